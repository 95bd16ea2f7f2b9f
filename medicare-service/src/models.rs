use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "en".to_string()
}

fn default_max_results() -> u8 {
    5
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub language: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    #[serde(default)]
    pub context: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub degraded: bool,
    pub disclaimer: String,
    pub language: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ImageAnalysisResponse {
    pub extracted_text: String,
    pub analysis: AnalysisResponse,
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: u8,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    pub query: String,
    pub results: Vec<ResearchResult>,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}
