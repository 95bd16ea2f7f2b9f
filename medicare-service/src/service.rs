use axum::{
    Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::Utc;
use medicare_pipeline::{Language, Pipeline, PipelineError, Settings, text_invoker};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::models::{
    AnalysisRequest, AnalysisResponse, ChatRequest, ChatResponse, ImageAnalysisResponse,
    ResearchRequest, ResearchResponse,
};
use crate::{ocr, research};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

const DISCLAIMER: &str = "⚠️ This analysis is for informational purposes only. \
Always consult qualified healthcare professionals for medical advice.";

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

/// UnsupportedLanguage is a caller error; everything else that escapes the
/// pipeline is a service failure. SchemaViolation never reaches this layer.
fn pipeline_error(err: PipelineError) -> ApiError {
    match err {
        PipelineError::UnsupportedLanguage(_) => bad_request_error(&err.to_string()),
        other => internal_error("Model invocation failed", &other.to_string()),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub settings: Settings,
}

pub fn create_app() -> Router {
    let settings = Settings::from_env().unwrap_or_else(|e| {
        error!("Failed to load settings: {}", e);
        std::process::exit(1);
    });
    let pipeline = Pipeline::new(text_invoker(&settings));

    build_router(AppState { pipeline, settings })
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_with_ai))
        .route("/api/analyze-text", post(analyze_medical_text))
        .route("/api/analyze-image", post(analyze_medical_image))
        .route("/api/extract-text", post(extract_text))
        .route("/api/research", post(search_research))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "MediCare AI Backend",
        "version": "1.0.0",
        "description": "Medical AI assistant: chat, record analysis, image OCR and research search",
        "endpoints": {
            "POST /api/chat": "Chat with the medical assistant",
            "POST /api/analyze-text": "Analyze a medical record text",
            "POST /api/analyze-image": "OCR a medical record image and analyze it",
            "POST /api/extract-text": "OCR a medical record image",
            "POST /api/research": "Search recent medical research",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn chat_with_ai(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    if request.message.is_empty() || request.message.chars().count() > 1000 {
        return Err(bad_request_error("Message must be between 1 and 1000 characters"));
    }

    let language = Language::parse(&request.language).map_err(pipeline_error)?;

    let response = state
        .pipeline
        .run_chat(&request.message, language)
        .await
        .map_err(pipeline_error)?;

    Ok(Json(ChatResponse {
        response,
        language: language.tag().to_string(),
        timestamp: Utc::now(),
    }))
}

async fn analyze_medical_text(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> ApiResult<AnalysisResponse> {
    if request.text.is_empty() {
        return Err(bad_request_error("Text must not be empty"));
    }

    let language = Language::parse(&request.language).map_err(pipeline_error)?;
    let response = run_analysis(&state, &request.text, &request.context, language).await?;
    Ok(Json(response))
}

async fn run_analysis(
    state: &AppState,
    text: &str,
    context: &str,
    language: Language,
) -> Result<AnalysisResponse, ApiError> {
    let outcome = state
        .pipeline
        .run_analysis(text, context, language)
        .await
        .map_err(pipeline_error)?;

    Ok(AnalysisResponse {
        summary: outcome.analysis.summary,
        key_findings: outcome.analysis.key_findings,
        recommendations: outcome.analysis.recommendations,
        next_steps: outcome.analysis.next_steps,
        degraded: outcome.degraded,
        disclaimer: DISCLAIMER.to_string(),
        language: language.tag().to_string(),
        timestamp: Utc::now(),
    })
}

struct ImageUpload {
    bytes: Vec<u8>,
    language: String,
    extract_text_only: bool,
}

async fn read_image_upload(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    let mut bytes = None;
    let mut language = "en".to_string();
    let mut extract_text_only = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request_error(&format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let is_image = field
                    .content_type()
                    .map(|ct| ct.starts_with("image/"))
                    .unwrap_or(false);
                if !is_image {
                    return Err(bad_request_error("File must be an image"));
                }
                bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| bad_request_error(&format!("Failed to read file: {}", e)))?
                        .to_vec(),
                );
            }
            Some("language") => {
                language = field.text().await.unwrap_or_else(|_| "en".to_string());
            }
            Some("extract_text_only") => {
                extract_text_only = field
                    .text()
                    .await
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false);
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| bad_request_error("Missing file field"))?;
    Ok(ImageUpload {
        bytes,
        language,
        extract_text_only,
    })
}

async fn analyze_medical_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<ImageAnalysisResponse> {
    let upload = read_image_upload(multipart).await?;
    let language = Language::parse(&upload.language).map_err(pipeline_error)?;

    info!(bytes = upload.bytes.len(), "Starting medical image analysis");

    let extracted_text = ocr::extract_text_from_image(
        &upload.bytes,
        &state.settings.api_key,
        &state.settings.vision_generation(),
    )
    .await
    .map_err(|e| internal_error("Text extraction failed", &e.to_string()))?;

    if upload.extract_text_only {
        return Ok(Json(ImageAnalysisResponse {
            extracted_text,
            analysis: AnalysisResponse {
                summary: "Text extraction completed".to_string(),
                key_findings: vec![],
                recommendations: vec![],
                next_steps: vec![
                    "Review the extracted text".to_string(),
                    "Analyze if needed".to_string(),
                ],
                degraded: false,
                disclaimer: "Text extraction only - no analysis performed".to_string(),
                language: language.tag().to_string(),
                timestamp: Utc::now(),
            },
        }));
    }

    let analysis = run_analysis(&state, &extracted_text, "", language).await?;
    Ok(Json(ImageAnalysisResponse {
        extracted_text,
        analysis,
    }))
}

async fn extract_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let upload = read_image_upload(multipart).await?;

    let extracted_text = ocr::extract_text_from_image(
        &upload.bytes,
        &state.settings.api_key,
        &state.settings.vision_generation(),
    )
    .await
    .map_err(|e| internal_error("Text extraction failed", &e.to_string()))?;

    Ok(Json(json!({
        "extracted_text": extracted_text,
        "timestamp": Utc::now().to_rfc3339()
    })))
}

async fn search_research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> ApiResult<ResearchResponse> {
    if request.query.chars().count() < 3 || request.query.chars().count() > 200 {
        return Err(bad_request_error("Query must be between 3 and 200 characters"));
    }

    let language = Language::parse(&request.language).map_err(pipeline_error)?;
    let max_results = request.max_results.clamp(1, 10);

    let results = research::search_medical_research(&request.query, max_results)
        .await
        .map_err(|e| internal_error("Research search failed", &e.to_string()))?;

    let summary = if results.is_empty() {
        "No recent relevant medical literature found for this query.".to_string()
    } else {
        state
            .pipeline
            .run_chat(&research::summary_prompt(&results), language)
            .await
            .map_err(pipeline_error)?
    };

    Ok(Json(ResearchResponse {
        query: request.query,
        results,
        summary,
        timestamp: Utc::now(),
    }))
}
