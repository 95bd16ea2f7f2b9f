use std::io::Cursor;
use std::sync::OnceLock;

use anyhow::anyhow;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::ImageFormat;
use medicare_pipeline::GenerationConfig;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{info, warn};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const OCR_PROMPT: &str = "You are an expert medical document OCR system. \
Extract ALL text from this medical record image (lab results, prescriptions, hospital book pages) \
with perfect accuracy, preserving the structure, formatting, and medical terminology. \
Return ONLY the extracted text without any commentary or explanations.";

static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(Client::new)
}

/// Extract text from a medical record image using the vision model.
///
/// The image is decoded and re-encoded to PNG before upload, which also
/// rejects non-image payloads that slipped past the content-type check.
pub async fn extract_text_from_image(
    image_bytes: &[u8],
    api_key: &str,
    config: &GenerationConfig,
) -> anyhow::Result<String> {
    let image = image::load_from_memory(image_bytes)
        .map_err(|e| anyhow!("Failed to decode image: {}", e))?;

    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| anyhow!("Failed to encode image: {}", e))?;
    let base64_image = STANDARD.encode(&buffer);

    let content = vec![
        json!({
            "type": "text",
            "text": OCR_PROMPT
        }),
        json!({
            "type": "image_url",
            "image_url": {
                "url": format!("data:image/png;base64,{}", base64_image)
            }
        }),
    ];

    let extracted_text = call_vision_api(api_key, config, content).await?;

    info!(
        chars = extracted_text.len(),
        "Vision OCR completed"
    );
    Ok(extracted_text)
}

async fn call_vision_api(
    api_key: &str,
    config: &GenerationConfig,
    content: Vec<Value>,
) -> anyhow::Result<String> {
    let payload = json!({
        "model": config.model,
        "messages": [
            {
                "role": "user",
                "content": content
            }
        ],
        "temperature": config.temperature,
        "max_tokens": config.max_tokens
    });

    let response = http_client()
        .post(OPENROUTER_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(anyhow!("Vision API request failed: {}", response.status()));
    }

    let response_json: Value = response.json().await?;
    vision_response_text(&response_json)
}

fn vision_response_text(response_json: &Value) -> anyhow::Result<String> {
    let content = response_json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow!("Invalid response format from vision model"))?;

    if content.trim().is_empty() {
        warn!("No text extracted from image");
        return Err(anyhow!("No text extracted from image"));
    }

    Ok(content.to_string())
}
