use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IngestError, Result};
use crate::traits::{InlineData, VisionModel};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlinePart },
}

#[derive(Debug, Serialize)]
struct InlinePart {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    text: Option<String>,
}

/// Unwraps a reply wrapped in a ```json fence.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        let body = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
        return body.trim();
    }

    trimmed
}

/// Client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        let config = GenerationConfig {
            response_mime_type: "application/json".to_string(),
            temperature: Some(0.4),
            max_output_tokens: Some(8192),
        };

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            config,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate_text(&self, prompt: &str, media: &[InlineData]) -> Result<String> {
        let mut parts = vec![Part::Text { text: prompt }];
        parts.extend(media.iter().map(|m| Part::Inline {
            inline_data: InlinePart {
                mime_type: m.mime_type.clone(),
                data: STANDARD.encode(&m.data),
            },
        }));

        let request = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: &self.config,
        };

        tracing::info!(
            "Sending request to Gemini (model: {}, prompt length: {} chars, attachments: {})",
            self.model,
            prompt.len(),
            media.len()
        );

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::UpstreamError(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(IngestError::UpstreamError(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            IngestError::UpstreamError(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(IngestError::UpstreamError("Gemini returned no text".to_string()));
        }

        tracing::info!("Gemini generation complete: {} chars output", text.len());
        Ok(text)
    }
}

#[async_trait::async_trait]
impl VisionModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate_json(&self, prompt: &str, media: &[InlineData]) -> Result<Value> {
        let text = self.generate_text(prompt, media).await?;
        let json = strip_code_fences(&text);

        serde_json::from_str(json).map_err(|e| {
            tracing::warn!("Gemini reply is not valid JSON: {}", e);
            IngestError::UpstreamError(format!("Gemini reply is not valid JSON: {}", e))
        })
    }
}
