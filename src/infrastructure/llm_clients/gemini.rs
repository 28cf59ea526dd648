use super::TextGenerator;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::GeminiConfig;
use crate::infrastructure::http_transport::{HttpTransport, OutboundRequest};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const STATUS_SERVICE_UNAVAILABLE: u16 = 503;

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

pub struct GeminiClient {
    transport: Arc<dyn HttpTransport>,
    config: GeminiConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, api_key: String, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            config,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model.trim()
        )
    }

    fn build_body(&self, prompt: &str) -> GeminiRequest {
        let generation_config =
            if self.config.temperature.is_some() || self.config.max_output_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_output_tokens,
                })
            } else {
                None
            };

        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
        }
    }

    /// Linear: the wait before retry `n` is `initial_backoff * n`.
    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.initial_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// Posts the prompt and returns the decoded JSON envelope.
    ///
    /// 503 is retried with linear backoff until `max_attempts` calls have been
    /// made; every other non-success status fails on the spot.
    pub async fn generate_content(&self, prompt: &str) -> Result<serde_json::Value> {
        let body = serde_json::to_value(self.build_body(prompt))
            .map_err(|e| AppError::Internal(format!("Failed to encode request: {}", e)))?;
        let request = OutboundRequest::post_json(self.endpoint(), body)
            .header("X-goog-api-key", &self.api_key);
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let response = self
                .transport
                .execute(request.clone())
                .await
                .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

            match response.status {
                status if (200..300).contains(&status) => {
                    debug!(attempt, "Gemini call succeeded");
                    return serde_json::from_str(&response.body).map_err(|e| {
                        AppError::MalformedUpstreamResponse(format!("Body is not JSON: {}", e))
                    });
                }
                STATUS_SERVICE_UNAVAILABLE if attempt < max_attempts => {
                    let wait = self.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        "Gemini is saturated (503), retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                STATUS_SERVICE_UNAVAILABLE => {
                    warn!(attempt, "Gemini still saturated (503), giving up");
                }
                status => {
                    return Err(AppError::UpstreamHttp {
                        status,
                        body: response.body,
                    });
                }
            }
        }

        Err(AppError::UpstreamUnavailable {
            attempts: max_attempts,
        })
    }
}

/// `candidates[0].content.parts[0].text` of a `generateContent` reply.
pub fn extract_candidate_text(envelope: &serde_json::Value) -> Result<String> {
    envelope
        .get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.get(0))
        .and_then(|part| part.get("text"))
        .and_then(|text| text.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::MalformedUpstreamResponse(
                "missing candidates[0].content.parts[0].text".to_string(),
            )
        })
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let envelope = self.generate_content(prompt).await?;
        extract_candidate_text(&envelope)
    }
}
