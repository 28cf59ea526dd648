use serde::{Deserialize, Serialize};

/// Connection and retry settings for the Gemini `generateContent` endpoint.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Total attempts, the first call included.
    pub max_attempts: u32,
    /// Wait before retry `n` is `initial_backoff_ms * n`.
    pub initial_backoff_ms: u64,
    pub timeout_secs: u64,
    /// Attempts allowed for the description-refinement step when the reply is empty.
    pub refine_attempts: u32,
    pub refine_retry_delay_ms: u64,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            max_attempts: 4,
            initial_backoff_ms: 2000,
            timeout_secs: 120,
            refine_attempts: 3,
            refine_retry_delay_ms: 1000,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TestRailConfig {
    pub base_url: String,
    pub user: String,
    pub api_key: Option<String>,
    /// Request timeout for TestRail calls, independent of the Gemini one.
    pub timeout_secs: u64,
}

impl Default for TestRailConfig {
    fn default() -> Self {
        Self {
            base_url: "https://example.testrail.io".to_string(),
            user: String::new(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}
