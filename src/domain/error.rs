use serde::{Deserialize, Serialize};
use std::fmt;

use super::export::ExportReport;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ParseError(String),
    LLMError(String),
    SecurityError(String),
    IoError(String),
    ConfigError(String),
    /// No row survived filtering. Regenerate upstream text instead of retrying it.
    EmptyOrInvalidTable(String),
    /// The generator answered 503 on every attempt.
    UpstreamUnavailable { attempts: u32 },
    /// The generator replied 2xx but the envelope did not carry a text payload.
    MalformedUpstreamResponse(String),
    /// Any other non-success status from a remote service.
    UpstreamHttp { status: u16, body: String },
    /// Some rows were rejected by the export target. Accepted rows stay accepted.
    ExportPartialFailure(ExportReport),
}

impl AppError {
    /// Stable, machine-readable tag used by the HTTP layer.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::NotFound(_) => "not_found",
            AppError::ValidationError(_) => "validation",
            AppError::ParseError(_) => "parse",
            AppError::LLMError(_) => "llm",
            AppError::SecurityError(_) => "security",
            AppError::IoError(_) => "io",
            AppError::ConfigError(_) => "config",
            AppError::EmptyOrInvalidTable(_) => "empty_or_invalid_table",
            AppError::UpstreamUnavailable { .. } => "upstream_unavailable",
            AppError::MalformedUpstreamResponse(_) => "malformed_upstream_response",
            AppError::UpstreamHttp { .. } => "upstream_http",
            AppError::ExportPartialFailure(_) => "export_partial_failure",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::LLMError(msg) => write!(f, "LLM error: {}", msg),
            AppError::SecurityError(msg) => write!(f, "Security error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::EmptyOrInvalidTable(msg) => {
                write!(f, "Generated table is empty or invalid: {}", msg)
            }
            AppError::UpstreamUnavailable { attempts } => write!(
                f,
                "Text generation service unavailable after {} attempts (503)",
                attempts
            ),
            AppError::MalformedUpstreamResponse(msg) => {
                write!(f, "Malformed response from text generation service: {}", msg)
            }
            AppError::UpstreamHttp { status, body } => {
                write!(f, "Remote service error ({}): {}", status, body)
            }
            AppError::ExportPartialFailure(report) => write!(
                f,
                "Export incomplete: {} of {} cases uploaded",
                report.uploaded, report.total
            ),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unavailable_mentions_attempts() {
        let err = AppError::UpstreamUnavailable { attempts: 4 };
        assert_eq!(
            err.to_string(),
            "Text generation service unavailable after 4 attempts (503)"
        );
        assert_eq!(err.kind(), "upstream_unavailable");
    }

    #[test]
    fn test_partial_failure_serializes_report() {
        let err = AppError::ExportPartialFailure(ExportReport {
            uploaded: 1,
            total: 2,
            failures: Vec::new(),
        });
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["ExportPartialFailure"]["uploaded"], 1);
        assert_eq!(err.to_string(), "Export incomplete: 1 of 2 cases uploaded");
    }
}
