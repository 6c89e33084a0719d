use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Internal => "INTERNAL",
        };
        write!(f, "{}", s)
    }
}

pub trait TopoviewError: std::error::Error {
    fn error_code(&self) -> ErrorCode;
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to decode report: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("report has no id")]
    MissingId,
    #[error("invalid network: {0}")]
    InvalidCidr(String),
}

impl TopoviewError for ReportError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::InvalidArgument
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl TopoviewError for SettingsError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SettingsError::Config(config::ConfigError::NotFound(_)) => ErrorCode::NotFound,
            SettingsError::Config(_) => ErrorCode::Internal,
            SettingsError::Invalid { .. } => ErrorCode::InvalidArgument,
        }
    }
}
