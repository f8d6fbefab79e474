//! Error types for WikiGap
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - Terminal resolution errors kept apart from transient upstream failures
//! - User-actionable messages
//! - Error codes for client handling

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidLanguage,
    SameLanguage,

    // Resolution errors (4xxx)
    CategoryNotFound,
    CategoryUnresolvable,

    // External service errors (8xxx)
    UpstreamError,
    UpstreamStatus,
    UpstreamTimeout,

    // Internal errors (9xxx)
    ConfigurationError,
    Cancelled,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidLanguage => 1002,
            ErrorCode::SameLanguage => 1003,

            // Resolution (4xxx)
            ErrorCode::CategoryNotFound => 4001,
            ErrorCode::CategoryUnresolvable => 4002,

            // External (8xxx)
            ErrorCode::UpstreamError => 8001,
            ErrorCode::UpstreamStatus => 8002,
            ErrorCode::UpstreamTimeout => 8003,

            // Internal (9xxx)
            ErrorCode::ConfigurationError => 9001,
            ErrorCode::Cancelled => 9002,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid language code: {code}")]
    InvalidLanguage { code: String },

    #[error("Target and reference language are both '{code}'")]
    SameLanguage { code: String },

    // Resolution errors
    #[error("Category '{category}' not found in {lang} Wikipedia")]
    CategoryNotFound { category: String, lang: String },

    #[error("Category '{category}' in {lang} Wikipedia has no resolvable member pages")]
    CategoryUnresolvable { category: String, lang: String },

    // External service errors
    #[error("Upstream service {service} failed: {message}")]
    Upstream { service: String, message: String },

    #[error("Upstream service {service} returned HTTP {status}")]
    UpstreamStatus { service: String, status: u16 },

    #[error("Upstream service {service} timed out after {timeout_ms}ms")]
    Timeout { service: String, timeout_ms: u64 },

    // Internal errors
    #[error("Run cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidLanguage { .. } => ErrorCode::InvalidLanguage,
            AppError::SameLanguage { .. } => ErrorCode::SameLanguage,
            AppError::CategoryNotFound { .. } => ErrorCode::CategoryNotFound,
            AppError::CategoryUnresolvable { .. } => ErrorCode::CategoryUnresolvable,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::UpstreamStatus { .. } => ErrorCode::UpstreamStatus,
            AppError::Timeout { .. } => ErrorCode::UpstreamTimeout,
            AppError::Cancelled => ErrorCode::Cancelled,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
        }
    }

    /// Terminal outcome of candidate resolution (the category itself is the problem)
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            AppError::CategoryNotFound { .. } | AppError::CategoryUnresolvable { .. }
        )
    }

    /// Network-level failure that a later run may not hit
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Upstream { .. }
                | AppError::UpstreamStatus { .. }
                | AppError::Timeout { .. }
        )
    }

    /// Caller input was rejected before any network call
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::InvalidLanguage { .. }
                | AppError::SameLanguage { .. }
        )
    }

    /// Message suitable for showing to an editor
    pub fn user_message(&self) -> String {
        match self {
            AppError::CategoryNotFound { .. } => {
                "Category not found in the reference language.".to_string()
            }
            AppError::CategoryUnresolvable { .. } => {
                "This category has no pages or is a red link \
                 (see https://en.wikipedia.org/wiki/Wikipedia:Red_link)."
                    .to_string()
            }
            AppError::InvalidLanguage { .. } | AppError::SameLanguage { .. } => {
                "Please select two different, valid languages.".to_string()
            }
            AppError::Validation { message, .. } => message.clone(),
            AppError::Cancelled => "Search cancelled.".to_string(),
            _ => "Error loading missing articles. Please try again later.".to_string(),
        }
    }
}

/// Structured error body for callers that serialize failures
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    pub user_message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = err.code();

        if err.is_transient() {
            tracing::error!(error = %err, code = ?code, "Upstream failure");
        } else if err.is_resolution_error() || err.is_validation_error() {
            tracing::warn!(error = %err, code = ?code, "Request rejected");
        }

        Self {
            error: ErrorDetails {
                code,
                message: err.to_string(),
                user_message: err.user_message(),
            },
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: err.to_string(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::CategoryNotFound {
            category: "Health".into(),
            lang: "en".into(),
        };
        assert_eq!(err.code(), ErrorCode::CategoryNotFound);
        assert_eq!(err.code().as_code(), 4001);
        assert!(err.is_resolution_error());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_resolution_errors_are_distinct() {
        let not_found = AppError::CategoryNotFound {
            category: "X".into(),
            lang: "en".into(),
        };
        let unresolvable = AppError::CategoryUnresolvable {
            category: "X".into(),
            lang: "en".into(),
        };
        assert_ne!(not_found.code(), unresolvable.code());
        assert_ne!(not_found.user_message(), unresolvable.user_message());
        assert!(unresolvable.user_message().contains("red link"));
    }

    #[test]
    fn test_transient_error() {
        let err = AppError::Timeout {
            service: "xtools".into(),
            timeout_ms: 10_000,
        };
        assert!(err.is_transient());
        assert!(!err.is_resolution_error());
        assert_eq!(err.code(), ErrorCode::UpstreamTimeout);
    }

    #[test]
    fn test_error_response_body() {
        let err = AppError::SameLanguage { code: "he".into() };
        let body = ErrorResponse::from(&err);
        assert_eq!(body.error.code, ErrorCode::SameLanguage);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["code"], "SAME_LANGUAGE");
    }
}
