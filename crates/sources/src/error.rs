use thiserror::Error;
use wikigap_common::AppError;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Failure of a single upstream call
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to {service} failed: {message}")]
    Request { service: &'static str, message: String },

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} timed out after {timeout_ms}ms")]
    Timeout { service: &'static str, timeout_ms: u64 },

    #[error("unexpected {service} response: {message}")]
    Decode { service: &'static str, message: String },

    #[error("{service} list still continuing after {limit} pages")]
    PaginationLimit { service: &'static str, limit: usize },

    #[error("{service} has no page titled '{title}'")]
    PageMissing { service: &'static str, title: String },
}

impl SourceError {
    pub fn service(&self) -> &'static str {
        match self {
            SourceError::Request { service, .. }
            | SourceError::Status { service, .. }
            | SourceError::Timeout { service, .. }
            | SourceError::Decode { service, .. }
            | SourceError::PaginationLimit { service, .. }
            | SourceError::PageMissing { service, .. } => *service,
        }
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Status { service, status } => AppError::UpstreamStatus {
                service: service.to_string(),
                status,
            },
            SourceError::Timeout { service, timeout_ms } => AppError::Timeout {
                service: service.to_string(),
                timeout_ms,
            },
            other => AppError::Upstream {
                service: other.service().to_string(),
                message: other.to_string(),
            },
        }
    }
}
