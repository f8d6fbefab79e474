//! WikiGap Common Library
//!
//! Shared code for all WikiGap crates including:
//! - Error types and handling
//! - Configuration management
//! - Language codes and run requests
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod language;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use language::{LanguageCode, RunRequest};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default per-call upstream timeout in seconds
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 10;

/// Default number of candidates processed per batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default pause between batches in milliseconds
pub const DEFAULT_BATCH_DELAY_MS: u64 = 100;
