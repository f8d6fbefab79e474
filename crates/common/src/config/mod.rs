//! Configuration management for WikiGap
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Upstream service locations
    #[serde(default)]
    pub services: ServicesConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Pipeline scheduling and policy configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Ranking weights
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServicesConfig {
    /// Base URL of the tool backend (language catalog, categories, candidate resolution)
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// MediaWiki action API URL; `{lang}` is replaced by the language code
    #[serde(default = "default_mediawiki_api")]
    pub mediawiki_api: String,

    /// XTools page API base URL
    #[serde(default = "default_xtools_url")]
    pub xtools_url: String,

    /// Wiki host pattern used for XTools project names and article links
    #[serde(default = "default_wiki_host")]
    pub wiki_host: String,

    /// User agent sent to Wikimedia services
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Per-call timeout in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// What to do with a candidate whose existence check failed
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownVerdictPolicy {
    /// Keep the candidate (treat as not confirmed existing)
    #[default]
    Retain,
    /// Drop the candidate
    Drop,
}

/// What to do with a candidate whose metadata sources all failed
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptyMetadataPolicy {
    /// Rank it with default values, flagged low-confidence
    #[default]
    Rank,
    /// Exclude it from the ranking
    Drop,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Candidates processed concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,

    /// Policy for `Unknown` existence verdicts
    #[serde(default)]
    pub unknown_verdict: UnknownVerdictPolicy,

    /// Policy for fully-default metadata records
    #[serde(default)]
    pub empty_metadata: EmptyMetadataPolicy,

    /// Items requested per page from paginated list endpoints
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Continuation pages followed before a list is declared unavailable
    #[serde(default = "default_max_continuations")]
    pub max_continuations: usize,
}

/// Ranking weights as loaded from configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RankingConfig {
    #[serde(default = "default_views_weight")]
    pub views: f64,
    #[serde(default = "default_langlinks_weight")]
    pub langlinks: f64,
    #[serde(default = "default_minor_weight")]
    pub edit_count: f64,
    #[serde(default = "default_minor_weight")]
    pub references: f64,
    #[serde(default = "default_minor_weight")]
    pub edit_wars: f64,
    #[serde(default = "default_minor_weight")]
    pub templates: f64,
    #[serde(default = "default_link_weight")]
    pub in_link_count: f64,
    #[serde(default = "default_link_weight")]
    pub out_link_count: f64,
    #[serde(default)]
    pub words_per_byte: f64,
    #[serde(default)]
    pub secs_since_last_edit: f64,
    #[serde(default)]
    pub page_rank: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name attached to log records
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_backend_url() -> String { "http://localhost:8000".to_string() }
fn default_mediawiki_api() -> String { "https://{lang}.wikipedia.org/w/api.php".to_string() }
fn default_xtools_url() -> String { "https://xtools.wmcloud.org/api/page".to_string() }
fn default_wiki_host() -> String { "{lang}.wikipedia.org".to_string() }
fn default_user_agent() -> String {
    format!("wikigap/{} (missing article finder)", crate::VERSION)
}
fn default_call_timeout() -> u64 { crate::DEFAULT_CALL_TIMEOUT_SECS }
fn default_connect_timeout() -> u64 { 5 }
fn default_batch_size() -> usize { crate::DEFAULT_BATCH_SIZE }
fn default_batch_delay() -> u64 { crate::DEFAULT_BATCH_DELAY_MS }
fn default_page_limit() -> u32 { 50 }
fn default_max_continuations() -> usize { 200 }
fn default_views_weight() -> f64 { 0.35 }
fn default_langlinks_weight() -> f64 { 0.35 }
fn default_minor_weight() -> f64 { 0.025 }
fn default_link_weight() -> f64 { 0.10 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "wikigap".to_string() }

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            mediawiki_api: default_mediawiki_api(),
            xtools_url: default_xtools_url(),
            wiki_host: default_wiki_host(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay(),
            unknown_verdict: UnknownVerdictPolicy::default(),
            empty_metadata: EmptyMetadataPolicy::default(),
            page_limit: default_page_limit(),
            max_continuations: default_max_continuations(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            views: default_views_weight(),
            langlinks: default_langlinks_weight(),
            edit_count: default_minor_weight(),
            references: default_minor_weight(),
            edit_wars: default_minor_weight(),
            templates: default_minor_weight(),
            in_link_count: default_link_weight(),
            out_link_count: default_link_weight(),
            words_per_byte: 0.0,
            secs_since_last_edit: 0.0,
            page_rank: 0.0,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__PIPELINE__BATCH_SIZE=20
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Per-call upstream timeout
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.http.call_timeout_secs)
    }

    /// Connection timeout for the shared HTTP client
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout_secs)
    }

    /// Pause between candidate batches
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.pipeline.batch_delay_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            services: ServicesConfig::default(),
            http: HttpConfig::default(),
            pipeline: PipelineConfig::default(),
            ranking: RankingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ServicesConfig {
    /// Wiki host (project name) for a language edition
    pub fn wiki_host_for(&self, lang: &str) -> String {
        self.wiki_host.replace("{lang}", lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.batch_size, 10);
        assert_eq!(config.pipeline.batch_delay_ms, 100);
        assert_eq!(config.call_timeout(), Duration::from_secs(10));
        assert_eq!(config.pipeline.unknown_verdict, UnknownVerdictPolicy::Retain);
        assert_eq!(config.pipeline.empty_metadata, EmptyMetadataPolicy::Rank);
    }

    #[test]
    fn test_reference_weights() {
        let weights = RankingConfig::default();
        assert_eq!(weights.views, 0.35);
        assert_eq!(weights.langlinks, 0.35);
        assert_eq!(weights.edit_wars, 0.025);
        assert_eq!(weights.in_link_count, 0.10);
        assert_eq!(weights.words_per_byte, 0.0);
        assert_eq!(weights.page_rank, 0.0);
    }

    #[test]
    fn test_language_templates() {
        let services = ServicesConfig::default();
        assert_eq!(services.wiki_host_for("ar"), "ar.wikipedia.org");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"pipeline": {"batch_size": 4, "unknown_verdict": "drop"}}"#,
        )
        .unwrap();
        assert_eq!(config.pipeline.batch_size, 4);
        assert_eq!(config.pipeline.batch_delay_ms, 100);
        assert_eq!(config.pipeline.unknown_verdict, UnknownVerdictPolicy::Drop);
        assert_eq!(config.ranking, RankingConfig::default());
    }
}
