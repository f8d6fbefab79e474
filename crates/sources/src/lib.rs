//! Upstream source abstraction
//!
//! Every network boundary the ranking pipeline consumes is a trait here:
//! - Candidate resolution, language catalog and category lookup (tool backend)
//! - Inter-language existence checks and paginated page lists (MediaWiki API)
//! - Page, prose and link statistics (XTools)
//!
//! HTTP implementations live next to an in-memory [`mock::MockWiki`] used by
//! pipeline tests.

mod backend;
mod error;
mod http;
mod mediawiki;
pub mod mock;
mod xtools;

pub use backend::ToolBackendClient;
pub use error::{SourceError, SourceResult};
pub use http::HttpSource;
pub use mediawiki::MediaWikiClient;
pub use xtools::XToolsClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wikigap_common::language::Language;
use wikigap_common::LanguageCode;

/// Outcome of resolving a category to candidate titles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// Member titles in the reference edition, in discovery order
    Resolved { articles: Vec<String> },
    /// The category does not exist in the reference edition
    CategoryNotFound,
    /// The category has no member pages or no cross-wiki identity
    CategoryUnresolvable,
}

/// Basic page statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub views: Option<u64>,
    pub edit_count: Option<u64>,
    pub editor_count: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub secs_since_last_edit: Option<u64>,
}

/// Prose and referencing statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProseInfo {
    pub references: Option<u64>,
    pub words: Option<u64>,
    pub bytes: Option<u64>,
}

impl ProseInfo {
    /// Words per byte of page source; 0 when the size is unknown or zero
    pub fn words_per_byte(&self) -> Option<f64> {
        match (self.words, self.bytes) {
            (Some(words), Some(bytes)) if bytes > 0 => Some(words as f64 / bytes as f64),
            (None, None) => None,
            _ => Some(0.0),
        }
    }
}

/// Link statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkInfo {
    pub in_links: Option<u64>,
    pub external_links: Option<u64>,
    pub out_links: Option<u64>,
}

impl LinkInfo {
    /// Internal plus external inbound links
    pub fn in_link_count(&self) -> Option<u64> {
        match (self.in_links, self.external_links) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
        }
    }
}

/// Paginated list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// Inter-language links of a page
    LangLinks,
    /// Templates transcluded by a page
    Templates,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::LangLinks => "langlinks",
            ListKind::Templates => "templates",
        }
    }
}

/// Opaque continuation parameters echoed back to fetch the next page
pub type Continuation = BTreeMap<String, String>;

/// One page of a paginated list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    pub items: Vec<String>,
    /// Present while more pages remain
    pub continuation: Option<Continuation>,
}

/// Resolves a category to candidate titles
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn resolve_candidates(
        &self,
        target_lang: &LanguageCode,
        category: &str,
        reference_lang: &LanguageCode,
    ) -> SourceResult<ResolutionOutcome>;
}

/// Supported language catalog
#[async_trait]
pub trait LanguageCatalog: Send + Sync {
    async fn supported_languages(&self) -> SourceResult<Vec<Language>>;
}

/// Category title lookup
#[async_trait]
pub trait CategoryLookup: Send + Sync {
    async fn categories(&self, lang: &LanguageCode, query: &str) -> SourceResult<Vec<String>>;
}

/// Inter-language link presence
#[async_trait]
pub trait LanguageLinks: Send + Sync {
    /// Whether `title` on `source_lang` links to an equivalent page on `target_lang`
    async fn language_exists(
        &self,
        title: &str,
        source_lang: &LanguageCode,
        target_lang: &LanguageCode,
    ) -> SourceResult<bool>;
}

/// Per-page statistics
#[async_trait]
pub trait PageStatistics: Send + Sync {
    async fn page_info(&self, title: &str, lang: &LanguageCode) -> SourceResult<PageInfo>;

    async fn prose_info(&self, title: &str, lang: &LanguageCode) -> SourceResult<ProseInfo>;

    async fn link_info(&self, title: &str, lang: &LanguageCode) -> SourceResult<LinkInfo>;
}

/// Paginated per-page lists; callers drain the continuation chain
#[async_trait]
pub trait PageLists: Send + Sync {
    async fn list_page(
        &self,
        kind: ListKind,
        title: &str,
        lang: &LanguageCode,
        continuation: Option<&Continuation>,
    ) -> SourceResult<ListPage>;
}
