//! In-memory wiki for tests and offline runs
//!
//! Titles without registered statistics fail every statistics call, which
//! models a page whose upstream sources are all down. The language catalog
//! starts with a handful of common editions.

use crate::error::{SourceError, SourceResult};
use crate::{
    CandidateSource, CategoryLookup, Continuation, LanguageCatalog, LanguageLinks, LinkInfo,
    ListKind, ListPage, PageInfo, PageLists, PageStatistics, ProseInfo, ResolutionOutcome,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wikigap_common::language::Language;
use wikigap_common::LanguageCode;

const SERVICE: &str = "mock";

const DEFAULT_LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("de", "German"),
    ("en", "English"),
    ("fr", "French"),
    ("he", "Hebrew"),
];

/// Everything the mock serves for one title
#[derive(Debug, Clone, Default)]
pub struct ArticleStats {
    pub page: PageInfo,
    pub prose: ProseInfo,
    pub links: LinkInfo,
    pub langlinks: Vec<String>,
    pub templates: Vec<String>,
}

impl ArticleStats {
    /// Stats with only a view count set
    pub fn with_views(views: u64) -> Self {
        Self {
            page: PageInfo {
                views: Some(views),
                ..PageInfo::default()
            },
            ..Self::default()
        }
    }
}

/// Mock upstream implementing every source trait
#[derive(Debug)]
pub struct MockWiki {
    resolution: ResolutionOutcome,
    languages: Vec<Language>,
    categories: Vec<String>,
    missing_pages: HashSet<String>,
    existing: HashSet<String>,
    failing_existence: HashSet<String>,
    existence_delays: HashMap<String, Duration>,
    stats: HashMap<String, ArticleStats>,
    stat_delays: HashMap<String, Duration>,
    broken_lists: HashMap<(String, ListKind), usize>,
    page_size: usize,
    resolve_calls: AtomicUsize,
    existence_calls: AtomicUsize,
    stat_calls: AtomicUsize,
    catalog_calls: AtomicUsize,
}

impl Default for MockWiki {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWiki {
    pub fn new() -> Self {
        Self {
            resolution: ResolutionOutcome::Resolved { articles: Vec::new() },
            languages: DEFAULT_LANGUAGES
                .iter()
                .map(|(code, name)| Language {
                    code: (*code).to_string(),
                    name: (*name).to_string(),
                })
                .collect(),
            categories: Vec::new(),
            missing_pages: HashSet::new(),
            existing: HashSet::new(),
            failing_existence: HashSet::new(),
            existence_delays: HashMap::new(),
            stats: HashMap::new(),
            stat_delays: HashMap::new(),
            broken_lists: HashMap::new(),
            page_size: 50,
            resolve_calls: AtomicUsize::new(0),
            existence_calls: AtomicUsize::new(0),
            stat_calls: AtomicUsize::new(0),
            catalog_calls: AtomicUsize::new(0),
        }
    }

    /// Resolve every category to these titles, in order
    pub fn with_articles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolution = ResolutionOutcome::Resolved {
            articles: titles.into_iter().map(Into::into).collect(),
        };
        self
    }

    pub fn with_resolution(mut self, outcome: ResolutionOutcome) -> Self {
        self.resolution = outcome;
        self
    }

    /// Replace the default language catalog
    pub fn with_languages(mut self, languages: Vec<Language>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Titles with no page in the reference edition
    pub fn missing_page(mut self, title: &str) -> Self {
        self.missing_pages.insert(title.to_string());
        self
    }

    /// Mark a title as already present in every target edition
    pub fn existing(mut self, title: &str) -> Self {
        self.existing.insert(title.to_string());
        self
    }

    /// Fail the existence check for a title
    pub fn failing_existence(mut self, title: &str) -> Self {
        self.failing_existence.insert(title.to_string());
        self
    }

    pub fn existence_delay(mut self, title: &str, delay: Duration) -> Self {
        self.existence_delays.insert(title.to_string(), delay);
        self
    }

    pub fn with_stats(mut self, title: &str, stats: ArticleStats) -> Self {
        self.stats.insert(title.to_string(), stats);
        self
    }

    pub fn stat_delay(mut self, title: &str, delay: Duration) -> Self {
        self.stat_delays.insert(title.to_string(), delay);
        self
    }

    /// Fail the list request at the given page index
    pub fn broken_list(mut self, title: &str, kind: ListKind, at_page: usize) -> Self {
        self.broken_lists.insert((title.to_string(), kind), at_page);
        self
    }

    /// Items per list page
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn existence_calls(&self) -> usize {
        self.existence_calls.load(Ordering::SeqCst)
    }

    /// Statistics and list calls combined
    pub fn stat_calls(&self) -> usize {
        self.stat_calls.load(Ordering::SeqCst)
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    async fn stats_for(&self, title: &str) -> SourceResult<&ArticleStats> {
        self.stat_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.stat_delays.get(title) {
            tokio::time::sleep(*delay).await;
        }
        self.stats.get(title).ok_or_else(|| SourceError::Status {
            service: SERVICE,
            status: 503,
        })
    }
}

#[async_trait]
impl CandidateSource for MockWiki {
    async fn resolve_candidates(
        &self,
        _target_lang: &LanguageCode,
        _category: &str,
        _reference_lang: &LanguageCode,
    ) -> SourceResult<ResolutionOutcome> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.resolution.clone())
    }
}

#[async_trait]
impl LanguageCatalog for MockWiki {
    async fn supported_languages(&self) -> SourceResult<Vec<Language>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.languages.clone())
    }
}

#[async_trait]
impl CategoryLookup for MockWiki {
    async fn categories(&self, _lang: &LanguageCode, query: &str) -> SourceResult<Vec<String>> {
        let query = query.to_lowercase();
        Ok(self
            .categories
            .iter()
            .filter(|c| c.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LanguageLinks for MockWiki {
    async fn language_exists(
        &self,
        title: &str,
        _source_lang: &LanguageCode,
        _target_lang: &LanguageCode,
    ) -> SourceResult<bool> {
        self.existence_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.existence_delays.get(title) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_existence.contains(title) {
            return Err(SourceError::Request {
                service: SERVICE,
                message: format!("existence lookup for '{}' failed", title),
            });
        }
        Ok(self.existing.contains(title))
    }
}

#[async_trait]
impl PageStatistics for MockWiki {
    async fn page_info(&self, title: &str, _lang: &LanguageCode) -> SourceResult<PageInfo> {
        Ok(self.stats_for(title).await?.page.clone())
    }

    async fn prose_info(&self, title: &str, _lang: &LanguageCode) -> SourceResult<ProseInfo> {
        Ok(self.stats_for(title).await?.prose.clone())
    }

    async fn link_info(&self, title: &str, _lang: &LanguageCode) -> SourceResult<LinkInfo> {
        Ok(self.stats_for(title).await?.links.clone())
    }
}

#[async_trait]
impl PageLists for MockWiki {
    async fn list_page(
        &self,
        kind: ListKind,
        title: &str,
        _lang: &LanguageCode,
        continuation: Option<&Continuation>,
    ) -> SourceResult<ListPage> {
        if self.missing_pages.contains(title) {
            self.stat_calls.fetch_add(1, Ordering::SeqCst);
            return Err(SourceError::PageMissing {
                service: SERVICE,
                title: title.to_string(),
            });
        }

        let stats = self.stats_for(title).await?;
        let offset = match continuation.and_then(|c| c.get("offset")) {
            Some(raw) => raw.parse::<usize>().map_err(|e| SourceError::Decode {
                service: SERVICE,
                message: format!("bad offset '{}': {}", raw, e),
            })?,
            None => 0,
        };

        if let Some(at_page) = self.broken_lists.get(&(title.to_string(), kind)) {
            if offset / self.page_size >= *at_page {
                return Err(SourceError::Timeout {
                    service: SERVICE,
                    timeout_ms: 0,
                });
            }
        }

        let all = match kind {
            ListKind::LangLinks => &stats.langlinks,
            ListKind::Templates => &stats.templates,
        };
        let end = (offset + self.page_size).min(all.len());
        let items = all.get(offset..end).map(<[String]>::to_vec).unwrap_or_default();
        let continuation = (end < all.len())
            .then(|| Continuation::from([("offset".to_string(), end.to_string())]));

        Ok(ListPage { items, continuation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> LanguageCode {
        LanguageCode::parse("en").unwrap()
    }

    #[tokio::test]
    async fn test_list_pages_continue_by_offset() {
        let stats = ArticleStats {
            templates: (0..5).map(|i| format!("Template:T{}", i)).collect(),
            ..ArticleStats::default()
        };
        let wiki = MockWiki::new().with_stats("A", stats).page_size(2);

        let first = wiki.list_page(ListKind::Templates, "A", &en(), None).await.unwrap();
        assert_eq!(first.items, vec!["Template:T0", "Template:T1"]);
        let next = first.continuation.unwrap();
        assert_eq!(next.get("offset").map(String::as_str), Some("2"));

        let resume = Continuation::from([("offset".to_string(), "4".to_string())]);
        let last = wiki
            .list_page(ListKind::Templates, "A", &en(), Some(&resume))
            .await
            .unwrap();
        assert_eq!(last.items, vec!["Template:T4"]);
        assert!(last.continuation.is_none());
    }

    #[tokio::test]
    async fn test_unknown_title_fails_statistics() {
        let wiki = MockWiki::new();
        assert!(wiki.page_info("Ghost", &en()).await.is_err());
        assert_eq!(wiki.stat_calls(), 1);
    }

    #[tokio::test]
    async fn test_existence() {
        let wiki = MockWiki::new().existing("A").failing_existence("B");
        assert!(wiki.language_exists("A", &en(), &en()).await.unwrap());
        assert!(wiki.language_exists("B", &en(), &en()).await.is_err());
        assert!(!wiki.language_exists("C", &en(), &en()).await.unwrap());
        assert_eq!(wiki.existence_calls(), 3);
    }

    #[tokio::test]
    async fn test_catalog_defaults_and_override() {
        let wiki = MockWiki::new();
        let codes: Vec<_> = wiki
            .supported_languages()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.code)
            .collect();
        assert!(codes.iter().any(|c| c == "he"));
        assert!(codes.iter().any(|c| c == "en"));

        let only_sw = MockWiki::new().with_languages(vec![Language {
            code: "sw".into(),
            name: "Swahili".into(),
        }]);
        let languages = only_sw.supported_languages().await.unwrap();
        assert_eq!(languages.len(), 1);
        assert_eq!(languages[0].label(), "Swahili (sw)");
        assert_eq!(only_sw.catalog_calls(), 1);
    }

    #[tokio::test]
    async fn test_categories_match_case_insensitively() {
        let wiki = MockWiki::new().with_categories(["Health", "Public health", "History"]);
        let found = wiki.categories(&en(), "HEALTH").await.unwrap();
        assert_eq!(found, vec!["Health", "Public health"]);
        assert!(wiki.categories(&en(), "Zoology").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_page_fails_lists() {
        let wiki = MockWiki::new().missing_page("Ghost");
        let err = wiki.list_page(ListKind::LangLinks, "Ghost", &en(), None).await.unwrap_err();
        assert!(matches!(err, SourceError::PageMissing { .. }));
        assert_eq!(wiki.stat_calls(), 1);
    }
}
