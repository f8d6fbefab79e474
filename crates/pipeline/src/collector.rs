//! Metadata collector
//!
//! Gathers the five metadata sources for a candidate concurrently. Each
//! source call has its own timeout; a failed source leaves its fields
//! unavailable and never fails the candidate. Paginated lists are drained
//! to the end before counting; a drain that breaks midway counts as
//! unavailable rather than as a partial total. A title whose page no longer
//! exists in the reference edition yields no record at all.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use wikigap_common::metrics::FetchTimer;
use wikigap_common::LanguageCode;
use wikigap_ranking::{ArticleMetadata, Candidate};
use wikigap_sources::{
    Continuation, ListKind, PageLists, PageStatistics, SourceError, SourceResult,
};

/// Collects metadata for surviving candidates
#[derive(Clone)]
pub struct MetadataCollector {
    stats: Arc<dyn PageStatistics>,
    lists: Arc<dyn PageLists>,
    timeout: Duration,
    max_continuations: usize,
}

impl MetadataCollector {
    pub fn new(
        stats: Arc<dyn PageStatistics>,
        lists: Arc<dyn PageLists>,
        timeout: Duration,
        max_continuations: usize,
    ) -> Self {
        Self {
            stats,
            lists,
            timeout,
            max_continuations,
        }
    }

    /// Gather every signal for `candidate`. Never fails.
    ///
    /// Returns `None` when the reference edition has no page for the title.
    #[instrument(
        skip(self, candidate),
        fields(title = %candidate.title, lang = %candidate.reference_lang)
    )]
    pub async fn collect(&self, candidate: &Candidate) -> Option<ArticleMetadata> {
        let title = candidate.title.as_str();
        let lang = &candidate.reference_lang;

        let (page, prose, links, langlinks, templates) = tokio::join!(
            self.guarded("xtools_pageinfo", self.stats.page_info(title, lang)),
            self.guarded("xtools_prose", self.stats.prose_info(title, lang)),
            self.guarded("xtools_links", self.stats.link_info(title, lang)),
            self.count_list(ListKind::LangLinks, title, lang),
            self.count_list(ListKind::Templates, title, lang),
        );

        let page_missing = |result: &SourceResult<u64>| {
            matches!(result, Err(SourceError::PageMissing { .. }))
        };
        if page_missing(&langlinks) || page_missing(&templates) {
            info!("No page in the reference edition, skipping");
            return None;
        }
        let langlinks = langlinks.ok();
        let templates = templates.ok();

        let page = page.unwrap_or_default();
        let prose = prose.unwrap_or_default();
        let links = links.unwrap_or_default();

        let metadata = ArticleMetadata {
            candidate: candidate.clone(),
            views: page.views,
            langlinks,
            edit_count: page.edit_count,
            editor_count: page.editor_count,
            references: prose.references,
            templates,
            in_link_count: links.in_link_count(),
            out_link_count: links.out_links,
            words_per_byte: prose.words_per_byte(),
            secs_since_last_edit: page.secs_since_last_edit,
            created_at: page.created_at,
            page_rank: 0.0,
        };

        if metadata.is_low_confidence() {
            warn!("No metadata source answered");
        } else {
            debug!("Metadata collected");
        }
        Some(metadata)
    }

    /// Run one source call under the per-call timeout
    async fn guarded<T, F>(&self, source: &'static str, call: F) -> Option<T>
    where
        F: Future<Output = SourceResult<T>>,
    {
        let timer = FetchTimer::start(source);
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                service: source,
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };
        timer.finish(result.is_ok());

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(source, error = %e, "Metadata source unavailable");
                None
            }
        }
    }

    async fn count_list(
        &self,
        kind: ListKind,
        title: &str,
        lang: &LanguageCode,
    ) -> SourceResult<u64> {
        let source = match kind {
            ListKind::LangLinks => "mediawiki_langlinks",
            ListKind::Templates => "mediawiki_templates",
        };

        let timer = FetchTimer::start(source);
        let result = self.drain(source, kind, title, lang).await;
        timer.finish(result.is_ok());

        if let Err(e) = &result {
            warn!(source, error = %e, "List unavailable");
        }
        result.map(|total| total as u64)
    }

    /// Follow the continuation chain to the end and count every item
    async fn drain(
        &self,
        source: &'static str,
        kind: ListKind,
        title: &str,
        lang: &LanguageCode,
    ) -> SourceResult<usize> {
        let mut total = 0;
        let mut pages = 0usize;
        let mut continuation: Option<Continuation> = None;

        loop {
            let page = tokio::time::timeout(
                self.timeout,
                self.lists.list_page(kind, title, lang, continuation.as_ref()),
            )
            .await
            .map_err(|_| SourceError::Timeout {
                service: source,
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

            total += page.items.len();
            pages += 1;

            match page.continuation {
                None => return Ok(total),
                Some(_) if pages > self.max_continuations => {
                    return Err(SourceError::PaginationLimit {
                        service: source,
                        limit: self.max_continuations,
                    });
                }
                next => continuation = next,
            }
        }
    }
}
