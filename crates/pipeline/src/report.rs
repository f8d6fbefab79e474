//! Run results and progress events

use crate::links::ArticleLinks;
use serde::Serialize;
use wikigap_common::RunRequest;
use wikigap_ranking::RankedArticle;

/// Counts describing one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Candidates returned by the resolver
    pub candidates: usize,
    /// Candidates already present in the target edition
    pub existing: usize,
    /// Existence checks that failed or timed out
    pub unknown_verdicts: usize,
    /// Unknown verdicts removed by the fail-closed policy
    pub dropped_unknown: usize,
    /// Candidates with no page in the reference edition
    pub missing_reference: usize,
    /// Records for which no metadata source answered
    pub low_confidence: usize,
    /// Low-confidence records removed by policy
    pub dropped_low_confidence: usize,
    pub ranked: usize,
    pub batches_completed: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}

/// A ranked article plus its links
#[derive(Debug, Clone, Serialize)]
pub struct MissingArticle {
    /// 1-based rank
    pub position: usize,
    pub article: RankedArticle,
    pub links: ArticleLinks,
}

impl MissingArticle {
    pub fn title(&self) -> &str {
        self.article.title()
    }

    pub fn score(&self) -> f64 {
        self.article.score
    }
}

/// Final output of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub request: RunRequest,
    pub articles: Vec<MissingArticle>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn titles(&self) -> Vec<&str> {
        self.articles.iter().map(MissingArticle::title).collect()
    }
}

/// Progress of a run, emitted as it happens
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The category resolved to this many candidates
    Resolved { candidates: usize },
    /// A batch finished; `ranking` covers every candidate collected so far
    BatchCompleted {
        batch: usize,
        total_batches: usize,
        processed: usize,
        total: usize,
        ranking: Vec<RankedArticle>,
    },
    /// The run was cancelled after `processed` candidates
    Cancelled { processed: usize },
}
