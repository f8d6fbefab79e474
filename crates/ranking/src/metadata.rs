//! Per-article metadata
//!
//! Fields stay optional until normalization so that "source unavailable"
//! can be told apart from a reported value. At the normalization boundary
//! both an absent value and a reported zero collapse to `0`.

use crate::Candidate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw signals gathered for one surviving candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub candidate: Candidate,

    /// Page views over the upstream's recent window
    pub views: Option<u64>,

    /// Number of other-language editions linking to the article
    pub langlinks: Option<u64>,

    /// Total revisions
    pub edit_count: Option<u64>,

    /// Distinct editors
    pub editor_count: Option<u64>,

    /// Inline citations
    pub references: Option<u64>,

    /// Transcluded templates
    pub templates: Option<u64>,

    /// Internal plus external inbound links
    pub in_link_count: Option<u64>,

    /// Outbound links
    pub out_link_count: Option<u64>,

    /// Prose words divided by page size in bytes
    pub words_per_byte: Option<f64>,

    /// Seconds since the most recent edit
    pub secs_since_last_edit: Option<u64>,

    /// Creation time of the page, informational only
    pub created_at: Option<DateTime<Utc>>,

    /// Reserved graph-centrality signal, always 0
    pub page_rank: f64,
}

/// Metadata collapsed to plain numbers, ready for normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignals {
    pub views: f64,
    pub langlinks: f64,
    pub edit_count: f64,
    pub editor_count: f64,
    pub references: f64,
    pub templates: f64,
    pub edit_wars: f64,
    pub in_link_count: f64,
    pub out_link_count: f64,
    pub words_per_byte: f64,
    pub secs_since_last_edit: f64,
    pub page_rank: f64,
}

/// Present-and-truthy value, else 0
fn count(value: Option<u64>) -> f64 {
    value.filter(|v| *v > 0).map_or(0.0, |v| v as f64)
}

fn ratio(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

impl ArticleMetadata {
    /// Record with every field unavailable
    pub fn empty(candidate: Candidate) -> Self {
        Self {
            candidate,
            views: None,
            langlinks: None,
            edit_count: None,
            editor_count: None,
            references: None,
            templates: None,
            in_link_count: None,
            out_link_count: None,
            words_per_byte: None,
            secs_since_last_edit: None,
            created_at: None,
            page_rank: 0.0,
        }
    }

    pub fn title(&self) -> &str {
        &self.candidate.title
    }

    /// Average edits per editor; 0 when the editor count is unknown or zero
    pub fn edit_wars(&self) -> f64 {
        let editors = count(self.editor_count);
        if editors > 0.0 {
            count(self.edit_count) / editors
        } else {
            0.0
        }
    }

    /// True when no signal at all could be fetched
    pub fn is_low_confidence(&self) -> bool {
        self.views.is_none()
            && self.langlinks.is_none()
            && self.edit_count.is_none()
            && self.editor_count.is_none()
            && self.references.is_none()
            && self.templates.is_none()
            && self.in_link_count.is_none()
            && self.out_link_count.is_none()
            && self.words_per_byte.is_none()
            && self.secs_since_last_edit.is_none()
    }

    /// Collapse optional fields to their numeric defaults
    pub fn signals(&self) -> RawSignals {
        RawSignals {
            views: count(self.views),
            langlinks: count(self.langlinks),
            edit_count: count(self.edit_count),
            editor_count: count(self.editor_count),
            references: count(self.references),
            templates: count(self.templates),
            edit_wars: self.edit_wars(),
            in_link_count: count(self.in_link_count),
            out_link_count: count(self.out_link_count),
            words_per_byte: ratio(self.words_per_byte),
            secs_since_last_edit: count(self.secs_since_last_edit),
            page_rank: if self.page_rank.is_finite() { self.page_rank.max(0.0) } else { 0.0 },
        }
    }
}
