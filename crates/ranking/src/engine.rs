//! Weighted ranking of missing articles

use crate::{ArticleMetadata, Candidate, MaxValues, NormalizedMetrics, RawSignals, Weights};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;
use wikigap_common::config::RankingConfig;

/// One article of the final ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedArticle {
    pub candidate: Candidate,

    pub metadata: ArticleMetadata,

    /// Signals as they entered normalization
    pub signals: RawSignals,

    pub normalized: NormalizedMetrics,

    pub score: f64,

    /// Every metadata source failed for this article
    pub low_confidence: bool,
}

impl RankedArticle {
    pub fn title(&self) -> &str {
        &self.candidate.title
    }
}

/// Rank metadata records by weighted, normalized score.
///
/// Output length always equals input length. Arrival order of `metadata`
/// does not matter: maxima are order-independent and ties are broken by
/// discovery index, then by input position.
pub fn rank(metadata: &[ArticleMetadata], weights: &Weights) -> Vec<RankedArticle> {
    let signals: Vec<RawSignals> = metadata.iter().map(ArticleMetadata::signals).collect();
    let max = MaxValues::compute(&signals);

    let mut ranked: Vec<RankedArticle> = metadata
        .iter()
        .zip(signals)
        .map(|(meta, signals)| {
            let normalized = max.normalize(&signals);
            let score = weights.score(&normalized, signals.page_rank);
            RankedArticle {
                candidate: meta.candidate.clone(),
                metadata: meta.clone(),
                signals,
                normalized,
                score,
                low_confidence: meta.is_low_confidence(),
            }
        })
        .collect();

    // Stable sort: equal keys keep input order
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.candidate.discovery_index.cmp(&b.candidate.discovery_index))
    });

    debug!(articles = ranked.len(), "Ranking computed");
    ranked
}

/// Ranking engine bound to a weight configuration
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    weights: Weights,
}

impl RankingEngine {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    pub fn from_config(config: &RankingConfig) -> Self {
        Self::new(Weights::from(config))
    }

    /// Full recomputation over the current metadata set
    pub fn rank(&self, metadata: &[ArticleMetadata]) -> Vec<RankedArticle> {
        rank(metadata, &self.weights)
    }
}
