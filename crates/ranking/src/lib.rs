//! WikiGap Ranking Engine
//!
//! Turns per-article metadata into a total order:
//! - Max-relative normalization of every signal across the candidate set
//! - Per-signal polarity (reward higher vs. reward lower raw values)
//! - Weighted linear scoring with caller-supplied weights
//! - Stable descending sort, ties broken by discovery order
//!
//! The engine is pure: every call recomputes from scratch, so it can be
//! invoked again whenever more metadata arrives.

mod candidate;
mod engine;
mod metadata;
mod normalize;
mod weights;

pub use candidate::Candidate;
pub use engine::{rank, RankedArticle, RankingEngine};
pub use metadata::{ArticleMetadata, RawSignals};
pub use normalize::{safe_divide, MaxValues, Metric, NormalizedMetrics, Polarity};
pub use weights::Weights;
