//! WikiGap Pipeline
//!
//! Finds articles of a reference-edition category that are missing from a
//! target edition and ranks them:
//! 1. Resolve the category to candidate titles
//! 2. Drop candidates that already exist in the target edition
//! 3. Collect page metadata for the rest
//! 4. Rank by weighted, normalized signals

pub mod collector;
pub mod existence;
pub mod links;
pub mod lookup;
pub mod orchestrator;
pub mod report;
pub mod resolver;
pub mod upstreams;

pub use collector::MetadataCollector;
pub use existence::{check_exists, ExistenceFilter, ExistenceVerdict, FilterOutcome};
pub use links::ArticleLinks;
pub use lookup::{find_languages, suggest_categories};
pub use orchestrator::RankingPipeline;
pub use report::{MissingArticle, ProgressEvent, RunReport, RunSummary};
pub use resolver::{candidates_from_titles, CandidateResolver};
pub use upstreams::Upstreams;
