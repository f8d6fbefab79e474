//! Existence filter
//!
//! Drops candidates that already have an equivalent page in the target
//! edition. A lookup that fails or times out yields `Unknown`, which the
//! configured policy either keeps or drops.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use wikigap_common::config::UnknownVerdictPolicy;
use wikigap_common::metrics::{record_dropped, record_existence};
use wikigap_common::LanguageCode;
use wikigap_ranking::Candidate;
use wikigap_sources::LanguageLinks;

/// Result of one existence lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceVerdict {
    /// An equivalent page exists in the target edition
    Exists,
    /// No equivalent page in the target edition
    Missing,
    /// The lookup failed or timed out
    Unknown,
}

impl ExistenceVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExistenceVerdict::Exists => "exists",
            ExistenceVerdict::Missing => "missing",
            ExistenceVerdict::Unknown => "unknown",
        }
    }

    /// Whether a candidate with this verdict continues to metadata collection
    pub fn retains(&self, policy: UnknownVerdictPolicy) -> bool {
        match self {
            ExistenceVerdict::Exists => false,
            ExistenceVerdict::Missing => true,
            ExistenceVerdict::Unknown => policy == UnknownVerdictPolicy::Retain,
        }
    }
}

/// Look up one title, bounded by `timeout`. Never fails.
pub async fn check_exists(
    links: &dyn LanguageLinks,
    title: &str,
    reference_lang: &LanguageCode,
    target_lang: &LanguageCode,
    timeout: Duration,
) -> ExistenceVerdict {
    let lookup = links.language_exists(title, reference_lang, target_lang);
    let verdict = match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(true)) => ExistenceVerdict::Exists,
        Ok(Ok(false)) => ExistenceVerdict::Missing,
        Ok(Err(e)) => {
            warn!(title = %title, error = %e, "Existence check failed");
            ExistenceVerdict::Unknown
        }
        Err(_) => {
            warn!(
                title = %title,
                timeout_ms = timeout.as_millis() as u64,
                "Existence check timed out"
            );
            ExistenceVerdict::Unknown
        }
    };

    record_existence(verdict.as_str());
    debug!(title = %title, verdict = verdict.as_str(), "Existence verdict");
    verdict
}

/// Candidates split by verdict
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Candidates continuing to collection, in input order, with their verdict
    pub retained: Vec<(Candidate, ExistenceVerdict)>,
    pub existing: usize,
    pub unknown: usize,
    /// Unknown verdicts removed by the fail-closed policy
    pub dropped_unknown: usize,
}

/// Existence filter bound to a source, timeout and policy
#[derive(Clone)]
pub struct ExistenceFilter {
    links: Arc<dyn LanguageLinks>,
    timeout: Duration,
    policy: UnknownVerdictPolicy,
}

impl ExistenceFilter {
    pub fn new(
        links: Arc<dyn LanguageLinks>,
        timeout: Duration,
        policy: UnknownVerdictPolicy,
    ) -> Self {
        Self {
            links,
            timeout,
            policy,
        }
    }

    pub async fn check_exists(
        &self,
        title: &str,
        reference_lang: &LanguageCode,
        target_lang: &LanguageCode,
    ) -> ExistenceVerdict {
        check_exists(self.links.as_ref(), title, reference_lang, target_lang, self.timeout).await
    }

    /// Check every candidate concurrently and keep the ones the policy retains
    #[instrument(
        skip(self, candidates),
        fields(candidates = candidates.len(), target = %target_lang)
    )]
    pub async fn filter(
        &self,
        candidates: Vec<Candidate>,
        target_lang: &LanguageCode,
    ) -> FilterOutcome {
        let verdicts = join_all(
            candidates
                .iter()
                .map(|c| self.check_exists(&c.title, &c.reference_lang, target_lang)),
        )
        .await;

        let mut outcome = FilterOutcome::default();
        for (candidate, verdict) in candidates.into_iter().zip(verdicts) {
            match verdict {
                ExistenceVerdict::Exists => outcome.existing += 1,
                ExistenceVerdict::Unknown => outcome.unknown += 1,
                ExistenceVerdict::Missing => {}
            }

            if verdict.retains(self.policy) {
                outcome.retained.push((candidate, verdict));
            } else if verdict == ExistenceVerdict::Unknown {
                outcome.dropped_unknown += 1;
            }
        }

        record_dropped("exists", outcome.existing);
        record_dropped("unknown_verdict", outcome.dropped_unknown);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikigap_sources::mock::MockWiki;

    fn lang(code: &str) -> LanguageCode {
        LanguageCode::parse(code).unwrap()
    }

    fn candidates(titles: &[&str]) -> Vec<Candidate> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| Candidate::new(*t, lang("en"), i))
            .collect()
    }

    #[test]
    fn test_retention_policy() {
        assert!(!ExistenceVerdict::Exists.retains(UnknownVerdictPolicy::Retain));
        assert!(ExistenceVerdict::Missing.retains(UnknownVerdictPolicy::Drop));
        assert!(ExistenceVerdict::Unknown.retains(UnknownVerdictPolicy::Retain));
        assert!(!ExistenceVerdict::Unknown.retains(UnknownVerdictPolicy::Drop));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_unknown() {
        let wiki = MockWiki::new().existence_delay("X", Duration::from_secs(30));
        let verdict =
            check_exists(&wiki, "X", &lang("en"), &lang("he"), Duration::from_secs(10)).await;
        assert_eq!(verdict, ExistenceVerdict::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_candidate_is_retained() {
        let wiki = Arc::new(
            MockWiki::new()
                .existence_delay("X", Duration::from_secs(30))
                .existing("B"),
        );
        let filter =
            ExistenceFilter::new(wiki, Duration::from_secs(10), UnknownVerdictPolicy::Retain);

        let outcome = filter.filter(candidates(&["A", "B", "X"]), &lang("he")).await;
        let kept: Vec<_> = outcome.retained.iter().map(|(c, v)| (c.title.as_str(), *v)).collect();
        assert_eq!(kept, vec![("A", ExistenceVerdict::Missing), ("X", ExistenceVerdict::Unknown)]);
        assert_eq!(outcome.existing, 1);
        assert_eq!(outcome.unknown, 1);
        assert_eq!(outcome.dropped_unknown, 0);
    }

    #[tokio::test]
    async fn test_fail_closed_drops_unknown() {
        let wiki = Arc::new(MockWiki::new().failing_existence("X"));
        let filter =
            ExistenceFilter::new(wiki.clone(), Duration::from_secs(10), UnknownVerdictPolicy::Drop);

        let outcome = filter.filter(candidates(&["A", "X"]), &lang("he")).await;
        assert_eq!(outcome.retained.len(), 1);
        assert_eq!(outcome.retained[0].0.title, "A");
        assert_eq!(outcome.dropped_unknown, 1);
        assert_eq!(wiki.existence_calls(), 2);
    }
}
