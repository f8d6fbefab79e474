//! Candidate resolution
//!
//! Turns a run request into the ordered, de-duplicated candidate set.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use wikigap_common::language::is_supported;
use wikigap_common::{AppError, LanguageCode, Result, RunRequest};
use wikigap_ranking::Candidate;
use wikigap_sources::{CandidateSource, LanguageCatalog, ResolutionOutcome};

/// Resolves a category to the candidate titles of a run
#[derive(Clone)]
pub struct CandidateResolver {
    source: Arc<dyn CandidateSource>,
    catalog: Arc<dyn LanguageCatalog>,
}

impl CandidateResolver {
    pub fn new(source: Arc<dyn CandidateSource>, catalog: Arc<dyn LanguageCatalog>) -> Self {
        Self { source, catalog }
    }

    /// Both languages must be editions the catalog lists
    async fn check_supported(&self, request: &RunRequest) -> Result<()> {
        let languages = self.catalog.supported_languages().await.map_err(|e| {
            tracing::error!(error = %e, "Language catalog unavailable");
            AppError::from(e)
        })?;

        for lang in [&request.target_lang, &request.reference_lang] {
            if !is_supported(&languages, lang) {
                warn!(lang = %lang, "Language not in catalog");
                return Err(AppError::InvalidLanguage {
                    code: lang.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Resolve the request's category.
    ///
    /// The request is validated and its languages checked against the
    /// catalog before the category is looked up. `CategoryNotFound` and
    /// `CategoryUnresolvable` are terminal and kept distinct. An empty
    /// article list is a valid, empty candidate set.
    #[instrument(
        skip(self, request),
        fields(
            category = %request.category,
            target = %request.target_lang,
            reference = %request.reference_lang
        )
    )]
    pub async fn resolve(&self, request: &RunRequest) -> Result<Vec<Candidate>> {
        request.check()?;
        self.check_supported(request).await?;

        let outcome = self
            .source
            .resolve_candidates(
                &request.target_lang,
                &request.category,
                &request.reference_lang,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Candidate resolution failed");
                AppError::from(e)
            })?;

        match outcome {
            ResolutionOutcome::Resolved { articles } => {
                let candidates = candidates_from_titles(articles, &request.reference_lang);
                info!(candidates = candidates.len(), "Category resolved");
                Ok(candidates)
            }
            ResolutionOutcome::CategoryNotFound => {
                warn!("Category not found in reference edition");
                Err(AppError::CategoryNotFound {
                    category: request.category.clone(),
                    lang: request.reference_lang.to_string(),
                })
            }
            ResolutionOutcome::CategoryUnresolvable => {
                warn!("Category has no resolvable member pages");
                Err(AppError::CategoryUnresolvable {
                    category: request.category.clone(),
                    lang: request.reference_lang.to_string(),
                })
            }
        }
    }
}

/// Build candidates in discovery order, skipping blanks and repeated titles
pub fn candidates_from_titles<I>(titles: I, reference_lang: &LanguageCode) -> Vec<Candidate>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .enumerate()
        .map(|(index, title)| Candidate::new(title, reference_lang.clone(), index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikigap_common::errors::ErrorCode;
    use wikigap_common::language::Language;
    use wikigap_sources::mock::MockWiki;

    fn request() -> RunRequest {
        RunRequest::new("he", "Health", "en").unwrap()
    }

    fn resolver(wiki: &Arc<MockWiki>) -> CandidateResolver {
        CandidateResolver::new(wiki.clone(), wiki.clone())
    }

    #[tokio::test]
    async fn test_resolves_in_discovery_order() {
        let wiki = Arc::new(
            MockWiki::new().with_articles(["Nutrition", "Hygiene", "Nutrition", " ", "Sleep"]),
        );

        let candidates = resolver(&wiki).resolve(&request()).await.unwrap();
        let titles: Vec<_> = candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Nutrition", "Hygiene", "Sleep"]);
        let indices: Vec<_> = candidates.iter().map(|c| c.discovery_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(candidates.iter().all(|c| c.reference_lang.as_str() == "en"));
        assert_eq!(wiki.resolve_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_category_is_not_an_error() {
        let wiki = Arc::new(MockWiki::new().with_articles(Vec::<String>::new()));
        let candidates = resolver(&wiki).resolve(&request()).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_errors_stay_distinct() {
        let not_found =
            Arc::new(MockWiki::new().with_resolution(ResolutionOutcome::CategoryNotFound));
        let err = resolver(&not_found).resolve(&request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CategoryNotFound);
        assert!(err.is_resolution_error());

        let unresolvable =
            Arc::new(MockWiki::new().with_resolution(ResolutionOutcome::CategoryUnresolvable));
        let err = resolver(&unresolvable).resolve(&request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CategoryUnresolvable);
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_source() {
        let wiki = Arc::new(MockWiki::new());
        let same = RunRequest {
            target_lang: LanguageCode::parse("en").unwrap(),
            category: "Health".into(),
            reference_lang: LanguageCode::parse("en").unwrap(),
        };

        let err = resolver(&wiki).resolve(&same).await.unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(wiki.resolve_calls(), 0);
        assert_eq!(wiki.catalog_calls(), 0);
    }

    #[tokio::test]
    async fn test_language_outside_catalog_is_rejected() {
        let wiki = Arc::new(MockWiki::new().with_articles(["Nutrition"]).with_languages(vec![
            Language { code: "en".into(), name: "English".into() },
            Language { code: "ar".into(), name: "Arabic".into() },
        ]));

        let err = resolver(&wiki).resolve(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidLanguage { ref code } if code == "he"));
        assert!(err.is_validation_error());
        assert_eq!(wiki.catalog_calls(), 1);
        assert_eq!(wiki.resolve_calls(), 0);

        let to_arabic = RunRequest::new("ar", "Health", "en").unwrap();
        let candidates = resolver(&wiki).resolve(&to_arabic).await.unwrap();
        assert_eq!(candidates.len(), 1);
    }
}
