//! Client for the tool backend
//!
//! The backend serves the language catalog, category suggestions and the
//! category-to-articles resolution (which goes through Wikidata to match
//! the category across editions).

use crate::error::SourceResult;
use crate::http::{join_segments, HttpSource};
use crate::{CandidateSource, CategoryLookup, LanguageCatalog, ResolutionOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use wikigap_common::language::Language;
use wikigap_common::LanguageCode;

const SERVICE: &str = "backend";

#[derive(Deserialize)]
struct ResolveResponse {
    #[serde(default)]
    articles: Option<Vec<String>>,
    #[serde(default, rename = "noCatError")]
    no_cat_error: bool,
    #[serde(default, rename = "noQCode")]
    no_q_code: bool,
}

impl From<ResolveResponse> for ResolutionOutcome {
    fn from(response: ResolveResponse) -> Self {
        if response.no_cat_error {
            ResolutionOutcome::CategoryNotFound
        } else if response.no_q_code {
            ResolutionOutcome::CategoryUnresolvable
        } else {
            ResolutionOutcome::Resolved {
                articles: response.articles.unwrap_or_default(),
            }
        }
    }
}

#[derive(Deserialize)]
struct LanguagesResponse {
    #[serde(default)]
    languages: Vec<Language>,
}

#[derive(Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Vec<String>,
}

/// Tool backend client
#[derive(Debug, Clone)]
pub struct ToolBackendClient {
    http: HttpSource,
    base_url: String,
}

impl ToolBackendClient {
    pub fn new(http: HttpSource, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CandidateSource for ToolBackendClient {
    #[instrument(
        skip(self, target_lang, reference_lang),
        fields(target = %target_lang, reference = %reference_lang)
    )]
    async fn resolve_candidates(
        &self,
        target_lang: &LanguageCode,
        category: &str,
        reference_lang: &LanguageCode,
    ) -> SourceResult<ResolutionOutcome> {
        let url = join_segments(
            SERVICE,
            &self.base_url,
            &[
                "get_articles_from_other_languages",
                target_lang.as_str(),
                category,
                reference_lang.as_str(),
            ],
            true,
        )?;

        let response: ResolveResponse = self.http.send_json(SERVICE, self.http.get(url)).await?;
        let outcome = ResolutionOutcome::from(response);
        debug!(?outcome, "Category resolved");
        Ok(outcome)
    }
}

#[async_trait]
impl LanguageCatalog for ToolBackendClient {
    async fn supported_languages(&self) -> SourceResult<Vec<Language>> {
        let url = join_segments(SERVICE, &self.base_url, &["api", "supported_languages"], true)?;
        let response: LanguagesResponse = self.http.send_json(SERVICE, self.http.get(url)).await?;
        Ok(response.languages)
    }
}

#[async_trait]
impl CategoryLookup for ToolBackendClient {
    async fn categories(&self, lang: &LanguageCode, query: &str) -> SourceResult<Vec<String>> {
        let url = join_segments(
            SERVICE,
            &self.base_url,
            &["get_categories_with_query", lang.as_str(), query],
            true,
        )?;
        let response: CategoriesResponse = self.http.send_json(SERVICE, self.http.get(url)).await?;
        Ok(response.categories)
    }
}
