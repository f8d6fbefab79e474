//! Catalog and category lookups behind the language and category pickers

use tracing::instrument;
use wikigap_common::language::{filter_languages, Language};
use wikigap_common::{AppError, LanguageCode, Result};
use wikigap_sources::{CategoryLookup, LanguageCatalog};

/// Catalog entries whose name or code contains `query`, case-insensitively
#[instrument(skip(catalog))]
pub async fn find_languages(catalog: &dyn LanguageCatalog, query: &str) -> Result<Vec<Language>> {
    let languages = catalog.supported_languages().await.map_err(AppError::from)?;
    Ok(filter_languages(&languages, query).into_iter().cloned().collect())
}

/// Category titles in `lang` matching `query`.
///
/// `lang` may be a bare code or a picker label such as `Hebrew (he)`.
#[instrument(skip(lookup))]
pub async fn suggest_categories(
    lookup: &dyn CategoryLookup,
    lang: &str,
    query: &str,
) -> Result<Vec<String>> {
    let lang = LanguageCode::from_label(lang)?;
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    lookup.categories(&lang, query).await.map_err(AppError::from)
}
