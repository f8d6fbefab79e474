//! Wiring of the upstream sources a run consumes

use std::sync::Arc;
use tracing::info;
use wikigap_common::AppConfig;
use wikigap_sources::{
    CandidateSource, CategoryLookup, HttpSource, LanguageCatalog, LanguageLinks, MediaWikiClient,
    PageLists, PageStatistics, SourceResult, ToolBackendClient, XToolsClient,
};

/// Every source trait object the pipeline needs
#[derive(Clone)]
pub struct Upstreams {
    pub candidates: Arc<dyn CandidateSource>,
    pub catalog: Arc<dyn LanguageCatalog>,
    pub categories: Arc<dyn CategoryLookup>,
    pub links: Arc<dyn LanguageLinks>,
    pub stats: Arc<dyn PageStatistics>,
    pub lists: Arc<dyn PageLists>,
}

impl Upstreams {
    /// HTTP clients for the tool backend, MediaWiki and XTools
    pub fn from_config(config: &AppConfig) -> SourceResult<Self> {
        let http = HttpSource::from_config(config)?;
        let services = &config.services;

        let backend = Arc::new(ToolBackendClient::new(
            http.clone(),
            services.backend_url.as_str(),
        ));
        let mediawiki = Arc::new(MediaWikiClient::new(
            http.clone(),
            services.mediawiki_api.as_str(),
            config.pipeline.page_limit,
        ));
        let xtools = Arc::new(XToolsClient::new(
            http,
            services.xtools_url.as_str(),
            services.wiki_host.as_str(),
        ));

        info!(
            backend = %services.backend_url,
            mediawiki = %services.mediawiki_api,
            xtools = %services.xtools_url,
            "Upstream clients initialized"
        );

        Ok(Self {
            candidates: backend.clone(),
            catalog: backend.clone(),
            categories: backend,
            links: mediawiki.clone(),
            stats: xtools,
            lists: mediawiki,
        })
    }

    /// One value serving every source, such as `MockWiki`
    pub fn single<S>(source: Arc<S>) -> Self
    where
        S: CandidateSource
            + LanguageCatalog
            + CategoryLookup
            + LanguageLinks
            + PageStatistics
            + PageLists
            + 'static,
    {
        Self {
            candidates: source.clone(),
            catalog: source.clone(),
            categories: source.clone(),
            links: source.clone(),
            stats: source.clone(),
            lists: source,
        }
    }
}
