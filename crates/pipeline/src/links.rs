//! Article links shown next to each ranked result

use reqwest::Url;
use serde::{Deserialize, Serialize};
use wikigap_common::config::ServicesConfig;
use wikigap_common::{AppError, LanguageCode, Result};

/// Where to read an article and where to start translating it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleLinks {
    /// Article in the reference edition
    pub view_url: String,
    /// Edit form for the (not yet existing) page in the target edition
    pub edit_url: String,
}

impl ArticleLinks {
    pub fn new(
        services: &ServicesConfig,
        title: &str,
        reference_lang: &LanguageCode,
        target_lang: &LanguageCode,
    ) -> Result<Self> {
        Ok(Self {
            view_url: view_url(services, title, reference_lang)?,
            edit_url: edit_url(services, title, target_lang)?,
        })
    }
}

fn wiki_root(services: &ServicesConfig, lang: &LanguageCode) -> Result<Url> {
    let host = services.wiki_host_for(lang.as_str());
    Url::parse(&format!("https://{}/", host)).map_err(|e| AppError::Configuration {
        message: format!("invalid wiki host '{}': {}", host, e),
    })
}

/// `https://{lang}.wikipedia.org/wiki/{title}`
pub fn view_url(services: &ServicesConfig, title: &str, lang: &LanguageCode) -> Result<String> {
    let mut url = wiki_root(services, lang)?;
    url.path_segments_mut()
        .map_err(|_| AppError::Configuration {
            message: "wiki URL cannot have a path".to_string(),
        })?
        .pop_if_empty()
        .push("wiki")
        .push(title);
    Ok(url.into())
}

/// `https://{lang}.wikipedia.org/w/index.php?title={title}&action=edit`
pub fn edit_url(services: &ServicesConfig, title: &str, lang: &LanguageCode) -> Result<String> {
    let mut url = wiki_root(services, lang)?;
    url.set_path("/w/index.php");
    url.query_pairs_mut()
        .append_pair("title", title)
        .append_pair("action", "edit");
    Ok(url.into())
}
