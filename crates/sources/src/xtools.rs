//! XTools page statistics client
//!
//! `GET {base}/{pageinfo|prose|links}/{lang}.wikipedia.org/{title}`

use crate::error::{SourceError, SourceResult};
use crate::http::{join_segments, lenient_count, HttpSource};
use crate::{LinkInfo, PageInfo, PageStatistics, ProseInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use wikigap_common::LanguageCode;

const SERVICE: &str = "xtools";

#[derive(Deserialize)]
struct PageInfoResponse {
    #[serde(default, deserialize_with = "lenient_count")]
    pageviews: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    revisions: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    editors: Option<u64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    secs_since_last_edit: Option<u64>,
}

#[derive(Deserialize)]
struct ProseResponse {
    #[serde(default, deserialize_with = "lenient_count")]
    references: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    words: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    bytes: Option<u64>,
}

#[derive(Deserialize)]
struct LinksResponse {
    #[serde(default, deserialize_with = "lenient_count")]
    links_in: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    links_ext_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    links_out: Option<u64>,
}

/// XTools client
#[derive(Debug, Clone)]
pub struct XToolsClient {
    http: HttpSource,
    base_url: String,
    /// Wiki host with a `{lang}` placeholder
    wiki_host: String,
}

impl XToolsClient {
    pub fn new(
        http: HttpSource,
        base_url: impl Into<String>,
        wiki_host: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            wiki_host: wiki_host.into(),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        title: &str,
        lang: &LanguageCode,
    ) -> SourceResult<T> {
        let host = self.wiki_host.replace("{lang}", lang.as_str());
        let url = join_segments(SERVICE, &self.base_url, &[endpoint, host.as_str(), title], false)?;

        // XTools reports unknown pages and rate limiting as `{"error": ...}`
        let body: Value = self.http.send_json(SERVICE, self.http.get(url)).await?;
        if let Some(error) = body.get("error") {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(SourceError::Decode {
                service: SERVICE,
                message,
            });
        }

        serde_json::from_value(body).map_err(|e| SourceError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl PageStatistics for XToolsClient {
    #[instrument(skip(self, lang), fields(lang = %lang))]
    async fn page_info(&self, title: &str, lang: &LanguageCode) -> SourceResult<PageInfo> {
        let response: PageInfoResponse = self.fetch("pageinfo", title, lang).await?;
        Ok(PageInfo {
            views: response.pageviews,
            edit_count: response.revisions,
            editor_count: response.editors,
            created_at: parse_timestamp(response.created_at.as_deref()),
            secs_since_last_edit: response.secs_since_last_edit,
        })
    }

    #[instrument(skip(self, lang), fields(lang = %lang))]
    async fn prose_info(&self, title: &str, lang: &LanguageCode) -> SourceResult<ProseInfo> {
        let response: ProseResponse = self.fetch("prose", title, lang).await?;
        Ok(ProseInfo {
            references: response.references,
            words: response.words,
            bytes: response.bytes,
        })
    }

    #[instrument(skip(self, lang), fields(lang = %lang))]
    async fn link_info(&self, title: &str, lang: &LanguageCode) -> SourceResult<LinkInfo> {
        let response: LinksResponse = self.fetch("links", title, lang).await?;
        Ok(LinkInfo {
            in_links: response.links_in,
            external_links: response.links_ext_count,
            out_links: response.links_out,
        })
    }
}
