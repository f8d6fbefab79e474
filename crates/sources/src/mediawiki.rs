//! MediaWiki action API client
//!
//! Uses `action=query` with `formatversion=2`:
//! - `prop=langlinks&lllang=…` for existence checks in a target edition
//! - `prop=langlinks` / `prop=templates` pages, continued via the `continue` object
//!
//! A title with no page in the queried edition comes back flagged `missing`;
//! list requests report it as `SourceError::PageMissing`.

use crate::error::{SourceError, SourceResult};
use crate::http::HttpSource;
use crate::{Continuation, LanguageLinks, ListKind, ListPage, PageLists};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use wikigap_common::LanguageCode;

const SERVICE: &str = "mediawiki";

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
    #[serde(default, rename = "continue")]
    continuation: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<PageEntry>,
}

#[derive(Deserialize)]
struct PageEntry {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    langlinks: Vec<LangLink>,
    #[serde(default)]
    templates: Vec<TemplateEntry>,
}

#[derive(Deserialize)]
struct LangLink {
    lang: String,
}

#[derive(Deserialize)]
struct TemplateEntry {
    title: String,
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

impl QueryResponse {
    fn into_pages(self) -> SourceResult<(Vec<PageEntry>, Option<Continuation>)> {
        if let Some(error) = self.error {
            return Err(SourceError::Decode {
                service: SERVICE,
                message: format!("{}: {}", error.code, error.info),
            });
        }

        let continuation = self.continuation.map(|map| {
            map.into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, value)
                })
                .collect::<Continuation>()
        });

        let pages = self.query.map(|q| q.pages).unwrap_or_default();
        Ok((pages, continuation))
    }
}

/// MediaWiki API client for any language edition
#[derive(Debug, Clone)]
pub struct MediaWikiClient {
    http: HttpSource,
    /// API URL with a `{lang}` placeholder
    api_template: String,
    page_limit: u32,
}

impl MediaWikiClient {
    pub fn new(http: HttpSource, api_template: impl Into<String>, page_limit: u32) -> Self {
        Self {
            http,
            api_template: api_template.into(),
            page_limit,
        }
    }

    fn api_url(&self, lang: &LanguageCode) -> SourceResult<Url> {
        let raw = self.api_template.replace("{lang}", lang.as_str());
        Url::parse(&raw).map_err(|e| SourceError::Request {
            service: SERVICE,
            message: format!("invalid API URL '{}': {}", raw, e),
        })
    }

    async fn query(
        &self,
        lang: &LanguageCode,
        params: &[(String, String)],
    ) -> SourceResult<QueryResponse> {
        let url = self.api_url(lang)?;
        let request = self
            .http
            .get(url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params);
        self.http.send_json(SERVICE, request).await
    }
}

#[async_trait]
impl LanguageLinks for MediaWikiClient {
    #[instrument(
        skip(self, source_lang, target_lang),
        fields(source = %source_lang, target = %target_lang)
    )]
    async fn language_exists(
        &self,
        title: &str,
        source_lang: &LanguageCode,
        target_lang: &LanguageCode,
    ) -> SourceResult<bool> {
        let params = vec![
            ("titles".to_string(), title.to_string()),
            ("prop".to_string(), "langlinks".to_string()),
            ("lllang".to_string(), target_lang.to_string()),
        ];
        let (pages, _) = self.query(source_lang, &params).await?.into_pages()?;

        let exists = pages
            .iter()
            .flat_map(|page| page.langlinks.iter())
            .any(|link| link.lang == target_lang.as_str());
        debug!(exists, "Language link checked");
        Ok(exists)
    }
}

#[async_trait]
impl PageLists for MediaWikiClient {
    async fn list_page(
        &self,
        kind: ListKind,
        title: &str,
        lang: &LanguageCode,
        continuation: Option<&Continuation>,
    ) -> SourceResult<ListPage> {
        let limit_param = match kind {
            ListKind::LangLinks => "lllimit",
            ListKind::Templates => "tllimit",
        };

        let mut params = vec![
            ("titles".to_string(), title.to_string()),
            ("prop".to_string(), kind.as_str().to_string()),
            (limit_param.to_string(), self.page_limit.to_string()),
        ];
        if let Some(continuation) = continuation {
            params.extend(continuation.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let (pages, continuation) = self.query(lang, &params).await?.into_pages()?;
        if pages.iter().any(|page| page.missing) {
            debug!(title, "Page missing from edition");
            return Err(SourceError::PageMissing {
                service: SERVICE,
                title: title.to_string(),
            });
        }

        let items = pages
            .into_iter()
            .flat_map(|page| match kind {
                ListKind::LangLinks => {
                    page.langlinks.into_iter().map(|l| l.lang).collect::<Vec<_>>()
                }
                ListKind::Templates => page.templates.into_iter().map(|t| t.title).collect(),
            })
            .collect();

        Ok(ListPage { items, continuation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> MediaWikiClient {
        let http = HttpSource::new("wikigap-test", Duration::from_secs(2), Duration::from_secs(1))
            .unwrap();
        MediaWikiClient::new(http, format!("{}/{{lang}}/w/api.php", server.uri()), 50)
    }

    fn lang(code: &str) -> LanguageCode {
        LanguageCode::parse(code).unwrap()
    }

    #[tokio::test]
    async fn test_language_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/en/w/api.php"))
            .and(query_param("titles", "Health"))
            .and(query_param("lllang", "he"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "batchcomplete": true,
                "query": {"pages": [{
                    "pageid": 1846, "ns": 0, "title": "Health",
                    "langlinks": [{"lang": "he", "title": "בריאות"}]
                }]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/en/w/api.php"))
            .and(query_param("titles", "Obscure topic"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "batchcomplete": true,
                "query": {"pages": [{"pageid": 77, "ns": 0, "title": "Obscure topic"}]}
            })))
            .mount(&server)
            .await;

        let wiki = client(&server);
        assert!(wiki.language_exists("Health", &lang("en"), &lang("he")).await.unwrap());
        assert!(!wiki.language_exists("Obscure topic", &lang("en"), &lang("he")).await.unwrap());
    }

    #[tokio::test]
    async fn test_api_error_is_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"code": "maxlag", "info": "Waiting for a database server"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .language_exists("Health", &lang("en"), &lang("he"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));
        assert!(err.to_string().contains("maxlag"));
    }

    #[tokio::test]
    async fn test_list_page_carries_continuation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/en/w/api.php"))
            .and(query_param("prop", "langlinks"))
            .and(query_param("lllimit", "50"))
            .and(query_param("llcontinue", "1846|bcl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"pages": [{
                    "pageid": 1846,
                    "langlinks": [{"lang": "bcl", "title": "Salud"}]
                }]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/en/w/api.php"))
            .and(query_param("prop", "langlinks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "continue": {"llcontinue": "1846|bcl", "continue": "||"},
                "query": {"pages": [{"pageid": 1846, "langlinks": [
                    {"lang": "af", "title": "Gesondheid"},
                    {"lang": "als", "title": "Gesundheit"}
                ]}]}
            })))
            .mount(&server)
            .await;

        let wiki = client(&server);
        let first = wiki
            .list_page(ListKind::LangLinks, "Health", &lang("en"), None)
            .await
            .unwrap();
        assert_eq!(first.items, vec!["af", "als"]);
        let continuation = first.continuation.expect("more pages");
        assert_eq!(continuation.get("llcontinue").map(String::as_str), Some("1846|bcl"));

        let second = wiki
            .list_page(ListKind::LangLinks, "Health", &lang("en"), Some(&continuation))
            .await
            .unwrap();
        assert_eq!(second.items, vec!["bcl"]);
        assert!(second.continuation.is_none());
    }

    #[tokio::test]
    async fn test_templates_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/en/w/api.php"))
            .and(query_param("prop", "templates"))
            .and(query_param("tllimit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"pages": [{"pageid": 5, "templates": [
                    {"ns": 10, "title": "Template:Infobox"},
                    {"ns": 10, "title": "Template:Cite web"}
                ]}]}
            })))
            .mount(&server)
            .await;

        let page = client(&server)
            .list_page(ListKind::Templates, "Health", &lang("en"), None)
            .await
            .unwrap();
        assert_eq!(page.items, vec!["Template:Infobox", "Template:Cite web"]);
        assert!(page.continuation.is_none());
    }

    #[tokio::test]
    async fn test_missing_page_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/en/w/api.php"))
            .and(query_param("titles", "Ghost page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "batchcomplete": true,
                "query": {"pages": [{"ns": 0, "title": "Ghost page", "missing": true}]}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .list_page(ListKind::Templates, "Ghost page", &lang("en"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::PageMissing { ref title, .. } if title == "Ghost page"));
    }
}
