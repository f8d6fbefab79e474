//! Shared HTTP plumbing for upstream clients

use crate::error::{SourceError, SourceResult};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use wikigap_common::AppConfig;

/// HTTP client plus the per-call timeout it enforces
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    timeout: Duration,
}

impl HttpSource {
    /// Build a client from configuration
    pub fn from_config(config: &AppConfig) -> SourceResult<Self> {
        Self::new(
            &config.services.user_agent,
            config.call_timeout(),
            config.connect_timeout(),
        )
    }

    pub fn new(
        user_agent: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> SourceResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| SourceError::Request {
                service: "http_client",
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url)
    }

    /// Send a request and decode a JSON body, mapping failures per service
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> SourceResult<T> {
        let response = request.send().await.map_err(|e| self.classify(service, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(service, status = status.as_u16(), "Upstream returned error status");
            return Err(SourceError::Status {
                service,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(service, e))?;
        serde_json::from_slice(&bytes).map_err(|e| SourceError::Decode {
            service,
            message: e.to_string(),
        })
    }

    fn classify(&self, service: &'static str, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout {
                service,
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            SourceError::Request {
                service,
                message: err.to_string(),
            }
        }
    }
}

/// Parse a base URL and append path segments, percent-encoding each one
pub(crate) fn join_segments(
    service: &'static str,
    base: &str,
    segments: &[&str],
    trailing_slash: bool,
) -> SourceResult<Url> {
    let mut url = Url::parse(base).map_err(|e| SourceError::Request {
        service,
        message: format!("invalid base URL '{}': {}", base, e),
    })?;

    {
        let mut path = url.path_segments_mut().map_err(|_| SourceError::Request {
            service,
            message: format!("base URL '{}' cannot have path segments", base),
        })?;
        path.pop_if_empty().extend(segments);
        if trailing_slash {
            path.push("");
        }
    }

    Ok(url)
}

/// Accept a count as number, numeric string or null; anything else is absent
pub(crate) fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Counts {
        #[serde(default, deserialize_with = "lenient_count")]
        a: Option<u64>,
        #[serde(default, deserialize_with = "lenient_count")]
        b: Option<u64>,
        #[serde(default, deserialize_with = "lenient_count")]
        c: Option<u64>,
        #[serde(default, deserialize_with = "lenient_count")]
        d: Option<u64>,
    }

    #[test]
    fn test_lenient_count() {
        let counts: Counts = serde_json::from_str(r#"{"a": 12, "b": "7", "c": null}"#).unwrap();
        assert_eq!(counts.a, Some(12));
        assert_eq!(counts.b, Some(7));
        assert_eq!(counts.c, None);
        assert_eq!(counts.d, None);
    }

    #[test]
    fn test_join_segments_encodes_titles() {
        let url = join_segments(
            "xtools",
            "https://xtools.wmcloud.org/api/page",
            &["pageinfo", "en.wikipedia.org", "AC/DC (band)"],
            false,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://xtools.wmcloud.org/api/page/pageinfo/en.wikipedia.org/AC%2FDC%20(band)"
        );

        let url = join_segments("backend", "http://localhost:8000/", &["api", "x"], true).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/x/");
    }
}
