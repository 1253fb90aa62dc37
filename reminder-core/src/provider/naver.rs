use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    config::NewsConfig,
    error::{UpstreamError, truncate_body},
    model::NewsArticle,
};

use super::{NewsProvider, ProviderId};

/// Naver news search client.
#[derive(Clone)]
pub struct NaverProvider {
    http: Client,
    credentials: Option<(String, String)>,
    base_url: String,
}

impl std::fmt::Debug for NaverProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaverProvider")
            .field("base_url", &self.base_url)
            .field("configured", &self.credentials.is_some())
            .finish()
    }
}

impl NaverProvider {
    pub fn new(http: Client, credentials: Option<(String, String)>, config: &NewsConfig) -> Self {
        Self {
            http,
            credentials: credentials.filter(|(id, secret)| !id.is_empty() && !secret.is_empty()),
            base_url: config.base_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<NewsArticle>,
}

pub fn parse_search_body(body: &str) -> Result<Vec<NewsArticle>, UpstreamError> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|source| UpstreamError::Decode {
            provider: ProviderId::Naver,
            source,
        })?;

    if parsed.items.is_empty() {
        return Err(UpstreamError::Empty(ProviderId::Naver));
    }
    Ok(parsed.items)
}

#[async_trait]
impl NewsProvider for NaverProvider {
    async fn search(&self, query: &str, display: u32) -> Result<Vec<NewsArticle>, UpstreamError> {
        let (client_id, client_secret) = self
            .credentials
            .as_ref()
            .ok_or(UpstreamError::MissingCredentials(ProviderId::Naver))?;

        let started = Instant::now();
        let display = display.to_string();
        debug!(query, "requesting news search");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("query", query), ("display", display.as_str()), ("sort", "sim")])
            .header("X-Naver-Client-Id", client_id)
            .header("X-Naver-Client-Secret", client_secret)
            .send()
            .await
            .map_err(|source| UpstreamError::Connection {
                provider: ProviderId::Naver,
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| UpstreamError::BodyRead {
            provider: ProviderId::Naver,
            source,
        })?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                provider: ProviderId::Naver,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let articles = parse_search_body(&body)?;
        info!(
            count = articles.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "news fetched"
        );
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_items_in_order() {
        let body = r#"{
            "lastBuildDate": "Mon, 01 Jan 2025 09:00:00 +0900",
            "total": 2, "start": 1, "display": 2,
            "items": [
                { "title": "첫 번째", "originallink": "a", "link": "b", "description": "c", "pubDate": "d" },
                { "title": "두 번째", "originallink": "e", "link": "f", "description": "g", "pubDate": "h" }
            ]
        }"#;

        let items = parse_search_body(body).unwrap();
        let titles: Vec<_> = items.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["첫 번째", "두 번째"]);
    }

    #[test]
    fn no_items_is_empty() {
        let err = parse_search_body(r#"{ "items": [] }"#).unwrap_err();
        assert!(matches!(err, UpstreamError::Empty(ProviderId::Naver)));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let provider = NaverProvider::new(
            Client::new(),
            Some(("client-id".into(), "top-secret".into())),
            &NewsConfig::default(),
        );
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("configured: true"));
    }
}
