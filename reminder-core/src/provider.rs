use crate::{
    Config,
    error::UpstreamError,
    freshness::BaseTime,
    model::{NewsArticle, RawObservation},
    provider::{kma::KmaProvider, naver::NaverProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};

pub mod kma;
pub mod naver;

/// Upper bound on a single upstream request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Kma,
    Naver,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Kma => "kma",
            ProviderId::Naver => "naver",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Kma, ProviderId::Naver]
    }

    /// Whether the provider authenticates with an id/secret pair rather than a single key.
    pub fn needs_secret(&self) -> bool {
        matches!(self, ProviderId::Naver)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "kma" => Ok(ProviderId::Kma),
            "naver" => Ok(ProviderId::Naver),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: kma, naver."
            )),
        }
    }
}

/// Source of raw short-term forecast observations for one grid cell.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_observations(
        &self,
        base: &BaseTime,
    ) -> Result<Vec<RawObservation>, UpstreamError>;
}

/// Source of news search results, in relevance order.
#[async_trait]
pub trait NewsProvider: Send + Sync + Debug {
    async fn search(&self, query: &str, display: u32) -> Result<Vec<NewsArticle>, UpstreamError>;
}

/// Pooled client shared by every provider.
pub fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(100)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}

/// Construct the forecast provider from config. A missing key is reported on first fetch,
/// so the server can still come up and serve the other endpoints.
pub fn forecast_provider_from_config(config: &Config, http: Client) -> Arc<dyn ForecastProvider> {
    let api_key = config.provider_api_key(ProviderId::Kma).map(str::to_owned);
    Arc::new(KmaProvider::new(http, api_key, &config.forecast))
}

pub fn news_provider_from_config(config: &Config, http: Client) -> Arc<dyn NewsProvider> {
    let credentials = config
        .provider_config(ProviderId::Naver)
        .and_then(|cfg| Some((cfg.api_key.clone(), cfg.secret.clone()?)));
    Arc::new(NaverProvider::new(http, credentials, &config.news))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_parses_case_insensitively() {
        assert_eq!(ProviderId::try_from("NAVER").unwrap(), ProviderId::Naver);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn only_naver_needs_a_secret() {
        assert!(ProviderId::Naver.needs_secret());
        assert!(!ProviderId::Kma.needs_secret());
    }

    #[tokio::test]
    async fn forecast_provider_without_key_fails_before_network() {
        let cfg = Config::default();
        let provider = forecast_provider_from_config(&cfg, http_client().unwrap());
        let base = BaseTime {
            date: "20250101".into(),
            time: "0500".into(),
        };

        let err = provider.fetch_observations(&base).await.unwrap_err();
        assert!(matches!(err, UpstreamError::MissingCredentials(ProviderId::Kma)));
    }

    #[tokio::test]
    async fn news_provider_without_secret_fails_before_network() {
        let mut cfg = Config::default();
        cfg.upsert_provider_credentials(ProviderId::Naver, "id".into(), None);
        let provider = news_provider_from_config(&cfg, http_client().unwrap());

        let err = provider.search("뉴스", 20).await.unwrap_err();
        assert!(matches!(err, UpstreamError::MissingCredentials(ProviderId::Naver)));
    }
}
