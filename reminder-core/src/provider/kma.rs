use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    config::ForecastConfig,
    error::{UpstreamError, truncate_body},
    freshness::BaseTime,
    model::RawObservation,
};

use super::{ForecastProvider, ProviderId};

/// Short-term ("village") forecast client for the Korea Meteorological Administration API hub.
#[derive(Debug, Clone)]
pub struct KmaProvider {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    nx: u32,
    ny: u32,
    rows: u32,
}

impl KmaProvider {
    pub fn new(http: Client, api_key: Option<String>, config: &ForecastConfig) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: config.base_url.clone(),
            nx: config.nx,
            ny: config.ny,
            rows: config.rows,
        }
    }
}

#[derive(Debug, Deserialize)]
struct KmaEnvelope {
    response: KmaResponse,
}

#[derive(Debug, Deserialize)]
struct KmaResponse {
    header: KmaHeader,
    #[serde(default)]
    body: Option<KmaBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KmaHeader {
    result_code: String,
    #[serde(default)]
    result_msg: String,
}

#[derive(Debug, Deserialize)]
struct KmaBody {
    items: KmaItems,
}

#[derive(Debug, Deserialize)]
struct KmaItems {
    #[serde(default)]
    item: Vec<KmaItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KmaItem {
    category: String,
    fcst_date: String,
    fcst_time: String,
    fcst_value: String,
}

/// Decode a forecast response body into raw observations.
///
/// A response without items (including error envelopes that carry no body) is
/// [`UpstreamError::Empty`], never an empty success.
pub fn parse_forecast_body(body: &str) -> Result<Vec<RawObservation>, UpstreamError> {
    let envelope: KmaEnvelope =
        serde_json::from_str(body).map_err(|source| UpstreamError::Decode {
            provider: ProviderId::Kma,
            source,
        })?;

    let header = envelope.response.header;
    let items = envelope
        .response
        .body
        .map(|b| b.items.item)
        .unwrap_or_default();

    if items.is_empty() {
        warn!(
            code = %header.result_code,
            reason = %header.result_msg,
            "forecast response carried no items"
        );
        return Err(UpstreamError::Empty(ProviderId::Kma));
    }

    Ok(items
        .into_iter()
        .map(|item| RawObservation {
            date: item.fcst_date,
            time: item.fcst_time,
            category: item.category,
            value: item.fcst_value,
        })
        .collect())
}

#[async_trait]
impl ForecastProvider for KmaProvider {
    async fn fetch_observations(
        &self,
        base: &BaseTime,
    ) -> Result<Vec<RawObservation>, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredentials(ProviderId::Kma))?;

        let started = Instant::now();
        let rows = self.rows.to_string();
        let nx = self.nx.to_string();
        let ny = self.ny.to_string();

        debug!(base_date = %base.date, base_time = %base.time, "requesting forecast");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("pageNo", "1"),
                ("numOfRows", rows.as_str()),
                ("dataType", "JSON"),
                ("base_date", base.date.as_str()),
                ("base_time", base.time.as_str()),
                ("nx", nx.as_str()),
                ("ny", ny.as_str()),
                ("authKey", api_key),
            ])
            .send()
            .await
            .map_err(|source| UpstreamError::Connection {
                provider: ProviderId::Kma,
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| UpstreamError::BodyRead {
            provider: ProviderId::Kma,
            source,
        })?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                provider: ProviderId::Kma,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let observations = parse_forecast_body(&body).inspect_err(|err| {
            if matches!(err, UpstreamError::Decode { .. }) {
                warn!(body = %truncate_body(&body), "could not decode forecast response");
            }
        })?;

        info!(
            count = observations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "forecast fetched"
        );
        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "response": {
            "header": { "resultCode": "00", "resultMsg": "NORMAL_SERVICE" },
            "body": {
                "dataType": "JSON",
                "items": { "item": [
                    { "baseDate": "20250101", "baseTime": "0500", "category": "TMP",
                      "fcstDate": "20250101", "fcstTime": "0600", "fcstValue": "-3", "nx": 77, "ny": 131 },
                    { "baseDate": "20250101", "baseTime": "0500", "category": "SKY",
                      "fcstDate": "20250101", "fcstTime": "0600", "fcstValue": "1", "nx": 77, "ny": 131 }
                ] },
                "pageNo": 1, "numOfRows": 900, "totalCount": 2
            }
        }
    }"#;

    #[test]
    fn parses_items_into_observations() {
        let obs = parse_forecast_body(SAMPLE).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(
            obs[0],
            RawObservation {
                date: "20250101".into(),
                time: "0600".into(),
                category: "TMP".into(),
                value: "-3".into(),
            }
        );
    }

    #[test]
    fn error_envelope_without_body_is_empty() {
        let body = r#"{ "response": { "header": { "resultCode": "03", "resultMsg": "NO_DATA" } } }"#;
        let err = parse_forecast_body(body).unwrap_err();
        assert!(matches!(err, UpstreamError::Empty(ProviderId::Kma)));
    }

    #[test]
    fn zero_items_is_empty_not_success() {
        let body = r#"{ "response": { "header": { "resultCode": "00" },
            "body": { "items": { "item": [] } } } }"#;
        assert!(matches!(
            parse_forecast_body(body),
            Err(UpstreamError::Empty(_))
        ));
    }

    #[test]
    fn non_json_is_a_decode_error() {
        let err = parse_forecast_body("<OpenAPI_ServiceResponse>").unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { .. }));
    }
}
