//! Cached weather and news feeds.
//!
//! A feed owns its cache slot and provider. Reads go through the cache; a miss loads from
//! the provider and stores the transformed result. The weather feed additionally schedules
//! a detached refresh when a hit lands close to expiry, so the first request after a new
//! forecast batch does not pay for the upstream round trip.

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    cache::ResponseCache,
    config::{ForecastConfig, NewsConfig},
    error::UpstreamError,
    freshness::{BaseTime, FreshnessPolicy},
    model::{ForecastRecord, NewsArticle},
    provider::{ForecastProvider, NewsProvider},
    transform::{group_observations, group_observations_chunked, unique_articles},
};

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    /// Hits with less than this left before expiry schedule a refresh.
    pub threshold: Duration,
    /// Delay past the expiry before the refresh runs.
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct WeatherFeed {
    provider: Arc<dyn ForecastProvider>,
    cache: Arc<ResponseCache<ForecastRecord>>,
    publish_margin: Duration,
    refresh: RefreshPolicy,
    chunk_size: usize,
    // Expiry the pending background refresh was scheduled for, if any.
    scheduled_for: Arc<Mutex<Option<NaiveDateTime>>>,
}

impl WeatherFeed {
    pub fn new(provider: Arc<dyn ForecastProvider>, config: &ForecastConfig) -> Self {
        let publish_margin = Duration::minutes(config.publish_margin_minutes);
        Self {
            provider,
            cache: Arc::new(ResponseCache::new(
                "weather",
                FreshnessPolicy::PublicationSchedule {
                    margin: publish_margin,
                },
            )),
            publish_margin,
            refresh: RefreshPolicy {
                threshold: Duration::minutes(config.refresh_threshold_minutes),
                delay: Duration::minutes(config.refresh_delay_minutes),
            },
            chunk_size: config.group_chunk_size,
            scheduled_for: Arc::new(Mutex::new(None)),
        }
    }

    pub fn cache(&self) -> &ResponseCache<ForecastRecord> {
        &self.cache
    }

    pub async fn records(&self) -> Result<Arc<[ForecastRecord]>, UpstreamError> {
        self.records_at(local_now()).await
    }

    /// All forecast records, served from cache while fresh. Order is unspecified.
    pub async fn records_at(
        &self,
        now: NaiveDateTime,
    ) -> Result<Arc<[ForecastRecord]>, UpstreamError> {
        if let Some(data) = self.cache.get_at(now).await {
            debug!("serving cached forecast");
            self.maybe_schedule_refresh(now).await;
            return Ok(data);
        }

        self.cache
            .get_or_load_at(now, || self.load(now))
            .await
            .inspect_err(|err| error!(error = %err, "forecast refresh failed"))
    }

    async fn load(&self, now: NaiveDateTime) -> Result<Vec<ForecastRecord>, UpstreamError> {
        let base = BaseTime::latest(now, self.publish_margin);
        let raw = self.provider.fetch_observations(&base).await?;
        let records = if raw.len() <= self.chunk_size {
            group_observations(&raw)
        } else {
            let chunk_size = self.chunk_size;
            tokio::task::spawn_blocking(move || group_observations_chunked(&raw, chunk_size))
                .await?
        };
        info!(
            base_date = %base.date,
            base_time = %base.time,
            records = records.len(),
            "forecast grouped"
        );
        Ok(records)
    }

    async fn maybe_schedule_refresh(&self, now: NaiveDateTime) {
        let Some(expires_at) = self.cache.expires_at().await else {
            return;
        };
        if expires_at - now >= self.refresh.threshold {
            return;
        }

        {
            let mut scheduled = self.scheduled_for.lock().await;
            if *scheduled == Some(expires_at) {
                return;
            }
            *scheduled = Some(expires_at);
        }

        let run_at = expires_at + self.refresh.delay;
        let wait = (run_at - now).to_std().unwrap_or_default();
        info!(%run_at, "scheduling background forecast refresh");

        let feed = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            // Evaluated at `run_at`: an entry reloaded by a request in the meantime is a hit.
            match feed.cache.get_or_load_at(run_at, || feed.load(run_at)).await {
                Ok(_) => {
                    let expires_at = feed.cache.expires_at().await;
                    info!(?expires_at, "background forecast refresh done");
                }
                Err(err) => warn!(error = %err, "background forecast refresh failed"),
            }
        });
    }
}

#[derive(Debug, Clone)]
pub struct NewsFeed {
    provider: Arc<dyn NewsProvider>,
    cache: Arc<ResponseCache<NewsArticle>>,
    query: String,
    display: u32,
    keep: usize,
}

impl NewsFeed {
    pub fn new(provider: Arc<dyn NewsProvider>, config: &NewsConfig) -> Self {
        Self {
            provider,
            cache: Arc::new(ResponseCache::new(
                "news",
                FreshnessPolicy::Ttl(Duration::minutes(config.ttl_minutes)),
            )),
            query: config.query.clone(),
            display: config.display,
            keep: config.keep,
        }
    }

    pub fn cache(&self) -> &ResponseCache<NewsArticle> {
        &self.cache
    }

    pub async fn articles(&self) -> Result<Arc<[NewsArticle]>, UpstreamError> {
        self.articles_at(local_now()).await
    }

    /// Top deduplicated articles in relevance order.
    pub async fn articles_at(&self, now: NaiveDateTime) -> Result<Arc<[NewsArticle]>, UpstreamError> {
        self.cache
            .get_or_load_at(now, || async {
                let items = self.provider.search(&self.query, self.display).await?;
                Ok::<_, UpstreamError>(unique_articles(items, self.keep))
            })
            .await
            .inspect_err(|err| error!(error = %err, "news refresh failed"))
    }
}
