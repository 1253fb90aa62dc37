//! Single-slot response cache with a computed expiry.
//!
//! Uses `tokio::sync::RwLock` so many readers can check freshness concurrently while a
//! refresh replaces the whole entry under the write lock.

use std::{future::Future, sync::Arc};

use chrono::NaiveDateTime;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::freshness::FreshnessPolicy;

/// Last stored result and the instant it stops being fresh.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub data: Arc<[T]>,
    /// `None` until the first successful store.
    pub expires_at: Option<NaiveDateTime>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: Arc::from(Vec::new()),
            expires_at: None,
        }
    }
}

#[derive(Debug)]
pub struct ResponseCache<T> {
    name: &'static str,
    policy: FreshnessPolicy,
    entry: RwLock<CacheEntry<T>>,
    // Serialises loads so concurrent misses trigger one upstream call.
    loading: Mutex<()>,
}

impl<T> ResponseCache<T> {
    pub fn new(name: &'static str, policy: FreshnessPolicy) -> Self {
        Self {
            name,
            policy,
            entry: RwLock::new(CacheEntry::default()),
            loading: Mutex::new(()),
        }
    }

    /// Cached data if `now` is strictly before the expiry.
    pub async fn get_at(&self, now: NaiveDateTime) -> Option<Arc<[T]>> {
        let entry = self.entry.read().await;
        match entry.expires_at {
            Some(expires_at) if now < expires_at => Some(Arc::clone(&entry.data)),
            _ => None,
        }
    }

    /// Replace the data wholesale and recompute the expiry from `now`. Returns the new expiry.
    #[cfg(test)]
    pub(crate) async fn set_at(&self, data: Vec<T>, now: NaiveDateTime) -> NaiveDateTime {
        self.store_at(Arc::from(data), now).await
    }

    async fn store_at(&self, data: Arc<[T]>, now: NaiveDateTime) -> NaiveDateTime {
        let expires_at = self.policy.expires_at(now);
        let mut entry = self.entry.write().await;
        entry.data = data;
        entry.expires_at = Some(expires_at);
        expires_at
    }

    pub async fn expires_at(&self) -> Option<NaiveDateTime> {
        self.entry.read().await.expires_at
    }

    /// Whatever was last stored, fresh or not.
    pub async fn last_known(&self) -> Option<Arc<[T]>> {
        let entry = self.entry.read().await;
        entry.expires_at.map(|_| Arc::clone(&entry.data))
    }

    /// Fresh data, or the result of `load` stored under the freshness policy.
    ///
    /// A failed load leaves the previous entry untouched and hands the error back.
    pub async fn get_or_load_at<F, Fut, E>(&self, now: NaiveDateTime, load: F) -> Result<Arc<[T]>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(data) = self.get_at(now).await {
            debug!(cache = self.name, "cache hit");
            return Ok(data);
        }

        let _loading = self.loading.lock().await;

        // Another caller may have refreshed the entry while we waited.
        if let Some(data) = self.get_at(now).await {
            debug!(cache = self.name, "filled by concurrent load");
            return Ok(data);
        }

        let data: Arc<[T]> = Arc::from(load().await?);
        let expires_at = self.store_at(Arc::clone(&data), now).await;
        debug!(cache = self.name, %expires_at, "stored fresh data");
        Ok(data)
    }
}
