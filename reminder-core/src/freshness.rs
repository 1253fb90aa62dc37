//! When cached data stops being fresh.
//!
//! The forecast is republished in batches at fixed local hours, so its expiry is pinned to
//! the next publication slot. News has no batch boundary and simply lives for a TTL.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Local hours at which a new short-term forecast batch is published.
pub const PUBLICATION_HOURS: [u32; 8] = [2, 5, 8, 11, 14, 17, 20, 23];

/// Base date/time parameters identifying a forecast batch (`YYYYMMDD`, `HHMM`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTime {
    pub date: String,
    pub time: String,
}

impl BaseTime {
    /// The latest batch that should be available at `now`, given `margin` of publication lag.
    /// Before the first slot of the day this is the previous day's `2300` batch.
    pub fn latest(now: NaiveDateTime, margin: Duration) -> Self {
        let probe = now - margin;
        let hour = probe.hour();

        match PUBLICATION_HOURS.iter().rev().find(|&&h| h <= hour) {
            Some(h) => Self {
                date: probe.format("%Y%m%d").to_string(),
                time: format!("{h:02}00"),
            },
            None => {
                let yesterday = probe.date() - Duration::days(1);
                Self {
                    date: yesterday.format("%Y%m%d").to_string(),
                    time: "2300".to_string(),
                }
            }
        }
    }
}

/// The next publication instant strictly after the current hour, plus `margin`.
/// Rolls over to the first slot of the following day.
pub fn next_publication(now: NaiveDateTime, margin: Duration) -> NaiveDateTime {
    let hour = now.hour();
    let today = now.date();

    let (date, slot) = match PUBLICATION_HOURS.iter().find(|&&h| hour < h) {
        Some(&h) => (today, h),
        None => (next_day(today), PUBLICATION_HOURS[0]),
    };

    // Slots are compile-time constants below 24.
    let at = NaiveTime::from_hms_opt(slot, 0, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(at) + margin
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessPolicy {
    /// Expire at the next forecast publication slot plus the given lag.
    PublicationSchedule { margin: Duration },
    /// Expire a fixed time after the data was stored.
    Ttl(Duration),
}

impl FreshnessPolicy {
    pub fn expires_at(&self, stored_at: NaiveDateTime) -> NaiveDateTime {
        match *self {
            FreshnessPolicy::PublicationSchedule { margin } => next_publication(stored_at, margin),
            FreshnessPolicy::Ttl(ttl) => stored_at + ttl,
        }
    }
}
