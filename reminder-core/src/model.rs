use serde::{Deserialize, Serialize};

/// One coded fact from the forecast feed, e.g. `TMP = 21` at `20250101 0900`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservation {
    pub date: String,
    pub time: String,
    pub category: String,
    pub value: String,
}

/// Weather summary for a single `(date, time)` slot, folded from several observations.
///
/// Fields stay `None` until the matching category shows up, so a record can be
/// partially populated when upstream omits a category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastRecord {
    /// `YYYYMMDD`
    pub date: String,
    /// `HHMM`
    pub time: String,
    pub sky: Option<String>,
    pub precipitation: Option<String>,
    pub temperature: Option<String>,
    pub precipitation_chance: Option<String>,
    pub humidity: Option<String>,
}

impl ForecastRecord {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            ..Self::default()
        }
    }

    /// Hour of day parsed from the `HHMM` time, if well formed.
    pub fn hour(&self) -> Option<u32> {
        self.time.get(..2).and_then(|h| h.parse().ok())
    }

    /// Fill fields missing here from `other`. Used when partial records for the same
    /// slot are produced independently.
    pub fn absorb(&mut self, other: ForecastRecord) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.sky, other.sky);
        take(&mut self.precipitation, other.precipitation);
        take(&mut self.temperature, other.temperature);
        take(&mut self.precipitation_chance, other.precipitation_chance);
        take(&mut self.humidity, other.humidity);
    }
}

/// A news search hit, as returned by the news search API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "originallink", default)]
    pub original_link: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "pubDate", default)]
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u32,
    pub title: String,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_is_parsed_from_time_prefix() {
        assert_eq!(ForecastRecord::new("20250101", "0900").hour(), Some(9));
        assert_eq!(ForecastRecord::new("20250101", "").hour(), None);
    }

    #[test]
    fn absorb_keeps_existing_fields_when_other_is_empty() {
        let mut a = ForecastRecord::new("20250101", "0900");
        a.temperature = Some("3℃".into());

        let mut b = ForecastRecord::new("20250101", "0900");
        b.humidity = Some("40%".into());

        a.absorb(b);
        assert_eq!(a.temperature.as_deref(), Some("3℃"));
        assert_eq!(a.humidity.as_deref(), Some("40%"));
    }

    #[test]
    fn news_article_decodes_search_api_field_names() {
        let json = r#"{
            "title": "<b>제목</b>",
            "originallink": "https://example.com/a",
            "link": "https://n.news.example.com/a",
            "description": "요약",
            "pubDate": "Mon, 01 Jan 2025 09:00:00 +0900"
        }"#;

        let article: NewsArticle = serde_json::from_str(json).unwrap();
        assert_eq!(article.original_link, "https://example.com/a");
        assert_eq!(article.published_at, "Mon, 01 Jan 2025 09:00:00 +0900");
    }
}
