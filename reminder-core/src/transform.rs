//! Raw upstream items → display-ready records.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;

use crate::model::{ForecastRecord, NewsArticle, RawObservation};

/// Marker used for sky or precipitation codes missing from the glyph table.
pub const UNKNOWN: &str = "알 수 없음";

/// Precipitation glyph meaning "nothing is falling"; the sky glyph is shown instead.
pub const NO_PRECIPITATION: &str = "none";

/// Sky condition code (`SKY`) → glyph.
pub fn sky_glyph(code: &str) -> &'static str {
    match code {
        "1" => "🌤",
        "3" => "🌥",
        "4" => "☁",
        _ => UNKNOWN,
    }
}

/// Precipitation type code (`PTY`) → glyph.
pub fn precipitation_glyph(code: &str) -> &'static str {
    match code {
        "0" => NO_PRECIPITATION,
        "1" => "🌧",
        "2" => "🌧(비/눈)",
        "3" => "🌨",
        "4" => "🌧(소나기)",
        _ => UNKNOWN,
    }
}

type Slot = (String, String);

fn apply(record: &mut ForecastRecord, obs: &RawObservation) {
    let value = obs.value.as_str();
    match obs.category.as_str() {
        "SKY" => record.sky = Some(sky_glyph(value).to_string()),
        "PTY" => record.precipitation = Some(precipitation_glyph(value).to_string()),
        "TMP" => record.temperature = Some(format!("{value}℃")),
        "POP" => record.precipitation_chance = Some(format!("{value}%")),
        "REH" => record.humidity = Some(format!("{value}%")),
        _ => {}
    }
}

fn fold_into(grouped: &mut HashMap<Slot, ForecastRecord>, obs: &RawObservation) {
    let record = grouped
        .entry((obs.date.clone(), obs.time.clone()))
        .or_insert_with(|| ForecastRecord::new(&obs.date, &obs.time));
    apply(record, obs);
}

/// Fold observations into one record per `(date, time)`. Output order is unspecified.
pub fn group_observations(raw: &[RawObservation]) -> Vec<ForecastRecord> {
    let mut grouped = HashMap::with_capacity(raw.len() / 5 + 1);
    for obs in raw {
        fold_into(&mut grouped, obs);
    }
    grouped.into_values().collect()
}

/// Same result as [`group_observations`], with the input split into `chunk_size` pieces
/// that are folded on the rayon pool and merged afterwards.
pub fn group_observations_chunked(raw: &[RawObservation], chunk_size: usize) -> Vec<ForecastRecord> {
    let chunk_size = chunk_size.max(1);

    raw.par_chunks(chunk_size)
        .map(|chunk| {
            let mut grouped = HashMap::with_capacity(chunk.len() / 5 + 1);
            for obs in chunk {
                fold_into(&mut grouped, obs);
            }
            grouped
        })
        .reduce(HashMap::new, |mut acc, part| {
            for (slot, record) in part {
                match acc.get_mut(&slot) {
                    Some(existing) => existing.absorb(record),
                    None => {
                        acc.insert(slot, record);
                    }
                }
            }
            acc
        })
        .into_values()
        .collect()
}

// Leading "[...]" tag, or any "(...)" group.
static TITLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[.*?\]|\(.*?\)").expect("valid regex"));

/// Strip the bold markup and the few entities the search API emits.
pub fn clean_html(s: &str) -> String {
    s.replace("<b>", "")
        .replace("</b>", "")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Key used to collapse near-duplicate headlines.
pub fn dedup_key(title: &str) -> String {
    let cleaned = clean_html(title);
    TITLE_PREFIX.replace_all(&cleaned, "").trim().to_string()
}

/// Keep the first article for each dedup key, in original order, up to `keep` articles.
pub fn unique_articles(items: Vec<NewsArticle>, keep: usize) -> Vec<NewsArticle> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(keep);

    for item in items {
        if unique.len() >= keep {
            break;
        }
        if seen.insert(dedup_key(&item.title)) {
            unique.push(item);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(date: &str, time: &str, category: &str, value: &str) -> RawObservation {
        RawObservation {
            date: date.into(),
            time: time.into(),
            category: category.into(),
            value: value.into(),
        }
    }

    fn article(title: &str) -> NewsArticle {
        NewsArticle {
            title: title.into(),
            original_link: String::new(),
            link: format!("https://news.example.com/{}", title.len()),
            description: String::new(),
            published_at: String::new(),
        }
    }

    fn sorted(mut records: Vec<ForecastRecord>) -> Vec<ForecastRecord> {
        records.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
        records
    }

    #[test]
    fn observations_sharing_a_slot_merge_into_one_record() {
        let raw = vec![
            obs("20250101", "0900", "TMP", "5"),
            obs("20250101", "0900", "SKY", "3"),
            obs("20250101", "0900", "PTY", "0"),
            obs("20250101", "0900", "POP", "20"),
            obs("20250101", "0900", "REH", "55"),
            obs("20250101", "1000", "TMP", "6"),
            obs("20250101", "0900", "WSD", "1.2"),
        ];

        let records = sorted(group_observations(&raw));
        assert_eq!(records.len(), 2);

        let nine = &records[0];
        assert_eq!(nine.temperature.as_deref(), Some("5℃"));
        assert_eq!(nine.sky.as_deref(), Some("🌥"));
        assert_eq!(nine.precipitation.as_deref(), Some(NO_PRECIPITATION));
        assert_eq!(nine.precipitation_chance.as_deref(), Some("20%"));
        assert_eq!(nine.humidity.as_deref(), Some("55%"));

        let ten = &records[1];
        assert_eq!(ten.temperature.as_deref(), Some("6℃"));
        assert_eq!(ten.sky, None);
        assert_eq!(ten.humidity, None);
    }

    #[test]
    fn unknown_codes_map_to_marker() {
        assert_eq!(sky_glyph("2"), UNKNOWN);
        assert_eq!(precipitation_glyph("9"), UNKNOWN);
        assert_eq!(precipitation_glyph("3"), "🌨");
    }

    #[test]
    fn chunked_grouping_matches_sequential() {
        let mut raw = Vec::new();
        for hour in 0..24 {
            let time = format!("{hour:02}00");
            for (cat, val) in [("TMP", "7"), ("SKY", "1"), ("PTY", "1"), ("POP", "60"), ("REH", "80")] {
                raw.push(obs("20250102", &time, cat, val));
            }
        }

        // Chunk size 3 splits most slots across chunk boundaries.
        let chunked = sorted(group_observations_chunked(&raw, 3));
        let sequential = sorted(group_observations(&raw));
        assert_eq!(chunked, sequential);
        assert_eq!(chunked.len(), 24);
    }

    #[test]
    fn chunked_grouping_tolerates_zero_chunk_size() {
        let raw = vec![obs("20250101", "0000", "TMP", "1")];
        assert_eq!(group_observations_chunked(&raw, 0).len(), 1);
    }

    #[test]
    fn dedup_key_strips_tags_prefix_and_parenthesised_suffix() {
        assert_eq!(dedup_key("[속보] <b>제목</b>(종합)"), "제목");
        assert_eq!(dedup_key("  제목  "), "제목");
        assert_eq!(dedup_key("[속보] 제목(종합)"), dedup_key("제목"));
    }

    #[test]
    fn bracket_prefix_is_only_stripped_at_start() {
        assert_eq!(dedup_key("제목 [단독]"), "제목 [단독]");
    }

    #[test]
    fn clean_html_decodes_known_entities() {
        assert_eq!(clean_html("&quot;a&quot; &lt;b&gt;"), "\"a\" <b>");
    }

    #[test]
    fn unique_articles_keeps_first_occurrence_in_order() {
        let items = vec![
            article("[속보] 금리 동결"),
            article("환율 급등"),
            article("금리 동결"),
            article("(종합) 환율 급등"),
            article("주가 반등"),
        ];

        let titles: Vec<_> = unique_articles(items, 5)
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, ["[속보] 금리 동결", "환율 급등", "주가 반등"]);
    }

    #[test]
    fn unique_articles_stops_at_keep() {
        let items = (0..20).map(|i| article(&format!("기사 {i}"))).collect();
        let kept = unique_articles(items, 5);
        assert_eq!(kept.len(), 5);
        assert_eq!(kept[4].title, "기사 4");
    }

    #[test]
    fn unique_articles_is_idempotent() {
        let items = vec![
            article("<b>뉴스</b> 하나"),
            article("[단독] 뉴스 하나"),
            article("뉴스 둘"),
            article("뉴스 둘 "),
            article("뉴스 셋"),
        ];

        let once = unique_articles(items, 5);
        let twice = unique_articles(once.clone(), 5);
        assert_eq!(once, twice);
    }
}
