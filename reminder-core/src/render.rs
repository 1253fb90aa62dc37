//! HTML fragments swapped into the page by htmx.

use std::{collections::BTreeMap, fmt::Write};

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::{
    model::{ForecastRecord, NewsArticle, Todo},
    transform::{NO_PRECIPITATION, clean_html},
};

/// From this local hour on, the today panel also previews tomorrow's early hours.
pub const PREVIEW_FROM_HOUR: u32 = 20;
/// Last hour (inclusive) shown in tomorrow's early-morning preview.
pub const PREVIEW_UNTIL_HOUR: u32 = 6;
/// Dates shown in the future panel.
pub const FUTURE_DAYS: usize = 2;

const EMPTY_NEWS: &str = "<p>가져온 뉴스가 없습니다.</p>";

/// Chronological order; fixed-width `YYYYMMDD`/`HHMM` strings sort lexicographically.
pub fn sort_records(records: &mut [ForecastRecord]) {
    records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
}

pub fn temperature_class(temperature: Option<&str>) -> &'static str {
    let parsed = temperature
        .map(|t| t.trim_end_matches('℃').trim())
        .and_then(|t| t.parse::<f64>().ok());

    match parsed {
        Some(t) if t <= 10.0 => "temp-cold",
        Some(t) if t <= 20.0 => "temp-cool",
        Some(t) if t <= 30.0 => "temp-warm",
        Some(_) => "temp-hot",
        None => "temp-cold",
    }
}

/// Precipitation glyph when something is falling, otherwise the sky glyph.
fn display_icon(record: &ForecastRecord) -> &str {
    match record.precipitation.as_deref() {
        Some(p) if p != NO_PRECIPITATION => p,
        _ => record.sky.as_deref().unwrap_or_default(),
    }
}

fn format_hour(time: &str) -> String {
    format!("{}시", time.get(..2).unwrap_or(time))
}

fn format_date(date: &str) -> String {
    match (date.get(4..6), date.get(6..8)) {
        (Some(month), Some(day)) => format!("{month}월 {day}일"),
        _ => date.to_string(),
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Today's records plus, late in the evening, tomorrow's 00–06h records.
pub fn select_today(
    records: &[ForecastRecord],
    now: NaiveDateTime,
) -> (Vec<ForecastRecord>, Vec<ForecastRecord>) {
    let today = now.format("%Y%m%d").to_string();
    let mut current: Vec<_> = records.iter().filter(|r| r.date == today).cloned().collect();
    sort_records(&mut current);

    let mut preview = Vec::new();
    if now.hour() >= PREVIEW_FROM_HOUR {
        let tomorrow = (now + Duration::days(1)).format("%Y%m%d").to_string();
        preview = records
            .iter()
            .filter(|r| r.date == tomorrow)
            .filter(|r| r.hour().is_some_and(|h| h <= PREVIEW_UNTIL_HOUR))
            .cloned()
            .collect();
        sort_records(&mut preview);
    }

    (current, preview)
}

/// The first [`FUTURE_DAYS`] dates after today, each with its records in time order.
pub fn select_future(
    records: &[ForecastRecord],
    now: NaiveDateTime,
) -> Vec<(String, Vec<ForecastRecord>)> {
    let today = now.format("%Y%m%d").to_string();
    let mut by_date: BTreeMap<String, Vec<ForecastRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.date != today) {
        by_date
            .entry(record.date.clone())
            .or_default()
            .push(record.clone());
    }

    by_date
        .into_iter()
        .take(FUTURE_DAYS)
        .map(|(date, mut items)| {
            sort_records(&mut items);
            (date, items)
        })
        .collect()
}

fn push_weather_card(out: &mut String, record: &ForecastRecord, with_humidity: bool) {
    let _ = write!(
        out,
        r#"
<div class="weather">
  <p class="sky-status">{icon}</p>
  <p class="temp {class}">{temp}</p>"#,
        icon = display_icon(record),
        class = temperature_class(record.temperature.as_deref()),
        temp = field(&record.temperature),
    );

    if with_humidity {
        let _ = write!(
            out,
            r#"
  <p class="rain-chance">강수확률: {pop}</p>
  <p class="humidity">습도: {reh}</p>"#,
            pop = field(&record.precipitation_chance),
            reh = field(&record.humidity),
        );
    } else {
        let _ = write!(
            out,
            r#"
  <p class="rain-chance">강수: {pop}</p>"#,
            pop = field(&record.precipitation_chance),
        );
    }

    let _ = write!(
        out,
        r#"
  <p class="time">{time}</p>
</div>"#,
        time = format_hour(&record.time),
    );
}

pub fn render_today(today: &[ForecastRecord], tomorrow_preview: &[ForecastRecord]) -> String {
    let mut out = String::from(r#"<div class="weather-grid">"#);

    for record in today {
        push_weather_card(&mut out, record, true);
    }

    if !tomorrow_preview.is_empty() {
        let style = if today.is_empty() {
            ""
        } else {
            r#" style="margin-top: 15px;""#
        };
        let _ = write!(
            out,
            r#"
<h3 class="date-title grid-full-width"{style}>내일 새벽 (1-6시)</h3>"#
        );
        for record in tomorrow_preview {
            push_weather_card(&mut out, record, true);
        }
    }

    out.push_str("</div>");
    out
}

/// First day shows every hour after 05h; later days only even hours.
fn shown_in_future_panel(day_index: usize, record: &ForecastRecord) -> bool {
    match record.hour() {
        Some(hour) if day_index == 0 => hour > 5,
        Some(hour) => hour % 2 == 0,
        None => false,
    }
}

pub fn render_future(days: &[(String, Vec<ForecastRecord>)]) -> String {
    let mut out = String::new();

    for (index, (date, records)) in days.iter().enumerate() {
        let _ = write!(
            out,
            r#"<div class="date-group">
<h3 class="date-title">{}</h3>
<div class="weather-grid">"#,
            format_date(date)
        );
        for record in records.iter().filter(|r| shown_in_future_panel(index, r)) {
            push_weather_card(&mut out, record, false);
        }
        out.push_str("</div></div>");
    }

    out
}

pub fn render_news(articles: &[NewsArticle]) -> String {
    if articles.is_empty() {
        return EMPTY_NEWS.to_string();
    }

    let mut out = String::new();
    for article in articles {
        let _ = write!(
            out,
            r#"<div class="news-item">
  <h4><a href="{link}" target="_blank">{title}</a></h4>
  <p>{description}</p>
</div>"#,
            link = escape_html(&article.link),
            title = clean_html(&article.title),
            description = clean_html(&article.description),
        );
    }
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_todo(todo: &Todo) -> String {
    let id = todo.id;
    let (class, checked) = if todo.completed {
        ("todo-item completed", " checked")
    } else {
        ("todo-item", "")
    };

    format!(
        r##"<li id="todo-{id}" class="{class}" data-id="{id}">
  <input type="checkbox" hx-put="/todo/{id}/toggle" hx-target="#todo-{id}" hx-swap="outerHTML"{checked}>
  <span class="todo-title">{title}</span>
  <button hx-delete="/todo/{id}" hx-target="#todo-{id}" hx-swap="outerHTML">삭제</button>
</li>"##,
        title = escape_html(&todo.title),
    )
}

pub fn render_todos(todos: &[Todo]) -> String {
    todos.iter().map(render_todo).collect::<Vec<_>>().join("\n")
}
