use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;

const FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("ordinal regex"));

static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").expect("weekday regex")
});

static LISTING_AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*\+?\s*(d|day|days|h|hr|hrs|hour|hours|m|min|mins|minute|minutes)\b")
        .expect("listing age regex")
});

/// Parses the date formats the boards print. Trailing times are ignored.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL.replace_all(text.trim(), "$1");
    let cleaned = WEEKDAY.replace(&cleaned, "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return None;
    }

    let tokens: Vec<&str> = cleaned.split(' ').collect();
    let mut candidates = vec![cleaned.clone()];
    if tokens.len() > 3 {
        candidates.push(tokens[..3].join(" "));
    }
    if tokens.len() > 1 {
        candidates.push(tokens[0].to_string());
    }
    if let Some((date, _time)) = cleaned.split_once('T') {
        candidates.push(date.to_string());
    }

    candidates.iter().find_map(|candidate| {
        FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
    })
}

/// ISO date when the text parses, otherwise the trimmed text itself.
///
/// A leading "Closing date:" label is dropped first.
pub fn closing_date_or_raw(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let value = match trimmed.split_once(':') {
        Some((label, rest)) if label.to_lowercase().contains("closing date") => rest.trim(),
        _ => trimmed,
    };
    if value.is_empty() {
        return None;
    }
    Some(
        parse_date(value)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| value.to_string()),
    )
}

/// Seek adverts run for 30 days; estimate the closing date from the listing
/// age printed on the card ("3d ago", "5h ago").
pub fn estimate_seek_closing_date(listing_age: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = LISTING_AGE.captures(listing_age)?;
    let amount: u64 = caps[1].parse().ok()?;
    let unit = caps[2].to_lowercase();
    let posted = if unit.starts_with('d') {
        today.checked_sub_days(Days::new(amount))?
    } else {
        today
    };
    posted.checked_add_days(Days::new(30))
}
