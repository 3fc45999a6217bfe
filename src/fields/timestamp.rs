//! Timestamp extraction.
//!
//! Machine-readable attributes (`datetime`, `data-timestamp`, `title`) always
//! win over human text. Relative text ("2h", "3 days ago", "Mar 5") is
//! resolved against the extraction time and flagged as such, because it is
//! only as precise as its unit.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use dom_query::Selection;

use super::{normalize_text, FieldError, FieldResult, Found};
use crate::dom;
use crate::patterns::{MONTH_DAY, NUMERIC_DATE, RELATIVE_TIME};
use crate::result::TimestampSource;
use crate::selector::SelectorGroup;

/// Attributes carrying machine-readable times, in preference order.
const MACHINE_ATTRS: &[&str] = &["datetime", "data-timestamp", "data-time", "data-utime", "title", "content"];

/// Earliest plausible social media timestamp.
const EARLIEST_YEAR: i32 = 2004;

/// Extract a timestamp under `root`, resolving relative text against `now`.
///
/// Two passes over the candidates: first every machine-readable attribute,
/// then visible text. Dates in the future (beyond one day of clock skew) or
/// before 2004 are rejected.
pub fn extract_timestamp(
    root: &Selection,
    group: &SelectorGroup,
    now: DateTime<Utc>,
) -> FieldResult<(DateTime<Utc>, TimestampSource)> {
    let candidates: Vec<(Selection, &str)> = group
        .selectors
        .iter()
        .filter_map(|selector| dom::try_query(root, selector).map(|m| (m, *selector)))
        .flat_map(|(matched, selector)| dom::each(&matched).map(move |node| (node, selector)).collect::<Vec<_>>())
        .collect();

    if candidates.is_empty() {
        return Err(FieldError::NotFound(group.field));
    }

    for (node, selector) in &candidates {
        for attr in MACHINE_ATTRS {
            let Some(value) = dom::non_empty_attribute(node, attr) else {
                continue;
            };
            if let Some(ts) = parse_machine_timestamp(&value).filter(|ts| is_plausible(*ts, now)) {
                return Ok(Found::new((ts, TimestampSource::Machine), *selector));
            }
        }
    }

    let mut seen_text = None;
    for (node, selector) in &candidates {
        let text = normalize_text(&dom::text_content(node));
        if text.is_empty() {
            continue;
        }
        if let Some(ts) = parse_relative_timestamp(&text, now).filter(|ts| is_plausible(*ts, now)) {
            return Ok(Found::new((ts, TimestampSource::Relative), *selector));
        }
        seen_text.get_or_insert(text);
    }

    Err(FieldError::invalid(
        group.field,
        format!("unparseable date {:?}", seen_text.unwrap_or_default()),
    ))
}

/// Parse a machine-readable timestamp: RFC 3339, ISO-like date-times, plain
/// dates, or Unix epochs in seconds or milliseconds.
///
/// # Example
///
/// ```rust
/// use rs_social_extract::fields::parse_machine_timestamp;
///
/// let ts = parse_machine_timestamp("2024-03-05T14:30:00.000Z").unwrap();
/// assert_eq!(ts.timestamp(), 1_709_649_000);
/// assert_eq!(parse_machine_timestamp("1709649000"), Some(ts));
/// ```
#[must_use]
pub fn parse_machine_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        let n: i64 = raw.parse().ok()?;
        return match raw.len() {
            9 | 10 => Utc.timestamp_opt(n, 0).single(),
            12 | 13 => Utc.timestamp_millis_opt(n).single(),
            _ => None,
        };
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    // "9:41 AM · Mar 5, 2024" tooltips
    if let Some((_, date)) = raw.split_once('·') {
        return parse_month_day(date.trim(), None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Resolve human-readable time text against `now`.
///
/// Handles "now", "yesterday", compact units ("2h", "5m", "3d", "1w"),
/// spelled-out units ("5 minutes ago"), month-day dates ("Mar 5",
/// "March 5, 2024", "5 Mar") and numeric dates ("2024-3-5", "3-5"). Dates
/// without a year take the most recent year that does not put them in the
/// future.
#[must_use]
pub fn parse_relative_timestamp(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = normalize_text(raw).to_lowercase();
    let text = text.trim_start_matches('·').trim();

    match text {
        "now" | "just now" | "moments ago" => return Some(now),
        "yesterday" => return Some(now - Duration::days(1)),
        _ => {}
    }

    if let Some(caps) = RELATIVE_TIME.captures(text) {
        let amount: i64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str();
        let delta = match unit {
            "s" | "sec" | "secs" | "second" | "seconds" => Duration::seconds(amount),
            "m" | "min" | "mins" | "minute" | "minutes" => Duration::minutes(amount),
            "h" | "hr" | "hrs" | "hour" | "hours" => Duration::hours(amount),
            "d" | "day" | "days" => Duration::days(amount),
            "w" | "wk" | "wks" | "week" | "weeks" => Duration::weeks(amount),
            "mo" | "month" | "months" => Duration::days(amount * 30),
            _ => Duration::days(amount * 365),
        };
        return now.checked_sub_signed(delta);
    }

    if let Some(ts) = parse_month_day(text, Some(now)) {
        return Some(ts);
    }

    let caps = NUMERIC_DATE.captures(text)?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;
    match caps.get(1) {
        Some(year) => date_at_midnight(year.as_str().parse().ok()?, month, day),
        None => most_recent(month, day, now),
    }
}

fn parse_month_day(text: &str, now: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    let caps = MONTH_DAY.captures(text)?;
    let (month_name, day, year) = if let Some(m) = caps.get(1) {
        (m.as_str(), caps.get(2)?, caps.get(3))
    } else {
        (caps.get(5)?.as_str(), caps.get(4)?, caps.get(6))
    };
    let month = month_number(month_name)?;
    let day: u32 = day.as_str().parse().ok()?;

    match (year, now) {
        (Some(year), _) => date_at_midnight(year.as_str().parse().ok()?, month, day),
        (None, Some(now)) => most_recent(month, day, now),
        (None, None) => None,
    }
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];
    let lower = name.to_ascii_lowercase();
    let prefix = lower.get(..3)?;
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .and_then(|i| u32::try_from(i + 1).ok())
}

fn date_at_midnight(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

/// The latest occurrence of month/day that is not after `now`.
fn most_recent(month: u32, day: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let this_year = date_at_midnight(now.year(), month, day)?;
    if this_year <= now {
        Some(this_year)
    } else {
        date_at_midnight(now.year() - 1, month, day)
    }
}

fn is_plausible(ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    ts.year() >= EARLIEST_YEAR && ts <= now + Duration::days(1)
}
