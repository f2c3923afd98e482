use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::time::SystemTime;

/// Parse an absolute or relative date: RFC 3339, `YYYY-MM-DD`, a
/// humantime duration such as `90days` (meaning that long ago), or
/// `N days/weeks/months ago`.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Some(dt) = parse_absolute_date(input) {
        return Some(dt);
    }

    let duration = parse_ago(input).or_else(|| humantime::parse_duration(input).ok())?;
    SystemTime::now()
        .checked_sub(duration)
        .map(DateTime::<Utc>::from)
}

pub fn parse_absolute_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

fn parse_ago(input: &str) -> Option<std::time::Duration> {
    let spec = input.to_lowercase();
    let spec = spec.strip_suffix(" ago")?.replace(' ', "");
    humantime::parse_duration(&spec).ok()
}

/// Four or more hex digits, the shortest abbreviation git accepts.
pub fn looks_like_commit_id(input: &str) -> bool {
    input.len() >= 4 && input.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn short_id(id: &str) -> &str {
    id.get(..10).unwrap_or(id)
}
