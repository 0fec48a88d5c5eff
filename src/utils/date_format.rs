use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Layouts the detection services have been seen to emit for naive local times
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

pub fn parse_timezone(name: &str) -> Result<Tz> {
    Tz::from_str(name).map_err(|e| anyhow!("Invalid timezone '{}': {}", name, e))
}

fn localize(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a detection timestamp. Strings without an offset are taken as
/// local time in `tz`. Returns `None` for clock-only values like "14:35:12".
pub fn parse_event_timestamp(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Flask's default JSON date encoding
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return localize(tz, &naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return localize(tz, &date.and_time(NaiveTime::MIN));
    }
    if let Ok(epoch) = raw.parse::<f64>() {
        // Epoch values above 1e12 are milliseconds
        let millis = if epoch > 1e12 { epoch } else { epoch * 1000.0 };
        return DateTime::from_timestamp_millis(millis as i64);
    }
    None
}

/// Parse a `--since`/`--until` bound: `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`.
/// A bare date starts at 00:00 or, for an end bound, runs to 23:59:59.
pub fn parse_range_bound(raw: &str, tz: &Tz, end_of_day: bool) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    let naive = if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        dt
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        dt
    } else {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| anyhow!("Invalid date '{}'. Use YYYY-MM-DD or 'YYYY-MM-DD HH:MM'", raw))?;
        let time = if end_of_day {
            NaiveTime::from_hms_opt(23, 59, 59)
        } else {
            NaiveTime::from_hms_opt(0, 0, 0)
        }
        .ok_or_else(|| anyhow!("Invalid time of day"))?;
        date.and_time(time)
    };

    localize(tz, &naive).ok_or_else(|| anyhow!("'{}' does not exist in timezone {}", raw, tz))
}

/// Inclusive time window; an open end matches everything on that side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn parse(since: Option<&str>, until: Option<&str>, tz: &Tz) -> Result<Self> {
        let since = since.map(|s| parse_range_bound(s, tz, false)).transpose()?;
        let until = until.map(|s| parse_range_bound(s, tz, true)).transpose()?;
        if let (Some(start), Some(end)) = (since, until) {
            if start > end {
                anyhow::bail!("--since must not be after --until");
            }
        }
        Ok(Self { since, until })
    }

    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since.is_none_or(|s| at >= s) && self.until.is_none_or(|u| at <= u)
    }
}

/// "HH:MM:SS" in the given timezone, as shown next to live detections
pub fn format_clock(at: DateTime<Utc>, tz: &Tz) -> String {
    at.with_timezone(tz).format("%H:%M:%S").to_string()
}

pub fn format_local(at: DateTime<Utc>, tz: &Tz) -> String {
    at.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render a service timestamp in `tz` when it parses, otherwise verbatim
pub fn display_timestamp(raw: &str, tz: &Tz) -> String {
    match parse_event_timestamp(raw, tz) {
        Some(at) => format_local(at, tz),
        None if raw.trim().is_empty() => "N/A".to_string(),
        None => raw.to_string(),
    }
}
