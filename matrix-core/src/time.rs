//! Time utilities: timezone-aware deadlines and remaining-time labels.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub fn parse_tz(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Parse a deadline like "2026-02-20 23:59" in an IANA tz like "America/Chicago",
/// returning UTC.
pub fn parse_local_deadline_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let tz = parse_tz(tz)?;
    let ndt = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?;
    local_to_utc(ndt, tz)
}

/// Local datetime layouts accepted without an offset, tried in order.
const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Accepts RFC 3339, an offset-less ISO 8601 datetime (`T` or space
/// separated, read in `tz`) or a bare "YYYY-MM-DD" (local midnight).
pub fn parse_deadline(raw: &str, tz: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let zone = parse_tz(tz)?;
    if raw.len() > 10 {
        let ndt = LOCAL_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| anyhow::anyhow!("invalid deadline '{raw}'"))?;
        return local_to_utc(ndt, zone);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid deadline '{raw}': {e}"))?;
    local_to_utc(date.and_time(chrono::NaiveTime::MIN), zone)
}

fn local_to_utc(ndt: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {ndt} {tz}"))?;
    Ok(local_dt.with_timezone(&Utc))
}

/// Short label for time left: "0h" once past, whole days when at least one
/// day is left, otherwise whole hours.
pub fn format_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = deadline - now;
    if left.num_milliseconds() < 0 {
        return "0h".to_string();
    }
    let hours = left.num_hours();
    let days = hours / 24;
    if days > 0 {
        format!("{days}d")
    } else {
        format!("{hours}h")
    }
}
