use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use serde_json::Value;

/// India Standard Time, UTC+05:30. All reporting windows are computed on this wall clock.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Local date-time layouts without an offset, read as IST wall clock.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn to_ist(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&ist())
}

/// Resolve an `order_on` value to an IST instant.
///
/// Accepted forms:
/// - RFC 3339 strings with an offset or `Z`
/// - ISO date-times without offset (treated as IST wall clock)
/// - bare `YYYY-MM-DD` dates (midnight UTC)
/// - integers, as epoch milliseconds
///
/// Anything else yields `None`.
pub fn parse_order_timestamp(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            })?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(|dt| dt.with_timezone(&ist()))
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&ist()));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&ist()));
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return ist().from_local_datetime(&naive).single();
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(midnight.with_timezone(&ist()))
}

/// The same wall-clock instant one calendar year earlier.
///
/// 29 February rolls over to 1 March of the prior year.
pub fn one_year_earlier(at: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let local = at.naive_local();
    let year = local.year() - 1;
    let shifted = local.with_year(year).or_else(|| {
        NaiveDate::from_ymd_opt(year, 3, 1).map(|date| date.and_time(local.time()))
    });

    shifted
        .and_then(|naive| at.offset().from_local_datetime(&naive).single())
        .unwrap_or_else(|| at - Duration::days(365))
}
