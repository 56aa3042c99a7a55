use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Timestamp stamped on new snippets.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn is_expired(created_at: Option<&str>, ttl_seconds: i64) -> bool {
    is_expired_at(created_at, ttl_seconds, Utc::now())
}

/// A non-positive ttl disables expiry. Missing or unparsable timestamps never expire.
pub fn is_expired_at(created_at: Option<&str>, ttl_seconds: i64, now: DateTime<Utc>) -> bool {
    if ttl_seconds <= 0 {
        return false;
    }
    let Some(created) = created_at.and_then(parse_timestamp) else {
        return false;
    };
    (now - created).num_milliseconds() > ttl_seconds.saturating_mul(1000)
}
