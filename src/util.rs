use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Resolve a backend date string to a calendar day, ignoring time-of-day.
///
/// The backend serves two shapes: a bare `YYYY-MM-DD` (a calendar day as
/// written) and a full ISO 8601 timestamp (resolved to the wall-clock day
/// carried by the stamp). Returns `None` for anything else; callers treat
/// that as "excluded from date views", never as an error.
pub fn resolve_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(day);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    // Timestamps without an offset, in both T-separated and space-separated form
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|dt| dt.date())
        .ok()
}

/// Parse a backend date string into an instant for ordering purposes.
///
/// Bare dates count as midnight UTC; offset-free timestamps are assumed
/// UTC. Returns `None` for unparseable strings so the sort stage can
/// order them after parseable ones instead of guessing.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
    {
        return Some(dt.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Normalize a free-text search query for case-insensitive matching.
///
/// Whitespace-only input means "no search" and returns `None`.
pub fn normalize_search(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
