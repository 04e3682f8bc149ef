use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::Result;

/// Fixed-width RFC 3339 text (microseconds, `Z` suffix).
///
/// Every stored timestamp has the same width, so text order is time order.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}
