//! Message timestamp parsing
//!
//! The API formats every date as RFC 1123 with a numeric zone,
//! e.g. `Thu, 30 Jul 2015 20:12:31 +0000`.

use chrono::{DateTime, FixedOffset, Utc};

/// Parse an API timestamp
pub fn parse(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc2822(value.trim())
}

/// Parse an API timestamp, falling back to the Unix epoch.
///
/// Used for ordering only: empty or malformed values sort first.
pub fn parse_or_epoch(value: &str) -> DateTime<FixedOffset> {
    match parse(value) {
        Ok(ts) => ts,
        Err(e) => {
            if !value.is_empty() {
                tracing::debug!("Unparseable timestamp '{}', using epoch: {}", value, e);
            }
            epoch()
        }
    }
}

/// 1970-01-01T00:00:00+00:00
pub fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}
