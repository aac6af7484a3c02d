//! UTC timestamp formatting shared by the REST and WebSocket layers.
//!
//! All timestamps leave the service as ISO-8601 in UTC with a trailing `Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats `at` as ISO-8601 with microsecond precision and a `Z` suffix.
#[must_use]
pub fn format_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current UTC time, formatted with [`format_iso`].
#[must_use]
pub fn now_iso() -> String {
    format_iso(Utc::now())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_trailing_z() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single();
        let Some(at) = at else {
            panic!("valid date");
        };
        assert_eq!(format_iso(at), "2024-05-01T12:30:00.000000Z");
    }

    #[test]
    fn now_is_utc() {
        assert!(now_iso().ends_with('Z'));
    }
}
