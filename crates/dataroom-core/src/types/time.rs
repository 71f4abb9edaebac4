//! Millisecond timestamps.
//!
//! Records carry creation and update times as milliseconds since the Unix
//! epoch so they sort and compare as plain integers in storage.

use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch.
pub type Millis = i64;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> Millis {
    Utc::now().timestamp_millis()
}

/// Convert a millisecond timestamp into a UTC datetime.
///
/// Returns `None` for values outside chrono's representable range.
pub fn to_datetime(millis: Millis) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_datetime() {
        let now = now_millis();
        let dt = to_datetime(now).expect("in range");
        assert_eq!(dt.timestamp_millis(), now);
    }
}
