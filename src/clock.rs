use crate::error::CliError;
use chrono::{Duration as ChronoDuration, Local, SecondsFormat, Utc};
use std::time::Duration;

pub fn validate_rfc3339(ts: &str, label: &str) -> Result<(), CliError> {
    let t = ts.trim();
    if t.is_empty() {
        return Err(CliError::usage(format!("Invalid {}: (empty)", label)));
    }
    chrono::DateTime::parse_from_rfc3339(t)
        .map(|_| ())
        .map_err(|_| CliError::usage(format!("Invalid {}: {}", label, ts)))
}

pub fn system_now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar day of an RFC3339 timestamp (the `YYYY-MM-DD` prefix).
pub fn date_of_ts(ts: &str) -> &str {
    let t = ts.trim();
    if t.len() >= 10 {
        &t[0..10]
    } else {
        t
    }
}

/// Time to sleep until the next local midnight. The `watch` command schedules
/// one wake-up here, then repeats every 24 hours.
pub fn until_next_local_midnight() -> Duration {
    let now = Local::now();
    let tomorrow = (now + ChronoDuration::days(1)).date_naive();
    let midnight = tomorrow.and_hms_opt(0, 0, 0).unwrap_or_default();
    let remaining = midnight - now.naive_local();
    remaining.to_std().unwrap_or(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_validation() {
        assert!(validate_rfc3339("2026-01-31T12:00:00Z", "ts").is_ok());
        assert!(validate_rfc3339("2026-01-31T12:00:00+02:00", "ts").is_ok());
        assert!(validate_rfc3339("2026-01-31", "ts").is_err());
        assert!(validate_rfc3339("", "ts").is_err());
    }

    #[test]
    fn ts_date_prefix() {
        assert_eq!(date_of_ts("2026-01-31T23:59:00Z"), "2026-01-31");
        assert_eq!(date_of_ts(" 2026-01-31T00:00:00Z "), "2026-01-31");
    }

    #[test]
    fn next_midnight_is_at_most_a_day_away() {
        let d = until_next_local_midnight();
        assert!(d <= Duration::from_secs(24 * 60 * 60));
    }
}
