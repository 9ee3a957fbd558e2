use crate::error::CliError;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Date {
    y: i32,
    m: u32,
    d: u32,
}

fn is_valid_date(y: i32, m: u32, d: u32) -> bool {
    if !(1..=12).contains(&m) {
        return false;
    }
    if d < 1 {
        return false;
    }

    let dim = match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            let leap = (y % 4 == 0 && y % 100 != 0) || (y % 400 == 0);
            if leap { 29 } else { 28 }
        }
        _ => return false,
    };

    d <= dim
}

// Howard Hinnant's algorithm: days since 1970-01-01 (Unix epoch)
fn days_from_civil(mut y: i32, m: u32, d: u32) -> i32 {
    let m = m as i32;
    let d = d as i32;
    y -= if m <= 2 { 1 } else { 0 };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = m + if m > 2 { -3 } else { 9 };
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe - 719468
}

fn civil_from_days(z: i32) -> Date {
    let z = z + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let mut y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let d = doy - (153 * mp + 2) / 5 + 1; // [1, 31]
    let m = mp + if mp < 10 { 3 } else { -9 }; // [1, 12]
    y += if m <= 2 { 1 } else { 0 };

    Date {
        y,
        m: m as u32,
        d: d as u32,
    }
}

fn fmt_date(dt: Date) -> String {
    format!("{:04}-{:02}-{:02}", dt.y, dt.m, dt.d)
}

fn parse_date(s: &str, label: &str) -> Result<Date, CliError> {
    let ss = s.trim();
    if ss.len() != 10 {
        return Err(CliError::usage(format!("Invalid {}: {}", label, s)));
    }
    let bytes = ss.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(CliError::usage(format!("Invalid {}: {}", label, s)));
    }

    let y: i32 = ss[0..4]
        .parse()
        .map_err(|_| CliError::usage(format!("Invalid {}: {}", label, s)))?;
    let m: u32 = ss[5..7]
        .parse()
        .map_err(|_| CliError::usage(format!("Invalid {}: {}", label, s)))?;
    let d: u32 = ss[8..10]
        .parse()
        .map_err(|_| CliError::usage(format!("Invalid {}: {}", label, s)))?;

    if !is_valid_date(y, m, d) {
        return Err(CliError::usage(format!("Invalid {}: {}", label, s)));
    }

    Ok(Date { y, m, d })
}

pub fn parse_date_string(s: &str, label: &str) -> Result<(), CliError> {
    let _ = parse_date(s, label)?;
    Ok(())
}

/// Days since the Unix epoch for a calendar date. The basis for all
/// day-counter arithmetic: two dates one midnight apart always differ by
/// exactly 1, regardless of the time of day anything happened.
pub fn day_number(date: &str) -> Result<i32, CliError> {
    let dt = parse_date(date, "date")?;
    Ok(days_from_civil(dt.y, dt.m, dt.d))
}

/// Whole calendar days from `from` to `to` (negative if `to` is earlier).
pub fn days_between(from: &str, to: &str) -> Result<i32, CliError> {
    Ok(day_number(to)? - day_number(from)?)
}

pub fn add_days(date: &str, delta_days: i32) -> Result<String, CliError> {
    let dt = parse_date(date, "date")?;
    let days = days_from_civil(dt.y, dt.m, dt.d);
    Ok(fmt_date(civil_from_days(days + delta_days)))
}

/// `YYYYMMDD`, used inside deterministic event ids.
pub fn compact_date(date: &str) -> String {
    date.replace('-', "")
}

pub fn system_today_utc() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let days = (secs / 86_400) as i32;
    fmt_date(civil_from_days(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_parse_validation() {
        assert!(parse_date_string("2026-01-31", "today").is_ok());
        assert!(parse_date_string("2026-02-29", "today").is_err());
        assert!(parse_date_string("2024-02-29", "today").is_ok());
        assert!(parse_date_string("2026-13-01", "today").is_err());
    }

    #[test]
    fn day_arithmetic_crosses_month_and_year_boundaries() {
        assert_eq!(days_between("2026-01-31", "2026-02-01").unwrap(), 1);
        assert_eq!(days_between("2025-12-31", "2026-01-01").unwrap(), 1);
        assert_eq!(days_between("2026-02-01", "2026-01-31").unwrap(), -1);
        assert_eq!(add_days("2026-01-31", 1).unwrap(), "2026-02-01");
        assert_eq!(add_days("2024-02-28", 1).unwrap(), "2024-02-29");
    }

    #[test]
    fn compact_date_strips_dashes() {
        assert_eq!(compact_date("2026-01-31"), "20260131");
    }
}
