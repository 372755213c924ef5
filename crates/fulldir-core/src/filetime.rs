//! FILETIME conversion
//!
//! A FILETIME counts 100-nanosecond ticks since 1601-01-01. Dumps are
//! rendered against a 12:00 (noon) reference instant rather than midnight,
//! which keeps reports comparable with those produced by earlier tooling.

use chrono::format::{Item, StrftimeItems};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt::Write;

use crate::error::{ParseError, Result};

pub const FILETIME_TICKS_PER_SECOND: u64 = 10_000_000;
const TICKS_PER_MICROSECOND: u64 = 10;
const NANOS_PER_TICK: i64 = 100;

/// Reference instant for tick zero: 1601-01-01 12:00:00
pub fn filetime_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1601, 1, 1)?.and_hms_opt(12, 0, 0)
}

/// Convert a tick count into a calendar timestamp
pub fn filetime_to_datetime(ticks: u64) -> Result<NaiveDateTime> {
    let micros = (ticks / TICKS_PER_MICROSECOND) as i64;
    let nanos = (ticks % TICKS_PER_MICROSECOND) as i64 * NANOS_PER_TICK;

    filetime_epoch()
        .and_then(|epoch| epoch.checked_add_signed(Duration::microseconds(micros)))
        .and_then(|t| t.checked_add_signed(Duration::nanoseconds(nanos)))
        .ok_or(ParseError::TimestampOutOfRange(ticks))
}

/// Reject format strings containing specifiers chrono does not know
pub fn validate_date_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ParseError::InvalidDateFormat(format.to_string()));
    }
    Ok(())
}

/// Convert and format in one step
pub fn format_filetime(ticks: u64, format: &str) -> Result<String> {
    let datetime = filetime_to_datetime(ticks)?;
    let mut out = String::new();
    // write! surfaces formatter errors where to_string() would panic
    write!(out, "{}", datetime.format(format))
        .map_err(|_| ParseError::InvalidDateFormat(format.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tick zero lands on noon, not midnight. Reports depend on this offset.
    #[test]
    fn test_zero_ticks_is_noon_epoch() {
        let t = filetime_to_datetime(0).unwrap();
        assert_eq!(t.to_string(), "1601-01-01 12:00:00");
    }

    #[test]
    fn test_one_second_of_ticks() {
        let zero = filetime_to_datetime(0).unwrap();
        let one = filetime_to_datetime(FILETIME_TICKS_PER_SECOND).unwrap();
        assert_eq!(one - zero, Duration::seconds(1));
    }

    #[test]
    fn test_sub_microsecond_ticks_kept() {
        let zero = filetime_to_datetime(0).unwrap();
        let t = filetime_to_datetime(7).unwrap();
        assert_eq!(t - zero, Duration::nanoseconds(700));
    }

    #[test]
    fn test_known_instant() {
        // 2020-01-01 00:00:00 UTC as a FILETIME, shifted by the noon epoch
        let t = filetime_to_datetime(132_223_104_000_000_000).unwrap();
        assert_eq!(t.to_string(), "2020-01-01 12:00:00");
    }

    #[test]
    fn test_max_ticks_in_range() {
        assert!(filetime_to_datetime(u64::MAX).is_ok());
    }

    #[test]
    fn test_unknown_specifier_rejected() {
        assert!(validate_date_format("%x - %X").is_ok());
        assert!(validate_date_format("%Y-%m-%d").is_ok());
        assert!(matches!(
            validate_date_format("%Q"),
            Err(ParseError::InvalidDateFormat(f)) if f == "%Q"
        ));
        assert!(matches!(
            format_filetime(0, "%Q"),
            Err(ParseError::InvalidDateFormat(_))
        ));
    }

    #[test]
    fn test_locale_style_format() {
        let s = format_filetime(0, "%x - %X").unwrap();
        assert_eq!(s, "01/01/01 - 12:00:00");
    }
}
