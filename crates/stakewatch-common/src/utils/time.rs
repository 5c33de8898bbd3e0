use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::errors::{Error, Result};

/// Source of the current UTC date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    /// The most recent fully elapsed UTC day (yesterday).
    fn last_completed_date(&self) -> NaiveDate {
        let today = self.today();
        today.pred_opt().unwrap_or(today)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| Error::InvalidDate(format!("{s}: {e}")))
}

/// UTC calendar date of a unix timestamp.
pub fn date_of_timestamp(timestamp: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

/// Unix timestamp of 00:00:00 UTC on `date`.
pub fn start_of_day(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

pub fn format_timestamp(timestamp: i64) -> String {
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default();
    datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_bucketing_is_utc() {
        let date = parse_date("2025-07-30").unwrap();
        let start = start_of_day(date);
        assert_eq!(start, 1_753_833_600);
        assert_eq!(date_of_timestamp(start), Some(date));
        assert_eq!(date_of_timestamp(start - 1), date.pred_opt());
        assert_eq!(date_of_timestamp(start + 86_399), Some(date));
        assert_eq!(format_timestamp(start + 3_661), "2025-07-30 01:01:01 UTC");
    }

    #[test]
    fn test_last_completed_date_is_yesterday() {
        let clock = FixedClock(parse_date("2025-03-01").unwrap());
        assert_eq!(clock.last_completed_date(), parse_date("2025-02-28").unwrap());
        assert_eq!(next_day(parse_date("2025-02-28").unwrap()), parse_date("2025-03-01").unwrap());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(parse_date("07/30/2025"), Err(Error::InvalidDate(_))));
    }
}
