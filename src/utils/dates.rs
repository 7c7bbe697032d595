use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProcessingError, Result};

/// An inclusive calendar-date range, as sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < begin {
            return Err(ProcessingError::InvalidFormat(format!(
                "Date range ends ({}) before it begins ({})",
                end, begin
            )));
        }
        Ok(Self { begin, end })
    }

    /// Parse two 8-digit `YYYYMMDD` dates.
    pub fn from_yyyymmdd(begin: &str, end: &str) -> Result<Self> {
        Self::new(parse_yyyymmdd(begin)?, parse_yyyymmdd(end)?)
    }

    pub fn begin_yyyymmdd(&self) -> String {
        to_yyyymmdd(self.begin)
    }

    pub fn end_yyyymmdd(&self) -> String {
        to_yyyymmdd(self.end)
    }

    pub fn days(&self) -> i64 {
        (self.end - self.begin).num_days() + 1
    }

    /// Split into per-calendar-year pieces; the service refuses requests
    /// spanning more than one year.
    pub fn split_by_year(&self) -> Vec<DateRange> {
        let mut chunks = Vec::new();
        let mut begin = self.begin;

        while begin <= self.end {
            let year_end = NaiveDate::from_ymd_opt(begin.year(), 12, 31).unwrap_or(self.end);
            let end = year_end.min(self.end);
            chunks.push(DateRange { begin, end });

            match end.succ_opt() {
                Some(next) => begin = next,
                None => break,
            }
        }

        chunks
    }

    /// Short probe windows: one of `span_days` at the same day offset into
    /// every `step_months` period from `begin`, clipped to the range.
    pub fn sampling_windows(&self, step_months: u32, span_days: u32) -> Result<Vec<DateRange>> {
        if step_months == 0 || span_days == 0 {
            return Err(ProcessingError::Config(
                "Sampling step and span must both be positive".to_string(),
            ));
        }

        let mut windows = Vec::new();

        // Each start is offset from `begin`, so month-end clamping does not carry over
        for k in 0u32.. {
            let Some(start) = k
                .checked_mul(step_months)
                .and_then(|months| self.begin.checked_add_months(Months::new(months)))
            else {
                break;
            };
            if start > self.end {
                break;
            }

            let end = (start + Duration::days(span_days as i64 - 1)).min(self.end);
            windows.push(DateRange { begin: start, end });
        }

        Ok(windows)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.begin_yyyymmdd(), self.end_yyyymmdd())
    }
}

pub fn to_yyyymmdd(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn parse_yyyymmdd(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.len() != 8 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ProcessingError::InvalidFormat(format!(
            "Expected an 8-digit YYYYMMDD date, got '{}'",
            raw
        )));
    }
    Ok(NaiveDate::parse_from_str(trimmed, "%Y%m%d")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_yyyymmdd_round_trip() {
        let range = DateRange::from_yyyymmdd("20180101", "20181231").unwrap();
        assert_eq!(range.begin, date(2018, 1, 1));
        assert_eq!(range.end_yyyymmdd(), "20181231");
        assert_eq!(range.days(), 365);
    }

    #[test]
    fn test_invalid_dates() {
        assert!(parse_yyyymmdd("2018-01-01").is_err());
        assert!(parse_yyyymmdd("20181301").is_err());
        assert!(DateRange::from_yyyymmdd("20180102", "20180101").is_err());
    }

    #[test]
    fn test_split_by_year() {
        let range = DateRange::new(date(2017, 11, 15), date(2019, 2, 1)).unwrap();
        let chunks = range.split_by_year();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], DateRange::new(date(2017, 11, 15), date(2017, 12, 31)).unwrap());
        assert_eq!(chunks[1], DateRange::new(date(2018, 1, 1), date(2018, 12, 31)).unwrap());
        assert_eq!(chunks[2], DateRange::new(date(2019, 1, 1), date(2019, 2, 1)).unwrap());
    }

    #[test]
    fn test_single_day_split() {
        let range = DateRange::new(date(2018, 1, 1), date(2018, 1, 1)).unwrap();
        assert_eq!(range.split_by_year(), vec![range]);
    }

    #[test]
    fn test_sampling_windows() {
        let range = DateRange::new(date(2018, 1, 1), date(2018, 12, 31)).unwrap();
        let windows = range.sampling_windows(3, 2).unwrap();

        assert_eq!(windows.len(), 4);
        assert_eq!(windows[0], DateRange::new(date(2018, 1, 1), date(2018, 1, 2)).unwrap());
        assert_eq!(windows[3], DateRange::new(date(2018, 10, 1), date(2018, 10, 2)).unwrap());
    }

    #[test]
    fn test_sampling_windows_from_month_end() {
        let range = DateRange::from_yyyymmdd("20180131", "20180630").unwrap();
        let starts: Vec<String> = range
            .sampling_windows(1, 1)
            .unwrap()
            .iter()
            .map(|w| w.begin_yyyymmdd())
            .collect();

        assert_eq!(
            starts,
            vec!["20180131", "20180228", "20180331", "20180430", "20180531", "20180630"]
        );
    }

    #[test]
    fn test_sampling_window_clipped_to_range() {
        let range = DateRange::new(date(2018, 1, 1), date(2018, 1, 1)).unwrap();
        let windows = range.sampling_windows(1, 7).unwrap();
        assert_eq!(windows, vec![range]);
        assert!(range.sampling_windows(0, 1).is_err());
    }
}
