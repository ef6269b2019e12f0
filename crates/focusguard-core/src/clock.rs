//! Calendar dates for the analytics ledger.
//!
//! All day buckets use the user's local calendar date, formatted as
//! `YYYY-MM-DD`. Both the rollover check and the per-date counters go
//! through the same [`Clock`], so they can never disagree about "today".

use std::cell::Cell;

use chrono::{Local, NaiveDate};

use crate::error::ValidationError;

/// Source of the current calendar date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A settable date, for tests and simulations.
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Cell<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Cell::new(date),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        self.date.set(date);
    }

    /// Move forward by `days` calendar days.
    pub fn advance_days(&self, days: u64) {
        let next = self.date.get() + chrono::Days::new(days);
        self.date.set(next);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// `YYYY-MM-DD` key for a date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` key.
pub fn parse_date_key(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate(s.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_is_zero_padded() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(date_key(d), "2024-01-03");
        assert_eq!(parse_date_key("2024-01-03").unwrap(), d);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_date_key("01/03/2024").is_err());
        assert!(parse_date_key("2024-02-30").is_err());
    }

    #[test]
    fn fixed_clock_advances_across_month_end() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        clock.advance_days(1);
        assert_eq!(date_key(clock.today()), "2024-02-01");
    }
}
