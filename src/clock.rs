//! Source of "today"
//!
//! Stall detection and the default date partition both depend on the
//! current calendar day. It is injected so tests can pin it.

use std::fmt;
use std::sync::RwLock;

use chrono::{Local, NaiveDate};

/// Provides the current calendar date
pub trait Clock: Send + Sync + fmt::Debug {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A date that only changes when told to
#[derive(Debug)]
pub struct FixedClock {
    date: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: RwLock::new(date),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        if let Ok(mut current) = self.date.write() {
            *current = date;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.date.read() {
            Ok(date) => *date,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
        assert_eq!(clock.today().to_string(), "2024-05-03");

        clock.set(NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(clock.today().to_string(), "2024-05-04");
    }
}
