//! Period arithmetic
//!
//! A period is a `{year, quarter}` pair. Weekly state is addressed by ISO
//! week numbers, so this module also maps quarters to the ISO weeks they
//! span and resolves a weekday inside a week to a calendar date.

use crate::config::{MAX_PERIOD_YEAR, MIN_PERIOD_YEAR};
use crate::error::{AppError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::ops::RangeInclusive;

/// A `{year, quarter}` addressing unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub quarter: i32,
}

impl Period {
    /// Build a validated period
    pub fn new(year: i32, quarter: i32) -> Result<Self> {
        let period = Self { year, quarter };
        period.validate()?;
        Ok(period)
    }

    /// Reject quarters outside 1..=4 and years outside the supported range.
    /// Deserialized periods bypass `new`, so services call this on input.
    pub fn validate(&self) -> Result<()> {
        if !(1..=4).contains(&self.quarter) {
            return Err(AppError::InvalidArgument(format!(
                "quarter must be between 1 and 4, got {}",
                self.quarter
            )));
        }

        if !(MIN_PERIOD_YEAR..=MAX_PERIOD_YEAR).contains(&self.year) {
            return Err(AppError::InvalidArgument(format!(
                "year must be between {} and {}, got {}",
                MIN_PERIOD_YEAR, MAX_PERIOD_YEAR, self.year
            )));
        }

        Ok(())
    }

    pub fn next(&self) -> Self {
        if self.quarter >= 4 {
            Self {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }

    pub fn previous(&self) -> Self {
        if self.quarter <= 1 {
            Self {
                year: self.year - 1,
                quarter: 4,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter - 1,
            }
        }
    }

    /// First calendar day of the quarter
    pub fn first_day(&self) -> Result<NaiveDate> {
        let month = ((self.quarter - 1) * 3 + 1) as u32;
        NaiveDate::from_ymd_opt(self.year, month, 1)
            .ok_or_else(|| AppError::InvalidArgument(format!("invalid period {}", self)))
    }

    /// Last calendar day of the quarter
    pub fn last_day(&self) -> Result<NaiveDate> {
        self.next()
            .first_day()?
            .pred_opt()
            .ok_or_else(|| AppError::InvalidArgument(format!("invalid period {}", self)))
    }

    /// ISO week numbers covered by this quarter.
    ///
    /// Weeks that straddle a year boundary are clamped into the period's own
    /// year: a Q1 starting in week 52 of the previous ISO year starts at 1,
    /// and a Q4 ending in week 1 of the next ISO year ends at the year's
    /// last week.
    pub fn week_range(&self) -> Result<RangeInclusive<i32>> {
        let first = self.first_day()?.iso_week();
        let last = self.last_day()?.iso_week();

        let start = if first.year() != self.year {
            1
        } else {
            first.week() as i32
        };

        let end = if last.year() != self.year {
            weeks_in_iso_year(self.year)?
        } else {
            last.week() as i32
        };

        Ok(start..=end)
    }

    /// The week new state rows land in when goals move into this period
    pub fn first_week(&self) -> Result<i32> {
        Ok(*self.week_range()?.start())
    }

    pub fn contains_week(&self, week_number: i32) -> Result<bool> {
        Ok(self.week_range()?.contains(&week_number))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.quarter, self.year)
    }
}

/// Parses the `2025-Q1` form
impl FromStr for Period {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || {
            AppError::InvalidArgument(format!("period must look like 2025-Q1, got {:?}", value))
        };

        let (year, quarter) = value.trim().split_once("-Q").ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let quarter = quarter.parse().map_err(|_| invalid())?;

        Self::new(year, quarter)
    }
}

fn weeks_in_iso_year(year: i32) -> Result<i32> {
    // Dec 28 always falls in the last ISO week of its year
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week() as i32)
        .ok_or_else(|| AppError::InvalidArgument(format!("invalid year {}", year)))
}

/// Map 1 (Monday) ..= 7 (Sunday) to a chrono weekday
pub fn weekday_from_number(day_of_week: i32) -> Option<Weekday> {
    match day_of_week {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Midnight UTC of the given weekday in an ISO week, in epoch milliseconds
pub fn date_timestamp(year: i32, week_number: i32, day_of_week: i32) -> Result<i64> {
    let weekday = weekday_from_number(day_of_week).ok_or_else(|| {
        AppError::InvalidArgument(format!(
            "day of week must be between 1 and 7, got {}",
            day_of_week
        ))
    })?;

    let date = u32::try_from(week_number)
        .ok()
        .and_then(|week| NaiveDate::from_isoywd_opt(year, week, weekday))
        .ok_or_else(|| {
            AppError::InvalidArgument(format!("week {} does not exist in {}", week_number, year))
        })?;

    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .ok_or_else(|| AppError::Generic(format!("cannot build midnight for {}", date)))
}
