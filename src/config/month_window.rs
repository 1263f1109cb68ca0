use serde::Deserialize;
use std::fmt;
use std::ops::RangeInclusive;

use super::ConfigError;

/// Inclusive calendar-month window. `start > end` wraps over the new year (e.g. 11..1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    start: u32,
    end: u32,
}

/// Which year a wrapping window's scenes are credited to.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SeasonAttribution {
    /// A scene counts toward its own calendar year, so January Y and
    /// November/December Y land in the same composite.
    #[serde(rename(deserialize = "calendar_year"))]
    CalendarYear,
    /// Nov-Dec Y and Jan Y+1 form composite Y.
    #[serde(rename(deserialize = "season_start"))]
    SeasonStart,
    /// Nov-Dec Y-1 and Jan Y form composite Y.
    #[serde(rename(deserialize = "season_end"))]
    SeasonEnd,
}

/// Inclusive range of requested years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl MonthWindow {
    pub fn new(start: u32, end: u32) -> Result<Self, ConfigError> {
        for month in [start, end] {
            if !(1..=12).contains(&month) {
                return Err(ConfigError::Month(month));
            }
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn wraps(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, month: u32) -> bool {
        if self.wraps() {
            month >= self.start || month <= self.end
        } else {
            (self.start..=self.end).contains(&month)
        }
    }

    pub fn month_count(&self) -> u32 {
        if self.wraps() {
            12 - self.start + 1 + self.end
        } else {
            self.end - self.start + 1
        }
    }
}

impl fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "months {}..{}", self.start, self.end)
    }
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::YearOrder);
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    // A range always holds at least one year.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
