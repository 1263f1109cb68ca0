use chrono::{Datelike, Months, NaiveDate};

use crate::config::{ConfigError, MonthWindow, SeasonAttribution, YearRange};

/// Maps acquisition dates onto composite years for a month window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonCalendar {
    window: MonthWindow,
    attribution: SeasonAttribution,
}

impl SeasonCalendar {
    /// A wrapping window needs an explicit attribution; a plain window ignores it.
    pub fn new(
        window: MonthWindow,
        attribution: Option<SeasonAttribution>,
    ) -> Result<Self, ConfigError> {
        let attribution = match (window.wraps(), attribution) {
            (true, None) => {
                return Err(ConfigError::MissingSeasonAttribution {
                    start: window.start(),
                    end: window.end(),
                });
            }
            (true, Some(attribution)) => attribution,
            (false, _) => SeasonAttribution::CalendarYear,
        };

        Ok(Self {
            window,
            attribution,
        })
    }

    pub fn window(&self) -> MonthWindow {
        self.window
    }

    pub fn attribution(&self) -> SeasonAttribution {
        self.attribution
    }

    /// Composite year a scene acquired on `date` belongs to, `None` outside the window.
    pub fn season_year(&self, date: NaiveDate) -> Option<i32> {
        let month = date.month();
        if !self.window.contains(month) {
            return None;
        }

        let year = date.year();
        if !self.window.wraps() {
            return Some(year);
        }

        let in_opening_months = month >= self.window.start();
        match self.attribution {
            SeasonAttribution::CalendarYear => Some(year),
            SeasonAttribution::SeasonStart if in_opening_months => Some(year),
            SeasonAttribution::SeasonStart => Some(year - 1),
            SeasonAttribution::SeasonEnd if in_opening_months => Some(year + 1),
            SeasonAttribution::SeasonEnd => Some(year),
        }
    }

    /// First and last calendar day that can hold scenes of composite `year`.
    pub fn date_range(&self, year: i32) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let (first_year, last_year) = match (self.window.wraps(), self.attribution) {
            (false, _) => (year, year),
            (true, SeasonAttribution::CalendarYear) => {
                return Ok((
                    first_day(year, 1).ok_or(ConfigError::DateRange(year))?,
                    last_day(year, 12).ok_or(ConfigError::DateRange(year))?,
                ));
            }
            (true, SeasonAttribution::SeasonStart) => (year, year + 1),
            (true, SeasonAttribution::SeasonEnd) => (year - 1, year),
        };

        let start = first_day(first_year, self.window.start()).ok_or(ConfigError::DateRange(year))?;
        let end = last_day(last_year, self.window.end()).ok_or(ConfigError::DateRange(year))?;

        Ok((start, end))
    }

    /// Calendar span covering every composite year of `years`.
    pub fn span(&self, years: &YearRange) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let (start, _) = self.date_range(years.start())?;
        let (_, end) = self.date_range(years.end())?;
        Ok((start, end))
    }
}

fn first_day(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn last_day(year: i32, month: u32) -> Option<NaiveDate> {
    first_day(year, month)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}
