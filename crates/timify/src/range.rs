use chrono::{NaiveDate, TimeDelta};
use common::{GridcastError, Result};
use serde::{Deserialize, Serialize};

/// Inclusive range of operating days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl DateRange {
    pub fn new(first_day: NaiveDate, last_day: NaiveDate) -> Result<Self> {
        if first_day > last_day {
            return Err(GridcastError::InvalidInput(format!(
                "date range starts on {first_day} after it ends on {last_day}"
            )));
        }
        Ok(Self {
            first_day,
            last_day,
        })
    }

    /// The `weeks * 7` days immediately preceding `day`.
    pub fn weeks_before(day: NaiveDate, weeks: u32) -> Result<Self> {
        if weeks == 0 {
            return Err(GridcastError::InvalidInput(
                "a training horizon needs at least one week".into(),
            ));
        }
        Self::new(
            day - TimeDelta::weeks(weeks as i64),
            day - TimeDelta::days(1),
        )
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    pub fn days(&self) -> usize {
        (self.last_day - self.first_day).num_days() as usize + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.first_day <= day && day <= self.last_day
    }

    /// The same range, extended to end on `day` if that is later.
    pub fn through(&self, day: NaiveDate) -> Self {
        Self {
            first_day: self.first_day,
            last_day: self.last_day.max(day),
        }
    }
}
