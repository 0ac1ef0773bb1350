//! Operating calendar: maps timestamps onto fixed-length time buckets.
//!
//! An operating day starts `day_start` after midnight and lasts `day_length`
//! (at most 24 hours, possibly running past midnight). It is cut into
//! `buckets_per_day` left-closed, right-open buckets `[start, start + length)`.
//! Timestamps outside operating hours belong to no bucket.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use crate::{CalendarConfig, GridcastError, Result};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// One bucket of the operating calendar, ordered by calendar position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeBucket {
    /// Operating day the bucket belongs to (the day it starts on, before any
    /// wrap past midnight).
    pub day: NaiveDate,
    /// Zero-based position of the bucket within the operating day.
    pub slot: u32,
}

impl TimeBucket {
    pub fn new(day: NaiveDate, slot: u32) -> Self {
        Self { day, slot }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingCalendar {
    day_start_minutes: u32,
    day_length_minutes: u32,
    bucket_minutes: u32,
    week_start: Weekday,
}

impl OperatingCalendar {
    /// Build a calendar; the bucket length must divide the operating day so
    /// that daily and weekly periodicities are whole numbers of buckets.
    pub fn new(
        day_start_minutes: u32,
        day_length_minutes: u32,
        bucket_minutes: u32,
        week_start: Weekday,
    ) -> Result<Self> {
        if bucket_minutes == 0 {
            return Err(GridcastError::Configuration(
                "bucket length must be positive".into(),
            ));
        }
        if day_start_minutes >= MINUTES_PER_DAY {
            return Err(GridcastError::Configuration(format!(
                "day start must lie within one day, got {day_start_minutes} minutes"
            )));
        }
        if day_length_minutes == 0 || day_length_minutes > MINUTES_PER_DAY {
            return Err(GridcastError::Configuration(format!(
                "operating day must last between 1 minute and 24 hours, got {day_length_minutes} minutes"
            )));
        }
        if day_length_minutes % bucket_minutes != 0 {
            return Err(GridcastError::Configuration(format!(
                "bucket length of {bucket_minutes} minutes does not divide the operating day of {day_length_minutes} minutes"
            )));
        }

        Ok(Self {
            day_start_minutes,
            day_length_minutes,
            bucket_minutes,
            week_start,
        })
    }

    /// A calendar covering the whole day from midnight.
    pub fn full_day(bucket_minutes: u32) -> Result<Self> {
        Self::new(0, MINUTES_PER_DAY, bucket_minutes, Weekday::Mon)
    }

    pub fn from_config(config: &CalendarConfig) -> Result<Self> {
        Self::new(
            config.day_start_minutes,
            config.day_length_minutes,
            config.bucket_minutes,
            config.week_start,
        )
    }

    pub fn buckets_per_day(&self) -> usize {
        (self.day_length_minutes / self.bucket_minutes) as usize
    }

    pub fn bucket_length(&self) -> TimeDelta {
        TimeDelta::minutes(self.bucket_minutes as i64)
    }

    pub fn day_start(&self) -> TimeDelta {
        TimeDelta::minutes(self.day_start_minutes as i64)
    }

    pub fn day_length(&self) -> TimeDelta {
        TimeDelta::minutes(self.day_length_minutes as i64)
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// Instant at which the operating `day` begins.
    pub fn day_opens_at(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(NaiveTime::MIN) + self.day_start()
    }

    pub fn bucket_start(&self, bucket: TimeBucket) -> NaiveDateTime {
        self.day_opens_at(bucket.day) + self.bucket_length() * bucket.slot as i32
    }

    pub fn bucket_end(&self, bucket: TimeBucket) -> NaiveDateTime {
        self.bucket_start(bucket) + self.bucket_length()
    }

    /// The bucket containing `ts`, or `None` outside operating hours.
    pub fn bucket_of(&self, ts: NaiveDateTime) -> Option<TimeBucket> {
        let date = ts.date();
        // A day running past midnight claims the early hours of the next date.
        for day in [Some(date), date.pred_opt()].into_iter().flatten() {
            let offset = ts - self.day_opens_at(day);
            if offset >= TimeDelta::zero() && offset < self.day_length() {
                let slot = offset.num_seconds() / (self.bucket_minutes as i64 * 60);
                return Some(TimeBucket::new(day, slot as u32));
            }
        }
        None
    }

    /// The bucket starting exactly at `ts`.
    pub fn bucket_starting_at(&self, ts: NaiveDateTime) -> Option<TimeBucket> {
        self.bucket_of(ts)
            .filter(|bucket| self.bucket_start(*bucket) == ts)
    }

    /// Absolute calendar position of `bucket`; consecutive buckets differ by one.
    pub fn ordinal(&self, bucket: TimeBucket) -> i64 {
        bucket.day.num_days_from_ce() as i64 * self.buckets_per_day() as i64 + bucket.slot as i64
    }

    pub fn from_ordinal(&self, ordinal: i64) -> Option<TimeBucket> {
        let per_day = self.buckets_per_day() as i64;
        let days = i32::try_from(ordinal.div_euclid(per_day)).ok()?;
        let day = NaiveDate::from_num_days_from_ce_opt(days)?;
        Some(TimeBucket::new(day, ordinal.rem_euclid(per_day) as u32))
    }

    /// Move `steps` buckets forward (or backward when negative).
    pub fn offset(&self, bucket: TimeBucket, steps: i64) -> Option<TimeBucket> {
        self.from_ordinal(self.ordinal(bucket) + steps)
    }

    pub fn steps_between(&self, from: TimeBucket, to: TimeBucket) -> i64 {
        self.ordinal(to) - self.ordinal(from)
    }

    pub fn first_bucket(&self, day: NaiveDate) -> TimeBucket {
        TimeBucket::new(day, 0)
    }

    pub fn last_bucket(&self, day: NaiveDate) -> TimeBucket {
        TimeBucket::new(day, self.buckets_per_day() as u32 - 1)
    }

    /// The most recent configured week-start day on or before `day`.
    pub fn start_of_week(&self, day: NaiveDate) -> NaiveDate {
        let back = (day.weekday().num_days_from_monday() + 7
            - self.week_start.num_days_from_monday())
            % 7;
        day - TimeDelta::days(back as i64)
    }
}

impl TryFrom<&CalendarConfig> for OperatingCalendar {
    type Error = GridcastError;

    fn try_from(config: &CalendarConfig) -> Result<Self> {
        Self::from_config(config)
    }
}
