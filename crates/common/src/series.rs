use serde::{Deserialize, Serialize};

use crate::{GridcastError, OperatingCalendar, Result, TimeBucket};

/// Positions of a series on the operating calendar.
///
/// Entry `i` sits on the bucket `first + i * stride` (in calendar order).
/// A stride of one is a contiguous series; a stride of `buckets_per_day`
/// picks the same time of day on consecutive days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesLattice {
    pub calendar: OperatingCalendar,
    pub first: TimeBucket,
    pub stride: usize,
    pub len: usize,
}

impl SeriesLattice {
    pub fn bucket(&self, index: usize) -> Option<TimeBucket> {
        self.calendar
            .offset(self.first, (index * self.stride) as i64)
    }

    pub fn last(&self) -> TimeBucket {
        // `len >= 1` is guaranteed by `OrderTimeSeries::new`.
        self.bucket(self.len.saturating_sub(1)).unwrap_or(self.first)
    }

    /// Position of `bucket` relative to `first`, if it lies on the lattice.
    /// May exceed `len` for buckets after the last entry.
    pub fn position_of(&self, bucket: TimeBucket) -> Option<usize> {
        let steps = self.calendar.steps_between(self.first, bucket);
        if steps < 0 || steps % self.stride as i64 != 0 {
            return None;
        }
        Some((steps / self.stride as i64) as usize)
    }

    /// Number of lattice steps from the last entry to the target that lies
    /// `horizon` steps after `origin`.
    pub fn steps_ahead(&self, origin: TimeBucket, horizon: usize) -> Result<usize> {
        if horizon == 0 {
            return Err(GridcastError::InvalidInput(
                "forecast horizon must be at least one bucket".into(),
            ));
        }
        let position = self.position_of(origin).ok_or_else(|| {
            GridcastError::InvalidInput(format!(
                "origin {origin:?} is not on the series lattice starting at {:?} with stride {}",
                self.first, self.stride
            ))
        })?;
        if position + 1 < self.len {
            return Err(GridcastError::InvalidInput(format!(
                "origin {origin:?} precedes the end of the fitted history {:?}",
                self.last()
            )));
        }
        Ok(position + 1 - self.len + horizon)
    }

    pub fn target(&self, origin: TimeBucket, horizon: usize) -> Result<TimeBucket> {
        let steps = self.steps_ahead(origin, horizon)?;
        self.bucket(self.len - 1 + steps).ok_or_else(|| {
            GridcastError::InvalidInput("forecast target lies outside the calendar".into())
        })
    }
}

/// Order counts on a regular lattice of the operating calendar, zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTimeSeries {
    calendar: OperatingCalendar,
    first: TimeBucket,
    stride: usize,
    counts: Vec<u32>,
}

impl OrderTimeSeries {
    pub fn new(
        calendar: OperatingCalendar,
        first: TimeBucket,
        stride: usize,
        counts: Vec<u32>,
    ) -> Result<Self> {
        if stride == 0 {
            return Err(GridcastError::InvalidInput("series stride must be positive".into()));
        }
        if counts.is_empty() {
            return Err(GridcastError::InsufficientHistory(
                "a series needs at least one bucket".into(),
            ));
        }
        if first.slot as usize >= calendar.buckets_per_day() {
            return Err(GridcastError::InvalidInput(format!(
                "slot {} does not exist in a day of {} buckets",
                first.slot,
                calendar.buckets_per_day()
            )));
        }
        Ok(Self {
            calendar,
            first,
            stride,
            counts,
        })
    }

    pub fn calendar(&self) -> &OperatingCalendar {
        &self.calendar
    }

    pub fn first(&self) -> TimeBucket {
        self.first
    }

    pub fn last(&self) -> TimeBucket {
        self.lattice().last()
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn values(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn lattice(&self) -> SeriesLattice {
        SeriesLattice {
            calendar: self.calendar,
            first: self.first,
            stride: self.stride,
            len: self.counts.len(),
        }
    }

    pub fn bucket(&self, index: usize) -> Option<TimeBucket> {
        if index >= self.counts.len() {
            return None;
        }
        self.lattice().bucket(index)
    }

    pub fn count_at(&self, bucket: TimeBucket) -> Option<u32> {
        let position = self.lattice().position_of(bucket)?;
        self.counts.get(position).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TimeBucket, u32)> + '_ {
        let lattice = self.lattice();
        self.counts
            .iter()
            .enumerate()
            .filter_map(move |(i, &c)| lattice.bucket(i).map(|b| (b, c)))
    }

    /// The first `len` entries, as a series of its own (used for backtests).
    pub fn head(&self, len: usize) -> Result<Self> {
        Self::new(
            self.calendar,
            self.first,
            self.stride,
            self.counts[..len.min(self.counts.len())].to_vec(),
        )
    }

    /// Entries `start, start + step, ...` up to `len` of them, re-based so the
    /// new stride is `step * stride`.
    pub fn select(&self, start: usize, step: usize, len: usize) -> Result<Self> {
        if step == 0 {
            return Err(GridcastError::InvalidInput("selection step must be positive".into()));
        }
        let needed = start + step * len.saturating_sub(1);
        if len == 0 || needed >= self.counts.len() {
            return Err(GridcastError::InsufficientHistory(format!(
                "selection of {len} entries from position {start} every {step} needs {} buckets, series has {}",
                needed + 1,
                self.counts.len()
            )));
        }
        let first = self.bucket(start).ok_or_else(|| {
            GridcastError::InvalidInput("selection starts outside the calendar".into())
        })?;
        let counts = (0..len).map(|i| self.counts[start + i * step]).collect();
        Self::new(self.calendar, first, self.stride * step, counts)
    }

    /// First bucket with at least one order.
    pub fn first_order_at(&self) -> Option<TimeBucket> {
        self.iter().find(|(_, c)| *c > 0).map(|(b, _)| b)
    }

    /// Last bucket with at least one order.
    pub fn last_order_at(&self) -> Option<TimeBucket> {
        let last = self.counts.iter().rposition(|&c| c > 0)?;
        self.bucket(last)
    }
}
