use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use common::{OperatingCalendar, OrderTimeSeries, Result, TimeBucket};
use tracing::debug;

use crate::DateRange;

/// Order counts of one pixel per bucket over every operating day in `range`.
///
/// `orders` must already be restricted to the pixel. Timestamps outside
/// operating hours or outside the range are dropped.
pub fn aggregate<I>(
    calendar: &OperatingCalendar,
    orders: I,
    range: &DateRange,
) -> Result<OrderTimeSeries>
where
    I: IntoIterator<Item = NaiveDateTime>,
{
    let mut counts = Counts::new(calendar, range);
    for placed_at in orders {
        counts.add(placed_at);
    }
    counts.log("orders aggregated");
    counts.into_series()
}

/// Order counts per bucket for every pixel seen in `orders`.
///
/// Each series covers all of `range`, zero-filled.
pub fn aggregate_by_pixel<K, I>(
    calendar: &OperatingCalendar,
    orders: I,
    range: &DateRange,
) -> Result<BTreeMap<K, OrderTimeSeries>>
where
    K: Ord,
    I: IntoIterator<Item = (NaiveDateTime, K)>,
{
    let mut per_pixel: BTreeMap<K, Counts<'_>> = BTreeMap::new();
    for (placed_at, pixel) in orders {
        per_pixel
            .entry(pixel)
            .or_insert_with(|| Counts::new(calendar, range))
            .add(placed_at);
    }

    debug!(pixels = per_pixel.len(), days = range.days(), "order totals aggregated");

    per_pixel
        .into_iter()
        .map(|(pixel, counts)| Ok((pixel, counts.into_series()?)))
        .collect()
}

/// Start of the first bucket with at least one order.
pub fn first_order_at(series: &OrderTimeSeries) -> Option<NaiveDateTime> {
    series
        .first_order_at()
        .map(|bucket| series.calendar().bucket_start(bucket))
}

/// Start of the last bucket with at least one order.
pub fn last_order_at(series: &OrderTimeSeries) -> Option<NaiveDateTime> {
    series
        .last_order_at()
        .map(|bucket| series.calendar().bucket_start(bucket))
}

struct Counts<'a> {
    calendar: &'a OperatingCalendar,
    range: &'a DateRange,
    first: TimeBucket,
    counts: Vec<u32>,
    out_of_hours: usize,
    out_of_range: usize,
}

impl<'a> Counts<'a> {
    fn new(calendar: &'a OperatingCalendar, range: &'a DateRange) -> Self {
        Self {
            calendar,
            range,
            first: calendar.first_bucket(range.first_day()),
            counts: vec![0; range.days() * calendar.buckets_per_day()],
            out_of_hours: 0,
            out_of_range: 0,
        }
    }

    fn add(&mut self, placed_at: NaiveDateTime) {
        let Some(bucket) = self.calendar.bucket_of(placed_at) else {
            self.out_of_hours += 1;
            return;
        };
        if !self.range.contains(bucket.day) {
            self.out_of_range += 1;
            return;
        }
        let position = self.calendar.steps_between(self.first, bucket) as usize;
        self.counts[position] += 1;
    }

    fn log(&self, message: &str) {
        debug!(
            buckets = self.counts.len(),
            orders = self.counts.iter().map(|&c| c as u64).sum::<u64>(),
            out_of_hours = self.out_of_hours,
            out_of_range = self.out_of_range,
            "{message}"
        );
    }

    fn into_series(self) -> Result<OrderTimeSeries> {
        OrderTimeSeries::new(*self.calendar, self.first, 1, self.counts)
    }
}
