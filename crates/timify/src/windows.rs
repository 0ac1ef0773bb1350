use chrono::{NaiveDate, TimeDelta};
use common::{GridcastError, OrderTimeSeries, Result, TimeBucket};
use tracing::debug;

// -----------------------------------------------------------------------
// Training windows cut from a contiguous order history
// -----------------------------------------------------------------------

/// Counts at `target`'s time of day on each of the `7 * weeks` days before
/// the target day. One entry per day, so the weekly season has length 7.
pub fn horizontal_window(
    history: &OrderTimeSeries,
    target: TimeBucket,
    weeks: u32,
) -> Result<OrderTimeSeries> {
    let days = training_days(weeks)?;
    let start = TimeBucket::new(target.day - TimeDelta::days(days as i64), target.slot);
    let bpd = history.calendar().buckets_per_day();
    let window = cut(history, start, bpd, days)?;
    debug!(target = ?target, entries = window.len(), "horizontal window");
    Ok(window)
}

/// Every bucket of the `7 * weeks` days before the target day plus the
/// target day's buckets before `target`.
pub fn realtime_window(
    history: &OrderTimeSeries,
    target: TimeBucket,
    weeks: u32,
) -> Result<OrderTimeSeries> {
    let days = training_days(weeks)?;
    let bpd = history.calendar().buckets_per_day();
    let start = TimeBucket::new(target.day - TimeDelta::days(days as i64), 0);
    let len = days * bpd + target.slot as usize;
    let window = cut(history, start, 1, len)?;
    debug!(target = ?target, entries = window.len(), "real-time window");
    Ok(window)
}

/// Every bucket of the `7 * weeks` days before `day`.
pub fn vertical_window(
    history: &OrderTimeSeries,
    day: NaiveDate,
    weeks: u32,
) -> Result<OrderTimeSeries> {
    let days = training_days(weeks)?;
    let bpd = history.calendar().buckets_per_day();
    let start = TimeBucket::new(day - TimeDelta::days(days as i64), 0);
    cut(history, start, 1, days * bpd)
}

/// Daily and weekly periodicities of a contiguous series, in buckets.
pub fn realtime_periodicities(history: &OrderTimeSeries) -> Vec<usize> {
    let bpd = history.calendar().buckets_per_day();
    if bpd == 1 {
        // The daily cycle is trivial with one bucket per day.
        vec![7]
    } else {
        vec![bpd, 7 * bpd]
    }
}

/// Average number of orders per day over the `7 * weeks` days before `day`,
/// rounded to one decimal.
pub fn average_daily_demand(history: &OrderTimeSeries, day: NaiveDate, weeks: u32) -> Result<f64> {
    let window = vertical_window(history, day, weeks)?;
    let days = training_days(weeks)?;
    let add = window.total() as f64 / days as f64;
    Ok((add * 10.0).round() / 10.0)
}

fn training_days(weeks: u32) -> Result<usize> {
    if weeks == 0 {
        return Err(GridcastError::InvalidInput(
            "a training horizon needs at least one week".into(),
        ));
    }
    Ok(weeks as usize * 7)
}

/// `len` entries of `history`, every `step` buckets, starting at `start`.
fn cut(history: &OrderTimeSeries, start: TimeBucket, step: usize, len: usize) -> Result<OrderTimeSeries> {
    if history.stride() != 1 {
        return Err(GridcastError::InvalidInput(
            "training windows are cut from a contiguous history".into(),
        ));
    }
    let position = history.lattice().position_of(start).ok_or_else(|| {
        GridcastError::InsufficientHistory(format!(
            "history starts at {:?}, the window needs {:?}",
            history.first(),
            start
        ))
    })?;
    history.select(position, step, len)
}

#[cfg(test)]
mod tests;
