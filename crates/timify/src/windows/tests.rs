use super::*;
use chrono::Weekday;
use common::OperatingCalendar;

fn calendar() -> OperatingCalendar {
    OperatingCalendar::new(11 * 60, 12 * 60, 60, Weekday::Mon).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 7, d).unwrap()
}

/// Three weeks from Monday 2016-07-04, each bucket holding its day index.
fn history_by_day() -> OrderTimeSeries {
    let counts = (0..21 * 12).map(|i| (i / 12) as u32).collect();
    OrderTimeSeries::new(calendar(), TimeBucket::new(day(4), 0), 1, counts).unwrap()
}

#[test]
fn test_horizontal_window() {
    let history = history_by_day();
    let window = horizontal_window(&history, TimeBucket::new(day(18), 5), 2).unwrap();
    assert_eq!(window.len(), 14);
    assert_eq!(window.stride(), 12);
    assert_eq!(window.first(), TimeBucket::new(day(4), 5));
    assert_eq!(window.last(), TimeBucket::new(day(17), 5));
    assert_eq!(window.counts(), (0..14).collect::<Vec<u32>>().as_slice());
}

#[test]
fn test_horizontal_window_before_history() {
    let history = history_by_day();
    let err = horizontal_window(&history, TimeBucket::new(day(10), 5), 2).unwrap_err();
    assert!(err.is_insufficient_history());
}

#[test]
fn test_realtime_window() {
    let history = history_by_day();
    let window = realtime_window(&history, TimeBucket::new(day(18), 5), 2).unwrap();
    assert_eq!(window.len(), 14 * 12 + 5);
    assert_eq!(window.stride(), 1);
    assert_eq!(window.first(), TimeBucket::new(day(4), 0));
    assert_eq!(window.last(), TimeBucket::new(day(18), 4));
    assert_eq!(realtime_periodicities(&window), vec![12, 84]);
}

#[test]
fn test_realtime_window_past_history() {
    let history = history_by_day();
    let err = realtime_window(&history, TimeBucket::new(day(26), 3), 2).unwrap_err();
    assert!(err.is_insufficient_history());
}

#[test]
fn test_vertical_window_and_average_daily_demand() {
    let history = history_by_day();
    let window = vertical_window(&history, day(18), 1).unwrap();
    assert_eq!(window.len(), 84);
    assert_eq!(window.first(), TimeBucket::new(day(11), 0));
    assert_eq!(window.last(), TimeBucket::new(day(17), 11));

    // Days 7..=13 with 12 orders per day and per day index.
    assert_eq!(average_daily_demand(&history, day(18), 1).unwrap(), 120.0);
}

#[test]
fn test_average_daily_demand_rounds_to_one_decimal() {
    let counts = (0..21 * 12).map(|i| u32::from(i % 5 == 0)).collect();
    let history = OrderTimeSeries::new(calendar(), TimeBucket::new(day(4), 0), 1, counts).unwrap();
    // 17 orders over 7 days.
    assert_eq!(average_daily_demand(&history, day(18), 1).unwrap(), 2.4);
}

#[test]
fn test_windows_need_contiguous_history() {
    let history = history_by_day();
    let daily = history.select(0, 12, 21).unwrap();
    let err = vertical_window(&daily, day(18), 1).unwrap_err();
    assert!(matches!(err, GridcastError::InvalidInput(_)));
    assert!(vertical_window(&history, day(18), 0).is_err());
}
