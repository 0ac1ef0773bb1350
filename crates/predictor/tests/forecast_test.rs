//! End-to-end forecasts over synthetic pixel histories with the default
//! 11:00-23:00 hourly calendar.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use common::{AppConfig, ModelChoice, Result, TimeBucket};
use grid::PixelKey;
use predictor::{ForecastOutcome, ForecastRequest, Forecaster, OrderSource};
use timify::DateRange;

/// Orders per hourly slot, identical on every day.
const BUSY: [u32; 12] = [2, 3, 6, 9, 5, 3, 2, 4, 8, 7, 4, 1];
const MEDIUM: [u32; 12] = [0, 1, 1, 2, 2, 1, 1, 2, 3, 2, 1, 0];
const SPARSE: [u32; 12] = [0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0];

struct MemorySource {
    orders: HashMap<PixelKey, Vec<NaiveDateTime>>,
}

impl MemorySource {
    /// Every pixel repeats its daily pattern from 70 days before `last_day`
    /// through `last_day`.
    fn new(patterns: &[(PixelKey, [u32; 12])], last_day: NaiveDate) -> Self {
        let orders = patterns
            .iter()
            .map(|(pixel, pattern)| {
                let mut placed = Vec::new();
                for back in 0..=70 {
                    let day = last_day - TimeDelta::days(back);
                    for (slot, &count) in pattern.iter().enumerate() {
                        for i in 0..count {
                            let minute = 5 + 6 * i;
                            placed.push(day.and_hms_opt(11 + slot as u32, minute, 0).unwrap());
                        }
                    }
                }
                (*pixel, placed)
            })
            .collect();
        Self { orders }
    }
}

impl OrderSource for MemorySource {
    fn orders_for_pixel(
        &self,
        pixel: &PixelKey,
        range: &DateRange,
    ) -> Result<Box<dyn Iterator<Item = NaiveDateTime> + '_>> {
        let range = *range;
        match self.orders.get(pixel) {
            Some(orders) => Ok(Box::new(
                orders.iter().copied().filter(move |ts| range.contains(ts.date())),
            )),
            None => Ok(Box::new(std::iter::empty())),
        }
    }
}

fn pixel(column: u32) -> PixelKey {
    PixelKey {
        side_length: 1000,
        row: 2,
        column,
    }
}

fn last_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 9, 30).unwrap()
}

fn source() -> MemorySource {
    MemorySource::new(
        &[(pixel(0), BUSY), (pixel(1), MEDIUM), (pixel(2), SPARSE)],
        last_day(),
    )
}

fn request(column: u32, origin: TimeBucket, horizon: usize, model: Option<ModelChoice>) -> ForecastRequest {
    ForecastRequest {
        pixel: pixel(column),
        origin,
        horizon,
        model_choice: model,
    }
}

fn forecast(forecaster: &Forecaster, request: &ForecastRequest) -> common::Forecast<PixelKey> {
    match forecaster.forecast(request, &source()).unwrap() {
        ForecastOutcome::Forecast(forecast) => forecast,
        ForecastOutcome::Unavailable { reason } => panic!("no forecast: {reason}"),
    }
}

#[test]
fn test_model_follows_average_daily_demand() {
    let forecaster = Forecaster::new(AppConfig::default()).unwrap();
    let origin = TimeBucket::new(last_day(), 11);
    let expected = [(0, "ensemble"), (1, "hets"), (2, "trivial")];
    for (column, model) in expected {
        let forecast = forecast(&forecaster, &request(column, origin, 1, None));
        assert_eq!(forecast.model, model, "pixel column {column}");
    }
}

#[test]
fn test_snaive_reproduces_daily_pattern() {
    let forecaster = Forecaster::new(AppConfig::default()).unwrap();
    let origin = TimeBucket::new(last_day(), 5);
    let forecast = forecast(
        &forecaster,
        &request(0, origin, 3, Some(ModelChoice::Snaive)),
    );
    assert_eq!(forecast.target, TimeBucket::new(last_day(), 8));
    assert!((forecast.prediction.point - BUSY[8] as f64).abs() < 1e-6);
    assert!(forecast.prediction.width() < 1e-6);
    assert_eq!(forecast.prediction.narrow.confidence, 0.8);
    assert_eq!(forecast.prediction.wide.confidence, 0.95);
    // The source already holds the whole last day.
    assert_eq!(forecast.actual, Some(BUSY[8]));
}

#[test]
fn test_actual_unknown_beyond_reported_orders() {
    let forecaster = Forecaster::new(AppConfig::default()).unwrap();
    let origin = TimeBucket::new(last_day(), 11);
    let forecast = forecast(&forecaster, &request(0, origin, 2, Some(ModelChoice::Snaive)));
    assert_eq!(forecast.target, TimeBucket::new(last_day() + TimeDelta::days(1), 1));
    assert_eq!(forecast.actual, None);
}

#[test]
fn test_intervals_nest_around_point() {
    let forecaster = Forecaster::new(AppConfig::default()).unwrap();
    let origin = TimeBucket::new(last_day() - TimeDelta::days(3), 6);
    for (column, model) in [(0, ModelChoice::Trend), (1, ModelChoice::Hets), (0, ModelChoice::Ensemble)] {
        let forecast = forecast(&forecaster, &request(column, origin, 5, Some(model)));
        let p = forecast.prediction;
        assert!(
            p.wide.lower <= p.narrow.lower
                && p.narrow.lower <= p.point
                && p.point <= p.narrow.upper
                && p.narrow.upper <= p.wide.upper,
            "{model}: {p:?}"
        );
        assert!(p.wide.lower >= 0.0);
        let pattern = if column == 0 { BUSY } else { MEDIUM };
        assert_eq!(forecast.actual, Some(pattern[forecast.target.slot as usize]));
    }
}

#[test]
fn test_ensemble_on_busy_pixel() {
    let forecaster = Forecaster::new(AppConfig::default()).unwrap();
    let origin = TimeBucket::new(last_day(), 11);
    let forecast = forecast(&forecaster, &request(0, origin, 4, None));
    assert_eq!(forecast.model, "ensemble");
    assert_eq!(forecast.target.slot, 3);
    assert!((forecast.prediction.point - BUSY[3] as f64).abs() < 1e-6);
}

#[test]
fn test_hets_uses_same_time_of_day() {
    let forecaster = Forecaster::new(AppConfig::default()).unwrap();
    // Target is 20:00 tomorrow; today's 20:00 bucket is not known yet.
    let origin = TimeBucket::new(last_day() - TimeDelta::days(1), 4);
    let forecast = forecast(
        &forecaster,
        &request(1, origin, 16, Some(ModelChoice::Hets)),
    );
    assert_eq!(forecast.model, "hets");
    assert_eq!(forecast.target, TimeBucket::new(last_day(), 8));
    assert!((forecast.prediction.point - MEDIUM[8] as f64).abs() < 1e-6);
}

#[test]
fn test_falls_back_when_history_too_short() {
    // Two weeks hold one season of 14 days, too few for Holt-Winters.
    let mut config = AppConfig::default();
    config.forecasting.train_horizon_weeks = 2;
    config.forecasting.horizontal_season = 14;
    let forecaster = Forecaster::new(config).unwrap();
    let origin = TimeBucket::new(last_day(), 11);
    let forecast = forecast(
        &forecaster,
        &request(1, origin, 1, Some(ModelChoice::Hets)),
    );
    assert_eq!(forecast.model, "snaive");
    assert!((forecast.prediction.point - MEDIUM[0] as f64).abs() < 1e-6);
}

#[test]
fn test_unavailable_when_every_model_lacks_history() {
    let mut config = AppConfig::default();
    config.forecasting.train_horizon_weeks = 1;
    let forecaster = Forecaster::new(config).unwrap();
    let origin = TimeBucket::new(last_day(), 11);
    for model in [ModelChoice::Ensemble, ModelChoice::Hets] {
        let outcome = forecaster
            .forecast(&request(0, origin, 1, Some(model)), &source())
            .unwrap();
        match outcome {
            ForecastOutcome::Unavailable { reason } => assert!(reason.starts_with("snaive")),
            ForecastOutcome::Forecast(f) => panic!("unexpected forecast from {}", f.model),
        }
    }
}

#[test]
fn test_forecast_many_keeps_request_order() {
    let forecaster = Forecaster::new(AppConfig::default()).unwrap();
    let origin = TimeBucket::new(last_day(), 11);
    let requests: Vec<ForecastRequest> = [2, 0, 1, 9]
        .into_iter()
        .map(|column| request(column, origin, 2, Some(ModelChoice::Snaive)))
        .collect();
    let source = source();
    let outcomes = forecaster.forecast_many(&requests, &source);

    assert_eq!(outcomes.len(), requests.len());
    for (request, outcome) in requests.iter().zip(&outcomes) {
        let forecast = outcome.as_ref().unwrap().forecast().unwrap();
        assert_eq!(forecast.pixel, request.pixel);
        let p = &forecast.prediction;
        assert!(p.is_nested(), "{p:?}");
    }
    // Unknown pixels have no orders.
    let unknown = outcomes[3].as_ref().unwrap().forecast().unwrap();
    assert_eq!(unknown.prediction.point, 0.0);
}

#[test]
fn test_outcome_serializes_model_name() {
    let forecaster = Forecaster::new(AppConfig::default()).unwrap();
    let origin = TimeBucket::new(last_day(), 11);
    let outcome = forecaster
        .forecast(&request(2, origin, 1, None), &source())
        .unwrap();
    let json = serde_json::to_string(&outcome).unwrap();
    assert!(json.contains("\"model\":\"trivial\""), "{json}");
    assert!(json.contains("\"actual\":null"), "{json}");
}
