use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use common::{
    AppConfig, Forecast, GridcastError, ModelCategory, ModelChoice, OperatingCalendar,
    OrderTimeSeries, Prediction, Result, TimeBucket,
};
use grid::PixelKey;
use rayon::prelude::*;
use selector::TacticalModelSelector;
use serde::{Deserialize, Serialize};
use timify::{
    aggregate, average_daily_demand, horizontal_window, realtime_periodicities, realtime_window,
    DateRange,
};
use tracing::{debug, info, warn};

/// Supplies the order timestamps of one pixel.
pub trait OrderSource: Sync {
    /// Placement times of the pixel's orders on the days of `range`.
    /// Timestamps outside the range are tolerated and dropped.
    fn orders_for_pixel(
        &self,
        pixel: &PixelKey,
        range: &DateRange,
    ) -> Result<Box<dyn Iterator<Item = NaiveDateTime> + '_>>;
}

/// One forecast to make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub pixel: PixelKey,
    /// Last bucket with known demand.
    pub origin: TimeBucket,
    /// Buckets ahead of `origin`, at least one.
    pub horizon: usize,
    /// Force a model instead of choosing one from the pixel's demand.
    pub model_choice: Option<ModelChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForecastOutcome {
    Forecast(Forecast<PixelKey>),
    /// Every model in the fallback chain lacked history.
    Unavailable { reason: String },
}

impl ForecastOutcome {
    pub fn forecast(&self) -> Option<&Forecast<PixelKey>> {
        match self {
            ForecastOutcome::Forecast(forecast) => Some(forecast),
            ForecastOutcome::Unavailable { .. } => None,
        }
    }
}

/// Forecasts pixel demand from the pixel's order history.
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: AppConfig,
    calendar: OperatingCalendar,
    selector: TacticalModelSelector,
}

impl Forecaster {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let calendar = OperatingCalendar::from_config(&config.calendar)?;
        let selector = TacticalModelSelector::new(config.selection.clone());
        Ok(Self {
            config,
            calendar,
            selector,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn calendar(&self) -> &OperatingCalendar {
        &self.calendar
    }

    /// Forecast one request.
    ///
    /// A model lacking history hands over to the next one in its fallback
    /// chain; when the chain is exhausted the outcome is `Unavailable`.
    /// Any other error is returned as is.
    pub fn forecast(
        &self,
        request: &ForecastRequest,
        source: &dyn OrderSource,
    ) -> Result<ForecastOutcome> {
        let target = self.target(request)?;
        let weeks = self.config.forecasting.train_horizon_weeks;
        info!(
            pixel = %request.pixel,
            origin = ?request.origin,
            horizon = request.horizon,
            "Starting forecast"
        );

        // Through the target's day so a known outcome can be reported; every
        // training window still ends at or before the origin.
        let range = DateRange::weeks_before(request.origin.day, weeks)?.through(target.day);
        let orders = source.orders_for_pixel(&request.pixel, &range)?;
        let history = aggregate(&self.calendar, orders, &range)?;
        let actual = known_actual(&history, target);

        let choice = match request.model_choice {
            Some(choice) => choice,
            None => {
                let add = average_daily_demand(&history, request.origin.day, weeks)?;
                self.selector.choose(add)
            }
        };

        let mut reason = String::new();
        for candidate in std::iter::once(choice).chain(self.selector.fallback_chain(choice)) {
            match self.predict_with(candidate, &history, request, target) {
                Ok((model, prediction)) => {
                    info!(
                        pixel = %request.pixel,
                        model = %model,
                        point = prediction.point,
                        actual = ?actual,
                        "Forecast complete"
                    );
                    return Ok(ForecastOutcome::Forecast(Forecast {
                        pixel: request.pixel,
                        origin: request.origin,
                        horizon: request.horizon,
                        target,
                        model,
                        prediction,
                        actual,
                    }));
                }
                Err(e) if e.is_insufficient_history() => {
                    warn!(pixel = %request.pixel, model = %candidate, error = %e, "Falling back");
                    reason = format!("{candidate}: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(pixel = %request.pixel, reason = %reason, "No forecast available");
        Ok(ForecastOutcome::Unavailable { reason })
    }

    /// Forecast every request in parallel; results keep the request order.
    pub fn forecast_many(
        &self,
        requests: &[ForecastRequest],
        source: &dyn OrderSource,
    ) -> Vec<Result<ForecastOutcome>> {
        info!(requests = requests.len(), "Forecasting in parallel");
        requests
            .par_iter()
            .map(|request| self.forecast(request, source))
            .collect()
    }

    fn target(&self, request: &ForecastRequest) -> Result<TimeBucket> {
        if request.horizon == 0 {
            return Err(GridcastError::InvalidInput(
                "forecast horizon must be at least one bucket".into(),
            ));
        }
        if request.origin.slot as usize >= self.calendar.buckets_per_day() {
            return Err(GridcastError::InvalidInput(format!(
                "origin slot {} outside the {} buckets of a day",
                request.origin.slot,
                self.calendar.buckets_per_day()
            )));
        }
        self.calendar
            .offset(request.origin, request.horizon as i64)
            .ok_or_else(|| GridcastError::InvalidInput("forecast target outside the calendar".into()))
    }

    /// Fit `choice` on its training window and predict `target`.
    fn predict_with(
        &self,
        choice: ModelChoice,
        history: &OrderTimeSeries,
        request: &ForecastRequest,
        target: TimeBucket,
    ) -> Result<(String, Prediction)> {
        let weeks = self.config.forecasting.train_horizon_weeks;
        let periodicities = realtime_periodicities(history);
        let model = models::create_model(choice, &self.config.forecasting, &periodicities)?;

        let (window, origin, horizon) = match model.category() {
            ModelCategory::Horizontal => {
                // Same time of day as the target, up to the last known day.
                let last_known = last_known_day(request.origin, target.slot);
                let next = TimeBucket::new(last_known + TimeDelta::days(1), target.slot);
                let window = horizontal_window(history, next, weeks)?;
                let days = (target.day - last_known).num_days() as usize;
                let origin = window.last();
                (window, origin, days)
            }
            ModelCategory::Realtime | ModelCategory::Composite => {
                let next = self.calendar.offset(request.origin, 1).ok_or_else(|| {
                    GridcastError::InvalidInput("origin at the end of the calendar".into())
                })?;
                let window = realtime_window(history, next, weeks)?;
                (window, request.origin, request.horizon)
            }
        };
        debug!(
            model = model.name(),
            category = ?model.category(),
            entries = window.len(),
            horizon = horizon,
            "Training window cut"
        );

        let fitted = model.fit(&window)?;
        let prediction = fitted.predict(origin, horizon)?;
        Ok((model.name().to_string(), prediction))
    }
}

/// Count at `target` once the source has reported orders at or after it.
/// Before that an empty bucket is indistinguishable from missing data.
fn known_actual(history: &OrderTimeSeries, target: TimeBucket) -> Option<u32> {
    match history.last_order_at() {
        Some(last) if last >= target => history.count_at(target),
        _ => None,
    }
}

/// Latest day whose bucket at `slot` is not after `origin`.
fn last_known_day(origin: TimeBucket, slot: u32) -> NaiveDate {
    if slot <= origin.slot {
        origin.day
    } else {
        origin.day - TimeDelta::days(1)
    }
}
