use augurs::prelude::*;
use common::{
    FittedModel, ForecastModel, GridcastError, Interval, IntervalLevels, ModelCategory,
    OrderTimeSeries, Prediction, Result, SeriesLattice, TimeBucket,
};
use decomposition::{decompose, Decomposition};
use tracing::debug;

/// How the seasonally adjusted series is extrapolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendMethod {
    /// Ordinary least squares line through the most recent entries.
    Linear,
    /// Non-seasonal AutoETS ("ZZN") from augurs.
    AutoEts,
}

/// Trend extrapolation on the real-time series (`trend`).
///
/// The series is decomposed, the seasonally adjusted part (level plus
/// residual) is extrapolated with `method`, and the seasonal components at
/// the target phase are added back.
#[derive(Debug, Clone)]
pub struct TrendExtrapolationModel {
    periodicities: Vec<usize>,
    method: TrendMethod,
    window: Option<usize>,
    levels: IntervalLevels,
}

impl TrendExtrapolationModel {
    pub fn new(
        periodicities: Vec<usize>,
        method: TrendMethod,
        window: Option<usize>,
        levels: IntervalLevels,
    ) -> Result<Self> {
        if matches!(window, Some(w) if w < 3) {
            return Err(GridcastError::Configuration(
                "trend window must cover at least 3 buckets".into(),
            ));
        }
        Ok(Self {
            periodicities,
            method,
            window,
            levels,
        })
    }
}

impl ForecastModel for TrendExtrapolationModel {
    fn name(&self) -> &str {
        "trend"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Realtime
    }

    fn fit(&self, series: &OrderTimeSeries) -> Result<Box<dyn FittedModel>> {
        let decomposition = decompose(&series.values(), &self.periodicities)?;
        if let Some(missing) = decomposition.seasonal.iter().find(|s| !s.estimated) {
            return Err(GridcastError::InsufficientHistory(format!(
                "periodicity {} needs {} buckets, history has {}",
                missing.periodicity,
                2 * missing.periodicity,
                series.len()
            )));
        }
        let adjusted = decomposition.seasonally_adjusted();
        if adjusted.len() < 3 {
            return Err(GridcastError::InsufficientHistory(format!(
                "trend extrapolation needs 3 buckets, history has {}",
                adjusted.len()
            )));
        }

        let extrapolation = match self.method {
            TrendMethod::Linear => {
                let window = self.window.unwrap_or(adjusted.len()).min(adjusted.len());
                Extrapolation::Linear(LinearFit::ols(&adjusted, window))
            }
            TrendMethod::AutoEts => Extrapolation::AutoEts(adjusted),
        };
        debug!(
            method = ?self.method,
            periodicities = ?self.periodicities,
            data_length = series.len(),
            "Trend extrapolation fitted"
        );

        Ok(Box::new(FittedTrend {
            lattice: series.lattice(),
            decomposition,
            extrapolation,
            levels: self.levels,
        }))
    }
}

/// Least squares line over absolute series positions.
#[derive(Debug, Clone, Copy)]
struct LinearFit {
    intercept: f64,
    slope: f64,
    residual_std: f64,
}

impl LinearFit {
    /// Fit the last `window` entries of `values`; `window >= 3`.
    fn ols(values: &[f64], window: usize) -> Self {
        let start = values.len() - window;
        let n = window as f64;
        let xs = (start..values.len()).map(|x| x as f64);
        let x_mean = xs.clone().sum::<f64>() / n;
        let y_mean = values[start..].iter().sum::<f64>() / n;

        let (sxy, sxx) = xs
            .zip(&values[start..])
            .fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
                let dx = x - x_mean;
                (sxy + dx * (y - y_mean), sxx + dx * dx)
            });
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = y_mean - slope * x_mean;

        let sse: f64 = values[start..]
            .iter()
            .enumerate()
            .map(|(i, y)| {
                let e = y - (intercept + slope * (start + i) as f64);
                e * e
            })
            .sum();
        Self {
            intercept,
            slope,
            residual_std: (sse / (n - 2.0)).sqrt(),
        }
    }

    fn at(&self, position: usize) -> f64 {
        self.intercept + self.slope * position as f64
    }
}

#[derive(Debug)]
enum Extrapolation {
    Linear(LinearFit),
    /// Adjusted series; AutoETS is fitted when a forecast is requested.
    AutoEts(Vec<f64>),
}

#[derive(Debug)]
struct FittedTrend {
    lattice: SeriesLattice,
    decomposition: Decomposition,
    extrapolation: Extrapolation,
    levels: IntervalLevels,
}

impl FittedTrend {
    /// Unclipped AutoETS forecast of the adjusted series `steps` ahead.
    fn auto_ets(&self, adjusted: &[f64], steps: usize) -> Result<(f64, Interval, Interval)> {
        let auto = augurs::ets::AutoETS::new(1, "ZZN")
            .map_err(|e| GridcastError::ModelError(format!("ETS init: {e}")))?;
        let fitted = auto
            .fit(adjusted)
            .map_err(|e| GridcastError::ModelError(format!("ETS fit: {e}")))?;

        let interval = |level: f64| -> Result<(f64, Interval)> {
            let forecast = fitted
                .predict(steps, level)
                .map_err(|e| GridcastError::ModelError(format!("ETS predict: {e}")))?;
            let point = forecast.point.get(steps - 1).copied().ok_or_else(|| {
                GridcastError::ModelError(format!("ETS returned no value for step {steps}"))
            })?;
            let (lower, upper) = forecast
                .intervals
                .as_ref()
                .and_then(|iv| Some((*iv.lower.get(steps - 1)?, *iv.upper.get(steps - 1)?)))
                .unwrap_or((point, point));
            Ok((point, Interval::new(lower, upper, level)))
        };
        let (point, narrow) = interval(self.levels.narrow())?;
        let (_, wide) = interval(self.levels.wide())?;
        Ok((point, narrow, wide))
    }
}

impl FittedModel for FittedTrend {
    fn name(&self) -> &str {
        "trend"
    }

    fn lattice(&self) -> &SeriesLattice {
        &self.lattice
    }

    fn predict(&self, origin: TimeBucket, horizon: usize) -> Result<Prediction> {
        let steps = self.lattice.steps_ahead(origin, horizon)?;
        let position = self.lattice.len - 1 + steps;
        let (point, narrow, wide) = match &self.extrapolation {
            Extrapolation::Linear(line) => {
                let point = line.at(position);
                let std = line.residual_std * (steps as f64).sqrt();
                let (narrow, wide) = self.levels.normal(point, std);
                (point, narrow, wide)
            }
            Extrapolation::AutoEts(values) => self.auto_ets(values, steps)?,
        };
        // Clip only once the seasonality is back in.
        let adjusted = Prediction {
            point,
            narrow,
            wide,
        };
        Ok(adjusted.shifted(self.decomposition.seasonal_at(position)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::OperatingCalendar;

    fn levels() -> IntervalLevels {
        IntervalLevels::new(0.8, 0.95).unwrap()
    }

    fn hourly(counts: Vec<u32>) -> OrderTimeSeries {
        let calendar = OperatingCalendar::full_day(60).unwrap();
        let first = TimeBucket::new(NaiveDate::from_ymd_opt(2016, 7, 4).unwrap(), 0);
        OrderTimeSeries::new(calendar, first, 1, counts).unwrap()
    }

    #[test]
    fn test_linear_line_is_extrapolated() {
        let line = LinearFit::ols(&[1.0, 3.0, 5.0, 7.0, 9.0], 5);
        assert!((line.slope - 2.0).abs() < 1e-12);
        assert!((line.intercept - 1.0).abs() < 1e-12);
        assert!(line.residual_std < 1e-12);
        assert!((line.at(7) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_uses_latest_entries() {
        // Flat, then rising: only the rising tail is in the window.
        let values = [5.0, 5.0, 5.0, 5.0, 6.0, 7.0, 8.0];
        let line = LinearFit::ols(&values, 4);
        assert!((line.slope - 1.0).abs() < 1e-12);
        assert!((line.at(7) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_rising_periodic_series() {
        // Daily profile on top of a slow upward drift.
        let counts = (0..24 * 7)
            .map(|t: u32| 10 + t / 24 + if t % 24 < 12 { 4 } else { 0 })
            .collect();
        let series = hourly(counts);
        let model = TrendExtrapolationModel::new(vec![24], TrendMethod::Linear, None, levels()).unwrap();
        let fitted = model.fit(&series).unwrap();

        let busy = fitted.predict(series.last(), 1).unwrap();
        let quiet = fitted.predict(series.last(), 13).unwrap();
        assert!(busy.point > quiet.point, "{} <= {}", busy.point, quiet.point);
        assert!(busy.point > 14.0);
        for p in [busy, quiet] {
            assert!(p.is_nested(), "{p:?}");
        }
    }

    #[test]
    fn test_auto_ets_forecast_is_valid() {
        let counts = (0..24 * 7)
            .map(|t: u32| 6 + (t % 24) / 4 + (t * 7919 % 3))
            .collect();
        let series = hourly(counts);
        let model = TrendExtrapolationModel::new(vec![24], TrendMethod::AutoEts, None, levels()).unwrap();
        let fitted = model.fit(&series).unwrap();
        let p = fitted.predict(series.last(), 2).unwrap();
        assert!(p.point > 0.0);
        assert!(p.is_nested(), "{p:?}");
        assert_eq!(p.narrow.confidence, 0.8);
        assert_eq!(p.wide.confidence, 0.95);
    }

    #[test]
    fn test_missing_periodicity_is_insufficient_history() {
        let series = hourly(vec![2; 24 * 3]);
        let model =
            TrendExtrapolationModel::new(vec![24, 168], TrendMethod::Linear, None, levels()).unwrap();
        assert!(model.fit(&series).unwrap_err().is_insufficient_history());
    }

    #[test]
    fn test_needs_three_points() {
        let series = hourly(vec![2, 3]);
        let model = TrendExtrapolationModel::new(vec![], TrendMethod::Linear, None, levels()).unwrap();
        assert!(model.fit(&series).unwrap_err().is_insufficient_history());
    }

    #[test]
    fn test_window_too_short_rejected() {
        assert!(TrendExtrapolationModel::new(vec![24], TrendMethod::Linear, Some(2), levels()).is_err());
    }
}
