use serde::{Deserialize, Serialize};

use crate::metrics::z_score;
use crate::{GridcastError, OrderTimeSeries, Result, SeriesLattice, TimeBucket};

/// Which training window a model expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    /// Fit on the same time of day over consecutive days.
    Horizontal,
    /// Fit on the contiguous series up to the forecast origin.
    Realtime,
    /// Delegates to other models; window follows its candidates.
    Composite,
}

/// Trait that all forecast models must implement.
pub trait ForecastModel: Send + Sync {
    /// Returns the model's name.
    fn name(&self) -> &str;

    /// Returns the window the model is meant to be fitted on.
    fn category(&self) -> ModelCategory;

    /// Fit on the provided order counts.
    ///
    /// Models whose parameters need a minimum amount of data (`trend`,
    /// `hets`) return `InsufficientHistory` here already. Models that can
    /// always be fitted (`snaive`) report missing seasonal history from
    /// `FittedModel::predict` instead. Callers treat both alike.
    fn fit(&self, series: &OrderTimeSeries) -> Result<Box<dyn FittedModel>>;
}

/// A model fitted to one series, able to extrapolate it.
pub trait FittedModel: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Lattice of the series the model was fitted on.
    fn lattice(&self) -> &SeriesLattice;

    /// Predict the bucket `horizon` lattice steps after `origin`, the last
    /// bucket with known demand.
    fn predict(&self, origin: TimeBucket, horizon: usize) -> Result<Prediction>;
}

/// Two-sided prediction interval at one confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
    /// Coverage of `[lower, upper]`, e.g. 0.8.
    pub confidence: f64,
}

impl Interval {
    pub fn new(lower: f64, upper: f64, confidence: f64) -> Self {
        Self {
            lower,
            upper,
            confidence,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    fn shifted(self, offset: f64) -> Self {
        Self::new(self.lower + offset, self.upper + offset, self.confidence)
    }
}

/// The two confidence levels every prediction carries, with their normal
/// quantiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalLevels {
    narrow: f64,
    wide: f64,
    z_narrow: f64,
    z_wide: f64,
}

impl IntervalLevels {
    /// Both levels must lie in (0, 1) and `narrow < wide`.
    pub fn new(narrow: f64, wide: f64) -> Result<Self> {
        let z_narrow = z_score(narrow)?;
        let z_wide = z_score(wide)?;
        if narrow >= wide {
            return Err(GridcastError::Configuration(format!(
                "narrow confidence level {narrow} must be below the wide level {wide}"
            )));
        }
        Ok(Self {
            narrow,
            wide,
            z_narrow,
            z_wide,
        })
    }

    pub fn narrow(&self) -> f64 {
        self.narrow
    }

    pub fn wide(&self) -> f64 {
        self.wide
    }

    /// Unclipped symmetric intervals `point ± z * std` at both levels.
    pub fn normal(&self, point: f64, std: f64) -> (Interval, Interval) {
        let std = std.max(0.0);
        let around = |z: f64, confidence| Interval::new(point - z * std, point + z * std, confidence);
        (around(self.z_narrow, self.narrow), around(self.z_wide, self.wide))
    }
}

/// Point forecast with a narrow and a wide prediction interval.
///
/// Always `0 <= wide.lower <= narrow.lower <= point <= narrow.upper <= wide.upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub point: f64,
    /// Interval at the configured confidence level, 80% by default.
    pub narrow: Interval,
    /// Interval at the wide confidence level, 95% by default.
    pub wide: Interval,
}

impl Prediction {
    /// Build a prediction, clipping it to non-negative demand and nesting the
    /// intervals around the point.
    pub fn clipped(point: f64, narrow: Interval, wide: Interval) -> Self {
        let point = point.max(0.0);
        let narrow_lower = narrow.lower.max(0.0).min(point);
        let narrow_upper = narrow.upper.max(point);
        let wide_lower = wide.lower.max(0.0).min(narrow_lower);
        let wide_upper = wide.upper.max(narrow_upper);
        Self {
            point,
            narrow: Interval::new(narrow_lower, narrow_upper, narrow.confidence),
            wide: Interval::new(wide_lower, wide_upper, wide.confidence),
        }
    }

    /// Symmetric normal intervals around `point` at both levels.
    pub fn from_normal(point: f64, std: f64, levels: &IntervalLevels) -> Self {
        let (narrow, wide) = levels.normal(point, std);
        Self::clipped(point, narrow, wide)
    }

    /// Move the point and both intervals by `offset`, then clip again.
    pub fn shifted(&self, offset: f64) -> Self {
        Self::clipped(
            self.point + offset,
            self.narrow.shifted(offset),
            self.wide.shifted(offset),
        )
    }

    /// Width of the narrow interval.
    pub fn width(&self) -> f64 {
        self.narrow.width()
    }

    /// True when the intervals nest around the point as documented.
    pub fn is_nested(&self) -> bool {
        0.0 <= self.wide.lower
            && self.wide.lower <= self.narrow.lower
            && self.narrow.lower <= self.point
            && self.point <= self.narrow.upper
            && self.narrow.upper <= self.wide.upper
    }
}

/// Tactical forecasting models, as named in stored forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    /// Zero forecast for pixels with hardly any demand.
    Trivial,
    /// Seasonal naive on the real-time series.
    Snaive,
    /// Seasonally adjusted trend extrapolation on the real-time series.
    Trend,
    /// Holt-Winters exponential smoothing on the horizontal series.
    Hets,
    /// Backtested combination of the other models.
    Ensemble,
}

impl ModelChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Trivial => "trivial",
            ModelChoice::Snaive => "snaive",
            ModelChoice::Trend => "trend",
            ModelChoice::Hets => "hets",
            ModelChoice::Ensemble => "ensemble",
        }
    }
}

impl std::fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelChoice {
    type Err = crate::GridcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "trivial" => Ok(ModelChoice::Trivial),
            "snaive" => Ok(ModelChoice::Snaive),
            "trend" => Ok(ModelChoice::Trend),
            "hets" => Ok(ModelChoice::Hets),
            "ensemble" => Ok(ModelChoice::Ensemble),
            other => Err(crate::GridcastError::InvalidInput(format!(
                "unknown model '{other}'"
            ))),
        }
    }
}

/// One stored forecast for a pixel.
///
/// `pixel` is kept generic so the record does not depend on the grid crate;
/// the predictor fills it with a `PixelKey`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast<P> {
    pub pixel: P,
    pub origin: TimeBucket,
    pub horizon: usize,
    pub target: TimeBucket,
    pub model: String,
    pub prediction: Prediction,
    /// Observed count at `target`, when the history already covers it.
    pub actual: Option<u32>,
}
