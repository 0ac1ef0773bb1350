use std::path::Path;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GridcastError, IntervalLevels, Result};

/// Application-level configuration, mirrors config/app_config.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gridify: GridifyConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub forecasting: ForecastingConfig,

    #[serde(default)]
    pub selection: SelectionConfig,
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Reject values no component could work with.
    ///
    /// The calendar is checked again, more thoroughly, when an
    /// `OperatingCalendar` is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.gridify.side_lengths.is_empty() {
            return Err(GridcastError::Configuration(
                "at least one grid side length is required".into(),
            ));
        }
        if self.gridify.side_lengths.contains(&0) {
            return Err(GridcastError::Configuration(
                "grid side lengths must be positive".into(),
            ));
        }
        self.forecasting.interval_levels()?;
        if self.forecasting.train_horizon_weeks == 0 {
            return Err(GridcastError::Configuration(
                "training horizon must cover at least one week".into(),
            ));
        }
        if self.forecasting.backtest_origins == 0 {
            return Err(GridcastError::Configuration(
                "ensemble backtest needs at least one origin".into(),
            ));
        }
        if self.forecasting.backtest_horizon == 0 {
            return Err(GridcastError::Configuration(
                "backtest horizon must be at least one bucket".into(),
            ));
        }
        if self.forecasting.horizontal_season < 2 {
            return Err(GridcastError::Configuration(
                "horizontal season length must be at least 2".into(),
            ));
        }
        let s = &self.selection;
        if !(s.high_demand >= s.medium_demand && s.medium_demand >= s.low_demand) {
            return Err(GridcastError::Configuration(
                "demand thresholds must be ordered high >= medium >= low".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridifyConfig {
    /// Pixel side lengths in metres, one grid per entry.
    #[serde(default = "default_side_lengths")]
    pub side_lengths: Vec<u32>,
}

impl Default for GridifyConfig {
    fn default() -> Self {
        Self {
            side_lengths: default_side_lengths(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Minutes after midnight at which the operating day starts.
    #[serde(default = "default_day_start_minutes")]
    pub day_start_minutes: u32,
    #[serde(default = "default_day_length_minutes")]
    pub day_length_minutes: u32,
    #[serde(default = "default_bucket_minutes")]
    pub bucket_minutes: u32,
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            day_start_minutes: default_day_start_minutes(),
            day_length_minutes: default_day_length_minutes(),
            bucket_minutes: default_bucket_minutes(),
            week_start: default_week_start(),
        }
    }
}

/// How an ensemble turns its candidates' backtest errors into one forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationRule {
    /// Use the candidate with the lowest backtest MAE (first one on ties).
    SelectBest,
    /// Average all candidates with weights proportional to 1 / MAE.
    InverseErrorWeighted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastingConfig {
    #[serde(default = "default_train_horizon_weeks")]
    pub train_horizon_weeks: u32,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Level of the wider interval stored next to the `confidence_level` one.
    #[serde(default = "default_wide_confidence_level")]
    pub wide_confidence_level: f64,
    #[serde(default = "default_backtest_origins")]
    pub backtest_origins: usize,
    #[serde(default = "default_backtest_horizon")]
    pub backtest_horizon: usize,
    #[serde(default = "default_combination")]
    pub combination: CombinationRule,
    /// Number of trailing points used by the linear trend fit; all when unset.
    #[serde(default)]
    pub trend_window: Option<usize>,
    #[serde(default = "default_horizontal_season")]
    pub horizontal_season: usize,
}

impl Default for ForecastingConfig {
    fn default() -> Self {
        Self {
            train_horizon_weeks: default_train_horizon_weeks(),
            confidence_level: default_confidence_level(),
            wide_confidence_level: default_wide_confidence_level(),
            backtest_origins: default_backtest_origins(),
            backtest_horizon: default_backtest_horizon(),
            combination: default_combination(),
            trend_window: None,
            horizontal_season: default_horizontal_season(),
        }
    }
}

impl ForecastingConfig {
    pub fn interval_levels(&self) -> Result<IntervalLevels> {
        IntervalLevels::new(self.confidence_level, self.wide_confidence_level)
    }
}

/// Average-daily-demand thresholds (orders per day) for tactical model choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_high_demand")]
    pub high_demand: f64,
    #[serde(default = "default_medium_demand")]
    pub medium_demand: f64,
    #[serde(default = "default_low_demand")]
    pub low_demand: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            high_demand: default_high_demand(),
            medium_demand: default_medium_demand(),
            low_demand: default_low_demand(),
        }
    }
}

fn default_side_lengths() -> Vec<u32> {
    vec![707, 1000, 1414]
}
fn default_day_start_minutes() -> u32 {
    11 * 60
}
fn default_day_length_minutes() -> u32 {
    12 * 60
}
fn default_bucket_minutes() -> u32 {
    60
}
fn default_week_start() -> Weekday {
    Weekday::Mon
}
fn default_train_horizon_weeks() -> u32 {
    8
}
fn default_confidence_level() -> f64 {
    0.8
}
fn default_wide_confidence_level() -> f64 {
    0.95
}
fn default_backtest_origins() -> usize {
    7
}
fn default_backtest_horizon() -> usize {
    1
}
fn default_combination() -> CombinationRule {
    CombinationRule::SelectBest
}
fn default_horizontal_season() -> usize {
    7
}
fn default_high_demand() -> f64 {
    25.0
}
fn default_medium_demand() -> f64 {
    10.0
}
fn default_low_demand() -> f64 {
    2.5
}
