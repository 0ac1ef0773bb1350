//! Holt-Winters exponential smoothing (`hets`).
//!
//! Additive seasonality with no, linear or damped trend. Each candidate form
//! is fitted by minimising the one-step-ahead squared error with Nelder-Mead;
//! the form with the lowest AICc is kept.

use common::{
    FittedModel, ForecastModel, GridcastError, IntervalLevels, ModelCategory, OrderTimeSeries,
    Prediction, Result, SeriesLattice, TimeBucket,
};
use tracing::debug;

use crate::optimize::{minimize, Bounds};

// -----------------------------------------------------------------------
// Model forms
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trend {
    None,
    Linear,
    Damped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Form {
    trend: Trend,
    seasonal: bool,
}

impl Form {
    const ALL: [Form; 6] = [
        Form { trend: Trend::None, seasonal: false },
        Form { trend: Trend::None, seasonal: true },
        Form { trend: Trend::Linear, seasonal: false },
        Form { trend: Trend::Linear, seasonal: true },
        Form { trend: Trend::Damped, seasonal: false },
        Form { trend: Trend::Damped, seasonal: true },
    ];

    fn has_trend(&self) -> bool {
        self.trend != Trend::None
    }

    /// Smoothing parameters plus initial states.
    fn n_params(&self, season: usize) -> usize {
        let smoothing = 1
            + usize::from(self.has_trend())
            + usize::from(self.seasonal)
            + usize::from(self.trend == Trend::Damped);
        let states = 1 + usize::from(self.has_trend()) + if self.seasonal { season } else { 0 };
        smoothing + states
    }

    /// Start, lower and upper bounds of `[alpha, beta?, gamma?, phi?]`.
    fn search_space(&self) -> (Vec<f64>, Bounds) {
        let mut start = vec![0.3];
        let mut lower = vec![0.001];
        let mut upper = vec![0.999];
        if self.has_trend() {
            start.push(0.05);
            lower.push(0.001);
            upper.push(0.5);
        }
        if self.seasonal {
            start.push(0.1);
            lower.push(0.001);
            upper.push(0.999);
        }
        if self.trend == Trend::Damped {
            start.push(0.95);
            lower.push(0.8);
            upper.push(0.999);
        }
        (start, Bounds { lower, upper })
    }

    fn smoothing(&self, raw: &[f64]) -> Smoothing {
        let mut raw = raw.iter().copied();
        let alpha = raw.next().unwrap_or(0.3);
        let beta = if self.has_trend() { raw.next().unwrap_or(0.0) } else { 0.0 };
        let gamma = if self.seasonal { raw.next().unwrap_or(0.0) } else { 0.0 };
        let phi = match self.trend {
            Trend::Damped => raw.next().unwrap_or(1.0),
            _ => 1.0,
        };
        Smoothing {
            alpha,
            beta,
            gamma,
            phi,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Smoothing {
    alpha: f64,
    beta: f64,
    gamma: f64,
    phi: f64,
}

// -----------------------------------------------------------------------
// Fitting
// -----------------------------------------------------------------------

/// Final smoothing state of one fitted form.
#[derive(Debug, Clone)]
pub(crate) struct HwState {
    form: Form,
    smoothing: Smoothing,
    level: f64,
    trend: f64,
    /// Indexed by position modulo the season length.
    seasonal: Vec<f64>,
    n: usize,
    sse: f64,
}

impl HwState {
    /// Point forecast `steps` positions after the last observation.
    pub(crate) fn point(&self, steps: usize) -> f64 {
        let m = self.seasonal.len();
        let phi = self.smoothing.phi;
        let damped_steps = if (phi - 1.0).abs() < 1e-12 {
            steps as f64
        } else {
            phi * (1.0 - phi.powi(steps as i32)) / (1.0 - phi)
        };
        let trend = if self.form.has_trend() {
            damped_steps * self.trend
        } else {
            0.0
        };
        let season = if self.form.seasonal {
            self.seasonal[(self.n + steps - 1) % m]
        } else {
            0.0
        };
        self.level + trend + season
    }

    /// Standard deviation of the in-sample one-step errors.
    pub(crate) fn residual_std(&self) -> f64 {
        let m = self.seasonal.len();
        let dof = self.n.saturating_sub(m).max(1);
        (self.sse / dof as f64).sqrt()
    }

    fn aicc(&self) -> f64 {
        let n = self.n as f64;
        let k = self.form.n_params(self.seasonal.len()) as f64;
        let mse = (self.sse / n).max(1e-300);
        if n - k - 1.0 <= 0.0 {
            return f64::INFINITY;
        }
        n * mse.ln() + 2.0 * k + 2.0 * k * (k + 1.0) / (n - k - 1.0)
    }
}

/// Run the smoothing recursions over `values`; the first season only
/// initialises the states.
fn smooth(values: &[f64], m: usize, form: Form, s: Smoothing) -> HwState {
    let first: f64 = values[..m].iter().sum::<f64>() / m as f64;
    let mut level = first;
    let mut trend = if form.has_trend() {
        let second: f64 = values[m..2 * m].iter().sum::<f64>() / m as f64;
        (second - first) / m as f64
    } else {
        0.0
    };
    let mut seasonal: Vec<f64> = if form.seasonal {
        values[..m].iter().map(|v| v - first).collect()
    } else {
        vec![0.0; m]
    };

    let mut sse = 0.0;
    for (t, &y) in values.iter().enumerate().skip(m) {
        let season = seasonal[t % m];
        let expected = level + s.phi * trend + season;
        let error = y - expected;
        sse += error * error;

        let previous = level;
        level = s.alpha * (y - season) + (1.0 - s.alpha) * (previous + s.phi * trend);
        if form.has_trend() {
            trend = s.beta * (level - previous) + (1.0 - s.beta) * s.phi * trend;
        }
        if form.seasonal {
            seasonal[t % m] = s.gamma * (y - level) + (1.0 - s.gamma) * season;
        }
    }

    HwState {
        form,
        smoothing: s,
        level,
        trend,
        seasonal,
        n: values.len(),
        sse,
    }
}

fn fit_form(values: &[f64], m: usize, form: Form) -> HwState {
    let (start, bounds) = form.search_space();
    let best = minimize(
        |raw| smooth(values, m, form, form.smoothing(raw)).sse,
        &start,
        &bounds,
        200,
        1e-6,
    );
    smooth(values, m, form, form.smoothing(&best))
}

/// Fit every form and keep the one with the lowest AICc.
pub(crate) fn fit_best(values: &[f64], m: usize) -> Result<HwState> {
    if m < 2 {
        return Err(GridcastError::Configuration(format!(
            "Holt-Winters season length must be at least 2, got {m}"
        )));
    }
    if values.len() < 2 * m {
        return Err(GridcastError::InsufficientHistory(format!(
            "Holt-Winters needs two full seasons ({} points), got {}",
            2 * m,
            values.len()
        )));
    }

    let mut best: Option<(f64, HwState)> = None;
    for form in Form::ALL {
        let state = fit_form(values, m, form);
        let aicc = state.aicc();
        if !state.sse.is_finite() || aicc.is_nan() {
            continue;
        }
        debug!(
            trend = ?form.trend,
            seasonal = form.seasonal,
            sse = state.sse,
            aicc = aicc,
            alpha = state.smoothing.alpha,
            "Holt-Winters candidate"
        );
        if best.as_ref().map_or(true, |(b, _)| aicc < *b) {
            best = Some((aicc, state));
        }
    }

    let (aicc, state) = best
        .ok_or_else(|| GridcastError::ModelError("all Holt-Winters forms failed".into()))?;
    debug!(
        trend = ?state.form.trend,
        seasonal = state.form.seasonal,
        aicc = aicc,
        "Holt-Winters form selected"
    );
    Ok(state)
}

// -----------------------------------------------------------------------
// Forecast model
// -----------------------------------------------------------------------

/// Holt-Winters on the horizontal series, seasonal over `season` days.
#[derive(Debug, Clone)]
pub struct HoltWintersModel {
    season: usize,
    levels: IntervalLevels,
}

impl HoltWintersModel {
    pub fn new(season: usize, levels: IntervalLevels) -> Result<Self> {
        if season < 2 {
            return Err(GridcastError::Configuration(format!(
                "Holt-Winters season length must be at least 2, got {season}"
            )));
        }
        Ok(Self { season, levels })
    }
}

impl ForecastModel for HoltWintersModel {
    fn name(&self) -> &str {
        "hets"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Horizontal
    }

    fn fit(&self, series: &OrderTimeSeries) -> Result<Box<dyn FittedModel>> {
        debug!(
            season = self.season,
            data_length = series.len(),
            "Holt-Winters fitting"
        );
        let state = fit_best(&series.values(), self.season)?;
        Ok(Box::new(FittedHoltWinters {
            lattice: series.lattice(),
            state,
            levels: self.levels,
        }))
    }
}

#[derive(Debug)]
struct FittedHoltWinters {
    lattice: SeriesLattice,
    state: HwState,
    levels: IntervalLevels,
}

impl FittedModel for FittedHoltWinters {
    fn name(&self) -> &str {
        "hets"
    }

    fn lattice(&self) -> &SeriesLattice {
        &self.lattice
    }

    fn predict(&self, origin: TimeBucket, horizon: usize) -> Result<Prediction> {
        let steps = self.lattice.steps_ahead(origin, horizon)?;
        let point = self.state.point(steps);
        let std = self.state.residual_std() * (steps as f64).sqrt();
        Ok(Prediction::from_normal(point, std, &self.levels))
    }
}
