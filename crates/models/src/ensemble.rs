//! Backtested combination of sibling models (`ensemble`).

use std::sync::Arc;

use common::metrics::mae;
use common::{
    CombinationRule, FittedModel, ForecastModel, GridcastError, Interval, ModelCategory,
    OrderTimeSeries, Prediction, Result, SeriesLattice, TimeBucket,
};
use tracing::{debug, warn};

/// Scores each candidate with a rolling-origin backtest and combines the
/// survivors according to `rule`.
pub struct EnsembleModel {
    candidates: Vec<Arc<dyn ForecastModel>>,
    backtest_origins: usize,
    backtest_horizon: usize,
    rule: CombinationRule,
}

impl EnsembleModel {
    pub fn new(
        candidates: Vec<Arc<dyn ForecastModel>>,
        backtest_origins: usize,
        backtest_horizon: usize,
        rule: CombinationRule,
    ) -> Result<Self> {
        if candidates.is_empty() {
            return Err(GridcastError::Configuration(
                "ensemble needs at least one candidate".into(),
            ));
        }
        if backtest_origins == 0 || backtest_horizon == 0 {
            return Err(GridcastError::Configuration(format!(
                "ensemble backtest needs positive origins and horizon, got {backtest_origins} and {backtest_horizon}"
            )));
        }
        Ok(Self {
            candidates,
            backtest_origins,
            backtest_horizon,
            rule,
        })
    }

    /// Mean absolute error of `candidate` over the last `backtest_origins`
    /// entries, each forecast `backtest_horizon` steps ahead.
    fn backtest(&self, candidate: &dyn ForecastModel, series: &OrderTimeSeries) -> Result<f64> {
        let h = self.backtest_horizon;
        let n = series.len();
        let counts = series.counts();

        let mut forecasts = Vec::with_capacity(self.backtest_origins);
        let mut actuals = Vec::with_capacity(self.backtest_origins);
        for t in n - self.backtest_origins..n {
            let train = series.head(t + 1 - h)?;
            let fitted = candidate.fit(&train)?;
            let prediction = fitted.predict(train.last(), h)?;
            forecasts.push(prediction.point);
            actuals.push(f64::from(counts[t]));
        }
        let error = mae(&forecasts, &actuals);
        if !error.is_finite() {
            return Err(GridcastError::ModelError(format!(
                "{} produced a non-finite backtest error",
                candidate.name()
            )));
        }
        Ok(error)
    }

    fn weights(&self, scores: &[(usize, f64)]) -> Vec<(usize, f64)> {
        match self.rule {
            CombinationRule::SelectBest => {
                // Strict comparison keeps the earlier candidate on ties.
                let best = scores
                    .iter()
                    .copied()
                    .reduce(|best, next| if next.1 < best.1 { next } else { best });
                best.map(|(i, _)| vec![(i, 1.0)]).unwrap_or_default()
            }
            CombinationRule::InverseErrorWeighted => {
                let inverse: Vec<(usize, f64)> = scores
                    .iter()
                    .map(|&(i, error)| (i, 1.0 / (error + 1e-10)))
                    .collect();
                let total: f64 = inverse.iter().map(|(_, w)| w).sum();
                inverse.into_iter().map(|(i, w)| (i, w / total)).collect()
            }
        }
    }
}

impl ForecastModel for EnsembleModel {
    fn name(&self) -> &str {
        "ensemble"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Composite
    }

    fn fit(&self, series: &OrderTimeSeries) -> Result<Box<dyn FittedModel>> {
        if series.len() < self.backtest_origins + self.backtest_horizon {
            return Err(GridcastError::InsufficientHistory(format!(
                "ensemble backtest needs {} buckets, history has {}",
                self.backtest_origins + self.backtest_horizon,
                series.len()
            )));
        }

        let mut scores = Vec::with_capacity(self.candidates.len());
        for (i, candidate) in self.candidates.iter().enumerate() {
            match self.backtest(candidate.as_ref(), series) {
                Ok(error) => {
                    debug!(candidate = candidate.name(), mae = error, "Ensemble backtest");
                    scores.push((i, error));
                }
                Err(e) => warn!(candidate = candidate.name(), error = %e, "Ensemble candidate excluded"),
            }
        }

        let mut members = Vec::new();
        for (i, weight) in self.weights(&scores) {
            let candidate = &self.candidates[i];
            match candidate.fit(series) {
                Ok(fitted) => members.push(Member { fitted, weight }),
                Err(e) => warn!(candidate = candidate.name(), error = %e, "Ensemble candidate excluded"),
            }
        }
        if members.is_empty() {
            return Err(GridcastError::InsufficientHistory(
                "no ensemble candidate survived the backtest".into(),
            ));
        }

        // Renormalise in case a refit dropped a member.
        let total: f64 = members.iter().map(|m| m.weight).sum();
        for member in &mut members {
            member.weight /= total;
        }
        debug!(
            rule = ?self.rule,
            members = ?members.iter().map(|m| (m.fitted.name().to_string(), m.weight)).collect::<Vec<_>>(),
            "Ensemble fitted"
        );

        Ok(Box::new(FittedEnsemble {
            lattice: series.lattice(),
            members,
        }))
    }
}

#[derive(Debug)]
struct Member {
    fitted: Box<dyn FittedModel>,
    weight: f64,
}

#[derive(Debug)]
struct FittedEnsemble {
    lattice: SeriesLattice,
    members: Vec<Member>,
}

impl FittedModel for FittedEnsemble {
    fn name(&self) -> &str {
        "ensemble"
    }

    fn lattice(&self) -> &SeriesLattice {
        &self.lattice
    }

    fn predict(&self, origin: TimeBucket, horizon: usize) -> Result<Prediction> {
        self.lattice.steps_ahead(origin, horizon)?;
        let mut point = 0.0;
        let mut narrow = Interval::new(0.0, 0.0, 0.0);
        let mut wide = Interval::new(0.0, 0.0, 0.0);
        for member in &self.members {
            let p = member.fitted.predict(origin, horizon)?;
            point += member.weight * p.point;
            for (sum, part) in [(&mut narrow, p.narrow), (&mut wide, p.wide)] {
                sum.lower += member.weight * part.lower;
                sum.upper += member.weight * part.upper;
                sum.confidence += member.weight * part.confidence;
            }
        }
        Ok(Prediction::clipped(point, narrow, wide))
    }
}
