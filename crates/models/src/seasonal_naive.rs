use common::{
    FittedModel, ForecastModel, GridcastError, IntervalLevels, ModelCategory, OrderTimeSeries,
    Prediction, Result, SeriesLattice, TimeBucket,
};
use decomposition::{decompose, Decomposition};
use tracing::debug;

/// Seasonal naive model (`snaive`): the last level plus the seasonal profiles
/// at the target's phase.
///
/// The level averages the trailing window of the longest periodicity, so a
/// single unusual last bucket does not carry over to every horizon. Interval
/// widths grow with the number of shortest cycles between origin and target.
#[derive(Debug, Clone)]
pub struct SeasonalNaiveModel {
    periodicities: Vec<usize>,
    levels: IntervalLevels,
}

impl SeasonalNaiveModel {
    pub fn new(periodicities: Vec<usize>, levels: IntervalLevels) -> Self {
        Self {
            periodicities,
            levels,
        }
    }
}

impl ForecastModel for SeasonalNaiveModel {
    fn name(&self) -> &str {
        "snaive"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Realtime
    }

    fn fit(&self, series: &OrderTimeSeries) -> Result<Box<dyn FittedModel>> {
        let decomposition = decompose(&series.values(), &self.periodicities)?;
        debug!(
            periodicities = ?self.periodicities,
            data_length = series.len(),
            complete = decomposition.is_complete(),
            "SeasonalNaive fitted"
        );
        Ok(Box::new(FittedSeasonalNaive {
            lattice: series.lattice(),
            decomposition,
            levels: self.levels,
        }))
    }
}

#[derive(Debug)]
struct FittedSeasonalNaive {
    lattice: SeriesLattice,
    decomposition: Decomposition,
    levels: IntervalLevels,
}

impl FittedSeasonalNaive {
    fn periodicities(&self) -> impl Iterator<Item = usize> + '_ {
        self.decomposition.seasonal.iter().map(|s| s.periodicity)
    }
}

impl FittedModel for FittedSeasonalNaive {
    fn name(&self) -> &str {
        "snaive"
    }

    fn lattice(&self) -> &SeriesLattice {
        &self.lattice
    }

    fn predict(&self, origin: TimeBucket, horizon: usize) -> Result<Prediction> {
        let steps = self.lattice.steps_ahead(origin, horizon)?;
        if let Some(missing) = self.decomposition.seasonal.iter().find(|s| !s.estimated) {
            return Err(GridcastError::InsufficientHistory(format!(
                "periodicity {} needs {} buckets, history has {}",
                missing.periodicity,
                2 * missing.periodicity,
                self.lattice.len
            )));
        }
        let level = self.decomposition.last_level().unwrap_or(0.0);
        let position = self.lattice.len - 1 + steps;
        let point = level + self.decomposition.seasonal_at(position);

        let shortest = self.periodicities().min().unwrap_or(1);
        let cycles = (steps - 1) / shortest;
        let std = self.decomposition.residual_std() * ((cycles + 1) as f64).sqrt();
        Ok(Prediction::from_normal(point, std, &self.levels))
    }
}
