use common::{
    FittedModel, ForecastModel, IntervalLevels, ModelCategory, OrderTimeSeries, Prediction,
    Result, SeriesLattice, TimeBucket,
};

/// Zero forecast (`trivial`) for pixels whose demand is too sparse for any
/// statistical model. Both intervals collapse onto the point.
#[derive(Debug, Clone)]
pub struct TrivialModel {
    levels: IntervalLevels,
}

impl TrivialModel {
    pub fn new(levels: IntervalLevels) -> Self {
        Self { levels }
    }
}

impl ForecastModel for TrivialModel {
    fn name(&self) -> &str {
        "trivial"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Realtime
    }

    fn fit(&self, series: &OrderTimeSeries) -> Result<Box<dyn FittedModel>> {
        Ok(Box::new(FittedTrivial {
            lattice: series.lattice(),
            levels: self.levels,
        }))
    }
}

#[derive(Debug)]
struct FittedTrivial {
    lattice: SeriesLattice,
    levels: IntervalLevels,
}

impl FittedModel for FittedTrivial {
    fn name(&self) -> &str {
        "trivial"
    }

    fn lattice(&self) -> &SeriesLattice {
        &self.lattice
    }

    fn predict(&self, origin: TimeBucket, horizon: usize) -> Result<Prediction> {
        self.lattice.steps_ahead(origin, horizon)?;
        Ok(Prediction::from_normal(0.0, 0.0, &self.levels))
    }
}
