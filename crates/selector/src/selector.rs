use common::{ModelChoice, SelectionConfig};
use tracing::debug;

/// Maps a pixel's average daily demand (ADD) to a tactical model.
///
/// Busier pixels get more elaborate models. Pixels below `low_demand` get
/// the zero forecast.
#[derive(Debug, Clone)]
pub struct TacticalModelSelector {
    config: SelectionConfig,
}

impl Default for TacticalModelSelector {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}

impl TacticalModelSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Model for a pixel with `add` orders per day.
    pub fn choose(&self, add: f64) -> ModelChoice {
        let choice = if add >= self.config.high_demand {
            ModelChoice::Ensemble
        } else if add >= self.config.medium_demand {
            ModelChoice::Hets
        } else if add >= self.config.low_demand {
            ModelChoice::Snaive
        } else {
            debug!(add = add, low_demand = self.config.low_demand, "Sparse pixel");
            ModelChoice::Trivial
        };
        debug!(add = add, model = %choice, "Tactical model chosen");
        choice
    }

    /// Simpler models to try, in order, when `choice` lacks history.
    pub fn fallback_chain(&self, choice: ModelChoice) -> Vec<ModelChoice> {
        match choice {
            ModelChoice::Ensemble => vec![ModelChoice::Hets, ModelChoice::Snaive],
            ModelChoice::Hets | ModelChoice::Trend => vec![ModelChoice::Snaive],
            ModelChoice::Snaive | ModelChoice::Trivial => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests;
