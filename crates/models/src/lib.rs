mod ensemble;
mod hw;
mod optimize;
mod seasonal_naive;
mod trend;
mod trivial;

use std::sync::Arc;

use common::{ForecastModel, ForecastingConfig, ModelChoice, Result};
use tracing::debug;

pub use ensemble::EnsembleModel;
pub use hw::HoltWintersModel;
pub use seasonal_naive::SeasonalNaiveModel;
pub use trend::{TrendExtrapolationModel, TrendMethod};
pub use trivial::TrivialModel;

/// Create the model for `choice`.
///
/// `periodicities` are the cycle lengths of the real-time series; `hets`
/// uses `config.horizontal_season` instead.
pub fn create_model(
    choice: ModelChoice,
    config: &ForecastingConfig,
    periodicities: &[usize],
) -> Result<Arc<dyn ForecastModel>> {
    let levels = config.interval_levels()?;
    let model: Arc<dyn ForecastModel> = match choice {
        ModelChoice::Trivial => Arc::new(TrivialModel::new(levels)),
        ModelChoice::Snaive => Arc::new(SeasonalNaiveModel::new(periodicities.to_vec(), levels)),
        ModelChoice::Trend => Arc::new(TrendExtrapolationModel::new(
            periodicities.to_vec(),
            TrendMethod::Linear,
            config.trend_window,
            levels,
        )?),
        ModelChoice::Hets => Arc::new(HoltWintersModel::new(config.horizontal_season, levels)?),
        ModelChoice::Ensemble => {
            let candidates: Vec<Arc<dyn ForecastModel>> = vec![
                Arc::new(SeasonalNaiveModel::new(periodicities.to_vec(), levels)),
                Arc::new(TrendExtrapolationModel::new(
                    periodicities.to_vec(),
                    TrendMethod::Linear,
                    config.trend_window,
                    levels,
                )?),
                Arc::new(TrendExtrapolationModel::new(
                    periodicities.to_vec(),
                    TrendMethod::AutoEts,
                    None,
                    levels,
                )?),
            ];
            Arc::new(EnsembleModel::new(
                candidates,
                config.backtest_origins,
                config.backtest_horizon,
                config.combination,
            )?)
        }
    };
    debug!(model = %choice, periodicities = ?periodicities, "Model created");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ModelCategory;

    #[test]
    fn test_create_every_choice() {
        let config = ForecastingConfig::default();
        for (choice, category) in [
            (ModelChoice::Trivial, ModelCategory::Realtime),
            (ModelChoice::Snaive, ModelCategory::Realtime),
            (ModelChoice::Trend, ModelCategory::Realtime),
            (ModelChoice::Hets, ModelCategory::Horizontal),
            (ModelChoice::Ensemble, ModelCategory::Composite),
        ] {
            let model = create_model(choice, &config, &[12, 84]).unwrap();
            assert_eq!(model.name(), choice.as_str());
            assert_eq!(model.category(), category);
        }
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let config = ForecastingConfig {
            confidence_level: 1.5,
            ..ForecastingConfig::default()
        };
        assert!(create_model(ModelChoice::Snaive, &config, &[12]).is_err());

        let config = ForecastingConfig {
            wide_confidence_level: 0.5,
            ..ForecastingConfig::default()
        };
        assert!(create_model(ModelChoice::Trivial, &config, &[12]).is_err());
    }
}
