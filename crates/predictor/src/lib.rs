mod pipeline;

pub use pipeline::{ForecastOutcome, ForecastRequest, Forecaster, OrderSource};
