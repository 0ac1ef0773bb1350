//! Turns order timestamps into bucketed time series and cuts the training
//! windows the forecasting models are fitted on.

mod aggregate;
mod range;
mod windows;

pub use aggregate::{aggregate, aggregate_by_pixel, first_order_at, last_order_at};
pub use range::DateRange;
pub use windows::{
    average_daily_demand, horizontal_window, realtime_periodicities, realtime_window,
    vertical_window,
};
