pub mod calendar;
pub mod config;
pub mod error;
pub mod metrics;
pub mod series;
pub mod types;

pub use calendar::*;
pub use config::*;
pub use error::*;
pub use series::*;
pub use types::*;
