mod utm;
mod zone;

pub use utm::{Coordinate, UtmProjection};
pub use zone::{Hemisphere, UtmZone};
