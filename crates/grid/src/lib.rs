mod boundary;
mod gridify;
mod grid;
mod index;

pub use boundary::CityBoundary;
pub use grid::{CellBounds, CellKey, Grid};
pub use gridify::{build_grids, Location, LocationSource};
pub use index::{AssignmentMiss, LocationId, MissReason, Pixel, PixelIndex, PixelKey};
