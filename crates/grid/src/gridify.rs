use std::collections::HashSet;
use std::sync::Arc;

use common::{GridcastError, Result};
use projection::{Coordinate, UtmProjection};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{CityBoundary, Grid, LocationId, PixelIndex};

/// A geocoded pickup or delivery location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub latitude: f64,
    pub longitude: f64,
}

/// Where the locations of a city come from (a database, a file, ...).
pub trait LocationSource {
    fn locations_for_city(&self, city: &str) -> Result<Box<dyn Iterator<Item = Location> + '_>>;
}

/// Build one pixel index per side length, in the order given.
///
/// Every location is projected once and shared by all grids. Locations that
/// cannot be projected into the city's zone are skipped with a warning.
pub fn build_grids(
    boundary: Arc<CityBoundary>,
    side_lengths: &[u32],
    source: &dyn LocationSource,
) -> Result<Vec<PixelIndex>> {
    let mut seen = HashSet::new();
    if let Some(dup) = side_lengths.iter().find(|&&s| !seen.insert(s)) {
        return Err(GridcastError::Configuration(format!(
            "side length {dup} requested more than once"
        )));
    }

    info!(
        city = boundary.name(),
        side_lengths = ?side_lengths,
        "Building grids"
    );

    let (sw_lat, sw_lon) = boundary.southwest();
    let projection = UtmProjection::for_location(sw_lat, sw_lon)?;

    let mut projected: Vec<(LocationId, Coordinate)> = Vec::new();
    let mut skipped = 0usize;
    for location in source.locations_for_city(boundary.name())? {
        match projection.project(location.latitude, location.longitude) {
            Ok(coordinate) => projected.push((location.id, coordinate)),
            Err(e) => {
                skipped += 1;
                warn!(
                    location = location.id,
                    latitude = location.latitude,
                    longitude = location.longitude,
                    error = %e,
                    "Skipping location"
                );
            }
        }
    }

    let indexes = side_lengths
        .par_iter()
        .map(|&side_length| {
            let grid = Grid::build(Arc::clone(&boundary), side_length)?;
            PixelIndex::build(grid, projected.iter().copied())
        })
        .collect::<Result<Vec<_>>>()?;

    for index in &indexes {
        info!(
            city = boundary.name(),
            side_length = index.side_length(),
            pixels = index.len(),
            unassigned = index.unassigned().len(),
            "Grid ready"
        );
    }
    info!(
        city = boundary.name(),
        locations = projected.len(),
        skipped = skipped,
        "Grids built"
    );

    Ok(indexes)
}
