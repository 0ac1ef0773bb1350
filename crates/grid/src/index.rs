use std::collections::HashMap;

use common::{GridcastError, Result};
use projection::Coordinate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{CellBounds, CellKey, Grid};

pub type LocationId = u64;

/// Stable identifier of a pixel: its grid resolution and cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PixelKey {
    pub side_length: u32,
    pub row: u32,
    pub column: u32,
}

impl PixelKey {
    pub fn cell(&self) -> CellKey {
        CellKey {
            row: self.row,
            column: self.column,
        }
    }
}

impl std::fmt::Display for PixelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m({},{})", self.side_length, self.row, self.column)
    }
}

/// A grid cell with at least one location in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pixel {
    pub key: PixelKey,
    pub bounds: CellBounds,
    pub centroid: Coordinate,
    /// `(latitude, longitude)` of the southwest corner.
    pub southwest: (f64, f64),
    /// `(latitude, longitude)` of the northeast corner.
    pub northeast: (f64, f64),
    pub locations: Vec<LocationId>,
}

impl Pixel {
    pub fn n_locations(&self) -> usize {
        self.locations.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// Outside the grid's rows and columns, or in another UTM zone.
    OutsideExtent,
    /// Inside the grid's extent but outside the city boundary.
    OutsideBoundary,
    /// In a cell whose corners cannot be mapped back to latitude and
    /// longitude, e.g. one reaching across the equator.
    UnmappableCell,
}

/// A location that could not be assigned to any pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssignmentMiss {
    pub location: LocationId,
    pub coordinate: Coordinate,
    pub reason: MissReason,
}

/// The non-empty pixels of one grid.
#[derive(Debug, Clone)]
pub struct PixelIndex {
    grid: Grid,
    /// Sorted by `(row, column)`.
    pixels: Vec<Pixel>,
    by_cell: HashMap<CellKey, usize>,
    by_location: HashMap<LocationId, usize>,
    unassigned: Vec<AssignmentMiss>,
}

impl PixelIndex {
    /// Assign every location to the cell containing it.
    pub fn build<I>(grid: Grid, locations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (LocationId, Coordinate)>,
    {
        let mut members: HashMap<CellKey, Vec<(LocationId, Coordinate)>> = HashMap::new();
        let mut unassigned = Vec::new();

        for (location, coordinate) in locations {
            let reason = match grid.locate(coordinate) {
                Some(cell) if grid.within_boundary(coordinate) => {
                    members.entry(cell).or_default().push((location, coordinate));
                    continue;
                }
                Some(_) => MissReason::OutsideBoundary,
                None => MissReason::OutsideExtent,
            };
            unassigned.push(AssignmentMiss {
                location,
                coordinate,
                reason,
            });
        }

        let mut cells: Vec<_> = members.into_iter().collect();
        cells.sort_unstable_by_key(|(cell, _)| *cell);

        let side_length = grid.side_length();
        let mut pixels = Vec::with_capacity(cells.len());
        let mut by_cell = HashMap::with_capacity(cells.len());
        let mut by_location = HashMap::new();

        for (cell, located) in cells {
            let (bounds, centroid, (southwest, northeast)) = match cell_geometry(&grid, cell) {
                Ok(geometry) => geometry,
                Err(e) => {
                    warn!(
                        city = grid.city(),
                        side_length = side_length,
                        row = cell.row,
                        column = cell.column,
                        locations = located.len(),
                        error = %e,
                        "Skipping pixel"
                    );
                    unassigned.extend(located.into_iter().map(|(location, coordinate)| {
                        AssignmentMiss {
                            location,
                            coordinate,
                            reason: MissReason::UnmappableCell,
                        }
                    }));
                    continue;
                }
            };
            let locations: Vec<LocationId> = located.into_iter().map(|(id, _)| id).collect();
            let slot = pixels.len();
            for &location in &locations {
                by_location.entry(location).or_insert(slot);
            }
            by_cell.insert(cell, slot);
            pixels.push(Pixel {
                key: PixelKey {
                    side_length,
                    row: cell.row,
                    column: cell.column,
                },
                bounds,
                centroid,
                southwest,
                northeast,
                locations,
            });
        }

        debug!(
            city = grid.city(),
            side_length = side_length,
            pixels = pixels.len(),
            unassigned = unassigned.len(),
            "Pixel index built"
        );

        Ok(Self {
            grid,
            pixels,
            by_cell,
            by_location,
            unassigned,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn side_length(&self) -> u32 {
        self.grid.side_length()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn unassigned(&self) -> &[AssignmentMiss] {
        &self.unassigned
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, key: &PixelKey) -> Option<&Pixel> {
        if key.side_length != self.side_length() {
            return None;
        }
        self.by_cell.get(&key.cell()).map(|&i| &self.pixels[i])
    }

    pub fn pixel_of_location(&self, location: LocationId) -> Option<&Pixel> {
        self.by_location.get(&location).map(|&i| &self.pixels[i])
    }

    /// The non-empty pixel containing a coordinate, if any.
    pub fn pixel_at(&self, coordinate: Coordinate) -> Option<&Pixel> {
        let cell = self.grid.locate(coordinate)?;
        self.by_cell.get(&cell).map(|&i| &self.pixels[i])
    }

    /// The up to eight non-empty pixels adjacent to `key`, by `(row, column)`.
    pub fn neighbors(&self, key: &PixelKey) -> Vec<&Pixel> {
        if key.side_length != self.side_length() {
            return Vec::new();
        }
        let mut found = Vec::new();
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let (row, column) = (key.row as i64 + dr, key.column as i64 + dc);
                if row < 0 || column < 0 {
                    continue;
                }
                let cell = CellKey {
                    row: row as u32,
                    column: column as u32,
                };
                if let Some(&i) = self.by_cell.get(&cell) {
                    found.push(&self.pixels[i]);
                }
            }
        }
        found
    }
}

type CellGeometry = (CellBounds, Coordinate, ((f64, f64), (f64, f64)));

/// Planar bounds, centroid and geographic corners of a cell.
fn cell_geometry(grid: &Grid, cell: CellKey) -> Result<CellGeometry> {
    let corners = grid.cell_corners_latlon(cell)?;
    let bounds = grid.cell_bounds(cell);
    let centroid = grid.cell_centroid(cell);
    match bounds.zip(centroid) {
        Some((bounds, centroid)) => Ok((bounds, centroid, corners)),
        None => Err(GridcastError::NotFound(format!(
            "cell ({}, {}) outside the grid",
            cell.row, cell.column
        ))),
    }
}
