use std::sync::Arc;

use common::{GridcastError, Result};
use geo::{Intersects, LineString, Point, Polygon};
use projection::{Coordinate, UtmProjection, UtmZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CityBoundary;

/// Position of a cell in a grid, counted from the southwest origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub row: u32,
    pub column: u32,
}

/// Planar extent of a cell, `[min, max)` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub min_easting: f64,
    pub min_northing: f64,
    pub max_easting: f64,
    pub max_northing: f64,
}

/// A regular square grid laid over a city in UTM coordinates.
#[derive(Debug, Clone)]
pub struct Grid {
    boundary: Arc<CityBoundary>,
    /// Boundary in planar metres, for point-in-boundary checks.
    projected_boundary: Polygon<f64>,
    projection: UtmProjection,
    side_length: u32,
    /// Southwest corner of cell `(0, 0)`.
    origin: Coordinate,
    columns: u32,
    rows: u32,
}

impl Grid {
    /// Lay a grid of `side_length` metre cells over `boundary`.
    ///
    /// The zone is the one of the boundary's southwest corner and the origin
    /// is the southwest corner of the projected boundary's bounding box.
    pub fn build(boundary: Arc<CityBoundary>, side_length: u32) -> Result<Self> {
        if side_length == 0 {
            return Err(GridcastError::Configuration(
                "grid side length must be positive".into(),
            ));
        }

        let (sw_lat, sw_lon) = boundary.southwest();
        let projection = UtmProjection::for_location(sw_lat, sw_lon)?;

        let project_ring = |ring: &LineString<f64>| -> Result<LineString<f64>> {
            ring.coords()
                .map(|c| {
                    projection
                        .project(c.y, c.x)
                        .map(|p| (p.easting(), p.northing()))
                })
                .collect::<Result<Vec<_>>>()
                .map(LineString::from)
        };
        let polygon = boundary.polygon();
        let exterior = project_ring(polygon.exterior())?;
        let interiors = polygon
            .interiors()
            .iter()
            .map(project_ring)
            .collect::<Result<Vec<_>>>()?;

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for c in exterior.coords() {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }

        let origin = Coordinate::new(min_x, min_y, projection.zone())?;
        let side = side_length as f64;
        let columns = ((max_x - min_x) / side).floor() as u32 + 1;
        let rows = ((max_y - min_y) / side).floor() as u32 + 1;

        debug!(
            city = boundary.name(),
            side_length = side_length,
            zone = %projection.zone(),
            rows = rows,
            columns = columns,
            "Grid laid out"
        );

        Ok(Self {
            projected_boundary: Polygon::new(exterior, interiors),
            boundary,
            projection,
            side_length,
            origin,
            columns,
            rows,
        })
    }

    pub fn city(&self) -> &str {
        self.boundary.name()
    }

    pub fn boundary(&self) -> &Arc<CityBoundary> {
        &self.boundary
    }

    pub fn projection(&self) -> &UtmProjection {
        &self.projection
    }

    pub fn zone(&self) -> UtmZone {
        self.projection.zone()
    }

    pub fn side_length(&self) -> u32 {
        self.side_length
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Southwest corner of cell `(0, 0)`.
    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    /// Cell containing `coordinate`; a point on a grid line belongs to the
    /// cell above or to the right of it.
    pub fn locate(&self, coordinate: Coordinate) -> Option<CellKey> {
        if coordinate.zone() != self.zone() {
            return None;
        }
        let side = self.side_length as f64;
        let column = ((coordinate.easting() - self.origin.easting()) / side).floor();
        let row = ((coordinate.northing() - self.origin.northing()) / side).floor();
        if !(column >= 0.0 && row >= 0.0) {
            return None;
        }
        if column >= self.columns as f64 || row >= self.rows as f64 {
            return None;
        }
        Some(CellKey {
            row: row as u32,
            column: column as u32,
        })
    }

    /// Whether a planar coordinate lies within the city boundary.
    pub fn within_boundary(&self, coordinate: Coordinate) -> bool {
        coordinate.zone() == self.zone()
            && self
                .projected_boundary
                .intersects(&Point::new(coordinate.easting(), coordinate.northing()))
    }

    pub fn contains_cell(&self, cell: CellKey) -> bool {
        cell.row < self.rows && cell.column < self.columns
    }

    pub fn cell_bounds(&self, cell: CellKey) -> Option<CellBounds> {
        if !self.contains_cell(cell) {
            return None;
        }
        let side = self.side_length as f64;
        let min_easting = self.origin.easting() + cell.column as f64 * side;
        let min_northing = self.origin.northing() + cell.row as f64 * side;
        Some(CellBounds {
            min_easting,
            min_northing,
            max_easting: min_easting + side,
            max_northing: min_northing + side,
        })
    }

    pub fn cell_centroid(&self, cell: CellKey) -> Option<Coordinate> {
        let bounds = self.cell_bounds(cell)?;
        let zone = self.zone();
        Coordinate::new(
            (bounds.min_easting + bounds.max_easting) / 2.0,
            (bounds.min_northing + bounds.max_northing) / 2.0,
            zone,
        )
        .ok()
    }

    /// Southwest and northeast corners of a cell as `(latitude, longitude)`.
    pub fn cell_corners_latlon(&self, cell: CellKey) -> Result<((f64, f64), (f64, f64))> {
        let bounds = self.cell_bounds(cell).ok_or_else(|| {
            GridcastError::NotFound(format!(
                "cell ({}, {}) outside the {} m grid of {}",
                cell.row,
                cell.column,
                self.side_length,
                self.city()
            ))
        })?;
        let zone = self.zone();
        let southwest = self
            .projection
            .unproject(Coordinate::new(bounds.min_easting, bounds.min_northing, zone)?)?;
        let northeast = self
            .projection
            .unproject(Coordinate::new(bounds.max_easting, bounds.max_northing, zone)?)?;
        Ok((southwest, northeast))
    }
}
