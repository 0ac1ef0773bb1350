use common::{GridcastError, Result};
use geo::{coord, BoundingRect, Intersects, Point, Polygon, Rect};

/// The area served in a city, as a WGS84 polygon (x = longitude, y = latitude).
#[derive(Debug, Clone, PartialEq)]
pub struct CityBoundary {
    name: String,
    polygon: Polygon<f64>,
    bounds: Rect<f64>,
}

impl CityBoundary {
    pub fn new(name: impl Into<String>, polygon: Polygon<f64>) -> Result<Self> {
        let name = name.into();
        if polygon.exterior().coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(GridcastError::InvalidInput(format!(
                "boundary of {name} has non-finite vertices"
            )));
        }
        let bounds = polygon.bounding_rect().ok_or_else(|| {
            GridcastError::InvalidInput(format!("boundary of {name} is empty"))
        })?;
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(GridcastError::InvalidInput(format!(
                "boundary of {name} has no area"
            )));
        }
        Ok(Self {
            name,
            polygon,
            bounds,
        })
    }

    /// Rectangular boundary from a map viewport's corners, given as
    /// `(latitude, longitude)`.
    pub fn from_viewport(
        name: impl Into<String>,
        southwest: (f64, f64),
        northeast: (f64, f64),
    ) -> Result<Self> {
        let name = name.into();
        if southwest.0 >= northeast.0 || southwest.1 >= northeast.1 {
            return Err(GridcastError::InvalidInput(format!(
                "viewport of {name}: southwest {southwest:?} is not below and left of northeast {northeast:?}"
            )));
        }
        let rect = Rect::new(
            coord! { x: southwest.1, y: southwest.0 },
            coord! { x: northeast.1, y: northeast.0 },
        );
        Self::new(name, rect.to_polygon())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Southwest corner of the bounding box as `(latitude, longitude)`.
    pub fn southwest(&self) -> (f64, f64) {
        (self.bounds.min().y, self.bounds.min().x)
    }

    /// Northeast corner of the bounding box as `(latitude, longitude)`.
    pub fn northeast(&self) -> (f64, f64) {
        (self.bounds.max().y, self.bounds.max().x)
    }

    /// Whether a location lies inside the boundary or on its edge.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.polygon.intersects(&Point::new(longitude, latitude))
    }
}
