//! Transverse Mercator projection on the WGS84 ellipsoid (Krüger series).

use common::{GridcastError, Result};
use serde::{Deserialize, Serialize};

use crate::zone::{check_latlon, Hemisphere, UtmZone};

// -----------------------------------------------------------------------
// WGS84 constants
// -----------------------------------------------------------------------

const K0: f64 = 0.9996;
/// Equatorial radius in metres.
const R: f64 = 6_378_137.0;
/// First eccentricity squared.
const E: f64 = 0.006_694_38;
const E2: f64 = E * E;
const E3: f64 = E2 * E;
const E_P2: f64 = E / (1.0 - E);

const M1: f64 = 1.0 - E / 4.0 - 3.0 * E2 / 64.0 - 5.0 * E3 / 256.0;
const M2: f64 = 3.0 * E / 8.0 + 3.0 * E2 / 32.0 + 45.0 * E3 / 1024.0;
const M3: f64 = 15.0 * E2 / 256.0 + 45.0 * E3 / 1024.0;
const M4: f64 = 35.0 * E3 / 3072.0;

const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Longitude slack around a zone's 6° band.
const ZONE_OVERLAP_DEGREES: f64 = 0.5;

/// Planar position in metres within one UTM zone. Both axes are finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    easting: f64,
    northing: f64,
    zone: UtmZone,
}

impl Coordinate {
    pub fn new(easting: f64, northing: f64, zone: UtmZone) -> Result<Self> {
        if !easting.is_finite() || !northing.is_finite() {
            return Err(GridcastError::Projection(format!(
                "non-finite planar coordinate ({easting}, {northing})"
            )));
        }
        Ok(Self::from_parts(easting, northing, zone))
    }

    pub(crate) fn from_parts(easting: f64, northing: f64, zone: UtmZone) -> Self {
        Self {
            easting,
            northing,
            zone,
        }
    }

    pub fn easting(&self) -> f64 {
        self.easting
    }

    pub fn northing(&self) -> f64 {
        self.northing
    }

    pub fn zone(&self) -> UtmZone {
        self.zone
    }

    /// The position `east` and `north` metres away, in the same zone.
    pub fn offset(&self, east: f64, north: f64) -> Result<Self> {
        Self::new(self.easting + east, self.northing + north, self.zone)
    }

    pub fn distance(&self, other: &Coordinate) -> Option<f64> {
        if self.zone != other.zone {
            return None;
        }
        Some((self.easting - other.easting).hypot(self.northing - other.northing))
    }
}

/// Projection to and from one UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmProjection {
    zone: UtmZone,
}

impl UtmProjection {
    pub fn new(zone: UtmZone) -> Self {
        Self { zone }
    }

    /// Projection for the zone containing a location.
    pub fn for_location(latitude: f64, longitude: f64) -> Result<Self> {
        Ok(Self::new(UtmZone::for_location(latitude, longitude)?))
    }

    pub fn zone(&self) -> UtmZone {
        self.zone
    }

    pub fn project(&self, latitude: f64, longitude: f64) -> Result<Coordinate> {
        check_latlon(latitude, longitude)?;
        self.check_in_zone(latitude, longitude)?;

        let lat_rad = latitude.to_radians();
        let lat_sin = lat_rad.sin();
        let lat_cos = lat_rad.cos();
        let lat_tan = lat_sin / lat_cos;
        let lat_tan2 = lat_tan * lat_tan;
        let lat_tan4 = lat_tan2 * lat_tan2;

        let n = R / (1.0 - E * lat_sin * lat_sin).sqrt();
        let c = E_P2 * lat_cos * lat_cos;

        let a = lat_cos * wrap_radians((longitude - self.zone.central_meridian()).to_radians());
        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let m = R
            * (M1 * lat_rad - M2 * (2.0 * lat_rad).sin() + M3 * (4.0 * lat_rad).sin()
                - M4 * (6.0 * lat_rad).sin());

        let easting = K0
            * n
            * (a + a3 / 6.0 * (1.0 - lat_tan2 + c)
                + a5 / 120.0 * (5.0 - 18.0 * lat_tan2 + lat_tan4 + 72.0 * c - 58.0 * E_P2))
            + FALSE_EASTING;

        let mut northing = K0
            * (m + n
                * lat_tan
                * (a2 / 2.0
                    + a4 / 24.0 * (5.0 - lat_tan2 + 9.0 * c + 4.0 * c * c)
                    + a6 / 720.0
                        * (61.0 - 58.0 * lat_tan2 + lat_tan4 + 600.0 * c - 330.0 * E_P2)));
        if self.zone.hemisphere() == Hemisphere::South {
            northing += FALSE_NORTHING_SOUTH;
        }

        Ok(Coordinate::from_parts(easting, northing, self.zone))
    }

    /// Inverse projection, returns `(latitude, longitude)` in degrees.
    pub fn unproject(&self, coordinate: Coordinate) -> Result<(f64, f64)> {
        if coordinate.zone != self.zone {
            return Err(GridcastError::Projection(format!(
                "coordinate in zone {} given to the projection for zone {}",
                coordinate.zone, self.zone
            )));
        }
        if !coordinate.easting.is_finite() || !coordinate.northing.is_finite() {
            return Err(GridcastError::Projection("non-finite planar coordinate".into()));
        }
        if !(100_000.0..1_000_000.0).contains(&coordinate.easting) {
            return Err(GridcastError::Projection(format!(
                "easting {} outside [100000, 1000000)",
                coordinate.easting
            )));
        }
        if !(0.0..=FALSE_NORTHING_SOUTH).contains(&coordinate.northing) {
            return Err(GridcastError::Projection(format!(
                "northing {} outside [0, 10000000]",
                coordinate.northing
            )));
        }

        let x = coordinate.easting - FALSE_EASTING;
        let mut y = coordinate.northing;
        if self.zone.hemisphere() == Hemisphere::South {
            y -= FALSE_NORTHING_SOUTH;
        }

        let sqrt_e = (1.0 - E).sqrt();
        let e1 = (1.0 - sqrt_e) / (1.0 + sqrt_e);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;
        let e1_5 = e1_4 * e1;
        let p2 = 3.0 / 2.0 * e1 - 27.0 / 32.0 * e1_3 + 269.0 / 512.0 * e1_5;
        let p3 = 21.0 / 16.0 * e1_2 - 55.0 / 32.0 * e1_4;
        let p4 = 151.0 / 96.0 * e1_3 - 417.0 / 128.0 * e1_5;
        let p5 = 1097.0 / 512.0 * e1_4;

        let m = y / K0;
        let mu = m / (R * M1);

        // Footpoint latitude.
        let p_rad = mu
            + p2 * (2.0 * mu).sin()
            + p3 * (4.0 * mu).sin()
            + p4 * (6.0 * mu).sin()
            + p5 * (8.0 * mu).sin();

        let p_sin = p_rad.sin();
        let p_sin2 = p_sin * p_sin;
        let p_cos = p_rad.cos();
        let p_tan = p_sin / p_cos;
        let p_tan2 = p_tan * p_tan;
        let p_tan4 = p_tan2 * p_tan2;

        let ep_sin = 1.0 - E * p_sin2;
        let n = R / ep_sin.sqrt();
        let r = (1.0 - E) / ep_sin;
        let c = E_P2 * p_cos * p_cos;
        let c2 = c * c;

        let d = x / (n * K0);
        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let latitude = p_rad
            - (p_tan / r)
                * (d2 / 2.0 - d4 / 24.0 * (5.0 + 3.0 * p_tan2 + 10.0 * c - 4.0 * c2 - 9.0 * E_P2)
                    + d6 / 720.0
                        * (61.0 + 90.0 * p_tan2 + 298.0 * c + 45.0 * p_tan4
                            - 252.0 * E_P2
                            - 3.0 * c2));

        let longitude = (d - d3 / 6.0 * (1.0 + 2.0 * p_tan2 + c)
            + d5 / 120.0 * (5.0 - 2.0 * c + 28.0 * p_tan2 - 3.0 * c2 + 8.0 * E_P2 + 24.0 * p_tan4))
            / p_cos;

        let longitude = wrap_radians(longitude + self.zone.central_meridian().to_radians());

        Ok((latitude.to_degrees(), longitude.to_degrees()))
    }

    fn check_in_zone(&self, latitude: f64, longitude: f64) -> Result<()> {
        let north = latitude >= 0.0;
        if north != (self.zone.hemisphere() == Hemisphere::North) {
            return Err(GridcastError::Projection(format!(
                "latitude {latitude} lies in the other hemisphere than zone {}",
                self.zone
            )));
        }

        let offset = wrap_degrees(longitude - self.zone.central_meridian()).abs();
        if offset <= 3.0 + ZONE_OVERLAP_DEGREES {
            return Ok(());
        }
        // Norway and Svalbard zones are wider than 6°.
        let natural = UtmZone::for_location(latitude, longitude)?;
        if natural.number() == self.zone.number() {
            return Ok(());
        }
        Err(GridcastError::Projection(format!(
            "longitude {longitude} lies {offset:.2}° from the central meridian of zone {}",
            self.zone
        )))
    }
}

/// Wrap an angle in degrees to [-180, 180).
fn wrap_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Wrap an angle in radians to [-pi, pi).
fn wrap_radians(angle: f64) -> f64 {
    use std::f64::consts::PI;
    (angle + PI).rem_euclid(2.0 * PI) - PI
}
