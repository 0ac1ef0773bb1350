use common::{GridcastError, Result};
use serde::{Deserialize, Serialize};

pub(crate) const MIN_LATITUDE: f64 = -80.0;
pub(crate) const MAX_LATITUDE: f64 = 84.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hemisphere {
    North,
    South,
}

/// A UTM zone: a 6° longitude band and a hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    number: u8,
    hemisphere: Hemisphere,
}

impl UtmZone {
    pub fn new(number: u8, hemisphere: Hemisphere) -> Result<Self> {
        if !(1..=60).contains(&number) {
            return Err(GridcastError::Projection(format!(
                "UTM zone number must lie in 1..=60, got {number}"
            )));
        }
        Ok(Self { number, hemisphere })
    }

    /// Zone containing a WGS84 location, including the Norway and Svalbard
    /// exceptions.
    pub fn for_location(latitude: f64, longitude: f64) -> Result<Self> {
        check_latlon(latitude, longitude)?;

        let hemisphere = if latitude >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        };

        let number = if (56.0..64.0).contains(&latitude) && (3.0..12.0).contains(&longitude) {
            32
        } else if (72.0..=84.0).contains(&latitude) && longitude >= 0.0 && longitude < 42.0 {
            match longitude {
                l if l < 9.0 => 31,
                l if l < 21.0 => 33,
                l if l < 33.0 => 35,
                _ => 37,
            }
        } else {
            (((longitude + 180.0) / 6.0).floor() as i64).rem_euclid(60) as u8 + 1
        };

        Ok(Self { number, hemisphere })
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    /// Longitude of the zone's central meridian, in degrees.
    pub fn central_meridian(&self) -> f64 {
        (self.number as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }
}

impl std::fmt::Display for UtmZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let h = match self.hemisphere {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
        };
        write!(f, "{}{}", self.number, h)
    }
}

pub(crate) fn check_latlon(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(GridcastError::Projection(format!(
            "non-finite coordinate ({latitude}, {longitude})"
        )));
    }
    if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
        return Err(GridcastError::Projection(format!(
            "latitude {latitude} outside the UTM range [{MIN_LATITUDE}, {MAX_LATITUDE}]"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(GridcastError::Projection(format!(
            "longitude {longitude} outside [-180, 180]"
        )));
    }
    Ok(())
}
