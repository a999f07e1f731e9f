use serde::{Deserialize, Serialize};

use crate::{almanac_errors::AlmanacError, constants::Degree};

/// Largest absolute latitude the event search accepts.
pub const MAX_LATITUDE: Degree = 89.9;

/// A geographic observer on the reference ellipsoid surface, height ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Geodetic latitude in degrees, north positive
    pub latitude: Degree,
    /// Longitude in degrees, east positive
    pub longitude: Degree,
}

impl GeoLocation {
    /// Build an observer, rejecting latitudes beyond ±89.9° and non-finite inputs.
    pub fn new(latitude: Degree, longitude: Degree) -> Result<Self, AlmanacError> {
        if !latitude.is_finite() || latitude.abs() > MAX_LATITUDE {
            return Err(AlmanacError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() {
            return Err(AlmanacError::InvalidConfiguration(format!(
                "longitude {longitude} is not finite"
            )));
        }
        Ok(GeoLocation {
            latitude,
            longitude,
        })
    }

    /// Observer on the Greenwich meridian, as used by the tabulated latitude rows.
    pub fn on_greenwich(latitude: Degree) -> Result<Self, AlmanacError> {
        Self::new(latitude, 0.0)
    }

    pub fn hemisphere(&self) -> Hemisphere {
        Hemisphere::from_latitude(self.latitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// The equator counts as north.
    pub fn from_latitude(latitude: Degree) -> Self {
        if latitude < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
        }
    }
}

#[cfg(test)]
mod observer_test {
    use super::*;

    #[test]
    fn test_latitude_bounds() {
        assert!(GeoLocation::new(89.9, 0.0).is_ok());
        assert_eq!(
            GeoLocation::new(90.0, 0.0),
            Err(AlmanacError::InvalidLatitude(90.0))
        );
        assert!(GeoLocation::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_hemisphere() {
        assert_eq!(Hemisphere::from_latitude(0.0), Hemisphere::North);
        assert_eq!(Hemisphere::from_latitude(-10.0).letter(), 'S');
    }
}
