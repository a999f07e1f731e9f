//! Identifiers of the bodies tabulated in the almanac.
//!
//! The set is closed: the Sun, the Moon, the four navigational planets, the first point
//! of Aries and the 57 navigational stars of [`NAVIGATIONAL_STARS`]. Anything else is
//! rejected with [`AlmanacError::UnsupportedBody`] when parsed.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    ephemeris::star_catalog::{CatalogStar, NAVIGATIONAL_STARS},
};

/// Index into [`NAVIGATIONAL_STARS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StarId(u8);

impl StarId {
    pub fn new(index: usize) -> Result<Self, AlmanacError> {
        if index < NAVIGATIONAL_STARS.len() {
            Ok(StarId(index as u8))
        } else {
            Err(AlmanacError::UnsupportedBody(format!("star #{index}")))
        }
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn entry(&self) -> &'static CatalogStar {
        &NAVIGATIONAL_STARS[self.index()]
    }

    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    /// All catalog stars, in catalog order.
    pub fn all() -> impl Iterator<Item = StarId> {
        (0..NAVIGATIONAL_STARS.len()).map(|i| StarId(i as u8))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Body {
    Sun,
    Moon,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    /// First point of Aries
    Aries,
    Star(StarId),
}

/// The planets tabulated on the daily pages, in column order.
pub const PLANETS: [Body; 4] = [Body::Venus, Body::Mars, Body::Jupiter, Body::Saturn];

impl Body {
    pub fn is_planet(&self) -> bool {
        matches!(self, Body::Venus | Body::Mars | Body::Jupiter | Body::Saturn)
    }

    /// Whether the body has a disk whose semidiameter enters the horizon threshold.
    pub fn has_disk(&self) -> bool {
        matches!(self, Body::Sun | Body::Moon)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Aries => "Aries",
            Body::Star(id) => id.name(),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Body {
    type Err = AlmanacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let body = match key.as_str() {
            "sun" => Body::Sun,
            "moon" => Body::Moon,
            "venus" => Body::Venus,
            "mars" => Body::Mars,
            "jupiter" => Body::Jupiter,
            "saturn" => Body::Saturn,
            "aries" => Body::Aries,
            _ => {
                return NAVIGATIONAL_STARS
                    .iter()
                    .position(|star| star.name.to_ascii_lowercase() == key)
                    .map(|idx| Body::Star(StarId(idx as u8)))
                    .ok_or_else(|| AlmanacError::UnsupportedBody(s.to_string()))
            }
        };
        Ok(body)
    }
}

#[cfg(test)]
mod bodies_test {
    use super::*;

    #[test]
    fn test_parse_bodies() {
        assert_eq!("Sun".parse::<Body>().unwrap(), Body::Sun);
        assert_eq!(" saturn ".parse::<Body>().unwrap(), Body::Saturn);
        let sirius: Body = "Sirius".parse().unwrap();
        assert_eq!(sirius.name(), "Sirius");
        assert_eq!(
            "Pluto".parse::<Body>(),
            Err(AlmanacError::UnsupportedBody("Pluto".into()))
        );
    }

    #[test]
    fn test_star_ids() {
        assert_eq!(StarId::all().count(), 57);
        assert!(StarId::new(56).is_ok());
        assert!(StarId::new(57).is_err());
    }
}
