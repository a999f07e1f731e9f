//! # Almanac number formatting
//!
//! Conversion of angles into the sexagesimal notation printed in nautical almanac
//! tables: `ddd°mm.m'` for hour angles, signed or hemisphere-prefixed `dd°mm.m'` for
//! declinations, and `mm:ss` for the equation of time.
//!
//! The functions here only format; rounding to 0.1' is done with carry so that
//! `59.96'` prints as the next whole degree instead of `60.0'`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ArcMin, Degree};

/// Split an absolute angle into whole degrees and tenth-of-arcminute rounded minutes,
/// propagating the carry into the degrees.
fn split_deg_min(value: Degree) -> (u32, f64) {
    let tenths = (value.abs() * 600.0).round() as u64;
    let deg = (tenths / 600) as u32;
    let min = (tenths % 600) as f64 / 10.0;
    (deg, min)
}

/// Format a Greenwich hour angle (or sidereal hour angle) as `ddd°mm.m'`.
///
/// The input is normalised to `[0, 360)` first; a value that rounds up to 360°
/// prints as `0°00.0'`.
pub fn fmt_gha(value: Degree) -> String {
    let (deg, min) = split_deg_min(value.rem_euclid(360.0));
    format!("{:3}°{:04.1}'", deg % 360, min)
}

/// Format a small angle expressed in arcminutes with one decimal (e.g. `v` and `d`
/// corrections, semidiameters).
pub fn fmt_arcmin(value: ArcMin) -> String {
    format!("{value:.1}")
}

/// Format the equation of time (in seconds) as `mm:ss`, sign left to the caller.
pub fn fmt_eot(seconds: f64) -> String {
    let s = seconds.abs().round() as u64;
    format!("{:02}:{:02}", s / 60, s % 60)
}

/// Print style of declinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclinationFormat {
    /// `N 12°34.5'` / `S 12°34.5'`
    Hemisphere,
    /// `+12°34.5'` / `-12°34.5'`
    Signed,
}

/// A declination in degrees, printed with the almanac conventions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Declination(pub Degree);

impl Declination {
    pub fn degrees(&self) -> Degree {
        self.0
    }

    /// `+dd°mm.m'` or `-dd°mm.m'`.
    pub fn signed(&self) -> String {
        let (deg, min) = split_deg_min(self.0);
        let sign = if self.0 < 0.0 && (deg > 0 || min > 0.0) {
            '-'
        } else {
            '+'
        };
        format!("{sign}{deg:02}°{min:04.1}'")
    }

    /// `N dd°mm.m'` or `S dd°mm.m'`.
    pub fn hemisphere(&self) -> String {
        let (deg, min) = split_deg_min(self.0);
        let h = if self.0 < 0.0 && (deg > 0 || min > 0.0) {
            'S'
        } else {
            'N'
        };
        format!("{h} {deg:02}°{min:04.1}'")
    }

    pub fn format(&self, style: DeclinationFormat) -> String {
        match style {
            DeclinationFormat::Hemisphere => self.hemisphere(),
            DeclinationFormat::Signed => self.signed(),
        }
    }
}

impl fmt::Display for Declination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hemisphere())
    }
}
