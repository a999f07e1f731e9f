//! The 57 navigational stars of the daily pages.
//!
//! Mean places are J2000.0 (ICRS). Proper motion is neglected; it reaches a few tenths
//! of an arcminute per century for Rigil Kentaurus and Arcturus.

use crate::constants::Degree;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogStar {
    pub name: &'static str,
    /// Right ascension at J2000.0, in degrees
    pub ra: Degree,
    /// Declination at J2000.0, in degrees
    pub dec: Degree,
    /// Visual magnitude
    pub magnitude: f64,
}

macro_rules! star {
    ($name:expr, $rh:expr, $rm:expr, $rs:expr, $sg:expr, $dd:expr, $dm:expr, $ds:expr, $mag:expr) => {
        CatalogStar {
            name: $name,
            ra: 15.0 * ($rh + $rm / 60.0 + $rs / 3600.0),
            dec: $sg * ($dd + $dm / 60.0 + $ds / 3600.0),
            magnitude: $mag,
        }
    };
}

pub const NAVIGATIONAL_STARS: [CatalogStar; 57] = [
    star!("Alpheratz", 0., 8., 23.3, 1., 29., 5., 26., 2.1),
    star!("Ankaa", 0., 26., 17.0, -1., 42., 18., 22., 2.4),
    star!("Schedar", 0., 40., 30.4, 1., 56., 32., 14., 2.2),
    star!("Diphda", 0., 43., 35.4, -1., 17., 59., 12., 2.0),
    star!("Achernar", 1., 37., 42.8, -1., 57., 14., 12., 0.5),
    star!("Hamal", 2., 7., 10.4, 1., 23., 27., 45., 2.0),
    star!("Acamar", 2., 58., 15.7, -1., 40., 18., 17., 3.2),
    star!("Menkar", 3., 2., 16.8, 1., 4., 5., 23., 2.5),
    star!("Mirfak", 3., 24., 19.4, 1., 49., 51., 40., 1.8),
    star!("Aldebaran", 4., 35., 55.2, 1., 16., 30., 33., 0.9),
    star!("Rigel", 5., 14., 32.3, -1., 8., 12., 6., 0.1),
    star!("Capella", 5., 16., 41.4, 1., 45., 59., 53., 0.1),
    star!("Bellatrix", 5., 25., 7.9, 1., 6., 20., 59., 1.6),
    star!("Elnath", 5., 26., 17.5, 1., 28., 36., 27., 1.7),
    star!("Alnilam", 5., 36., 12.8, -1., 1., 12., 7., 1.7),
    star!("Betelgeuse", 5., 55., 10.3, 1., 7., 24., 25., 0.5),
    star!("Canopus", 6., 23., 57.1, -1., 52., 41., 45., -0.7),
    star!("Sirius", 6., 45., 8.9, -1., 16., 42., 58., -1.5),
    star!("Adhara", 6., 58., 37.5, -1., 28., 58., 20., 1.5),
    star!("Procyon", 7., 39., 18.1, 1., 5., 13., 30., 0.4),
    star!("Pollux", 7., 45., 18.9, 1., 28., 1., 34., 1.1),
    star!("Avior", 8., 22., 30.8, -1., 59., 30., 34., 1.9),
    star!("Suhail", 9., 7., 59.8, -1., 43., 25., 57., 2.2),
    star!("Miaplacidus", 9., 13., 12.0, -1., 69., 43., 2., 1.7),
    star!("Alphard", 9., 27., 35.2, -1., 8., 39., 31., 2.0),
    star!("Regulus", 10., 8., 22.3, 1., 11., 58., 2., 1.4),
    star!("Dubhe", 11., 3., 43.7, 1., 61., 45., 3., 1.8),
    star!("Denebola", 11., 49., 3.6, 1., 14., 34., 19., 2.1),
    star!("Gienah", 12., 15., 48.4, -1., 17., 32., 31., 2.6),
    star!("Acrux", 12., 26., 35.9, -1., 63., 5., 57., 0.8),
    star!("Gacrux", 12., 31., 9.9, -1., 57., 6., 48., 1.6),
    star!("Alioth", 12., 54., 1.7, 1., 55., 57., 35., 1.8),
    star!("Spica", 13., 25., 11.6, -1., 11., 9., 41., 1.0),
    star!("Alkaid", 13., 47., 32.4, 1., 49., 18., 48., 1.9),
    star!("Hadar", 14., 3., 49.4, -1., 60., 22., 23., 0.6),
    star!("Menkent", 14., 6., 41.0, -1., 36., 22., 12., 2.1),
    star!("Arcturus", 14., 15., 39.7, 1., 19., 10., 57., 0.0),
    star!("Rigil Kentaurus", 14., 39., 36.5, -1., 60., 50., 2., -0.3),
    star!("Zubenelgenubi", 14., 50., 52.7, -1., 16., 2., 30., 2.8),
    star!("Kochab", 14., 50., 42.3, 1., 74., 9., 20., 2.1),
    star!("Alphecca", 15., 34., 41.3, 1., 26., 42., 53., 2.2),
    star!("Antares", 16., 29., 24.5, -1., 26., 25., 55., 1.0),
    star!("Atria", 16., 48., 39.9, -1., 69., 1., 40., 1.9),
    star!("Sabik", 17., 10., 22.7, -1., 15., 43., 29., 2.4),
    star!("Shaula", 17., 33., 36.5, -1., 37., 6., 14., 1.6),
    star!("Rasalhague", 17., 34., 56.1, 1., 12., 33., 36., 2.1),
    star!("Eltanin", 17., 56., 36.4, 1., 51., 29., 20., 2.2),
    star!("Kaus Australis", 18., 24., 10.3, -1., 34., 23., 5., 1.9),
    star!("Vega", 18., 36., 56.3, 1., 38., 47., 1., 0.0),
    star!("Nunki", 18., 55., 15.9, -1., 26., 17., 48., 2.0),
    star!("Altair", 19., 50., 47.0, 1., 8., 52., 6., 0.8),
    star!("Peacock", 20., 25., 38.9, -1., 56., 44., 6., 1.9),
    star!("Deneb", 20., 41., 25.9, 1., 45., 16., 49., 1.3),
    star!("Enif", 21., 44., 11.2, 1., 9., 52., 30., 2.4),
    star!("Al Na'ir", 22., 8., 14.0, -1., 46., 57., 40., 1.7),
    star!("Fomalhaut", 22., 57., 39.0, -1., 29., 37., 20., 1.2),
    star!("Markab", 23., 4., 45.7, 1., 15., 12., 19., 2.5),
];

#[cfg(test)]
mod star_catalog_test {
    use super::*;

    #[test]
    fn test_catalog_is_sorted_by_ra() {
        assert!(NAVIGATIONAL_STARS
            .windows(2)
            .all(|w| w[0].ra <= w[1].ra + 0.5));
    }

    #[test]
    fn test_sirius_place() {
        let sirius = NAVIGATIONAL_STARS
            .iter()
            .find(|s| s.name == "Sirius")
            .unwrap();
        approx::assert_abs_diff_eq!(sirius.ra, 101.287, epsilon = 1e-3);
        approx::assert_abs_diff_eq!(sirius.dec, -16.716, epsilon = 1e-3);
    }
}
