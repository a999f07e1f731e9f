//! # Lunar distances
//!
//! Geocentric angular distance between the Moon and the Sun, the four planets and the
//! bright catalog stars, hour by hour, for clearing a sextant lunar.
//!
//! An hour is tabulated only when its distance can be observed and interpolated:
//!
//! | Rule | Limit |
//! |---|---|
//! | Moon–Sun distance (the Moon is lost near new moon) | > 10° |
//! | Moon–Sun distance, on the Sun's own row | > 40° |
//! | lunar distance | < 120° |
//! | body–Sun distance | > 10° |
//! | Sun between the body and the Moon in right ascension | never |
//! | hourly change of the distance | > 15′ |
//! | change of the hourly change | ≤ 0.016° |
//!
//! A daily table has room for [`MAX_TABULATED`] rows, chosen with a
//! [`LunarDistanceStrategy`] by [`select_lunar_distances`].

use itertools::Itertools;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    bodies::{Body, StarId, PLANETS},
    constants::{Degree, RADEG},
    ephemeris::wrap180,
};

pub const NEW_MOON_LIMIT: Degree = 10.0;
pub const SUN_ROW_LIMIT: Degree = 40.0;
pub const MAX_DISTANCE: Degree = 120.0;
pub const SOLAR_DISTANCE_LIMIT: Degree = 10.0;
pub const MIN_HOURLY_CHANGE: Degree = 0.25;
pub const MAX_CHANGE_RATE: Degree = 0.016;
/// Faintest catalog star offered for lunars
pub const STAR_MAGNITUDE_LIMIT: f64 = 1.5;
/// Rows of a daily table
pub const MAX_TABULATED: usize = 8;

const SUN_MAGNITUDE: f64 = -26.7;

/// Bodies a lunar distance is computed for: Sun, planets, then the catalog stars of
/// magnitude ≤ [`STAR_MAGNITUDE_LIMIT`].
pub fn lunar_distance_bodies() -> impl Iterator<Item = Body> {
    std::iter::once(Body::Sun).chain(PLANETS).chain(
        StarId::all()
            .filter(|id| id.entry().magnitude <= STAR_MAGNITUDE_LIMIT)
            .map(Body::Star),
    )
}

/// Side of the Moon's hour circle a body lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaSide {
    /// Larger right ascension than the Moon
    East,
    West,
}

impl RaSide {
    fn of(ra_offset: Degree) -> Self {
        if ra_offset >= 0.0 {
            RaSide::East
        } else {
            RaSide::West
        }
    }

    pub fn sign(&self) -> f64 {
        match self {
            RaSide::East => 1.0,
            RaSide::West => -1.0,
        }
    }
}

/// How the rows of a daily table are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LunarDistanceStrategy {
    /// The bodies nearest the Moon, centred on it
    ClosestToMoon,
    /// Largest hourly change first, the most precise for time
    LargestHourlyChange,
    /// Brightest first
    Brightest,
}

/// Hourly lunar distances of one body on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LunarDistanceRow {
    pub body: Body,
    pub magnitude: Option<f64>,
    /// Distance at 00h … 23h, `None` where the hour is not usable
    pub hourly: Vec<Option<Degree>>,
    /// Largest absolute hourly change over the usable hours
    pub max_hourly_change: Degree,
    /// Side of the Moon at the first usable hour
    pub side_first: Option<RaSide>,
    /// Side of the Moon at the last usable hour
    pub side_last: Option<RaSide>,
}

impl LunarDistanceRow {
    pub fn is_usable(&self) -> bool {
        self.hourly.iter().any(Option::is_some)
    }

    /// First usable distance, negative west of the Moon.
    pub fn signed_first(&self) -> Option<Degree> {
        let first = self.hourly.iter().flatten().next()?;
        Some(self.side_first?.sign() * first)
    }

    /// `+`, `-`, or `±` when the body changes side during the day.
    pub fn side_label(&self) -> &'static str {
        match (self.side_first, self.side_last) {
            (Some(a), Some(b)) if a != b => "±",
            (Some(RaSide::West), _) => "-",
            (Some(RaSide::East), _) => "+",
            _ => "",
        }
    }
}

/// Unit vector of a place given by GHA and declination. All places of one instant share
/// the same sidereal time, so `−GHA` stands for the right ascension.
pub fn place_vector(gha: Degree, dec: Degree) -> Vector3<f64> {
    let (ra, dec) = (-gha * RADEG, dec * RADEG);
    Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
}

fn separation(a: &Vector3<f64>, b: &Vector3<f64>) -> Degree {
    a.angle(b) / RADEG
}

fn right_ascension(v: &Vector3<f64>) -> Degree {
    v.y.atan2(v.x) / RADEG
}

/// Whether the Sun lies on the shorter right-ascension arc from the Moon to the body.
fn sun_between(moon: &Vector3<f64>, sun: &Vector3<f64>, body: &Vector3<f64>) -> bool {
    let ra_moon = right_ascension(moon);
    let to_body = wrap180(right_ascension(body) - ra_moon);
    let to_sun = wrap180(right_ascension(sun) - ra_moon);
    to_body.signum() == to_sun.signum() && to_sun.abs() < to_body.abs()
}

/// Lunar-distance row of `body`.
///
/// Arguments
/// -----------------
/// * `body`, `magnitude`: the target and its magnitude at 12h.
/// * `moon`, `sun`, `target`: place vectors at hours −1, 0, …, 24 of the date (26 each).
///
/// Return
/// ----------
/// * The 24 hourly distances with the usability rules of the module applied.
pub fn distance_row(
    body: Body,
    magnitude: Option<f64>,
    moon: &[Vector3<f64>],
    sun: &[Vector3<f64>],
    target: &[Vector3<f64>],
) -> LunarDistanceRow {
    let ld: Vec<Degree> = moon
        .iter()
        .zip(target)
        .map(|(m, t)| separation(m, t))
        .collect();

    let mut hourly = vec![None; 24];
    let mut max_hourly_change: Degree = 0.0;
    let mut side_first = None;
    let mut side_last = None;

    for (hour, cell) in hourly.iter_mut().enumerate() {
        let i = hour + 1;
        let change = ld[i + 1] - ld[i];
        let previous_change = ld[i] - ld[i - 1];
        let visible = if body == Body::Sun {
            ld[i] > SUN_ROW_LIMIT
        } else {
            separation(&target[i], &sun[i]) > SOLAR_DISTANCE_LIMIT
                && !sun_between(&moon[i], &sun[i], &target[i])
        };
        let usable = visible
            && separation(&moon[i], &sun[i]) > NEW_MOON_LIMIT
            && ld[i] < MAX_DISTANCE
            && change.abs() > MIN_HOURLY_CHANGE
            && (change - previous_change).abs() <= MAX_CHANGE_RATE;
        if usable {
            *cell = Some(ld[i]);
            max_hourly_change = max_hourly_change.max(change.abs());
            let side = RaSide::of(wrap180(right_ascension(&target[i]) - right_ascension(&moon[i])));
            side_first.get_or_insert(side);
            side_last = Some(side);
        }
    }

    LunarDistanceRow {
        body,
        magnitude: match (body, magnitude) {
            (Body::Sun, None) => Some(SUN_MAGNITUDE),
            _ => magnitude,
        },
        hourly,
        max_hourly_change,
        side_first,
        side_last,
    }
}

fn signed_key(row: &LunarDistanceRow) -> f64 {
    row.signed_first().unwrap_or(f64::INFINITY)
}

/// Rows of a daily table, at most `max`, in order of signed first distance.
///
/// [`LunarDistanceStrategy::ClosestToMoon`] takes a contiguous run of that order around
/// the first body east of the Moon. The ranked strategies pick alternately west and east
/// of the Moon, best first, so both sides are represented.
pub fn select_lunar_distances(
    rows: &[LunarDistanceRow],
    strategy: LunarDistanceStrategy,
    max: usize,
) -> Vec<LunarDistanceRow> {
    let mut usable: Vec<&LunarDistanceRow> = rows.iter().filter(|r| r.is_usable()).collect();
    usable.sort_by(|a, b| signed_key(a).total_cmp(&signed_key(b)));

    if usable.len() <= max {
        return usable.into_iter().cloned().collect();
    }

    let picked: Vec<&LunarDistanceRow> = match strategy {
        LunarDistanceStrategy::ClosestToMoon => {
            let closest = usable
                .iter()
                .position(|r| signed_key(r) >= 0.0)
                .unwrap_or(0);
            let from = closest.saturating_sub(max / 2).min(usable.len() - max);
            return usable[from..from + max].iter().map(|r| (*r).clone()).collect();
        }
        LunarDistanceStrategy::LargestHourlyChange => usable
            .iter()
            .copied()
            .sorted_by(|a, b| b.max_hourly_change.total_cmp(&a.max_hourly_change))
            .collect(),
        LunarDistanceStrategy::Brightest => usable
            .iter()
            .copied()
            .sorted_by(|a, b| {
                let mag = |r: &LunarDistanceRow| r.magnitude.unwrap_or(f64::INFINITY);
                mag(*a).total_cmp(&mag(*b))
            })
            .collect(),
    };

    let (west, east): (Vec<_>, Vec<_>) = picked.into_iter().partition(|r| signed_key(r) < 0.0);
    let chosen: Vec<Body> = west
        .into_iter()
        .interleave(east)
        .take(max)
        .map(|r| r.body)
        .collect();

    usable
        .into_iter()
        .filter(|r| chosen.contains(&r.body))
        .cloned()
        .collect()
}

#[cfg(test)]
mod lunar_distance_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Moon moving east at 0.5°/h along the equator from RA 100° at hour −1.
    fn moon_track() -> Vec<Vector3<f64>> {
        (0..26)
            .map(|i| place_vector(-(100.0 + 0.5 * i as f64), 0.0))
            .collect()
    }

    fn fixed(gha: Degree, dec: Degree) -> Vec<Vector3<f64>> {
        vec![place_vector(gha, dec); 26]
    }

    fn row(body: Body, magnitude: f64, hourly: Option<Degree>, side: RaSide, change: f64) -> LunarDistanceRow {
        LunarDistanceRow {
            body,
            magnitude: Some(magnitude),
            hourly: vec![hourly; 24],
            max_hourly_change: change,
            side_first: Some(side),
            side_last: Some(side),
        }
    }

    #[test]
    fn test_bright_star_list() {
        let bodies: Vec<Body> = lunar_distance_bodies().collect();
        assert_eq!(bodies.len(), 1 + 4 + 21);
        assert_eq!(bodies[0], Body::Sun);
        assert!(bodies.contains(&"Sirius".parse().unwrap()));
        assert!(!bodies.contains(&"Alpheratz".parse().unwrap()));
    }

    #[test]
    fn test_distance_along_the_equator() {
        // Sun far west of the Moon (RA 0°), star east of it at RA 160°
        let moon = moon_track();
        let sun = fixed(0.0, 0.0);
        let star = fixed(-160.0, 0.0);
        let r = distance_row(Body::Venus, Some(-4.0), &moon, &sun, &star);

        assert!(r.hourly.iter().all(Option::is_some));
        assert_abs_diff_eq!(r.hourly[0].unwrap(), 59.5, epsilon = 1e-9);
        assert_abs_diff_eq!(r.hourly[23].unwrap(), 48.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.max_hourly_change, 0.5, epsilon = 1e-9);
        assert_eq!(r.side_label(), "+");
        assert_abs_diff_eq!(r.signed_first().unwrap(), 59.5, epsilon = 1e-9);

        let sun_row = distance_row(Body::Sun, None, &moon, &sun, &sun);
        assert!(sun_row.hourly.iter().all(Option::is_some));
        assert_eq!(sun_row.side_label(), "-");
        assert_eq!(sun_row.magnitude, Some(SUN_MAGNITUDE));
    }

    #[test]
    fn test_unusable_hours() {
        let moon = moon_track();
        // the Sun sits between the Moon and the star
        let star = fixed(-40.0, 0.0);
        let r = distance_row(Body::Mars, Some(1.0), &moon, &fixed(-70.0, 0.0), &star);
        assert!(!r.is_usable());
        assert_eq!(r.side_label(), "");

        // beyond what a sextant measures
        let far = fixed(-250.0, 0.0);
        let r = distance_row(Body::Mars, Some(1.0), &moon, &fixed(0.0, 0.0), &far);
        assert!(!r.is_usable());

        // a star at the Moon's pole: the distance hardly changes
        let pole = fixed(0.0, 89.0);
        let r = distance_row(Body::Mars, Some(1.0), &moon, &fixed(0.0, 0.0), &pole);
        assert!(!r.is_usable());

        // new moon: nothing is tabulated
        let sun = fixed(-105.0, 0.0);
        let r = distance_row(Body::Jupiter, Some(-2.0), &moon, &sun, &fixed(-160.0, 0.0));
        assert!(!r.is_usable());
    }

    #[test]
    fn test_closest_strategy_centres_on_the_moon() {
        let rows: Vec<LunarDistanceRow> = (0..10)
            .map(|k| {
                let signed = -45.0 + 10.0 * k as f64;
                let side = RaSide::of(signed);
                let star = StarId::new(k).unwrap();
                row(Body::Star(star), 1.0, Some(signed.abs()), side, 0.5)
            })
            .collect();
        let picked = select_lunar_distances(&rows, LunarDistanceStrategy::ClosestToMoon, 4);
        let signed: Vec<f64> = picked.iter().map(|r| r.signed_first().unwrap()).collect();
        assert_eq!(signed, vec![-15.0, -5.0, 5.0, 15.0]);
    }

    #[test]
    fn test_ranked_strategies_balance_both_sides() {
        let mut rows = Vec::new();
        for k in 0..6 {
            let star = Body::Star(StarId::new(k).unwrap());
            rows.push(row(star, k as f64, Some(20.0 + k as f64), RaSide::East, 0.3 + 0.01 * k as f64));
        }
        for k in 6..8 {
            let star = Body::Star(StarId::new(k).unwrap());
            rows.push(row(star, k as f64, Some(20.0 + k as f64), RaSide::West, 0.3));
        }
        rows.push(row(Body::Saturn, 0.5, None, RaSide::East, 0.0));

        let bright = select_lunar_distances(&rows, LunarDistanceStrategy::Brightest, 4);
        assert_eq!(bright.len(), 4);
        assert_eq!(bright.iter().filter(|r| r.side_first == Some(RaSide::West)).count(), 2);
        // westward first in signed order, then the two brightest eastward
        assert_eq!(bright[2].body, rows[0].body);
        assert_eq!(bright[3].body, rows[1].body);

        let fast = select_lunar_distances(&rows, LunarDistanceStrategy::LargestHourlyChange, 4);
        assert_eq!(fast[2].body, rows[4].body);
        assert_eq!(fast[3].body, rows[5].body);
        assert!(fast.iter().all(|r| r.body != Body::Saturn));
    }
}
