//! Moon age and illuminated fraction.
//!
//! The last new moon is the last instant the Moon's right ascension caught up with the
//! Sun's; both are read from the GHA difference so only apparent places are needed.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    bodies::Body,
    constants::{RADEG, SECONDS_PER_DAY},
    ephemeris::{wrap180, EphemerisProvider},
    time::CalendarDate,
};

use super::root_finding::{bisect, Bracket, Refinement, SearchParams};

/// Longest interval searched back for the previous conjunction, days.
const MAX_LUNATION_DAYS: i64 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonPhase {
    /// Days since the last new moon
    pub age_days: f64,
    /// Illuminated fraction of the disk, percent
    pub illuminated_pct: f64,
}

/// Moon minus Sun right ascension, degrees in `[-180, 180)`, at `t` seconds from
/// 00:00 of `date`.
fn elongation_ra(
    ephemeris: &dyn EphemerisProvider,
    date: CalendarDate,
    t: f64,
) -> Result<f64, AlmanacError> {
    let epoch = date.at_seconds(t);
    let sun = ephemeris.apparent_place(Body::Sun, epoch)?;
    let moon = ephemeris.apparent_place(Body::Moon, epoch)?;
    Ok(wrap180(sun.gha - moon.gha))
}

/// Instant of the last new moon before `t` (seconds from 00:00 of `date`), in the same
/// time scale.
pub fn previous_new_moon(
    ephemeris: &dyn EphemerisProvider,
    date: CalendarDate,
    t: f64,
) -> Result<f64, AlmanacError> {
    let params = SearchParams {
        tolerance_s: 60.0,
        ..SearchParams::default()
    };
    conjunction_before(ephemeris, date, t, &params)
}

/// Bisection of the last conjunction in right ascension before `t`.
///
/// A bracket left unresolved after `params.max_iterations` is an
/// [`AlmanacError::EphemerisFailure`]: the age printed on the page would be wrong.
fn conjunction_before(
    ephemeris: &dyn EphemerisProvider,
    date: CalendarDate,
    t: f64,
    params: &SearchParams,
) -> Result<f64, AlmanacError> {
    let f = |s: f64| elongation_ra(ephemeris, date, s);
    let mut hi = t;
    let mut f_hi = f(hi)?;
    for _ in 0..MAX_LUNATION_DAYS {
        let lo = hi - SECONDS_PER_DAY;
        let f_lo = f(lo)?;
        if f_lo < 0.0 && f_hi >= 0.0 && f_lo.abs() < 90.0 && f_hi.abs() < 90.0 {
            let bracket = Bracket { lo, hi, f_lo, f_hi };
            return match bisect(&f, &bracket, params)? {
                Refinement::Converged(s) => Ok(s),
                Refinement::NotConverged { lo, hi } => {
                    warn!("new moon before {date} unresolved in [{lo:.0}, {hi:.0}] s");
                    Err(AlmanacError::EphemerisFailure(format!(
                        "new moon search before {date} did not converge"
                    )))
                }
            };
        }
        hi = lo;
        f_hi = f_lo;
    }
    Err(AlmanacError::EphemerisFailure(format!(
        "no new moon found in the {MAX_LUNATION_DAYS} days before {date}"
    )))
}

/// Age and illuminated percentage of the Moon at 12h of `date`.
pub fn moon_phase(
    ephemeris: &dyn EphemerisProvider,
    date: CalendarDate,
) -> Result<MoonPhase, AlmanacError> {
    let noon = SECONDS_PER_DAY / 2.0;
    let new_moon = previous_new_moon(ephemeris, date, noon)?;

    let epoch = date.at_seconds(noon);
    let sun = ephemeris.apparent_place(Body::Sun, epoch)?;
    let moon = ephemeris.apparent_place(Body::Moon, epoch)?;
    let (ds, dm) = (sun.dec * RADEG, moon.dec * RADEG);
    let dra = (sun.gha - moon.gha) * RADEG;
    let cos_psi = ds.sin() * dm.sin() + ds.cos() * dm.cos() * dra.cos();

    Ok(MoonPhase {
        age_days: (noon - new_moon) / SECONDS_PER_DAY,
        illuminated_pct: 50.0 * (1.0 - cos_psi),
    })
}

#[cfg(test)]
mod lunation_test {
    use super::*;
    use crate::unit_test_global::LOW_PRECISION;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_age_after_january_2024_new_moon() {
        // new moon 2024-01-11 11:57 UTC
        let phase = moon_phase(&*LOW_PRECISION, CalendarDate::new(2024, 1, 20).unwrap()).unwrap();
        assert_abs_diff_eq!(phase.age_days, 9.0, epsilon = 0.3);
        assert!(phase.illuminated_pct > 50.0 && phase.illuminated_pct < 90.0);
    }

    #[test]
    fn test_full_moon_is_lit() {
        // full moon 2024-01-25 17:54 UTC
        let phase = moon_phase(&*LOW_PRECISION, CalendarDate::new(2024, 1, 25).unwrap()).unwrap();
        assert!(phase.illuminated_pct > 98.0, "{}", phase.illuminated_pct);
        assert_abs_diff_eq!(phase.age_days, 14.0, epsilon = 0.4);
    }

    #[test]
    fn test_unresolved_conjunction_is_an_error() {
        let params = SearchParams {
            tolerance_s: 60.0,
            max_iterations: 3,
            ..SearchParams::default()
        };
        let date = CalendarDate::new(2024, 1, 20).unwrap();
        let res = conjunction_before(&*LOW_PRECISION, date, SECONDS_PER_DAY / 2.0, &params);
        assert!(matches!(res, Err(AlmanacError::EphemerisFailure(_))));

        let res = conjunction_before(
            &*LOW_PRECISION,
            date,
            SECONDS_PER_DAY / 2.0,
            &SearchParams {
                tolerance_s: 60.0,
                ..SearchParams::default()
            },
        );
        assert!(res.is_ok());
    }
}
