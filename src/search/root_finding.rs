//! Coarse sign-change scan and bisection refinement.
//!
//! The scanned function is sampled on a regular grid covering a half-open window; each
//! grid interval whose end points differ in sign (with `f ≥ 0` counting as positive) is
//! refined by bisection until the bracket is shorter than the tolerance. A bracket that
//! cannot be narrowed within the iteration bound, or whose midpoint evaluates to NaN, is
//! returned as [`Refinement::NotConverged`] and never silently dropped.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{almanac_errors::AlmanacError, constants::DaySeconds};

/// Numerical parameters of the event search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Coarse sampling interval, seconds
    pub coarse_step_s: f64,
    /// Bracket width at which bisection stops, seconds
    pub tolerance_s: f64,
    /// Upper bound on bisection iterations per crossing
    pub max_iterations: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            coarse_step_s: 3600.0,
            tolerance_s: 0.05,
            max_iterations: 60,
        }
    }
}

/// `true` when the value counts as "at or above" the threshold.
#[inline]
pub fn is_up(value: f64) -> bool {
    value >= 0.0
}

/// A grid interval whose end points differ in sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lo: DaySeconds,
    pub hi: DaySeconds,
    pub f_lo: f64,
    pub f_hi: f64,
}

impl Bracket {
    /// Whether the function goes from below to at-or-above over the bracket.
    pub fn is_rising(&self) -> bool {
        !is_up(self.f_lo) && is_up(self.f_hi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refinement {
    Converged(DaySeconds),
    NotConverged { lo: DaySeconds, hi: DaySeconds },
}

/// Grid instants covering `[start, end]`, both ends included, spaced by at most `step`.
pub fn grid(start: DaySeconds, end: DaySeconds, step: f64) -> Vec<DaySeconds> {
    let n = ((end - start) / step).ceil().max(1.0) as usize;
    (0..=n)
        .map(|k| if k == n { end } else { start + k as f64 * step })
        .collect()
}

/// Sample `f` on `instants` and return the brackets of every sign change, with the
/// sampled values.
///
/// Non-finite samples are an evaluation failure of the underlying model and are
/// reported as [`AlmanacError::EphemerisFailure`].
pub fn scan<F>(
    instants: &[DaySeconds],
    mut f: F,
) -> Result<(Vec<f64>, Vec<Bracket>), AlmanacError>
where
    F: FnMut(DaySeconds) -> Result<f64, AlmanacError>,
{
    let values = instants
        .iter()
        .map(|&t| {
            let v = f(t)?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(AlmanacError::EphemerisFailure(format!(
                    "non-finite sample at t = {t} s"
                )))
            }
        })
        .collect::<Result<Vec<f64>, AlmanacError>>()?;

    let brackets = instants
        .iter()
        .zip(values.iter())
        .tuple_windows()
        .filter(|((_, fa), (_, fb))| is_up(**fa) != is_up(**fb))
        .map(|((&lo, &f_lo), (&hi, &f_hi))| Bracket { lo, hi, f_lo, f_hi })
        .collect();

    Ok((values, brackets))
}

/// Refine a sign-change bracket by bisection.
///
/// Arguments
/// -----------------
/// * `f`: the scanned function.
/// * `bracket`: interval with a sign change.
/// * `params`: tolerance and iteration bound.
///
/// Return
/// ----------
/// * [`Refinement::Converged`] with the bracket midpoint once narrower than the
///   tolerance, or [`Refinement::NotConverged`] with the last bracket.
pub fn bisect<F>(
    mut f: F,
    bracket: &Bracket,
    params: &SearchParams,
) -> Result<Refinement, AlmanacError>
where
    F: FnMut(DaySeconds) -> Result<f64, AlmanacError>,
{
    let (mut lo, mut hi) = (bracket.lo, bracket.hi);
    let lo_up = is_up(bracket.f_lo);
    let mut iterations = 0;

    while hi - lo > params.tolerance_s {
        if iterations >= params.max_iterations {
            return Ok(Refinement::NotConverged { lo, hi });
        }
        let mid = 0.5 * (lo + hi);
        let fm = f(mid)?;
        if fm.is_nan() {
            return Ok(Refinement::NotConverged { lo, hi });
        }
        if is_up(fm) == lo_up {
            lo = mid;
        } else {
            hi = mid;
        }
        iterations += 1;
    }
    Ok(Refinement::Converged(0.5 * (lo + hi)))
}
