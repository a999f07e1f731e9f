//! # Calendar dates, instants and display rounding
//!
//! Every table row is attributed to a UTC **calendar date**. Instants are handled as
//! [`hifitime::Epoch`] values or, inside the search engine, as seconds relative to
//! 00:00 UTC of a [`CalendarDate`].
//!
//! ## Rounding policy
//! -----------------
//! Times are rounded **half-up** to the display unit (one minute or one second). A rounded
//! time that reaches 24:00 becomes 00:00 of the following date, and a time just before
//! midnight that rounds backwards from a negative offset lands on the previous date. The
//! date carried by [`DisplayTime`] is therefore the date whose table shows the event.
//!
//! The set of instants that round onto date `D` is the half-open window
//! `[D 00:00 − unit/2, D+1 00:00 − unit/2)`, returned by [`TimePrecision::day_window`].
//! Searching exactly that window makes the day attribution automatic.

use std::fmt;

use hifitime::{is_gregorian_valid, Duration, Epoch, Unit};
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    constants::{DaySeconds, SECONDS_PER_DAY},
};

/// A proleptic Gregorian calendar date (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CalendarDate {
    /// Build a validated calendar date.
    ///
    /// Arguments
    /// -----------------
    /// * `year`, `month` (1–12), `day` (1–days in month).
    ///
    /// Return
    /// ----------
    /// * The date, or [`AlmanacError::InvalidDate`] if the triple does not exist.
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, AlmanacError> {
        if !is_gregorian_valid(year, month, day, 0, 0, 0, 0) {
            return Err(AlmanacError::InvalidDate(format!(
                "{year:04}-{month:02}-{day:02}"
            )));
        }
        Ok(CalendarDate { year, month, day })
    }

    /// UTC date of an instant.
    pub fn of_epoch(epoch: Epoch) -> Self {
        let (year, month, day, _, _, _, _) = epoch.to_gregorian_utc();
        CalendarDate { year, month, day }
    }

    /// The date `n` days later (earlier for negative `n`).
    pub fn add_days(&self, n: i64) -> Self {
        // stepping from noon keeps leap seconds away from the date boundary
        Self::of_epoch(self.at_seconds(SECONDS_PER_DAY / 2.0) + Unit::Day * n)
    }

    /// Number of dates from `self` to `other` (negative if `other` is earlier).
    pub fn days_until(&self, other: CalendarDate) -> i64 {
        (other.midnight() - self.midnight()).to_unit(Unit::Day).round() as i64
    }

    /// The following date.
    pub fn succ(&self) -> Self {
        self.add_days(1)
    }

    /// The preceding date.
    pub fn pred(&self) -> Self {
        self.add_days(-1)
    }

    /// 00:00:00 UTC of this date.
    pub fn midnight(&self) -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(self.year, self.month, self.day)
    }

    /// The instant `seconds` after 00:00 UTC of this date (may be negative or exceed a day).
    pub fn at_seconds(&self, seconds: DaySeconds) -> Epoch {
        self.midnight() + Duration::from_seconds(seconds)
    }

    /// Seconds from 00:00 UTC of this date to `epoch`.
    pub fn seconds_until(&self, epoch: Epoch) -> DaySeconds {
        (epoch - self.midnight()).to_seconds()
    }

    /// Three-letter English month abbreviation.
    pub fn month_abbrev(&self) -> String {
        format!("{:x}", self.midnight().month_name())
    }

    /// Three-letter English weekday abbreviation.
    pub fn weekday_abbrev(&self) -> String {
        format!("{:x}", self.midnight().weekday_utc())
    }

    /// Fractional year, used by the ΔT polynomials.
    pub fn decimal_year(&self) -> f64 {
        self.year as f64 + (self.month as f64 - 0.5) / 12.0
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Display unit of a tabulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePrecision {
    /// `hh:mm`
    Minute,
    /// `hh:mm:ss`
    Second,
}

impl TimePrecision {
    /// Length of the display unit in seconds.
    pub fn unit_seconds(self) -> i64 {
        match self {
            TimePrecision::Minute => 60,
            TimePrecision::Second => 1,
        }
    }

    /// Half of the display unit, in seconds.
    pub fn half_unit(self) -> DaySeconds {
        self.unit_seconds() as f64 / 2.0
    }

    /// Half-open search window, in seconds relative to 00:00 of the date, whose instants
    /// round onto that date.
    pub fn day_window(self) -> (DaySeconds, DaySeconds) {
        let h = self.half_unit();
        (-h, SECONDS_PER_DAY - h)
    }
}

/// A time of day rounded for display, together with the date it is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayTime {
    pub date: CalendarDate,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub precision: TimePrecision,
}

impl DisplayTime {
    /// Round an instant given as seconds after 00:00 of `date`.
    ///
    /// Rounding is half-up to the unit of `precision`; the result is re-anchored to the
    /// adjacent date whenever it falls outside `[00:00, 24:00)`.
    ///
    /// Arguments
    /// -----------------
    /// * `date`: reference date of `seconds`.
    /// * `seconds`: offset from 00:00 UTC of `date` (may be negative or beyond a day).
    /// * `precision`: display unit.
    ///
    /// Return
    /// ----------
    /// * The rounded time with the date whose table shows it.
    pub fn round(date: CalendarDate, seconds: DaySeconds, precision: TimePrecision) -> Self {
        let unit = precision.unit_seconds();
        let n = (seconds / unit as f64 + 0.5).floor() as i64;
        let total = n * unit;
        let day_offset = total.div_euclid(SECONDS_PER_DAY as i64);
        let rem = total.rem_euclid(SECONDS_PER_DAY as i64);
        DisplayTime {
            date: date.add_days(day_offset),
            hour: (rem / 3600) as u8,
            minute: ((rem % 3600) / 60) as u8,
            second: (rem % 60) as u8,
            precision,
        }
    }

    /// Round an absolute instant, attributing it relative to `reference`.
    pub fn from_epoch(reference: CalendarDate, epoch: Epoch, precision: TimePrecision) -> Self {
        Self::round(reference, reference.seconds_until(epoch), precision)
    }

    /// Seconds after 00:00 of [`date`](DisplayTime::date).
    pub fn seconds_of_day(&self) -> i64 {
        self.hour as i64 * 3600 + self.minute as i64 * 60 + self.second as i64
    }
}

impl fmt::Display for DisplayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            TimePrecision::Minute => write!(f, "{:02}:{:02}", self.hour, self.minute),
            TimePrecision::Second => write!(
                f,
                "{:02}:{:02}:{:02}",
                self.hour, self.minute, self.second
            ),
        }
    }
}

#[cfg(test)]
mod time_test {
    use super::*;

    fn date(y: i32, m: u8, d: u8) -> CalendarDate {
        CalendarDate::new(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_roundtrip() {
        let d = date(2024, 2, 28);
        assert_eq!(d.succ(), date(2024, 2, 29));
        assert_eq!(d.add_days(2), date(2024, 3, 1));
        assert_eq!(date(2025, 1, 1).pred(), date(2024, 12, 31));
        assert_eq!(date(2100, 2, 28).succ(), date(2100, 3, 1));
        assert_eq!(date(2024, 3, 1).add_days(-366), date(2023, 3, 1));
        assert_eq!(date(2024, 1, 1).days_until(date(2025, 1, 1)), 366);
        assert_eq!(date(2024, 3, 1).days_until(date(2024, 2, 1)), -29);
    }

    #[test]
    fn test_stepping_over_a_leap_second() {
        let d = date(2016, 12, 31);
        assert_eq!(d.succ(), date(2017, 1, 1));
        assert_eq!(date(2017, 1, 1).pred(), d);
        assert_eq!(d.days_until(date(2017, 1, 1)), 1);
        assert_eq!(CalendarDate::of_epoch(d.at_seconds(86_399.0)), d);
    }

    #[test]
    fn test_invalid_dates() {
        assert!(CalendarDate::new(2023, 2, 29).is_err());
        assert!(CalendarDate::new(2024, 13, 1).is_err());
        assert!(CalendarDate::new(2024, 4, 31).is_err());
        assert!(CalendarDate::new(2000, 2, 29).is_ok());
        assert!(CalendarDate::new(1900, 2, 29).is_err());
    }

    #[test]
    fn test_weekday() {
        assert_eq!(date(2024, 1, 1).weekday_abbrev(), "Mon");
        assert_eq!(date(1970, 1, 1).weekday_abbrev(), "Thu");
        assert_eq!(date(2024, 9, 3).month_abbrev(), "Sep");
    }

    #[test]
    fn test_round_half_up_minute() {
        let d = date(2024, 6, 1);
        let t = DisplayTime::round(d, 3600.0 + 29.9, TimePrecision::Minute);
        assert_eq!((t.hour, t.minute), (1, 0));
        let t = DisplayTime::round(d, 3600.0 + 30.0, TimePrecision::Minute);
        assert_eq!((t.hour, t.minute), (1, 1));
        assert_eq!(t.to_string(), "01:01");
    }

    #[test]
    fn test_round_past_midnight_goes_to_next_day() {
        let d = date(2024, 12, 31);
        let t = DisplayTime::round(d, 86_399.6, TimePrecision::Second);
        assert_eq!(t.date, date(2025, 1, 1));
        assert_eq!(t.to_string(), "00:00:00");
    }

    #[test]
    fn test_negative_offset_goes_to_previous_day() {
        let d = date(2024, 3, 1);
        let t = DisplayTime::round(d, -75.0, TimePrecision::Minute);
        assert_eq!(t.date, date(2024, 2, 29));
        assert_eq!(t.to_string(), "23:59");
    }

    #[test]
    fn test_day_window_matches_rounding() {
        let d = date(2024, 3, 1);
        for precision in [TimePrecision::Minute, TimePrecision::Second] {
            let (start, end) = precision.day_window();
            assert_eq!(DisplayTime::round(d, start, precision).date, d);
            assert_eq!(DisplayTime::round(d, end - 1e-6, precision).date, d);
            assert_eq!(DisplayTime::round(d, end, precision).date, d.succ());
        }
    }
}
