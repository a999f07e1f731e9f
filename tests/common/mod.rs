#![allow(dead_code)]

use std::f64::consts::TAU;

use hifitime::Epoch;
use navalmanac::{
    constants::REFRACTION_HORIZON, AlmanacError, ApparentPlace, Body, CalendarDate, EventCell,
    EphemerisProvider, GeoLocation,
};

/// Altitude of the Moon's rise/set threshold when the provider reports no semidiameter.
pub const MOON_THRESHOLD: f64 = -REFRACTION_HORIZON;

pub fn date(year: i32, month: u8, day: u8) -> CalendarDate {
    CalendarDate::new(year, month, day).unwrap()
}

/// Seconds of day of a time cell, panics on markers.
pub fn cell_seconds(cell: &EventCell) -> i64 {
    match cell {
        EventCell::Time(t) => t.seconds_of_day(),
        other => panic!("expected a time, got {other}"),
    }
}

fn point_place() -> ApparentPlace {
    ApparentPlace {
        gha: 0.0,
        dec: 0.0,
        distance_km: 0.0,
        semidiameter: 0.0,
        horizontal_parallax: 0.0,
        magnitude: None,
    }
}

/// `offset + amplitude · sin(2π (t − origin) / period)` for every body and observer.
#[derive(Debug, Clone, Copy)]
pub struct SineAltitude {
    pub origin: Epoch,
    pub period_s: f64,
    pub amplitude: f64,
    pub offset: f64,
}

impl EphemerisProvider for SineAltitude {
    fn apparent_place(&self, _body: Body, _epoch: Epoch) -> Result<ApparentPlace, AlmanacError> {
        Ok(point_place())
    }

    fn supported_years(&self) -> (i32, i32) {
        (1900, 2100)
    }

    fn altitude(&self, _: Body, epoch: Epoch, _: &GeoLocation) -> Result<f64, AlmanacError> {
        let t = (epoch - self.origin).to_seconds();
        Ok(self.offset + self.amplitude * (TAU * t / self.period_s).sin())
    }
}

/// Linear altitude reaching `offset` at `crossing`.
#[derive(Debug, Clone, Copy)]
pub struct RampAltitude {
    pub crossing: Epoch,
    pub deg_per_s: f64,
    pub offset: f64,
}

impl EphemerisProvider for RampAltitude {
    fn apparent_place(&self, _body: Body, _epoch: Epoch) -> Result<ApparentPlace, AlmanacError> {
        Ok(point_place())
    }

    fn supported_years(&self) -> (i32, i32) {
        (1900, 2100)
    }

    fn altitude(&self, _: Body, epoch: Epoch, _: &GeoLocation) -> Result<f64, AlmanacError> {
        Ok(self.offset + self.deg_per_s * (epoch - self.crossing).to_seconds())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantAltitude(pub f64);

impl EphemerisProvider for ConstantAltitude {
    fn apparent_place(&self, _body: Body, _epoch: Epoch) -> Result<ApparentPlace, AlmanacError> {
        Ok(point_place())
    }

    fn supported_years(&self) -> (i32, i32) {
        (1900, 2100)
    }

    fn altitude(&self, _: Body, _: Epoch, _: &GeoLocation) -> Result<f64, AlmanacError> {
        Ok(self.0)
    }
}

/// A provider whose altitude model is broken.
#[derive(Debug, Clone, Copy)]
pub struct NanAltitude;

impl EphemerisProvider for NanAltitude {
    fn apparent_place(&self, _body: Body, _epoch: Epoch) -> Result<ApparentPlace, AlmanacError> {
        Ok(point_place())
    }

    fn supported_years(&self) -> (i32, i32) {
        (1900, 2100)
    }

    fn altitude(&self, _: Body, _: Epoch, _: &GeoLocation) -> Result<f64, AlmanacError> {
        Ok(f64::NAN)
    }
}
