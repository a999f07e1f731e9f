use thiserror::Error;

/// Errors raised by the sampler, the event search engine and the run orchestration.
///
/// Root-finding non-convergence is not an error: it is reported as
/// [`EventTime::Indeterminate`](crate::search::EventTime::Indeterminate) inside the
/// event list.
#[derive(Error, Debug)]
pub enum AlmanacError {
    #[error("Year {year} is outside the ephemeris span {min}-{max}")]
    EphemerisOutOfRange { year: i32, min: i32, max: i32 },

    #[error("Ephemeris evaluation failed: {0}")]
    EphemerisFailure(String),

    #[error("Unsupported body: {0}")]
    UnsupportedBody(String),

    #[error("Unsupported latitude list length: {0} (expected 31)")]
    InvalidLatitudeList(usize),

    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Worker failure: {0}")]
    WorkerFailure(String),

    #[error("Unable to build the worker pool: {0}")]
    ThreadPool(String),
}

impl From<rayon::ThreadPoolBuildError> for AlmanacError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        AlmanacError::ThreadPool(err.to_string())
    }
}

impl PartialEq for AlmanacError {
    fn eq(&self, other: &Self) -> bool {
        use AlmanacError::*;
        match (self, other) {
            (
                EphemerisOutOfRange { year, min, max },
                EphemerisOutOfRange {
                    year: y2,
                    min: m2,
                    max: x2,
                },
            ) => year == y2 && min == m2 && max == x2,
            (EphemerisFailure(a), EphemerisFailure(b)) => a == b,
            (UnsupportedBody(a), UnsupportedBody(b)) => a == b,
            (InvalidLatitudeList(a), InvalidLatitudeList(b)) => a == b,
            (InvalidLatitude(a), InvalidLatitude(b)) => a == b,
            (InvalidConfiguration(a), InvalidConfiguration(b)) => a == b,
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (WorkerFailure(a), WorkerFailure(b)) => a == b,
            (ThreadPool(a), ThreadPool(b)) => a == b,
            _ => false,
        }
    }
}
