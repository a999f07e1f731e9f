//! # Work distribution
//!
//! Per-latitude searches are independent of each other, so a batch of work items is
//! mapped over a pool of threads and the results are gathered back in input order.
//! The same [`WorkDistributor`] interface has a serial implementation; callers do not
//! know which one is active.
//!
//! ## Failure
//! -----------------
//! A worker returning an error, or panicking, fails the whole batch: the first error
//! in input order is returned and no partial result is kept. Panics are turned into
//! [`AlmanacError::WorkerFailure`].
//!
//! ## Pool size
//! -----------------
//! `min(available logical processors, max_workers)`, further capped at 8 on macOS and
//! Windows. The pool is built once per run and dropped with it.

use std::{
    fmt::Debug,
    panic::{catch_unwind, AssertUnwindSafe},
    thread::available_parallelism,
};

use log::{debug, warn};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};

use crate::{almanac_errors::AlmanacError, config::AlmanacConfig};

/// Pool size cap on platforms where threads are expensive to oversubscribe.
const DESKTOP_WORKER_CAP: usize = 8;

/// Runs a batch of work items and returns their results in input order.
pub trait WorkDistributor: Debug {
    /// Number of items processed concurrently.
    fn workers(&self) -> usize;

    /// Apply `f` to every item, each item being borrowed mutably by exactly one task.
    ///
    /// Arguments
    /// -----------------
    /// * `items`: the work items (e.g. one per latitude, each owning its carry state).
    /// * `f`: the task; it must not rely on any state other than its item and captures.
    ///
    /// Return
    /// ----------
    /// * The results in the order of `items`, or the first failure.
    fn map_mut<T, R, F>(&self, items: &mut [T], f: F) -> Result<Vec<R>, AlmanacError>
    where
        T: Send,
        R: Send,
        F: Fn(&mut T) -> Result<R, AlmanacError> + Send + Sync;

    /// Apply `f` to every item of a read-only batch.
    fn map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, AlmanacError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R, AlmanacError> + Send + Sync;
}

/// Run one task, turning a panic into a [`AlmanacError::WorkerFailure`].
fn guarded<R>(task: impl FnOnce() -> Result<R, AlmanacError>) -> Result<R, AlmanacError> {
    match catch_unwind(AssertUnwindSafe(task)) {
        Ok(result) => result,
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "worker panicked".to_string());
            warn!("worker panicked: {msg}");
            Err(AlmanacError::WorkerFailure(msg))
        }
    }
}

/// Processes items one after the other on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialDistributor;

impl WorkDistributor for SerialDistributor {
    fn workers(&self) -> usize {
        1
    }

    fn map_mut<T, R, F>(&self, items: &mut [T], f: F) -> Result<Vec<R>, AlmanacError>
    where
        T: Send,
        R: Send,
        F: Fn(&mut T) -> Result<R, AlmanacError> + Send + Sync,
    {
        items.iter_mut().map(|item| guarded(|| f(item))).collect()
    }

    fn map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, AlmanacError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R, AlmanacError> + Send + Sync,
    {
        items.iter().map(|item| guarded(|| f(item))).collect()
    }
}

/// Processes items on a dedicated rayon pool.
#[derive(Debug)]
pub struct ParallelDistributor {
    pool: ThreadPool,
}

impl ParallelDistributor {
    /// Build a pool of [`pool_size`]`(max_workers)` threads.
    pub fn new(max_workers: usize) -> Result<Self, AlmanacError> {
        let threads = pool_size(max_workers);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("almanac-worker-{i}"))
            .build()?;
        debug!("worker pool started with {threads} threads");
        Ok(ParallelDistributor { pool })
    }
}

impl WorkDistributor for ParallelDistributor {
    fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn map_mut<T, R, F>(&self, items: &mut [T], f: F) -> Result<Vec<R>, AlmanacError>
    where
        T: Send,
        R: Send,
        F: Fn(&mut T) -> Result<R, AlmanacError> + Send + Sync,
    {
        let results: Vec<Result<R, AlmanacError>> = self
            .pool
            .install(|| items.par_iter_mut().map(|item| guarded(|| f(item))).collect());
        results.into_iter().collect()
    }

    fn map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, AlmanacError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R, AlmanacError> + Send + Sync,
    {
        let results: Vec<Result<R, AlmanacError>> = self
            .pool
            .install(|| items.par_iter().map(|item| guarded(|| f(item))).collect());
        results.into_iter().collect()
    }
}

/// Effective number of worker threads for a `max_workers` bound.
pub fn pool_size(max_workers: usize) -> usize {
    let available = available_parallelism().map(|n| n.get()).unwrap_or(1);
    let mut size = available.min(max_workers);
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        size = size.min(DESKTOP_WORKER_CAP);
    }
    size.max(1)
}

/// The distributor selected by the run configuration.
#[derive(Debug)]
pub enum Distributor {
    Serial(SerialDistributor),
    Parallel(ParallelDistributor),
}

impl Distributor {
    pub fn from_config(config: &AlmanacConfig) -> Result<Self, AlmanacError> {
        if config.parallel {
            Ok(Distributor::Parallel(ParallelDistributor::new(
                config.max_workers,
            )?))
        } else {
            Ok(Distributor::Serial(SerialDistributor))
        }
    }
}

impl WorkDistributor for Distributor {
    fn workers(&self) -> usize {
        match self {
            Distributor::Serial(d) => d.workers(),
            Distributor::Parallel(d) => d.workers(),
        }
    }

    fn map_mut<T, R, F>(&self, items: &mut [T], f: F) -> Result<Vec<R>, AlmanacError>
    where
        T: Send,
        R: Send,
        F: Fn(&mut T) -> Result<R, AlmanacError> + Send + Sync,
    {
        match self {
            Distributor::Serial(d) => d.map_mut(items, f),
            Distributor::Parallel(d) => d.map_mut(items, f),
        }
    }

    fn map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, AlmanacError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R, AlmanacError> + Send + Sync,
    {
        match self {
            Distributor::Serial(d) => d.map(items, f),
            Distributor::Parallel(d) => d.map(items, f),
        }
    }
}
