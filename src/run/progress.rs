//! Page progress: an `indicatif` bar with the `progress` feature, `log::info!` lines
//! otherwise. Each completed page reports its own wall time and the running mean.

use std::time::{Duration, Instant};

use hifitime::Unit;
#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(not(feature = "progress"))]
use log::info;

use crate::time::CalendarDate;

/// Wall time printed with hifitime units, to the millisecond (`"3 s 140 ms"`), or to the
/// microsecond below one millisecond.
pub fn format_elapsed(d: Duration) -> String {
    let rounded = match d.as_millis() {
        0 => Unit::Microsecond * d.as_micros() as i64,
        ms => Unit::Millisecond * ms as i64,
    };
    rounded.to_string()
}

/// Progress of a sequence of pages.
#[derive(Debug)]
pub struct PageProgress {
    label: &'static str,
    total: u64,
    started: Instant,
    last: Instant,
    done: u64,
    #[cfg(feature = "progress")]
    bar: ProgressBar,
}

impl PageProgress {
    pub fn new(label: &'static str, total: u64) -> Self {
        #[cfg(feature = "progress")]
        let bar = {
            let pb = ProgressBar::new(total.max(1));
            pb.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {pos}/{len} pages ({percent:>3}%) | ETA {eta_precise} | {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb.enable_steady_tick(Duration::from_millis(200));
            pb
        };
        let now = Instant::now();
        PageProgress {
            label,
            total,
            started: now,
            last: now,
            done: 0,
            #[cfg(feature = "progress")]
            bar,
        }
    }

    pub fn pages_done(&self) -> u64 {
        self.done
    }

    /// Mean wall time of the completed pages.
    pub fn mean_page_time(&self) -> Duration {
        match self.done {
            0 => Duration::ZERO,
            n => self.last.duration_since(self.started).div_f64(n as f64),
        }
    }

    /// Record the completion of the page starting at `first`.
    pub fn page_done(&mut self, first: CalendarDate) {
        let now = Instant::now();
        let page = now.duration_since(self.last);
        self.last = now;
        self.done += 1;
        let message = format!(
            "{} page {}/{} ({first}) in {}, mean {}",
            self.label,
            self.done,
            self.total,
            format_elapsed(page),
            format_elapsed(self.mean_page_time())
        );
        #[cfg(feature = "progress")]
        {
            self.bar.set_message(message);
            self.bar.inc(1);
        }
        #[cfg(not(feature = "progress"))]
        info!("{message}");
    }

    pub fn finish(self) {
        #[cfg(feature = "progress")]
        self.bar.finish_and_clear();
    }
}
