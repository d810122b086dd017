//! Remaining-time estimation from historical job throughput
//!
//! The rate (replies per second) is the median over recently finished
//! successful jobs. It is recomputed periodically and published through a
//! [`RateCell`], which status queries read without taking any lock.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Timing data of one successful job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EtaSample {
    /// Unix timestamp when the pipeline started
    pub started_at: i64,
    /// Unix timestamp when the job finished
    pub finished_at: i64,
    /// Number of replies the job archived
    pub reply_count: i64,
}

impl EtaSample {
    /// Replies per second for this job; durations below one second count as one
    pub fn rate(&self) -> f64 {
        let duration = (self.finished_at - self.started_at).max(1);
        self.reply_count as f64 / duration as f64
    }
}

/// Median rate over the samples, `None` when there are none
pub fn estimate_rate(samples: &[EtaSample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let mut rates: Vec<f64> = samples.iter().map(EtaSample::rate).collect();
    rates.sort_by(f64::total_cmp);

    let mid = rates.len() / 2;
    let median = if rates.len() % 2 == 0 {
        (rates[mid - 1] + rates[mid]) / 2.0
    } else {
        rates[mid]
    };

    Some(median)
}

/// Projected remaining time of an in-flight job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EtaProjection {
    /// The job already took longer than projected
    Overdue,
    /// Less than ten seconds left
    AlmostDone,
    /// Whole seconds left
    Remaining(u64),
}

/// Project remaining time as `reply_count / rate - elapsed`, truncated toward zero
///
/// `rate` must be positive; callers substitute the configured default otherwise.
pub fn project(reply_count: i64, rate: f64, elapsed_secs: i64) -> EtaProjection {
    let remaining = (reply_count as f64 / rate - elapsed_secs as f64) as i64;

    if remaining < 0 {
        EtaProjection::Overdue
    } else if remaining < 10 {
        EtaProjection::AlmostDone
    } else {
        EtaProjection::Remaining(remaining as u64)
    }
}

impl fmt::Display for EtaProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            EtaProjection::Overdue => f.write_str(
                "It seems that the retrieval is taking a bit more time than expected. Please stand by...",
            ),
            EtaProjection::AlmostDone => {
                f.write_str("Estimated remaining time: less than 10 seconds")
            }
            EtaProjection::Remaining(secs) if secs < 60 => {
                write!(f, "Estimated remaining time: {} seconds", secs)
            }
            EtaProjection::Remaining(secs) => write!(
                f,
                "Estimated remaining time: {} minutes, {} seconds",
                secs / 60,
                secs % 60
            ),
        }
    }
}

/// Shared, lock-free holder of the current rate estimate
///
/// Single writer (the estimator), many readers (status queries). Cloning
/// shares the same cell.
#[derive(Clone, Debug)]
pub struct RateCell {
    bits: Arc<AtomicU64>,
    default_rate: f64,
}

impl RateCell {
    /// Create a cell holding `default_rate`
    pub fn new(default_rate: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(default_rate.to_bits())),
            default_rate,
        }
    }

    /// Current rate
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Publish a new estimate; `None`, zero, negative or non-finite values reset to the default
    pub fn publish(&self, rate: Option<f64>) -> f64 {
        let rate = match rate {
            Some(r) if r.is_finite() && r > 0.0 => r,
            _ => self.default_rate,
        };
        self.bits.store(rate.to_bits(), Ordering::Release);
        rate
    }
}
