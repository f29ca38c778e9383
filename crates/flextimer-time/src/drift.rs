//! Drift correction for periodic tick callbacks
//!
//! Host timers fire late under load, and trusting `elapsed += interval`
//! compounds that error over thousands of ticks. The corrector measures each
//! observed tick spacing against the nominal interval and keeps a bounded
//! lateness accumulator. Early ticks are discarded by the clamp rather than
//! offsetting later lateness.

use flextimer_core::{TimerError, TimerResult};
use tracing::warn;

use crate::epoch_millis;

/// Tracks tick lateness against the nominal interval
#[derive(Clone, Debug)]
pub struct DriftCorrector {
    /// Nominal tick period (ms)
    interval: f64,
    /// Time of the last sample, `None` until reset
    last_sample: Option<f64>,
    /// Running sum of (observed - nominal) spacing
    /// INVARIANT: never negative after `corrected_elapsed`
    accumulated_drift: f64,
    /// Drift reported by the most recent sample
    last_drift: f64,
}

impl DriftCorrector {
    /// Create an unanchored corrector; call `reset` before sampling
    pub fn new(interval: f64) -> Self {
        DriftCorrector {
            interval,
            last_sample: None,
            accumulated_drift: 0.0,
            last_drift: 0.0,
        }
    }

    /// Anchor the corrector at `reference`, or at the current epoch time
    pub fn reset(&mut self, reference: Option<f64>) {
        self.last_sample = Some(reference.unwrap_or_else(epoch_millis));
        self.accumulated_drift = 0.0;
        self.last_drift = 0.0;
    }

    /// Record a tick observed at `now`.
    /// Returns the signed drift of this tick; positive means it fired late.
    pub fn sample(&mut self, now: f64) -> TimerResult<f64> {
        if !now.is_finite() {
            return Err(TimerError::InvalidInput(format!(
                "drift sample time must be finite, got {}",
                now
            )));
        }

        let Some(last) = self.last_sample else {
            warn!(now, "drift sampled before reset, reporting zero drift");
            self.last_drift = 0.0;
            return Ok(0.0);
        };

        let drift = (now - last) - self.interval;
        self.accumulated_drift += drift;
        self.last_sample = Some(now);
        self.last_drift = drift;
        Ok(drift)
    }

    /// The tick's contribution after shaving off accumulated lateness.
    /// Drains one interval from the accumulator, clamped at zero.
    pub fn corrected_elapsed(&mut self) -> f64 {
        let corrected = self.interval - self.accumulated_drift;
        self.accumulated_drift = (self.accumulated_drift - self.interval).max(0.0);
        corrected.max(0.0)
    }

    #[inline]
    pub fn interval(&self) -> f64 {
        self.interval
    }

    #[inline]
    pub fn last_sample(&self) -> Option<f64> {
        self.last_sample
    }

    #[inline]
    pub fn accumulated_drift(&self) -> f64 {
        self.accumulated_drift
    }

    #[inline]
    pub fn last_drift(&self) -> f64 {
        self.last_drift
    }

    /// Whether `reset` has been called
    #[inline]
    pub fn is_anchored(&self) -> bool {
        self.last_sample.is_some()
    }
}
