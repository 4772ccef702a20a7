//! Engine settings. Callers usually fill these from their own config file.

use serde::{Deserialize, Serialize};

/// Tunable thresholds for the correction strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionSettings {
    /// Confidence (0–100) above which a detection counts as high confidence.
    pub high_confidence_threshold: f64,
    /// Confidence (0–100) below which a detection counts as low confidence.
    pub low_confidence_threshold: f64,
    /// Largest fallback perturbation, in normalized units.
    pub max_jitter: f64,
    /// Emit per-face diagnostics.
    pub debug: bool,
}

impl Default for CorrectionSettings {
    fn default() -> Self {
        Self {
            high_confidence_threshold: 80.0,
            low_confidence_threshold: 50.0,
            max_jitter: 0.05,
            debug: false,
        }
    }
}

impl CorrectionSettings {
    /// Replaces out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.high_confidence_threshold.is_finite() {
            self.high_confidence_threshold = defaults.high_confidence_threshold;
        }
        if !self.low_confidence_threshold.is_finite() {
            self.low_confidence_threshold = defaults.low_confidence_threshold;
        }
        if !(0.0..=defaults.max_jitter).contains(&self.max_jitter) {
            self.max_jitter = defaults.max_jitter;
        }
        self
    }
}
