//! Comparison statistics.
//!
//! The significance estimate is a heuristic: a simplified two-sample
//! t-statistic compared against a fixed critical value of 2.0, scaled into a
//! confidence in `[0, 0.95]`. It is not derived from a p-value and should
//! not be read as one.

use serde::Serialize;

/// Fixed critical value for the t-statistic
pub const CRITICAL_T: f64 = 2.0;

/// Confidence reported once the critical value is reached
pub const MAX_CONFIDENCE: f64 = 0.95;

const EPSILON: f64 = 1e-12;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance; zero for fewer than two values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignificanceEstimate {
    /// `|m2 - m1| / sqrt((s1² + s2²) / n)`; infinite when both samples have
    /// zero spread but different means
    pub t_statistic: f64,
    /// `0.95 * min(t / 2, 1)`
    pub confidence: f64,
    /// Whether `t` reached the critical value
    pub significant: bool,
}

impl SignificanceEstimate {
    pub fn none() -> Self {
        Self {
            t_statistic: 0.0,
            confidence: 0.0,
            significant: false,
        }
    }
}

/// Approximate significance of the difference between two samples
pub fn approximate_significance(first: &[f64], second: &[f64]) -> SignificanceEstimate {
    let n = first.len().min(second.len());
    if n == 0 {
        return SignificanceEstimate::none();
    }

    let diff = (mean(second) - mean(first)).abs();
    let spread = ((sample_variance(first) + sample_variance(second)) / n as f64).sqrt();
    let t = if spread > EPSILON {
        diff / spread
    } else if diff > EPSILON {
        f64::INFINITY
    } else {
        0.0
    };

    SignificanceEstimate {
        t_statistic: t,
        confidence: MAX_CONFIDENCE * (t / CRITICAL_T).min(1.0),
        significant: t >= CRITICAL_T,
    }
}

/// Relative change in percent. A zero baseline reports the absolute change
/// in percentage points so the sign is preserved.
pub fn improvement_pct(old: f64, new: f64) -> f64 {
    let improvement = new - old;
    if old.abs() < EPSILON {
        improvement * 100.0
    } else {
        improvement / old * 100.0
    }
}

/// User frustration proxy: share of strokes the model gets wrong
pub fn frustration(accuracy: f64) -> f64 {
    (1.0 - accuracy).max(0.0)
}

/// Relative reduction in frustration (0.15 = 15% less frustration)
pub fn satisfaction_improvement(old_accuracy: f64, new_accuracy: f64) -> f64 {
    let old = frustration(old_accuracy);
    let new = frustration(new_accuracy);
    if old < EPSILON {
        old - new
    } else {
        (old - new) / old
    }
}
