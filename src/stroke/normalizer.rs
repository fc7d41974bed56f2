//! Stroke normalization: unit-box rescaling and arc-length resampling.
//!
//! Raw strokes arrive with arbitrary canvas coordinates and uneven sampling
//! density (slow sections are oversampled, fast sections undersampled).
//! Normalization removes both effects so that strokes of the same shape look
//! alike to the feature extractor:
//!
//! 1. Compute the bounding box and map every point into `[0,1]×[0,1]`.
//!    Zero-width or zero-height strokes divide by 1.0 instead.
//! 2. Resample to exactly `N` points spaced equally along the path, linearly
//!    interpolating position, time and pressure inside each segment.

use crate::config::StrokeConfig;
use crate::error::{DuctusError, Result};
use crate::types::{BoundingBox, NormalizedStroke, RawStroke, StrokePoint};

/// Rescales and resamples raw strokes to a fixed point count
#[derive(Debug, Clone)]
pub struct StrokeNormalizer {
    target_points: usize,
}

impl StrokeNormalizer {
    /// Create a normalizer producing `target_points` points per stroke
    pub fn new(target_points: usize) -> Self {
        Self {
            target_points: target_points.max(1),
        }
    }

    pub fn from_config(config: &StrokeConfig) -> Self {
        Self::new(config.target_points)
    }

    pub fn target_points(&self) -> usize {
        self.target_points
    }

    /// Normalize a raw stroke
    ///
    /// # Errors
    ///
    /// Returns [`DuctusError::EmptyStroke`] if the stroke has no points.
    pub fn normalize(&self, stroke: &RawStroke) -> Result<NormalizedStroke> {
        let bounds = stroke.bounding_box().ok_or(DuctusError::EmptyStroke)?;
        let start_t = stroke.points[0].t;

        let sx = unit_denominator(bounds.width());
        let sy = unit_denominator(bounds.height());

        let scaled: Vec<StrokePoint> = stroke
            .points
            .iter()
            .map(|p| StrokePoint {
                x: (p.x - bounds.min_x) / sx,
                y: (p.y - bounds.min_y) / sy,
                t: p.t - start_t,
                pressure: p.pressure,
            })
            .collect();

        let points = resample(&scaled, self.target_points)
            .into_iter()
            .map(|p| StrokePoint {
                x: p.x.clamp(0.0, 1.0),
                y: p.y.clamp(0.0, 1.0),
                ..p
            })
            .collect();

        Ok(NormalizedStroke {
            points,
            original_bounds: bounds,
            duration: stroke.duration(),
        })
    }

    /// Re-run resampling on an already normalized stroke (e.g. after
    /// augmentation produced uneven spacing), keeping its bounds and duration.
    pub fn resample_normalized(&self, stroke: &NormalizedStroke) -> NormalizedStroke {
        NormalizedStroke {
            points: resample(&stroke.points, self.target_points),
            original_bounds: stroke.original_bounds,
            duration: stroke.duration,
        }
    }
}

fn unit_denominator(extent: f64) -> f64 {
    if extent > f64::EPSILON {
        extent
    } else {
        1.0
    }
}

/// Cumulative path length at each point; starts at 0.0 and is non-decreasing
pub fn cumulative_lengths(points: &[StrokePoint]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += points[i - 1].distance_to(p);
        }
        cumulative.push(total);
    }
    cumulative
}

/// Resample a polyline to `n` points equally spaced by arc length.
///
/// Target distances are `i * L / (n - 1)` for `i in 0..n`. A target at or past
/// the total length clamps to the last point. Strokes without any length
/// (a single point, or a stationary press) repeat their first point.
pub fn resample(points: &[StrokePoint], n: usize) -> Vec<StrokePoint> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };

    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![first];
    }

    let cumulative = cumulative_lengths(points);
    let total = cumulative[cumulative.len() - 1];
    // NaN or infinite input has no usable arc length
    if !total.is_finite() || total <= f64::EPSILON {
        return vec![first; n];
    }

    let step = total / (n - 1) as f64;
    (0..n)
        .map(|i| {
            let target = step * i as f64;
            if target >= total {
                return last;
            }
            // First index whose cumulative length exceeds the target; the
            // bracketing segment starts one before it.
            let upper = cumulative.partition_point(|&c| c <= target);
            let lower = upper - 1;
            let span = cumulative[upper] - cumulative[lower];
            let t = (target - cumulative[lower]) / span;
            points[lower].lerp(&points[upper], t)
        })
        .collect()
}

/// Bounding box helper for already-normalized points
pub fn normalized_bounds(stroke: &NormalizedStroke) -> Option<BoundingBox> {
    BoundingBox::from_points(&stroke.points)
}
