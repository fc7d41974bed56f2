//! Shared polyline and sample statistics used by the quality validator and
//! the feature extractor.

use crate::types::StrokePoint;
use std::f64::consts::PI;

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0.0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Mean absolute turning angle between consecutive segment directions.
///
/// Each difference is wrapped into `[0, π]`. Zero-length segments carry no
/// direction and are skipped.
pub fn turning_complexity(points: &[StrokePoint]) -> f64 {
    let headings: Vec<f64> = points
        .windows(2)
        .filter(|w| w[0].distance_to(&w[1]) > f64::EPSILON)
        .map(|w| (w[1].y - w[0].y).atan2(w[1].x - w[0].x))
        .collect();

    if headings.len() < 2 {
        return 0.0;
    }

    let turns: Vec<f64> = headings
        .windows(2)
        .map(|h| {
            let diff = (h[1] - h[0]).abs() % (2.0 * PI);
            if diff > PI {
                2.0 * PI - diff
            } else {
                diff
            }
        })
        .collect();

    mean(&turns)
}

/// Instantaneous speed per segment (`distance / Δt`); segments without
/// positive elapsed time are skipped.
pub fn segment_speeds(points: &[StrokePoint]) -> Vec<f64> {
    points
        .windows(2)
        .filter_map(|w| {
            let dt = w[1].t - w[0].t;
            (dt > 0.0).then(|| w[0].distance_to(&w[1]) / dt)
        })
        .collect()
}

/// Polygon area via the shoelace formula (closing the path implicitly)
pub fn shoelace_area(points: &[StrokePoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..points.len() {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    (twice_area / 2.0).abs()
}
