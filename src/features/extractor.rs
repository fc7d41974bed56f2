//! Stroke feature extraction.
//!
//! Converts a normalized stroke into a fixed-length feature vector made of
//! two blocks:
//!
//! - **Summary statistics** (geometry, timing, pressure, shape), always
//!   [`SUMMARY_LEN`] values.
//! - **Point block**: the stroke's `[x, y, pressure]` triples at a fixed
//!   point count, resampled down when longer and zero-padded when shorter.
//!
//! Bounding-box dimensions and aspect ratio come from the stroke's original
//! bounds: after unit-box normalization every stroke spans the same box, so
//! only the raw extent tells an oval from a circle.

use crate::config::StrokeConfig;
use crate::stroke::geometry::{mean, segment_speeds, shoelace_area, std_dev, turning_complexity};
use crate::stroke::normalizer::resample;
use crate::types::{path_length, FeatureVector, LabeledSample, NormalizedStroke};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of summary statistics at the head of every feature vector
pub const SUMMARY_LEN: usize = 15;

/// Encoded value for an undefined or extreme aspect ratio
const ASPECT_CAP: f64 = 50.0;

/// Encoded value for an undefined or extreme compactness
const COMPACTNESS_CAP: f64 = 200.0;

/// Extents below this are treated as zero
const DEGENERATE_EXTENT: f64 = 1e-9;

/// Named summary statistics of one stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeFeatures {
    // Geometric
    pub path_length: f64,
    pub width: f64,
    pub height: f64,
    /// Width over height; `None` when the height is (near) zero
    pub aspect_ratio: Option<f64>,
    /// Mean absolute turning angle in `[0, π]`
    pub complexity: f64,

    // Temporal
    pub duration: f64,
    pub mean_speed: f64,
    /// Population standard deviation of segment speeds
    pub speed_std_dev: f64,

    // Pressure
    pub pressure_mean: f64,
    pub pressure_std_dev: f64,
    pub pressure_range: f64,

    // Shape
    pub centroid_x: f64,
    pub centroid_y: f64,
    /// `perimeter² / area`; `None` when the enclosed area is zero
    pub compactness: Option<f64>,
    /// Gap between first and last point relative to the path length
    pub closure: f64,
}

impl StrokeFeatures {
    /// Encode as the fixed-length summary block
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.path_length,
            self.width,
            self.height,
            self.aspect_ratio.map_or(ASPECT_CAP, |a| a.min(ASPECT_CAP)),
            self.complexity,
            self.duration,
            self.mean_speed,
            self.speed_std_dev,
            self.pressure_mean,
            self.pressure_std_dev,
            self.pressure_range,
            self.centroid_x,
            self.centroid_y,
            self.compactness
                .map_or(COMPACTNESS_CAP, |c| c.min(COMPACTNESS_CAP)),
            self.closure,
        ]
    }
}

/// Feature extractor with a fixed output length
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    classifier_points: usize,
}

impl FeatureExtractor {
    pub fn new(classifier_points: usize) -> Self {
        Self {
            classifier_points: classifier_points.max(1),
        }
    }

    pub fn from_config(config: &StrokeConfig) -> Self {
        Self::new(config.classifier_points)
    }

    /// Length of every vector produced by this extractor
    pub fn vector_len(&self) -> usize {
        SUMMARY_LEN + 3 * self.classifier_points
    }

    /// Compute the named summary statistics
    pub fn summarize(&self, stroke: &NormalizedStroke) -> StrokeFeatures {
        let points = &stroke.points;
        let width = stroke.original_bounds.width();
        let height = stroke.original_bounds.height();
        let length = path_length(points);

        let speeds = segment_speeds(points);
        let pressures: Vec<f64> = points.iter().map(|p| p.pressure).collect();
        let (p_min, p_max) = pressures
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            });

        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();

        let area = shoelace_area(points);
        let compactness = (area > DEGENERATE_EXTENT).then(|| length * length / area);

        let closure = match (points.first(), points.last()) {
            (Some(first), Some(last)) if length > DEGENERATE_EXTENT => {
                first.distance_to(last) / length
            }
            _ => 0.0,
        };

        StrokeFeatures {
            path_length: length,
            width,
            height,
            aspect_ratio: (height > DEGENERATE_EXTENT).then(|| width / height),
            complexity: turning_complexity(points),
            duration: stroke.duration,
            mean_speed: mean(&speeds),
            speed_std_dev: std_dev(&speeds),
            pressure_mean: mean(&pressures),
            pressure_std_dev: std_dev(&pressures),
            pressure_range: if pressures.is_empty() { 0.0 } else { p_max - p_min },
            centroid_x: mean(&xs),
            centroid_y: mean(&ys),
            compactness,
            closure,
        }
    }

    /// Flatten `[x, y, pressure]` triples to exactly `classifier_points`
    /// triples. Longer strokes are resampled by arc length, shorter ones are
    /// zero-padded.
    pub fn point_block(&self, stroke: &NormalizedStroke) -> Vec<f64> {
        let target = self.classifier_points;
        let resampled;
        let points = if stroke.len() > target {
            resampled = resample(&stroke.points, target);
            &resampled
        } else {
            &stroke.points
        };

        let mut block = Vec::with_capacity(target * 3);
        for p in points {
            block.extend_from_slice(&[p.x, p.y, p.pressure]);
        }
        block.resize(target * 3, 0.0);
        block
    }

    /// Full fixed-length feature vector
    pub fn featurize(&self, stroke: &NormalizedStroke) -> FeatureVector {
        let mut values = self.summarize(stroke).to_vec();
        values.extend(self.point_block(stroke));
        debug_assert_eq!(values.len(), self.vector_len());
        FeatureVector(values)
    }

    /// Featurize every sample, keeping input order
    pub fn extract_batch(&self, samples: &[LabeledSample]) -> Vec<FeatureVector> {
        debug!("Extracting features for {} samples", samples.len());
        samples.iter().map(|s| self.featurize(&s.stroke)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::normalizer::StrokeNormalizer;
    use crate::types::{RawStroke, StrokePoint};

    fn normalize(points: Vec<StrokePoint>, n: usize) -> NormalizedStroke {
        StrokeNormalizer::new(n)
            .normalize(&RawStroke::new(points))
            .unwrap()
    }

    fn horizontal_line() -> NormalizedStroke {
        let points = (0..30)
            .map(|i| {
                let f = i as f64 / 29.0;
                StrokePoint::new(50.0 + 124.0 * f, 112.0, f * 0.5, 0.4 + 0.2 * f)
            })
            .collect();
        normalize(points, 100)
    }

    #[test]
    fn test_line_aspect_ratio_is_guarded() {
        let extractor = FeatureExtractor::new(32);
        let features = extractor.summarize(&horizontal_line());

        assert_eq!(features.width, 124.0);
        assert_eq!(features.height, 0.0);
        assert!(features.aspect_ratio.is_none());
        assert!(features.compactness.is_none());
        assert!((features.path_length - 1.0).abs() < 1e-9);
        assert!(features.complexity < 1e-9);
        assert!((features.closure - 1.0).abs() < 1e-9);
        assert!((features.pressure_range - 0.2).abs() < 1e-9);

        let vector = features.to_vec();
        assert_eq!(vector[3], ASPECT_CAP);
        assert!(vector.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_circle_compactness_near_four_pi() {
        let points = (0..200)
            .map(|i| {
                let a = i as f64 / 199.0 * std::f64::consts::TAU;
                StrokePoint::new(a.cos() * 40.0, a.sin() * 40.0, i as f64 * 0.01, 0.5)
            })
            .collect();
        let features = FeatureExtractor::new(32).summarize(&normalize(points, 200));

        let compactness = features.compactness.unwrap();
        assert!((compactness - 4.0 * std::f64::consts::PI).abs() < 0.2);
        assert!((features.aspect_ratio.unwrap() - 1.0).abs() < 1e-3);
        assert!(features.closure < 0.01);
        assert!((features.centroid_x - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_speed_statistics() {
        // Constant speed along x: 0.1 unit per 0.1 s
        let stroke = NormalizedStroke {
            points: (0..11)
                .map(|i| StrokePoint::new(i as f64 * 0.1, 0.0, i as f64 * 0.1, 0.5))
                .collect(),
            original_bounds: crate::types::BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 1.0,
                max_y: 0.0,
            },
            duration: 1.0,
        };
        let features = FeatureExtractor::new(8).summarize(&stroke);
        assert!((features.mean_speed - 1.0).abs() < 1e-9);
        assert!(features.speed_std_dev < 1e-9);
        assert_eq!(features.pressure_std_dev, 0.0);
    }

    #[test]
    fn test_vector_length_is_fixed() {
        let extractor = FeatureExtractor::new(32);
        let long = horizontal_line();
        let short = NormalizedStroke {
            points: long.points[..10].to_vec(),
            ..long.clone()
        };

        assert_eq!(extractor.featurize(&long).len(), extractor.vector_len());
        assert_eq!(extractor.featurize(&short).len(), extractor.vector_len());
    }

    #[test]
    fn test_point_block_pads_with_zeros() {
        let extractor = FeatureExtractor::new(4);
        let stroke = NormalizedStroke {
            points: vec![
                StrokePoint::new(0.1, 0.2, 0.0, 0.3),
                StrokePoint::new(0.4, 0.5, 0.1, 0.6),
            ],
            original_bounds: crate::types::BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 1.0,
                max_y: 1.0,
            },
            duration: 0.1,
        };
        let block = extractor.point_block(&stroke);
        assert_eq!(
            block,
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_point_block_resamples_longer_strokes() {
        let extractor = FeatureExtractor::new(3);
        let block = extractor.point_block(&horizontal_line());
        assert_eq!(block.len(), 9);
        assert!((block[0] - 0.0).abs() < 1e-9);
        assert!((block[3] - 0.5).abs() < 1e-9);
        assert!((block[6] - 1.0).abs() < 1e-9);
    }
}
