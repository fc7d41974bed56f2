//! Data augmentation for normalized strokes.
//!
//! Each augmentation is a single geometric or temporal perturbation with its
//! magnitude drawn from a bounded range. Augmented strokes always keep the
//! point count of their input so they stay compatible with the fixed-size
//! feature vector.

use crate::types::{AugmentationKind, LabeledSample, NormalizedStroke, SampleMetadata, SampleSource, StrokePoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Bounds for every augmentation parameter
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentationRanges {
    /// Maximum rotation magnitude in radians
    pub max_rotation: f64,
    /// Uniform scale factor range
    pub scale: (f64, f64),
    /// Maximum translation per axis (unit-box coordinates)
    pub max_translation: f64,
    /// Maximum jitter per point per axis
    pub max_noise: f64,
    /// Time warp factor range applied to timestamps and duration
    pub time_warp: (f64, f64),
}

impl Default for AugmentationRanges {
    fn default() -> Self {
        Self {
            max_rotation: 15f64.to_radians(),
            scale: (0.85, 1.15),
            max_translation: 0.05,
            max_noise: 0.01,
            time_warp: (0.8, 1.2),
        }
    }
}

/// Seeded augmentation engine
pub struct AugmentationEngine {
    ranges: AugmentationRanges,
    rng: StdRng,
}

impl AugmentationEngine {
    /// Create an engine with default ranges and a fixed seed
    pub fn new(seed: u64) -> Self {
        Self::with_ranges(AugmentationRanges::default(), seed)
    }

    pub fn with_ranges(ranges: AugmentationRanges, seed: u64) -> Self {
        Self {
            ranges,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn ranges(&self) -> &AugmentationRanges {
        &self.ranges
    }

    /// Apply one perturbation of the given kind
    pub fn augment(&mut self, stroke: &NormalizedStroke, kind: AugmentationKind) -> NormalizedStroke {
        match kind {
            AugmentationKind::Rotation => {
                let max = self.ranges.max_rotation;
                let angle = self.rng.gen_range(-max..=max);
                rotate(stroke, angle)
            }
            AugmentationKind::Scaling => {
                let (lo, hi) = self.ranges.scale;
                let factor = self.rng.gen_range(lo..=hi);
                scale(stroke, factor)
            }
            AugmentationKind::Translation => {
                let max = self.ranges.max_translation;
                let dx = self.rng.gen_range(-max..=max);
                let dy = self.rng.gen_range(-max..=max);
                translate(stroke, dx, dy)
            }
            AugmentationKind::Noise => {
                let max = self.ranges.max_noise;
                let rng = &mut self.rng;
                map_points(stroke, |p| StrokePoint {
                    x: p.x + rng.gen_range(-max..=max),
                    y: p.y + rng.gen_range(-max..=max),
                    ..p
                })
            }
            AugmentationKind::TimeWarp => {
                let (lo, hi) = self.ranges.time_warp;
                let factor = self.rng.gen_range(lo..=hi);
                time_warp(stroke, factor)
            }
        }
    }

    /// Produce `k` augmented variants of a sample, cycling through the
    /// augmentation kinds. Each variant records its kind in metadata.
    pub fn expand(&mut self, sample: &LabeledSample, k: usize) -> Vec<LabeledSample> {
        let kinds = AugmentationKind::ALL;
        (0..k)
            .map(|i| {
                let kind = kinds[i % kinds.len()];
                let stroke = self.augment(&sample.stroke, kind);
                let metadata = SampleMetadata {
                    source: SampleSource::Augmented,
                    augmentation: Some(kind),
                    ..sample.metadata.clone()
                };
                LabeledSample::new(stroke, sample.label, metadata)
            })
            .collect()
    }

    /// Expand a whole corpus; originals are kept ahead of their variants
    pub fn expand_corpus(&mut self, samples: Vec<LabeledSample>, k: usize) -> Vec<LabeledSample> {
        let mut out = Vec::with_capacity(samples.len() * (k + 1));
        for sample in samples {
            let variants = self.expand(&sample, k);
            out.push(sample);
            out.extend(variants);
        }
        debug!("Augmented corpus to {} samples (multiplier {})", out.len(), k);
        out
    }
}

fn map_points<F>(stroke: &NormalizedStroke, mut f: F) -> NormalizedStroke
where
    F: FnMut(StrokePoint) -> StrokePoint,
{
    NormalizedStroke {
        points: stroke.points.iter().map(|p| f(*p)).collect(),
        original_bounds: stroke.original_bounds,
        duration: stroke.duration,
    }
}

fn centroid(stroke: &NormalizedStroke) -> (f64, f64) {
    let n = stroke.points.len().max(1) as f64;
    let (sx, sy) = stroke
        .points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    (sx / n, sy / n)
}

/// Rotate about the centroid by `angle` radians
pub fn rotate(stroke: &NormalizedStroke, angle: f64) -> NormalizedStroke {
    let (cx, cy) = centroid(stroke);
    let (sin, cos) = angle.sin_cos();
    map_points(stroke, |p| {
        let dx = p.x - cx;
        let dy = p.y - cy;
        StrokePoint {
            x: cx + dx * cos - dy * sin,
            y: cy + dx * sin + dy * cos,
            ..p
        }
    })
}

/// Uniform scale about the centroid
pub fn scale(stroke: &NormalizedStroke, factor: f64) -> NormalizedStroke {
    let (cx, cy) = centroid(stroke);
    map_points(stroke, |p| StrokePoint {
        x: cx + (p.x - cx) * factor,
        y: cy + (p.y - cy) * factor,
        ..p
    })
}

pub fn translate(stroke: &NormalizedStroke, dx: f64, dy: f64) -> NormalizedStroke {
    map_points(stroke, |p| StrokePoint {
        x: p.x + dx,
        y: p.y + dy,
        ..p
    })
}

/// Multiply every timestamp and the total duration by `factor`
pub fn time_warp(stroke: &NormalizedStroke, factor: f64) -> NormalizedStroke {
    let mut warped = map_points(stroke, |p| StrokePoint { t: p.t * factor, ..p });
    warped.duration = stroke.duration * factor;
    warped
}
