//! Core data types for the Ductus retraining pipeline
//!
//! This module defines the stroke and sample structures that flow through the
//! pipeline: raw captures from the canvas, normalized strokes with a fixed
//! point count, labeled training samples, and feature vectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One captured drawing sample
///
/// `t` is seconds since the start of capture; `pressure` is in `[0, 1]` for
/// pressure-capable devices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    pub t: f64,
    pub pressure: f64,
}

impl StrokePoint {
    pub fn new(x: f64, y: f64, t: f64, pressure: f64) -> Self {
        Self { x, y, t, pressure }
    }

    /// Euclidean distance in the drawing plane
    pub fn distance_to(&self, other: &StrokePoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation of every channel (position, time, pressure)
    pub fn lerp(&self, other: &StrokePoint, t: f64) -> StrokePoint {
        StrokePoint {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            t: self.t + (other.t - self.t) * t,
            pressure: self.pressure + (other.pressure - self.pressure) * t,
        }
    }
}

/// Axis-aligned bounding box of a point set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Compute the bounding box of the given points, `None` when empty
    pub fn from_points(points: &[StrokePoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Sum of consecutive point-to-point distances
pub fn path_length(points: &[StrokePoint]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Stroke as delivered by the capture collaborator. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStroke {
    pub points: Vec<StrokePoint>,
}

impl RawStroke {
    pub fn new(points: Vec<StrokePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time between first and last sample in seconds
    pub fn duration(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (last.t - first.t).max(0.0),
            _ => 0.0,
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }
}

/// Stroke rescaled into the unit box and resampled to a fixed point count
///
/// Every normalized stroke produced under one configuration has the same
/// number of points, which keeps feature vectors a fixed size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStroke {
    pub points: Vec<StrokePoint>,
    /// Bounding box of the raw stroke before rescaling
    pub original_bounds: BoundingBox,
    /// Duration of the raw stroke in seconds
    pub duration: f64,
}

impl NormalizedStroke {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Shape classes recognized by the on-device classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeLabel {
    Circle,
    Rectangle,
    Line,
    Oval,
    Curve,
    Polygon,
}

impl ShapeLabel {
    /// All labels in a stable order
    pub const ALL: [ShapeLabel; 6] = [
        ShapeLabel::Circle,
        ShapeLabel::Rectangle,
        ShapeLabel::Line,
        ShapeLabel::Oval,
        ShapeLabel::Curve,
        ShapeLabel::Polygon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeLabel::Circle => "circle",
            ShapeLabel::Rectangle => "rectangle",
            ShapeLabel::Line => "line",
            ShapeLabel::Oval => "oval",
            ShapeLabel::Curve => "curve",
            ShapeLabel::Polygon => "polygon",
        }
    }

    /// Stable index into [`ShapeLabel::ALL`]
    pub fn index(&self) -> usize {
        match self {
            ShapeLabel::Circle => 0,
            ShapeLabel::Rectangle => 1,
            ShapeLabel::Line => 2,
            ShapeLabel::Oval => 3,
            ShapeLabel::Curve => 4,
            ShapeLabel::Polygon => 5,
        }
    }
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown shape label: {}", s))
    }
}

/// Geometric or temporal perturbation applied by the augmentation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AugmentationKind {
    Rotation,
    Scaling,
    Translation,
    Noise,
    TimeWarp,
}

impl AugmentationKind {
    pub const ALL: [AugmentationKind; 5] = [
        AugmentationKind::Rotation,
        AugmentationKind::Scaling,
        AugmentationKind::Translation,
        AugmentationKind::Noise,
        AugmentationKind::TimeWarp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AugmentationKind::Rotation => "rotation",
            AugmentationKind::Scaling => "scaling",
            AugmentationKind::Translation => "translation",
            AugmentationKind::Noise => "noise",
            AugmentationKind::TimeWarp => "time_warp",
        }
    }
}

impl fmt::Display for AugmentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a training sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSource {
    /// Drawn by a user on the canvas
    Real,
    /// Produced by the synthetic stroke generator
    Synthetic,
    /// Derived from another sample by augmentation
    Augmented,
}

/// Free-form provenance attached to each labeled sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub source: SampleSource,
    pub quality_score: Option<f64>,
    pub augmentation: Option<AugmentationKind>,
    /// Generator variation index for synthetic samples
    pub variation: Option<u32>,
    pub captured_at: DateTime<Utc>,
}

impl SampleMetadata {
    pub fn new(source: SampleSource) -> Self {
        Self {
            source,
            quality_score: None,
            augmentation: None,
            variation: None,
            captured_at: Utc::now(),
        }
    }

    pub fn with_quality(mut self, score: f64) -> Self {
        self.quality_score = Some(score);
        self
    }

    pub fn with_variation(mut self, variation: u32) -> Self {
        self.variation = Some(variation);
        self
    }
}

/// Normalized stroke paired with its shape label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub id: Uuid,
    pub stroke: NormalizedStroke,
    pub label: ShapeLabel,
    pub metadata: SampleMetadata,
}

impl LabeledSample {
    pub fn new(stroke: NormalizedStroke, label: ShapeLabel, metadata: SampleMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            stroke,
            label,
            metadata,
        }
    }
}

/// Fixed-length numeric summary of one normalized stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(pub Vec<f64>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let points = vec![
            StrokePoint::new(10.0, 5.0, 0.0, 0.5),
            StrokePoint::new(-2.0, 8.0, 0.1, 0.5),
            StrokePoint::new(4.0, 20.0, 0.2, 0.5),
        ];
        let bounds = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bounds.min_x, -2.0);
        assert_eq!(bounds.max_x, 10.0);
        assert_eq!(bounds.width(), 12.0);
        assert_eq!(bounds.height(), 15.0);

        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_path_length_and_duration() {
        let stroke = RawStroke::new(vec![
            StrokePoint::new(0.0, 0.0, 1.0, 0.5),
            StrokePoint::new(3.0, 4.0, 1.5, 0.5),
            StrokePoint::new(3.0, 10.0, 2.5, 0.5),
        ]);
        assert_eq!(path_length(&stroke.points), 11.0);
        assert_eq!(stroke.duration(), 1.5);
        assert_eq!(RawStroke::new(vec![]).duration(), 0.0);
    }

    #[test]
    fn test_lerp_interpolates_every_channel() {
        let a = StrokePoint::new(0.0, 0.0, 0.0, 0.2);
        let b = StrokePoint::new(10.0, 20.0, 2.0, 0.6);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid, StrokePoint::new(5.0, 10.0, 1.0, 0.4));
    }

    #[test]
    fn test_shape_label_parsing() {
        assert_eq!("circle".parse::<ShapeLabel>().unwrap(), ShapeLabel::Circle);
        assert_eq!(" Polygon ".parse::<ShapeLabel>().unwrap(), ShapeLabel::Polygon);
        assert!("triangle".parse::<ShapeLabel>().is_err());

        for (i, label) in ShapeLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
        }
    }

    #[test]
    fn test_shape_label_serde() {
        let json = serde_json::to_string(&ShapeLabel::Rectangle).unwrap();
        assert_eq!(json, "\"rectangle\"");
        let kind = serde_json::to_string(&AugmentationKind::TimeWarp).unwrap();
        assert_eq!(kind, "\"time_warp\"");
    }
}
