//! Stroke preparation: normalization, quality validation, augmentation and
//! synthetic generation.
//!
//! # Pipeline
//!
//! ```text
//! RawStroke → DataQualityValidator → StrokeNormalizer → NormalizedStroke
//!                                                            ↓
//!              SyntheticStrokeGenerator (fallback)   AugmentationEngine
//! ```

pub mod augmentation;
pub mod geometry;
pub mod normalizer;
pub mod quality;
pub mod synthetic;

pub use augmentation::{AugmentationEngine, AugmentationRanges};
pub use normalizer::{resample, StrokeNormalizer};
pub use quality::{DataQualityValidator, QualityIssue, QualityReport};
pub use synthetic::{ImperfectionProfile, SyntheticConfig, SyntheticStrokeGenerator};
