//! Feature extraction for the shape classifier.
//!
//! Every vector is `SUMMARY_LEN + 3 * classifier_points` long for a given
//! configuration, so one model version always sees the same input width.

pub mod extractor;

pub use extractor::{FeatureExtractor, StrokeFeatures, SUMMARY_LEN};
