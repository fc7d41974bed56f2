//! Comparative evaluation of a baseline and a candidate classifier.
//!
//! # Architecture
//!
//! - **ImperfectionScenario**: closed set of real-world drawing flaws
//! - **ScenarioStrokeFactory**: reproducible labeled test strokes per scenario
//! - **PerformanceEvaluator**: paired scoring of both models, one task per
//!   scenario, joined before aggregation
//! - **stats**: improvement, frustration proxy and the approximate
//!   significance heuristic
//!
//! # Example
//!
//! ```rust,ignore
//! let evaluator = PerformanceEvaluator::from_config(&config);
//! let report = evaluator.compare(baseline.model, candidate.model).await?;
//! println!("{:+.1}%", report.overall_improvement_pct);
//! ```

pub mod evaluator;
pub mod scenarios;
pub mod stats;

pub use evaluator::{ComparisonReport, PerformanceEvaluator, ScenarioResult};
pub use scenarios::{ImperfectionScenario, ScenarioStrokeFactory};
pub use stats::SignificanceEstimate;
