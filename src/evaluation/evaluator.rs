//! Paired baseline-versus-candidate evaluation across imperfection scenarios

use crate::config::PipelineConfig;
use crate::error::{DuctusError, Result};
use crate::evaluation::scenarios::{ImperfectionScenario, ScenarioStrokeFactory};
use crate::evaluation::stats::{
    approximate_significance, improvement_pct, mean, satisfaction_improvement,
    SignificanceEstimate,
};
use crate::features::FeatureExtractor;
use crate::stroke::StrokeNormalizer;
use crate::training::model::ShapeClassifier;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Old versus new model on one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub scenario: ImperfectionScenario,
    /// Per-sample scores (1.0 correct, 0.0 wrong), paired by index
    pub old_scores: Vec<f64>,
    pub new_scores: Vec<f64>,
    pub old_accuracy: f64,
    pub new_accuracy: f64,
    pub improvement: f64,
    pub improvement_pct: f64,
    pub significance: SignificanceEstimate,
}

impl ScenarioResult {
    pub fn from_scores(scenario: ImperfectionScenario, old_scores: Vec<f64>, new_scores: Vec<f64>) -> Self {
        let old_accuracy = mean(&old_scores);
        let new_accuracy = mean(&new_scores);
        Self {
            scenario,
            old_accuracy,
            new_accuracy,
            improvement: new_accuracy - old_accuracy,
            improvement_pct: improvement_pct(old_accuracy, new_accuracy),
            significance: approximate_significance(&old_scores, &new_scores),
            old_scores,
            new_scores,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.old_scores.len().min(self.new_scores.len())
    }
}

/// Aggregate of every scenario result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub scenarios: Vec<ScenarioResult>,
    pub overall_old_accuracy: f64,
    pub overall_new_accuracy: f64,
    pub overall_improvement_pct: f64,
    /// Relative reduction of the frustration proxy `max(0, 1 - accuracy)`
    pub satisfaction_improvement: f64,
    /// Mean per-scenario accuracy improvement
    pub robustness: f64,
    /// Significance over every paired sample of every scenario
    pub significance: SignificanceEstimate,
}

impl ComparisonReport {
    pub fn from_results(scenarios: Vec<ScenarioResult>) -> Result<Self> {
        if scenarios.is_empty() || scenarios.iter().all(|s| s.sample_count() == 0) {
            return Err(DuctusError::MissingTestResults(
                "no scenario produced any samples".to_string(),
            ));
        }

        let pooled_old: Vec<f64> = scenarios.iter().flat_map(|s| s.old_scores.iter().copied()).collect();
        let pooled_new: Vec<f64> = scenarios.iter().flat_map(|s| s.new_scores.iter().copied()).collect();
        let overall_old_accuracy = mean(&pooled_old);
        let overall_new_accuracy = mean(&pooled_new);
        let improvements: Vec<f64> = scenarios.iter().map(|s| s.improvement).collect();

        Ok(Self {
            overall_old_accuracy,
            overall_new_accuracy,
            overall_improvement_pct: improvement_pct(overall_old_accuracy, overall_new_accuracy),
            satisfaction_improvement: satisfaction_improvement(
                overall_old_accuracy,
                overall_new_accuracy,
            ),
            robustness: mean(&improvements),
            significance: approximate_significance(&pooled_old, &pooled_new),
            scenarios,
        })
    }

    /// Scenarios where the candidate is worse than the baseline
    pub fn regressions(&self) -> Vec<ImperfectionScenario> {
        self.scenarios
            .iter()
            .filter(|s| s.improvement < 0.0)
            .map(|s| s.scenario)
            .collect()
    }
}

/// Runs both models over synthetic scenario strokes
#[derive(Debug, Clone)]
pub struct PerformanceEvaluator {
    factory: ScenarioStrokeFactory,
    normalizer: StrokeNormalizer,
    extractor: FeatureExtractor,
    samples_per_scenario: usize,
}

impl PerformanceEvaluator {
    pub fn new(
        factory: ScenarioStrokeFactory,
        normalizer: StrokeNormalizer,
        extractor: FeatureExtractor,
        samples_per_scenario: usize,
    ) -> Self {
        Self {
            factory,
            normalizer,
            extractor,
            samples_per_scenario,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            // Offset so test strokes never coincide with training synthetics
            ScenarioStrokeFactory::new(config.seed.wrapping_add(0x5EED)),
            StrokeNormalizer::from_config(&config.stroke),
            FeatureExtractor::from_config(&config.stroke),
            config.evaluation.samples_per_scenario,
        )
    }

    /// Score both models on one scenario
    pub fn evaluate_scenario(
        &self,
        scenario: ImperfectionScenario,
        old: &dyn ShapeClassifier,
        new: &dyn ShapeClassifier,
    ) -> Result<ScenarioResult> {
        let strokes = self.factory.generate(scenario, self.samples_per_scenario);
        let mut old_scores = Vec::with_capacity(strokes.len());
        let mut new_scores = Vec::with_capacity(strokes.len());

        for (raw, label) in &strokes {
            let features = self.extractor.featurize(&self.normalizer.normalize(raw)?);
            old_scores.push(score(old.predict(&features)?.label == *label));
            new_scores.push(score(new.predict(&features)?.label == *label));
        }

        let result = ScenarioResult::from_scores(scenario, old_scores, new_scores);
        debug!(
            "Scenario {}: old {:.3} new {:.3} ({:+.1}%)",
            scenario, result.old_accuracy, result.new_accuracy, result.improvement_pct
        );
        Ok(result)
    }

    /// Evaluate every scenario concurrently and aggregate
    pub async fn compare(
        &self,
        old: Arc<dyn ShapeClassifier>,
        new: Arc<dyn ShapeClassifier>,
    ) -> Result<ComparisonReport> {
        let mut tasks = JoinSet::new();
        for scenario in ImperfectionScenario::ALL {
            let evaluator = self.clone();
            let old = Arc::clone(&old);
            let new = Arc::clone(&new);
            tasks.spawn_blocking(move || evaluator.evaluate_scenario(scenario, old.as_ref(), new.as_ref()));
        }

        let mut results = Vec::with_capacity(ImperfectionScenario::ALL.len());
        while let Some(joined) = tasks.join_next().await {
            let result = joined
                .map_err(|e| DuctusError::Other(format!("Scenario evaluation task failed: {}", e)))??;
            results.push(result);
        }
        results.sort_by_key(|r| r.scenario.index());

        let report = ComparisonReport::from_results(results)?;
        info!(
            "Evaluation: {} -> {} accuracy ({:+.1}%), robustness {:+.3}, confidence {:.2}",
            old.name(),
            new.name(),
            report.overall_improvement_pct,
            report.robustness,
            report.significance.confidence
        );
        Ok(report)
    }
}

fn score(correct: bool) -> f64 {
    if correct {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::model::Prediction;
    use crate::types::{FeatureVector, ShapeLabel};

    /// Always answers the same label
    struct ConstantModel(ShapeLabel);

    impl ShapeClassifier for ConstantModel {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, _features: &FeatureVector) -> Result<Prediction> {
            Ok(Prediction {
                label: self.0,
                confidence: 1.0,
            })
        }
    }

    fn scores(correct: usize, total: usize) -> Vec<f64> {
        (0..total).map(|i| score(i < correct)).collect()
    }

    #[test]
    fn test_sixty_to_seventy_eight_is_thirty_percent() {
        let result = ScenarioResult::from_scores(
            ImperfectionScenario::HandShake,
            scores(30, 50),
            scores(39, 50),
        );
        assert!((result.old_accuracy - 0.60).abs() < 1e-12);
        assert!((result.new_accuracy - 0.78).abs() < 1e-12);
        assert!((result.improvement_pct - 30.0).abs() < 1e-9);
        assert_eq!(result.sample_count(), 50);
    }

    #[test]
    fn test_swapping_models_negates_improvement() {
        let a = ScenarioResult::from_scores(ImperfectionScenario::Hesitation, scores(20, 40), scores(31, 40));
        let b = ScenarioResult::from_scores(ImperfectionScenario::Hesitation, scores(31, 40), scores(20, 40));
        assert!((a.improvement + b.improvement).abs() < 1e-12);
        assert!(a.improvement_pct > 0.0 && b.improvement_pct < 0.0);
        assert_eq!(a.significance.t_statistic, b.significance.t_statistic);
    }

    #[test]
    fn test_report_aggregates() {
        let report = ComparisonReport::from_results(vec![
            ScenarioResult::from_scores(ImperfectionScenario::HandShake, scores(5, 10), scores(8, 10)),
            ScenarioResult::from_scores(ImperfectionScenario::Hesitation, scores(6, 10), scores(5, 10)),
        ])
        .unwrap();

        assert!((report.overall_old_accuracy - 0.55).abs() < 1e-12);
        assert!((report.overall_new_accuracy - 0.65).abs() < 1e-12);
        assert!((report.robustness - 0.1).abs() < 1e-12);
        assert_eq!(report.regressions(), vec![ImperfectionScenario::Hesitation]);
    }

    #[test]
    fn test_empty_report_is_missing_results() {
        assert!(matches!(
            ComparisonReport::from_results(Vec::new()),
            Err(DuctusError::MissingTestResults(_))
        ));
    }

    #[tokio::test]
    async fn test_compare_runs_every_scenario_in_order() {
        let config = PipelineConfig {
            evaluation: crate::config::EvaluationConfig {
                samples_per_scenario: 12,
            },
            ..PipelineConfig::default()
        };
        let evaluator = PerformanceEvaluator::from_config(&config);
        let report = evaluator
            .compare(
                Arc::new(ConstantModel(ShapeLabel::Line)),
                Arc::new(ConstantModel(ShapeLabel::Circle)),
            )
            .await
            .unwrap();

        let order: Vec<_> = report.scenarios.iter().map(|s| s.scenario).collect();
        assert_eq!(order, ImperfectionScenario::ALL.to_vec());
        // Labels cycle evenly, so either constant answer is right 1 time in 6
        for scenario in &report.scenarios {
            assert!((scenario.old_accuracy - 1.0 / 6.0).abs() < 1e-12);
            assert!((scenario.new_accuracy - 1.0 / 6.0).abs() < 1e-12);
        }
        assert_eq!(report.robustness, 0.0);
    }
}
