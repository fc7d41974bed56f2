//! Property tests for stroke preparation, scoring and the deployment gate

use ductus_core::deployment::gate::{GateCriteria, GateSignals, GateThresholds};
use ductus_core::evaluation::{ImperfectionScenario, ScenarioResult};
use ductus_core::stroke::normalizer::resample;
use ductus_core::stroke::quality::quality_score;
use ductus_core::{
    AugmentationEngine, AugmentationKind, RawStroke, StrokeNormalizer, StrokePoint,
};
use proptest::prelude::*;

fn raw_stroke() -> impl Strategy<Value = RawStroke> {
    prop::collection::vec((-500.0f64..500.0, -500.0f64..500.0, 0.0f64..1.0), 2..60).prop_map(
        |coords| {
            let points = coords
                .into_iter()
                .enumerate()
                .map(|(i, (x, y, pressure))| StrokePoint::new(x, y, i as f64 * 0.016, pressure))
                .collect();
            RawStroke::new(points)
        },
    )
}

fn scores(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(prop::bool::ANY.prop_map(|hit| if hit { 1.0 } else { 0.0 }), len)
}

/// Regular polygon vertices; equal chords make the spacing uniform already
fn uniform_arc(n: usize, radius: f64, phase: f64) -> Vec<StrokePoint> {
    let step = std::f64::consts::PI / n as f64;
    (0..n)
        .map(|i| {
            let angle = phase + step * i as f64;
            StrokePoint::new(radius * angle.cos(), radius * angle.sin(), i as f64, 0.5)
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_normalize_yields_target_count(stroke in raw_stroke(), target in 2usize..128) {
        let normalized = StrokeNormalizer::new(target).normalize(&stroke).unwrap();
        prop_assert_eq!(normalized.len(), target);
    }

    #[test]
    fn prop_normalized_points_inside_unit_box(stroke in raw_stroke()) {
        let normalized = StrokeNormalizer::new(64).normalize(&stroke).unwrap();
        for p in &normalized.points {
            prop_assert!((0.0..=1.0).contains(&p.x), "x out of range: {}", p.x);
            prop_assert!((0.0..=1.0).contains(&p.y), "y out of range: {}", p.y);
        }
    }

    #[test]
    fn prop_resampling_uniform_stroke_is_identity(
        n in 3usize..80,
        radius in 1.0f64..100.0,
        phase in 0.0f64..6.28,
    ) {
        let points = uniform_arc(n, radius, phase);
        let again = resample(&points, n);
        prop_assert_eq!(again.len(), n);
        for (a, b) in points.iter().zip(&again) {
            prop_assert!(a.distance_to(b) < 1e-6 * radius, "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn prop_augmentation_keeps_point_count(
        stroke in raw_stroke(),
        seed in any::<u64>(),
        kind in prop::sample::select(AugmentationKind::ALL.to_vec()),
    ) {
        let normalized = StrokeNormalizer::new(32).normalize(&stroke).unwrap();
        let augmented = AugmentationEngine::new(seed).augment(&normalized, kind);
        prop_assert_eq!(augmented.len(), normalized.len());
        prop_assert_eq!(augmented.original_bounds, normalized.original_bounds);
    }

    #[test]
    fn prop_quality_score_is_monotonic(
        points in 0usize..200,
        duration in 0.0f64..10.0,
        pressure in 0.0f64..1.0,
        complexity in 0.0f64..10.0,
        bump in 0.0f64..5.0,
    ) {
        let base = quality_score(points, duration, pressure, complexity);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&base));

        let grown = [
            quality_score(points + bump as usize, duration, pressure, complexity),
            quality_score(points, duration + bump, pressure, complexity),
            quality_score(points, duration, pressure + bump, complexity),
            quality_score(points, duration, pressure, complexity + bump),
        ];
        for score in grown {
            prop_assert!(score + 1e-12 >= base, "{} < {}", score, base);
        }
    }

    #[test]
    fn prop_swapping_models_negates_improvement(
        (old, new) in (1usize..40).prop_flat_map(|n| (scores(n), scores(n))),
    ) {
        let scenario = ImperfectionScenario::HandShake;
        let forward = ScenarioResult::from_scores(scenario, old.clone(), new.clone());
        let backward = ScenarioResult::from_scores(scenario, new, old);

        prop_assert!((forward.improvement + backward.improvement).abs() < 1e-12);
        if forward.improvement.abs() > 1e-12 {
            prop_assert_eq!(forward.improvement_pct.signum(), -backward.improvement_pct.signum());
        } else {
            prop_assert_eq!(forward.improvement_pct, 0.0);
            prop_assert_eq!(backward.improvement_pct, 0.0);
        }
        prop_assert_eq!(forward.significance.t_statistic, backward.significance.t_statistic);
        prop_assert_eq!(forward.significance.significant, backward.significance.significant);
    }

    #[test]
    fn prop_gate_is_conjunction_of_criteria(
        accuracy in -1.0f64..1.0,
        satisfaction in -1.0f64..1.0,
        confidence in 0.0f64..1.0,
        robustness in -1.0f64..1.0,
    ) {
        let thresholds = GateThresholds::default();
        let signals = GateSignals {
            accuracy_improvement: accuracy,
            satisfaction_improvement: satisfaction,
            confidence,
            robustness,
        };
        let criteria = GateCriteria::evaluate(Some(&signals), &thresholds);

        let expected = accuracy >= thresholds.accuracy_improvement
            && satisfaction >= thresholds.satisfaction_improvement
            && confidence >= thresholds.confidence
            && robustness > 0.0;
        prop_assert_eq!(criteria.all(), expected);
        prop_assert_eq!(criteria.confidence(), criteria.met() as f64 / 4.0);
        prop_assert_eq!(criteria.failures().len(), 4 - criteria.met());
    }
}
