//! Real-world imperfection scenarios for robustness testing.
//!
//! Each scenario starts from an idealized outline and applies one specific
//! kind of imperfection, so a model's accuracy per scenario shows which
//! drawing habits it copes with.

use crate::stroke::SyntheticStrokeGenerator;
use crate::types::{RawStroke, ShapeLabel, StrokePoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImperfectionScenario {
    /// Strong positional tremor
    HandShake,
    /// Irregular timing with pauses and stalls
    Hesitation,
    /// Wobbly edges and over- or under-shot endpoints
    ImperfectGeometry,
    /// Retraced segments at the end of the stroke
    CorrectionMarks,
    /// Widely fluctuating pressure
    PressureVariability,
}

impl ImperfectionScenario {
    pub const ALL: [ImperfectionScenario; 5] = [
        ImperfectionScenario::HandShake,
        ImperfectionScenario::Hesitation,
        ImperfectionScenario::ImperfectGeometry,
        ImperfectionScenario::CorrectionMarks,
        ImperfectionScenario::PressureVariability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImperfectionScenario::HandShake => "hand_shake",
            ImperfectionScenario::Hesitation => "hesitation",
            ImperfectionScenario::ImperfectGeometry => "imperfect_geometry",
            ImperfectionScenario::CorrectionMarks => "correction_marks",
            ImperfectionScenario::PressureVariability => "pressure_variability",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ImperfectionScenario::HandShake => 0,
            ImperfectionScenario::Hesitation => 1,
            ImperfectionScenario::ImperfectGeometry => 2,
            ImperfectionScenario::CorrectionMarks => 3,
            ImperfectionScenario::PressureVariability => 4,
        }
    }

    /// Apply this imperfection to an idealized outline
    pub fn apply(&self, outline: &[StrokePoint], canvas_size: f64, rng: &mut StdRng) -> RawStroke {
        let points = match self {
            ImperfectionScenario::HandShake => hand_shake(outline, canvas_size, rng),
            ImperfectionScenario::Hesitation => hesitation(outline, rng),
            ImperfectionScenario::ImperfectGeometry => imperfect_geometry(outline, canvas_size, rng),
            ImperfectionScenario::CorrectionMarks => correction_marks(outline, canvas_size, rng),
            ImperfectionScenario::PressureVariability => pressure_variability(outline, rng),
        };
        RawStroke::new(points)
    }
}

impl fmt::Display for ImperfectionScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn hand_shake(outline: &[StrokePoint], canvas_size: f64, rng: &mut StdRng) -> Vec<StrokePoint> {
    let amplitude = canvas_size * 0.02;
    outline
        .iter()
        .map(|p| StrokePoint {
            x: p.x + rng.gen_range(-amplitude..=amplitude),
            y: p.y + rng.gen_range(-amplitude..=amplitude),
            ..*p
        })
        .collect()
}

fn hesitation(outline: &[StrokePoint], rng: &mut StdRng) -> Vec<StrokePoint> {
    let mut out = Vec::with_capacity(outline.len() + outline.len() / 4);
    let mut t = 0.0;
    for (i, p) in outline.iter().enumerate() {
        if i > 0 {
            let nominal = (p.t - outline[i - 1].t).max(1e-3);
            t += nominal * rng.gen_range(0.3..3.0);
            // Occasional stall: the pen rests, repeating its position
            if rng.gen_bool(0.08) {
                let pause = rng.gen_range(0.1..0.4);
                out.push(StrokePoint { t, ..*p });
                t += pause;
            }
        }
        out.push(StrokePoint { t, ..*p });
    }
    out
}

fn imperfect_geometry(outline: &[StrokePoint], canvas_size: f64, rng: &mut StdRng) -> Vec<StrokePoint> {
    let amplitude = canvas_size * rng.gen_range(0.02..0.05);
    let waves = rng.gen_range(1.5..3.5);
    let phase = rng.gen_range(0.0..TAU);
    let n = outline.len().max(2) as f64;

    let mut warped: Vec<StrokePoint> = outline
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let a = phase + TAU * waves * i as f64 / (n - 1.0);
            StrokePoint {
                x: p.x + amplitude * a.sin(),
                y: p.y + amplitude * (1.3 * a).cos(),
                ..*p
            }
        })
        .collect();

    // Undershoot by dropping the tail, or overshoot by extending it
    let tail = (outline.len() / 12).max(1);
    let ends = match warped.as_slice() {
        [.., prev, last] => Some((*prev, *last)),
        _ => None,
    };
    if rng.gen_bool(0.5) && warped.len() > tail + 2 {
        warped.truncate(warped.len() - tail);
    } else if let Some((prev, last)) = ends {
        let dt = (last.t - prev.t).max(1e-3);
        for k in 1..=tail {
            let f = k as f64;
            warped.push(StrokePoint {
                x: last.x + (last.x - prev.x) * f,
                y: last.y + (last.y - prev.y) * f,
                t: last.t + dt * f,
                pressure: last.pressure,
            });
        }
    }
    warped
}

fn correction_marks(outline: &[StrokePoint], canvas_size: f64, rng: &mut StdRng) -> Vec<StrokePoint> {
    let mut out = outline.to_vec();
    let Some(last) = outline.last().copied() else {
        return out;
    };
    let span = (outline.len() / 5).max(2).min(outline.len());
    let dt = outline
        .windows(2)
        .last()
        .map_or(0.012, |w| (w[1].t - w[0].t).max(1e-3));
    let wobble = canvas_size * 0.01;
    let mut t = last.t;

    // Back over the last stretch, then forward again
    let back = outline[outline.len() - span..].iter().rev().skip(1);
    let forward = outline[outline.len() - span..].iter().skip(1);
    for p in back.chain(forward) {
        t += dt;
        out.push(StrokePoint {
            x: p.x + rng.gen_range(-wobble..=wobble),
            y: p.y + rng.gen_range(-wobble..=wobble),
            t,
            pressure: p.pressure,
        });
    }
    out
}

fn pressure_variability(outline: &[StrokePoint], rng: &mut StdRng) -> Vec<StrokePoint> {
    outline
        .iter()
        .map(|p| StrokePoint {
            pressure: (p.pressure * rng.gen_range(0.2..1.8)).clamp(0.02, 1.0),
            ..*p
        })
        .collect()
}

/// Produces labeled test strokes for a scenario
#[derive(Debug, Clone)]
pub struct ScenarioStrokeFactory {
    generator: SyntheticStrokeGenerator,
    seed: u64,
}

impl ScenarioStrokeFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            generator: SyntheticStrokeGenerator::ideal(seed),
            seed,
        }
    }

    /// `n` strokes exhibiting `scenario`, labels cycling through every shape
    pub fn generate(&self, scenario: ImperfectionScenario, n: usize) -> Vec<(RawStroke, ShapeLabel)> {
        let canvas = self.generator.config().canvas_size;
        let mut rng = StdRng::seed_from_u64(
            self.seed ^ (0xA5A5_0000_0000 | scenario.index() as u64),
        );

        (0..n)
            .map(|i| {
                let label = ShapeLabel::ALL[i % ShapeLabel::ALL.len()];
                let variation = (i / ShapeLabel::ALL.len()) as u32;
                let mut shape_rng = self.generator.rng_for(label, variation);
                let outline = self.generator.ideal_outline(label, variation, &mut shape_rng);
                (scenario.apply(&outline, canvas, &mut rng), label)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::geometry::std_dev;

    fn outline() -> Vec<StrokePoint> {
        let generator = SyntheticStrokeGenerator::ideal(3);
        let mut rng = generator.rng_for(ShapeLabel::Circle, 0);
        generator.ideal_outline(ShapeLabel::Circle, 0, &mut rng)
    }

    #[test]
    fn test_labels_cycle_and_output_is_reproducible() {
        let factory = ScenarioStrokeFactory::new(11);
        let a = factory.generate(ImperfectionScenario::HandShake, 12);
        let b = factory.generate(ImperfectionScenario::HandShake, 12);

        assert_eq!(a.len(), 12);
        assert_eq!(a[0].1, ShapeLabel::Circle);
        assert_eq!(a[7].1, ShapeLabel::Rectangle);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hesitation_keeps_time_monotone() {
        let mut rng = StdRng::seed_from_u64(5);
        let stroke = ImperfectionScenario::Hesitation.apply(&outline(), 300.0, &mut rng);
        assert!(stroke.len() >= outline().len());
        assert!(stroke.points.windows(2).all(|w| w[1].t >= w[0].t));
    }

    #[test]
    fn test_correction_marks_retrace_the_end() {
        let base = outline();
        let mut rng = StdRng::seed_from_u64(5);
        let stroke = ImperfectionScenario::CorrectionMarks.apply(&base, 300.0, &mut rng);
        let span = base.len() / 5;
        assert_eq!(stroke.len(), base.len() + 2 * (span - 1));
    }

    #[test]
    fn test_pressure_variability_widens_spread() {
        let base = outline();
        let mut rng = StdRng::seed_from_u64(5);
        let stroke = ImperfectionScenario::PressureVariability.apply(&base, 300.0, &mut rng);
        let before: Vec<f64> = base.iter().map(|p| p.pressure).collect();
        let after: Vec<f64> = stroke.points.iter().map(|p| p.pressure).collect();
        assert!(std_dev(&after) > std_dev(&before));
        assert!(after.iter().all(|p| (0.02..=1.0).contains(p)));
    }

    #[test]
    fn test_every_scenario_yields_points() {
        let base = outline();
        for scenario in ImperfectionScenario::ALL {
            let mut rng = StdRng::seed_from_u64(scenario.index() as u64);
            let stroke = scenario.apply(&base, 300.0, &mut rng);
            assert!(stroke.len() >= 10, "{} produced {} points", scenario, stroke.len());
        }
    }
}
