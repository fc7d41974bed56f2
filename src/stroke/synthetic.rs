//! Synthetic stroke generation with human-like imperfection.
//!
//! Used when real samples for a shape are scarce. Each generator builds the
//! idealized geometry for a shape and then degrades it the way a hand does:
//! positional tremor, uneven drawing speed, and fluctuating pressure.
//!
//! Generation is reproducible: the same `(seed, label, variation)` triple
//! always yields the same stroke, while different variation indices give a
//! diverse family of sizes, orientations and proportions.

use crate::stroke::normalizer::resample;
use crate::types::{RawStroke, ShapeLabel, StrokePoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::{PI, TAU};

/// Magnitudes of the simulated hand imperfections
#[derive(Debug, Clone, PartialEq)]
pub struct ImperfectionProfile {
    /// Maximum positional jitter per point (canvas pixels)
    pub tremor: f64,
    /// Maximum relative deviation of each sampling interval
    pub speed_jitter: f64,
    /// Maximum relative deviation of each pressure sample
    pub pressure_jitter: f64,
}

impl ImperfectionProfile {
    /// Typical finger or stylus drawing
    pub fn human() -> Self {
        Self {
            tremor: 2.5,
            speed_jitter: 0.35,
            pressure_jitter: 0.25,
        }
    }

    /// Geometrically perfect strokes with steady timing
    pub fn ideal() -> Self {
        Self {
            tremor: 0.0,
            speed_jitter: 0.0,
            pressure_jitter: 0.0,
        }
    }
}

impl Default for ImperfectionProfile {
    fn default() -> Self {
        Self::human()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub points_per_stroke: usize,
    /// Side of the square canvas the shapes are drawn on
    pub canvas_size: f64,
    /// Nominal seconds between samples
    pub base_interval_secs: f64,
    pub base_pressure: f64,
    pub profile: ImperfectionProfile,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            points_per_stroke: 64,
            canvas_size: 300.0,
            base_interval_secs: 0.012,
            base_pressure: 0.55,
            profile: ImperfectionProfile::human(),
        }
    }
}

/// Procedural stroke generator
#[derive(Debug, Clone)]
pub struct SyntheticStrokeGenerator {
    config: SyntheticConfig,
    seed: u64,
}

impl SyntheticStrokeGenerator {
    pub fn new(config: SyntheticConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    /// Generator with human imperfections and default geometry
    pub fn human(seed: u64) -> Self {
        Self::new(SyntheticConfig::default(), seed)
    }

    /// Generator producing idealized, imperfection-free strokes
    pub fn ideal(seed: u64) -> Self {
        Self::new(
            SyntheticConfig {
                profile: ImperfectionProfile::ideal(),
                ..SyntheticConfig::default()
            },
            seed,
        )
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Deterministic RNG for one member of a shape family
    pub fn rng_for(&self, label: ShapeLabel, variation: u32) -> StdRng {
        let mixed = self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ ((label.index() as u64 + 1) << 40)
            ^ variation as u64;
        StdRng::seed_from_u64(mixed)
    }

    /// Generate one degraded stroke
    pub fn generate(&self, label: ShapeLabel, variation: u32) -> RawStroke {
        let mut rng = self.rng_for(label, variation);
        let outline = self.ideal_outline(label, variation, &mut rng);
        self.degrade(&outline, &mut rng)
    }

    /// Generate `count` strokes starting at `first_variation`
    pub fn generate_family(
        &self,
        label: ShapeLabel,
        first_variation: u32,
        count: usize,
    ) -> Vec<(u32, RawStroke)> {
        (0..count as u32)
            .map(|i| {
                let variation = first_variation.wrapping_add(i);
                (variation, self.generate(label, variation))
            })
            .collect()
    }

    /// Idealized geometry resampled to `points_per_stroke` points, with
    /// steady timing and a smooth pressure envelope.
    pub fn ideal_outline(&self, label: ShapeLabel, variation: u32, rng: &mut StdRng) -> Vec<StrokePoint> {
        let vertices = match label {
            ShapeLabel::Circle => self.circle(rng),
            ShapeLabel::Oval => self.oval(rng),
            ShapeLabel::Rectangle => self.rectangle(rng),
            ShapeLabel::Polygon => self.polygon(variation, rng),
            ShapeLabel::Line => self.line(rng),
            ShapeLabel::Curve => self.curve(rng),
        };

        let path: Vec<StrokePoint> = vertices
            .into_iter()
            .map(|(x, y)| StrokePoint::new(x, y, 0.0, self.config.base_pressure))
            .collect();

        let n = self.config.points_per_stroke.max(2);
        resample(&path, n)
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let f = i as f64 / (n - 1) as f64;
                StrokePoint {
                    t: i as f64 * self.config.base_interval_secs,
                    // Pressure builds up after touch-down and eases before lift-off
                    pressure: self.config.base_pressure * (0.8 + 0.2 * (PI * f).sin()),
                    ..p
                }
            })
            .collect()
    }

    /// Apply tremor, speed variation and pressure variation
    pub fn degrade(&self, outline: &[StrokePoint], rng: &mut StdRng) -> RawStroke {
        let profile = &self.config.profile;
        let mut t = 0.0;
        let points = outline
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i > 0 {
                    let interval = self.config.base_interval_secs
                        * (1.0 + jitter(rng, profile.speed_jitter));
                    t += interval.max(1e-4);
                }
                StrokePoint {
                    x: p.x + jitter(rng, profile.tremor),
                    y: p.y + jitter(rng, profile.tremor),
                    t,
                    pressure: (p.pressure * (1.0 + jitter(rng, profile.pressure_jitter)))
                        .clamp(0.05, 1.0),
                }
            })
            .collect();
        RawStroke::new(points)
    }

    fn center(&self) -> (f64, f64) {
        (self.config.canvas_size / 2.0, self.config.canvas_size / 2.0)
    }

    fn circle(&self, rng: &mut StdRng) -> Vec<(f64, f64)> {
        let (cx, cy) = self.center();
        let r = self.config.canvas_size * rng.gen_range(0.2..0.4);
        let start = rng.gen_range(0.0..TAU);
        // Hands rarely close a circle exactly
        let sweep = TAU + rng.gen_range(-0.15..0.2);
        ellipse_points(cx, cy, r, r, 0.0, start, sweep)
    }

    fn oval(&self, rng: &mut StdRng) -> Vec<(f64, f64)> {
        let (cx, cy) = self.center();
        let rx = self.config.canvas_size * rng.gen_range(0.3..0.42);
        let ry = rx * rng.gen_range(0.4..0.7);
        let tilt = rng.gen_range(-0.4..0.4);
        let start = rng.gen_range(0.0..TAU);
        ellipse_points(cx, cy, rx, ry, tilt, start, TAU)
    }

    fn rectangle(&self, rng: &mut StdRng) -> Vec<(f64, f64)> {
        let (cx, cy) = self.center();
        let w = self.config.canvas_size * rng.gen_range(0.35..0.8);
        let h = self.config.canvas_size * rng.gen_range(0.3..0.7);
        let (x0, y0, x1, y1) = (cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0);
        let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
        let start = rng.gen_range(0..4);
        (0..=4).map(|i| corners[(start + i) % 4]).collect()
    }

    fn polygon(&self, variation: u32, rng: &mut StdRng) -> Vec<(f64, f64)> {
        const SIDES: [usize; 5] = [3, 5, 6, 7, 8];
        let sides = SIDES[variation as usize % SIDES.len()];
        let (cx, cy) = self.center();
        let r = self.config.canvas_size * rng.gen_range(0.25..0.42);
        let start = rng.gen_range(0.0..TAU);
        (0..=sides)
            .map(|i| {
                let a = start + TAU * (i % sides) as f64 / sides as f64;
                (cx + r * a.cos(), cy + r * a.sin())
            })
            .collect()
    }

    fn line(&self, rng: &mut StdRng) -> Vec<(f64, f64)> {
        let (cx, cy) = self.center();
        let half = self.config.canvas_size * rng.gen_range(0.2..0.45);
        let angle = rng.gen_range(0.0..PI);
        let (dx, dy) = (half * angle.cos(), half * angle.sin());
        vec![(cx - dx, cy - dy), (cx + dx, cy + dy)]
    }

    fn curve(&self, rng: &mut StdRng) -> Vec<(f64, f64)> {
        let s = self.config.canvas_size;
        let p0 = (s * rng.gen_range(0.1..0.25), s * rng.gen_range(0.4..0.6));
        let p3 = (s * rng.gen_range(0.75..0.9), s * rng.gen_range(0.4..0.6));
        let p1 = (s * rng.gen_range(0.25..0.45), s * rng.gen_range(0.05..0.3));
        let p2 = (s * rng.gen_range(0.55..0.75), s * rng.gen_range(0.7..0.95));
        cubic_bezier(p0, p1, p2, p3, 48)
    }
}

fn jitter(rng: &mut StdRng, amount: f64) -> f64 {
    if amount > 0.0 {
        rng.gen_range(-amount..=amount)
    } else {
        0.0
    }
}

fn ellipse_points(
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    tilt: f64,
    start: f64,
    sweep: f64,
) -> Vec<(f64, f64)> {
    const SEGMENTS: usize = 72;
    let (sin_t, cos_t) = tilt.sin_cos();
    (0..=SEGMENTS)
        .map(|i| {
            let a = start + sweep * i as f64 / SEGMENTS as f64;
            let (x, y) = (rx * a.cos(), ry * a.sin());
            (cx + x * cos_t - y * sin_t, cy + x * sin_t + y * cos_t)
        })
        .collect()
}

fn cubic_bezier(
    p0: (f64, f64),
    p1: (f64, f64),
    p2: (f64, f64),
    p3: (f64, f64),
    segments: usize,
) -> Vec<(f64, f64)> {
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let u = 1.0 - t;
            let b0 = u * u * u;
            let b1 = 3.0 * u * u * t;
            let b2 = 3.0 * u * t * t;
            let b3 = t * t * t;
            (
                b0 * p0.0 + b1 * p1.0 + b2 * p2.0 + b3 * p3.0,
                b0 * p0.1 + b1 * p1.1 + b2 * p2.1 + b3 * p3.1,
            )
        })
        .collect()
}
