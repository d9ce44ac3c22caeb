//! Collision-free placement of a frame's bubbles.
//!
//! Each iteration pulls every bubble toward its `(target_x, target_y)` with a
//! cooling strength and then runs a few collision passes that push
//! overlapping pairs apart along the line between their centres. The budget
//! is fixed, so a crowded frame can keep a small residual overlap; callers
//! compare [`Frame::max_overlap`] against
//! [`LayoutConfig::collision_tolerance`] instead of expecting zero.

use std::collections::HashMap;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{CanvasConfig, Frame, LayoutConfig};

/// Golden angle in radians, used to fan out coincident centres.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
const COINCIDENT: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Settled centres keyed by entity id.
pub type PositionMap = HashMap<String, Point>;

/// Output of a relaxation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Relaxed {
    pub frame: Frame,
    pub positions: PositionMap,
}

#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
    x_span: [f64; 2],
    y_span: [f64; 2],
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig, canvas: &CanvasConfig) -> Self {
        Self {
            config,
            x_span: canvas.x_span(),
            y_span: canvas.y_span(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Settles the entries of an annotated frame.
    ///
    /// Entities found in `previous` start from their old centre; the rest
    /// start on their target with a seeded jitter. `previous` is only read;
    /// the settled centres come back as a fresh map.
    pub fn relax(&self, mut frame: Frame, previous: Option<&PositionMap>) -> Relaxed {
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let jitter = self.config.jitter.max(0.0);

        for entry in &mut frame.entries {
            match previous.and_then(|positions| positions.get(&entry.id)) {
                Some(point) => {
                    entry.x = point.x;
                    entry.y = point.y;
                }
                None => {
                    entry.x = entry.target_x;
                    entry.y = entry.target_y;
                    if jitter > 0.0 {
                        entry.x += rng.random_range(-jitter..=jitter);
                        entry.y += rng.random_range(-jitter..=jitter);
                    }
                }
            }
            self.clamp(&mut entry.x, &mut entry.y, entry.radius);
        }

        let decay = self.alpha_decay();
        let mut alpha = 1.0;
        for _ in 0..self.config.iterations {
            alpha -= alpha * decay;
            self.attract(&mut frame, alpha);
            for _ in 0..self.config.collision_passes {
                self.collide(&mut frame);
            }
        }

        tracing::debug!(
            period = %frame.period,
            entries = frame.entries.len(),
            residual_overlap = frame.max_overlap(),
            "relaxed frame"
        );

        let positions = frame
            .entries
            .iter()
            .map(|entry| (entry.id.clone(), Point { x: entry.x, y: entry.y }))
            .collect();

        Relaxed { frame, positions }
    }

    fn alpha_decay(&self) -> f64 {
        let steps = self.config.cooling_iterations.max(1) as f64;
        let alpha_min = self.config.alpha_min.clamp(f64::MIN_POSITIVE, 1.0);
        1.0 - alpha_min.powf(1.0 / steps)
    }

    fn attract(&self, frame: &mut Frame, alpha: f64) {
        let sx = self.config.strength_x * alpha;
        let sy = self.config.strength_y * alpha;
        for entry in &mut frame.entries {
            entry.x += (entry.target_x - entry.x) * sx;
            entry.y += (entry.target_y - entry.y) * sy;
            self.clamp(&mut entry.x, &mut entry.y, entry.radius);
        }
    }

    /// One Gauss-Seidel sweep over all pairs. Whatever part of the push the
    /// first circle cannot take (because it sits against a wall) is handed
    /// to the second.
    fn collide(&self, frame: &mut Frame) {
        let entries = &mut frame.entries;
        let count = entries.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let (head, tail) = entries.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];

                let min_distance = a.radius + b.radius + self.config.padding;
                let dx = b.x - a.x;
                let dy = b.y - a.y;
                let distance = dx.hypot(dy);
                if distance >= min_distance {
                    continue;
                }

                let (ux, uy) = if distance < COINCIDENT {
                    let angle = GOLDEN_ANGLE * (i * count + j) as f64;
                    (angle.cos(), angle.sin())
                } else {
                    (dx / distance, dy / distance)
                };

                let overlap = min_distance - distance;
                let (ax, ay) = (a.x, a.y);
                a.x -= ux * overlap * 0.5;
                a.y -= uy * overlap * 0.5;
                self.clamp(&mut a.x, &mut a.y, a.radius);

                let moved = (ax - a.x) * ux + (ay - a.y) * uy;
                let remaining = overlap - moved;
                b.x += ux * remaining;
                b.y += uy * remaining;
                self.clamp(&mut b.x, &mut b.y, b.radius);
            }
        }
    }

    fn clamp(&self, x: &mut f64, y: &mut f64, radius: f64) {
        *x = clamp_within(*x, self.x_span, radius);
        *y = clamp_within(*y, self.y_span, radius);
    }
}

fn clamp_within(value: f64, [lo, hi]: [f64; 2], radius: f64) -> f64 {
    let (lo, hi) = (lo + radius, hi - radius);
    if lo > hi {
        (lo + hi) * 0.5
    } else {
        value.clamp(lo, hi)
    }
}
