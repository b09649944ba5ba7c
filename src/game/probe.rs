//! Collision probes around the player
//!
//! The session asks an oracle what lies under a handful of points near the
//! player. The answer only distinguishes empty space, shape outlines and
//! shape interiors.

use glam::Vec2;

use crate::consts::PROBE_DISTANCE;
use crate::sim::{Outline, Simulation, Special};

/// What a probe point hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Nothing drawn there; blocks movement
    Void,
    /// On a shape's outline; passable
    Edge,
    /// Inside the topmost shape with this index
    Shape(usize),
}

/// Answers probe queries against the current frame
pub trait CollisionOracle {
    /// `point` is in arena pixels relative to the arena center
    fn sample(&self, sim: &Simulation, point: Vec2) -> Probe;
}

/// Eight directions at `PROBE_DISTANCE`, then the center
pub fn probe_offsets() -> [Vec2; 9] {
    let mut offsets = [Vec2::ZERO; 9];
    for (d, offset) in offsets.iter_mut().take(8).enumerate() {
        let angle = d as f32 * std::f32::consts::FRAC_PI_4;
        *offset = Vec2::new(angle.cos(), angle.sin()) * PROBE_DISTANCE;
    }
    offsets
}

/// Headless oracle working on world-space outlines
///
/// Shapes later in the list are on top. Everything attached to the player
/// is invisible to the probes.
#[derive(Debug, Clone)]
pub struct GeometryOracle {
    /// Outline stroke width (pixels)
    pub edge_width: f32,
}

impl Default for GeometryOracle {
    fn default() -> Self {
        Self { edge_width: 2.0 }
    }
}

impl CollisionOracle for GeometryOracle {
    fn sample(&self, sim: &Simulation, point: Vec2) -> Probe {
        let player_root = sim.find_special(Special::Player).map(|p| sim.root(p));
        let half = self.edge_width * 0.5;

        for index in (0..sim.shapes.len()).rev() {
            if Some(sim.root(index)) == player_root {
                continue;
            }
            let Some(outline) = sim.outline(index) else {
                continue;
            };
            let (edge_distance, inside) = match &outline {
                Outline::Marker { center, radius } => {
                    let d = point.distance(*center);
                    ((d - radius).abs(), d < *radius)
                }
                Outline::Polygon(points) => {
                    (polygon_edge_distance(points, point), contains(points, point))
                }
            };
            if edge_distance <= half {
                return Probe::Edge;
            }
            if inside {
                return Probe::Shape(index);
            }
        }
        Probe::Void
    }
}

/// Even-odd point in polygon test
fn contains(points: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn polygon_edge_distance(points: &[Vec2], p: Vec2) -> f32 {
    let mut best = f32::INFINITY;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        best = best.min(segment_distance(points[j], points[i], p));
        j = i;
    }
    best
}

fn segment_distance(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
