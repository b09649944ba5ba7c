//! Camera offset and shake
//!
//! The offset eases back to zero every frame. Shake adds seeded jitter so
//! replays with the same seed look identical.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Per-frame decay of the shake amplitude
const QUAKE_DECAY: f32 = 0.95;
/// Per-frame decay of the offset towards center
const OFFSET_DECAY: f32 = 0.9;

#[derive(Debug, Clone)]
pub struct Camera {
    /// Offset from the arena origin (pixels)
    pub offset: Vec2,
    /// Current shake amplitude (pixels)
    pub quake: f32,
    rng: Pcg32,
}

impl Camera {
    pub fn new(seed: u64) -> Self {
        Self {
            offset: Vec2::ZERO,
            quake: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn shake(&mut self, amplitude: f32) {
        self.quake = amplitude;
    }

    /// Jump by a whole arena when the player changes map cell
    pub fn shift(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Once per rendered frame
    pub fn update(&mut self) {
        self.quake *= QUAKE_DECAY;
        let jitter = Vec2::new(
            self.rng.random::<f32>() - 0.5,
            self.rng.random::<f32>() - 0.5,
        );
        self.offset = self.offset * OFFSET_DECAY + jitter * self.quake;
    }
}
