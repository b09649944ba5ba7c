//! Live simulation state for the running level
//!
//! Owns the instantiated shapes and the clock. All mutation goes through
//! `advance` (or the scrub helpers built on it), one discrete tick at a time.

use glam::Affine2;
use serde::{Deserialize, Serialize};

use super::clock::SimClock;
use super::hierarchy::{self, Outline};
use super::keys::SimulationContext;
use super::level::{LevelError, LevelSet};
use super::shape::{Pose, Shape, Special};
use super::tick::tick;
use crate::audio::SoundCue;
use crate::consts::STEP_INTERVAL;

/// Side effects for external collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Play a sound cue (fired by trigger curves)
    Sound(SoundCue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    /// Level indices this shape list was built from
    pub levels: Vec<usize>,
    pub shapes: Vec<Shape>,
    pub clock: SimClock,
    #[serde(skip)]
    events: Vec<SimEvent>,
}

impl Simulation {
    /// Fresh copy of the given levels at time zero
    pub fn start(set: &LevelSet, indices: &[usize]) -> Result<Self, LevelError> {
        let shapes = set.instantiate(indices)?;
        log::info!("Started levels {:?} ({} shapes)", indices, shapes.len());
        Ok(Self::from_shapes(indices.to_vec(), shapes))
    }

    pub fn from_shapes(levels: Vec<usize>, shapes: Vec<Shape>) -> Self {
        Self {
            levels,
            shapes,
            clock: SimClock::new(),
            events: Vec::new(),
        }
    }

    /// Feed elapsed seconds (negative rewinds); returns ticks executed
    pub fn advance(&mut self, elapsed: f64, ctx: &mut SimulationContext) -> usize {
        let target = self.clock.retarget(elapsed);
        self.run_to(target, ctx)
    }

    /// Tick until the committed step equals `step`
    pub fn seek_step(&mut self, step: i64, ctx: &mut SimulationContext) -> usize {
        self.run_to(step, ctx)
    }

    fn run_to(&mut self, target: i64, ctx: &mut SimulationContext) -> usize {
        let mut ticks = 0;
        while let Some(direction) = self.clock.step_toward(target) {
            tick(&mut self.shapes, direction, ctx, &mut self.events);
            ticks += 1;
        }
        ticks
    }

    /// Rewind every shape to the level's starting state
    pub fn rewind_to_start(&mut self, ctx: &mut SimulationContext) {
        let total = self.clock.total_seconds;
        self.advance(-total - STEP_INTERVAL + 1e-10, ctx);
        self.advance(1e-10, ctx);
    }

    /// Move simulated time to `seconds` (editor scrubbing)
    pub fn scrub_to(&mut self, seconds: f64, ctx: &mut SimulationContext) -> usize {
        let total = self.clock.total_seconds;
        self.advance(seconds - total, ctx)
    }

    /// Drain side effects produced since the last call
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn step_fraction(&self) -> f32 {
        self.clock.step_fraction as f32
    }

    /// First shape with the given behavior
    pub fn find_special(&self, special: Special) -> Option<usize> {
        self.shapes.iter().position(|s| s.special == special)
    }

    pub fn root(&self, index: usize) -> usize {
        hierarchy::root(&self.shapes, index)
    }

    /// Pose to draw for `index` at the current fraction
    pub fn interpolated(&self, index: usize) -> Pose {
        self.shapes[index].interpolated(self.step_fraction())
    }

    pub fn world_transform(&self, index: usize) -> Affine2 {
        hierarchy::world_transform(&self.shapes, index, self.step_fraction())
    }

    pub fn outline(&self, index: usize) -> Option<Outline> {
        hierarchy::world_outline(&self.shapes, index, self.step_fraction())
    }
}
