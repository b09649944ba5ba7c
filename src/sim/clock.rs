//! Bidirectional fixed-step clock
//!
//! Continuous elapsed time (possibly negative) is folded into a whole step
//! counter plus a fraction used to blend rendered poses between ticks.

use serde::{Deserialize, Serialize};

use crate::consts::STEP_INTERVAL;

/// Direction of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Continuous time accumulator (seconds)
    pub total_seconds: f64,
    /// Last committed step
    pub step: i64,
    /// Blend weight in [0, 1) towards the previous tick
    pub step_fraction: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// Clock at level start
    pub fn new() -> Self {
        Self {
            total_seconds: STEP_INTERVAL,
            step: 0,
            step_fraction: 0.0,
        }
    }

    /// Fold `elapsed` into the accumulator and return the step to reach
    ///
    /// Moving forward targets the step after the current boundary, so any
    /// forward motion commits the tick in progress.
    pub fn retarget(&mut self, elapsed: f64) -> i64 {
        self.total_seconds += elapsed;
        let forward = if elapsed > 0.0 { 1 } else { 0 };
        let target = (self.total_seconds / STEP_INTERVAL).floor() as i64 + forward;
        self.step_fraction =
            ((self.total_seconds - target as f64 * STEP_INTERVAL).abs() / STEP_INTERVAL).min(1.0);
        target
    }

    /// Move one step towards `target`, or `None` once there
    pub fn step_toward(&mut self, target: i64) -> Option<Direction> {
        if self.step == target {
            return None;
        }
        let direction = if self.step < target {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.step += direction.sign() as i64;
        Some(direction)
    }

    /// Seconds of simulated time at the committed step
    pub fn step_seconds(&self) -> f64 {
        self.step as f64 * STEP_INTERVAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(clock: &mut SimClock, target: i64) -> Vec<Direction> {
        std::iter::from_fn(|| clock.step_toward(target)).collect()
    }

    #[test]
    fn test_new_clock_is_one_interval_in() {
        let clock = SimClock::new();
        assert_eq!(clock.step, 0);
        assert!((clock.total_seconds - STEP_INTERVAL).abs() < 1e-12);
    }

    #[test]
    fn test_forward_advance_commits_eagerly() {
        let mut clock = SimClock::new();
        // 0.05 + 0.01 = 0.06 -> floor(1.2) + 1 = 2
        let target = clock.retarget(0.01);
        assert_eq!(target, 2);
        assert!((clock.step_fraction - 0.8).abs() < 1e-9);
        assert_eq!(drain(&mut clock, target), vec![Direction::Forward; 2]);
        assert_eq!(clock.step, 2);
    }

    #[test]
    fn test_backward_advance_steps_back() {
        let mut clock = SimClock::new();
        let target = clock.retarget(0.17); // 0.22 -> 4 + 1
        assert_eq!(drain(&mut clock, target).len(), 5);

        let target = clock.retarget(-0.13); // 0.09 -> floor(1.8)
        assert_eq!(target, 1);
        assert!((clock.step_fraction - 0.8).abs() < 1e-9);
        assert_eq!(drain(&mut clock, target), vec![Direction::Backward; 4]);
    }

    #[test]
    fn test_zero_elapsed_settles_on_boundary() {
        let mut clock = SimClock::new();
        let target = clock.retarget(0.0);
        assert_eq!(target, 1);
        // Stepping to 1 from the level start is the only pending work
        assert_eq!(drain(&mut clock, target).len(), 1);
        let target = clock.retarget(0.0);
        assert!(drain(&mut clock, target).is_empty());
    }

    #[test]
    fn test_large_rewind_is_many_single_steps() {
        let mut clock = SimClock::new();
        let target = clock.retarget(9.98);
        let forward = drain(&mut clock, target).len();
        assert_eq!(forward, 201);

        let target = clock.retarget(-clock.total_seconds - STEP_INTERVAL + 1e-10);
        let back = drain(&mut clock, target);
        assert_eq!(back.len(), 202);
        assert!(back.iter().all(|d| *d == Direction::Backward));
        assert_eq!(clock.step, -1);
    }

    #[test]
    fn test_step_fraction_stays_in_unit_range() {
        let mut clock = SimClock::new();
        for elapsed in [0.013, 0.2, -0.07, 0.031, -0.5, 0.0049] {
            let target = clock.retarget(elapsed);
            drain(&mut clock, target);
            assert!((0.0..=1.0).contains(&clock.step_fraction));
        }
    }
}
