//! Key sets and timelock gating
//!
//! Keys are small integers. Persistent keys survive level restarts within a
//! play session; temporary keys are cleared on every (re)start.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::shape::Shape;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    pub persistent: BTreeSet<u8>,
    pub temporary: BTreeSet<u8>,
}

impl KeyState {
    /// Held in either set
    pub fn has(&self, key: u8) -> bool {
        self.persistent.contains(&key) || self.temporary.contains(&key)
    }

    pub fn clear_temporary(&mut self) {
        self.temporary.clear();
    }
}

/// Session-wide state every tick reads and writes
#[derive(Debug, Clone, Default)]
pub struct SimulationContext {
    pub keys: KeyState,
    /// Authoring mode: no timelocks, no position-driven time, no sounds
    pub editor: bool,
    /// Wall-clock time used to debounce sound triggers
    pub wall_time: Duration,
}

impl SimulationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editor() -> Self {
        Self {
            editor: true,
            ..Self::default()
        }
    }

    /// Frozen this tick: timelocked and its key is held nowhere
    pub fn is_timelocked(&self, shape: &Shape) -> bool {
        !self.editor && shape.flags.timelock() && !self.keys.has(shape.key)
    }
}
