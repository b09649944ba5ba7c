//! Retrohaunt - a rewindable shape-puzzle platformer
//!
//! Core modules:
//! - `sim`: Deterministic shape simulation (level format, clock, curves, timelocks)
//! - `game`: Play session driving the simulation (player, travel, probes)
//! - `audio`: Sound cue routing to an external synthesizer
//! - `settings`: Player-facing configuration

pub mod audio;
pub mod game;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    use std::time::Duration;

    /// Duration of one discrete simulation tick (seconds)
    pub const STEP_INTERVAL: f64 = 0.05;
    /// Seconds per curve duration unit
    pub const TIME_STEP: f64 = 0.1;

    /// Arena pixels per position unit
    pub const POSITION_STEP: f32 = 8.0;
    /// Degrees per angle unit
    pub const ANGLE_STEP: f32 = 5.0;
    /// Scale factor per scale unit
    pub const SCALE_STEP: f32 = 0.1;

    /// Arena dimensions in pixels
    pub const ARENA_SIZE_X: f32 = 640.0;
    pub const ARENA_SIZE_Y: f32 = 368.0;

    /// Tolerance for curve segment edges
    pub const CURVE_EPSILON: f64 = 1e-10;
    /// Minimum wall-clock gap between two sound triggers of one curve
    pub const TRIGGER_DEBOUNCE: Duration = Duration::from_millis(1500);

    /// Player speed in position units per second
    pub const PLAYER_VELOCITY: f32 = 18.0;
    /// Player y written when an exit is touched
    pub const EXIT_SENTINEL_Y: f32 = -1000.0;
    /// Default upper bound on a single frame's elapsed time
    pub const MAX_FRAME_SECONDS: f32 = 0.02;

    /// Push-back speed against walls, relative to walking speed
    pub const PUSHBACK_FACTOR: f32 = 1.1;
    /// Distance of the eight outer collision probes (pixels)
    pub const PROBE_DISTANCE: f32 = 10.0;
    /// Temporary key held while the player walks
    pub const MOVEMENT_KEY: u8 = 0;
    /// Idle animation period of the movement key (seconds of player time)
    pub const MOVEMENT_KEY_PERIOD: f64 = 0.4;

    /// Leaving these bounds moves to the neighboring map cell
    pub const ARENA_BOUND_X: f32 = 38.0;
    pub const ARENA_BOUND_Y: f32 = 21.0;
    /// Entry position at the opposite edge after travel
    pub const REENTRY_X: f32 = 36.0;
    pub const REENTRY_Y: f32 = 19.0;
    /// Frozen time after entering a map cell
    pub const TRAVEL_DELAY: f32 = 0.7;
    /// Frozen time after dying
    pub const DEATH_DELAY: f32 = 0.5;
    /// Camera shake amplitude on death (pixels)
    pub const DEATH_QUAKE: f32 = 10.0;

    /// Map layout: level index = map_x * MAP_COLUMNS + map_y
    pub const MAP_COLUMNS: i32 = 8;
    pub const LEVEL_COUNT: i32 = 64;
    /// Level shown without the overlay
    pub const OUTRO_LEVEL_INDEX: usize = 32;
    /// Level appended to every other level (player, HUD shapes)
    pub const OVERLAY_LEVEL_INDEX: usize = 0;
}

/// Linear interpolation, `t = 0` yields `a`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Sign that maps zero to zero (unlike `f32::signum`)
#[inline]
pub fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
