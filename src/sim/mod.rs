//! Deterministic shape simulation
//!
//! Everything that moves in a level lives here. This module must stay pure:
//! - Fixed timestep only, in both directions
//! - Stable iteration order (list order of the shapes)
//! - Wall-clock time only through `SimulationContext`
//! - No rendering, audio or platform dependencies

pub mod clock;
pub mod curve;
pub mod hierarchy;
pub mod keys;
pub mod level;
pub mod shape;
pub mod state;
pub mod tick;

pub use clock::{Direction, SimClock};
pub use hierarchy::{MARKER_RADIUS, Outline};
pub use keys::{KeyState, SimulationContext};
pub use level::{Level, LevelError, LevelSet};
pub use shape::{
    ControlPoint, CurveEffect, ParamTarget, ParameterCurve, Pose, PoseField, Shape, ShapeFlags,
    ShapeType, Special,
};
pub use state::{SimEvent, Simulation};
pub use tick::tick;
