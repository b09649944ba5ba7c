//! Gameplay on top of the simulation
//!
//! Everything here talks to the core only through `Simulation` and the key
//! sets in `SimulationContext`.

pub mod camera;
pub mod probe;
pub mod session;

pub use camera::Camera;
pub use probe::{CollisionOracle, GeometryOracle, Probe, probe_offsets};
pub use session::{FrameReport, PlayerInput, Session, TimeTint, level_indices};
