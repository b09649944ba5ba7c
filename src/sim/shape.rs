//! Shape model and core simulation types
//!
//! A level is a flat list of shapes. Each shape is a transform node with an
//! outline and a set of keyframe curves that drive its pose over time.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::audio::SoundCue;
use crate::lerp;

/// How a shape is drawn and how the player interacts with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShapeType {
    /// Walkable area
    #[default]
    Open1,
    /// Walkable area (alternate fill)
    Open2,
    /// Blocks movement
    Wall1,
    /// Blocks movement (hatched)
    Wall2,
    /// Runs time backwards while the player stands in it
    Reverse,
    /// Stops time while the player stands in it
    Stop,
    /// Time only flows while the player moves
    Superhot,
    /// Restarts the level on contact
    Hazard,
    /// Unlit walkable area
    Dark,
}

impl ShapeType {
    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0 => ShapeType::Open1,
            1 => ShapeType::Open2,
            2 => ShapeType::Wall1,
            3 => ShapeType::Wall2,
            4 => ShapeType::Reverse,
            5 => ShapeType::Stop,
            6 => ShapeType::Superhot,
            7 => ShapeType::Hazard,
            8 => ShapeType::Dark,
            _ => return None,
        })
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn blocks_movement(self) -> bool {
        matches!(self, ShapeType::Wall1 | ShapeType::Wall2)
    }

    /// Time rate while the player stands on this ground, if it changes it
    pub fn time_rate_effect(self, moving: bool) -> Option<f32> {
        match self {
            ShapeType::Reverse => Some(-1.0),
            ShapeType::Stop => Some(0.0),
            ShapeType::Superhot => Some(if moving { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

/// Behavior variant selected by the low five bits of the special byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Special {
    #[default]
    None,
    Player,
    /// Local time follows the root's x position
    XTime,
    /// Local time follows the root's y position
    YTime,
    TrackX,
    TrackY,
    TrackXY,
    TrackXTimeless,
    TrackYTimeless,
    TrackXYTimeless,
    Exit,
    ProximitySetKey,
    ProximityUnsetKey,
    ProximityTempSetKey,
    /// Adds `key - 1` to the temporary keys while context is non-negative
    ContextSetKeyMinusOne,
    Reserved,
    /// Trigger curves play sound `n`
    Sound(u8),
}

impl Special {
    const MASK: u8 = 31;

    pub fn from_bits(bits: u8) -> Self {
        match bits & Self::MASK {
            0 => Special::None,
            1 => Special::Player,
            2 => Special::XTime,
            3 => Special::YTime,
            4 => Special::TrackX,
            5 => Special::TrackY,
            6 => Special::TrackXY,
            7 => Special::TrackXTimeless,
            8 => Special::TrackYTimeless,
            9 => Special::TrackXYTimeless,
            10 => Special::Exit,
            11 => Special::ProximitySetKey,
            12 => Special::ProximityUnsetKey,
            13 => Special::ProximityTempSetKey,
            14 => Special::ContextSetKeyMinusOne,
            15 => Special::Reserved,
            n => Special::Sound(n - 16),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Special::None => 0,
            Special::Player => 1,
            Special::XTime => 2,
            Special::YTime => 3,
            Special::TrackX => 4,
            Special::TrackY => 5,
            Special::TrackXY => 6,
            Special::TrackXTimeless => 7,
            Special::TrackYTimeless => 8,
            Special::TrackXYTimeless => 9,
            Special::Exit => 10,
            Special::ProximitySetKey => 11,
            Special::ProximityUnsetKey => 12,
            Special::ProximityTempSetKey => 13,
            Special::ContextSetKeyMinusOne => 14,
            Special::Reserved => 15,
            Special::Sound(n) => 16 + (n & 15),
        }
    }

    pub fn tracks_x(self) -> bool {
        matches!(
            self,
            Special::TrackX | Special::TrackXY | Special::TrackXTimeless | Special::TrackXYTimeless
        )
    }

    pub fn tracks_y(self) -> bool {
        matches!(
            self,
            Special::TrackY | Special::TrackXY | Special::TrackYTimeless | Special::TrackXYTimeless
        )
    }

    /// Timeless trackers keep chasing while time is stopped or reversed
    pub fn is_timeless(self) -> bool {
        matches!(
            self,
            Special::TrackXTimeless | Special::TrackYTimeless | Special::TrackXYTimeless
        )
    }

    pub fn sound_cue(self) -> Option<SoundCue> {
        match self {
            Special::Sound(n) => SoundCue::from_index(n),
            _ => None,
        }
    }
}

/// High bits of the special byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShapeFlags(pub u8);

impl ShapeFlags {
    pub const TIMELOCK: u8 = 32;
    pub const WAVE: u8 = 64;
    pub const LOOP: u8 = 128;

    pub fn from_special_byte(b: u8) -> Self {
        Self(b & (Self::TIMELOCK | Self::WAVE | Self::LOOP))
    }

    pub fn timelock(self) -> bool {
        self.0 & Self::TIMELOCK != 0
    }

    pub fn wave(self) -> bool {
        self.0 & Self::WAVE != 0
    }

    pub fn looping(self) -> bool {
        self.0 & Self::LOOP != 0
    }
}

/// Pose component a curve can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoseField {
    X,
    Y,
    Angle,
    ScaleX,
    ScaleY,
    Context,
}

impl PoseField {
    const ALL: [PoseField; 6] = [
        PoseField::X,
        PoseField::Y,
        PoseField::Angle,
        PoseField::ScaleX,
        PoseField::ScaleY,
        PoseField::Context,
    ];
}

/// Mutable transform and scalar state of a shape, in level units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    /// Rotation in `ANGLE_STEP` units
    pub angle: f32,
    /// Non-uniform scale in `SCALE_STEP` units
    pub scale: Vec2,
    /// General purpose scalar (tracking speed, key gating)
    pub context: f32,
    /// Shape-local clock in seconds
    pub time: f64,
}

impl Pose {
    pub fn field(&self, field: PoseField) -> f32 {
        match field {
            PoseField::X => self.position.x,
            PoseField::Y => self.position.y,
            PoseField::Angle => self.angle,
            PoseField::ScaleX => self.scale.x,
            PoseField::ScaleY => self.scale.y,
            PoseField::Context => self.context,
        }
    }

    pub fn field_mut(&mut self, field: PoseField) -> &mut f32 {
        match field {
            PoseField::X => &mut self.position.x,
            PoseField::Y => &mut self.position.y,
            PoseField::Angle => &mut self.angle,
            PoseField::ScaleX => &mut self.scale.x,
            PoseField::ScaleY => &mut self.scale.y,
            PoseField::Context => &mut self.context,
        }
    }

    /// Blend towards `other`; `t = 0` keeps `self`
    pub fn lerp(&self, other: &Pose, t: f32) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            angle: lerp(self.angle, other.angle, t),
            scale: self.scale.lerp(other.scale, t),
            context: lerp(self.context, other.context, t),
            time: self.time + (other.time - self.time) * t as f64,
        }
    }
}

/// What a curve does with its sampled value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveEffect {
    /// Value is a per-second rate added each tick
    Rate(PoseField),
    /// Value replaces the field
    Absolute(PoseField),
    /// Positive values fire the shape's sound cue
    Trigger,
}

/// Parameter id of a curve (0..=6 delta, 7..=13 absolute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamTarget {
    DeltaX,
    DeltaY,
    DeltaAngle,
    DeltaScaleX,
    DeltaScaleY,
    DeltaContext,
    DeltaTrigger,
    AbsoluteX,
    AbsoluteY,
    AbsoluteAngle,
    AbsoluteScaleX,
    AbsoluteScaleY,
    AbsoluteContext,
    AbsoluteTrigger,
}

impl ParamTarget {
    pub const COUNT: u8 = 14;

    pub fn from_id(id: u8) -> Option<Self> {
        use ParamTarget::*;
        Some(match id {
            0 => DeltaX,
            1 => DeltaY,
            2 => DeltaAngle,
            3 => DeltaScaleX,
            4 => DeltaScaleY,
            5 => DeltaContext,
            6 => DeltaTrigger,
            7 => AbsoluteX,
            8 => AbsoluteY,
            9 => AbsoluteAngle,
            10 => AbsoluteScaleX,
            11 => AbsoluteScaleY,
            12 => AbsoluteContext,
            13 => AbsoluteTrigger,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn effect(self) -> CurveEffect {
        let id = self.id();
        match id % 7 {
            6 => CurveEffect::Trigger,
            slot => {
                let field = PoseField::ALL[slot as usize];
                if id > 6 {
                    CurveEffect::Absolute(field)
                } else {
                    CurveEffect::Rate(field)
                }
            }
        }
    }
}

/// One keyframe: hold `duration` time units while moving towards the next value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub duration: u8,
    pub value: i8,
}

/// Piecewise-linear keyframe track for one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterCurve {
    pub target: ParamTarget,
    pub points: Vec<ControlPoint>,
    /// Wall-clock time of the last sound trigger
    #[serde(skip)]
    pub last_trigger: Option<Duration>,
}

impl ParameterCurve {
    pub fn new(target: ParamTarget, points: Vec<ControlPoint>) -> Self {
        Self {
            target,
            points,
            last_trigger: None,
        }
    }
}

/// A simulated shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub pose: Pose,
    /// Pose at the start of the current tick (for render interpolation)
    pub previous: Pose,
    /// Index of the parent within the same shape list
    pub parent: Option<usize>,
    pub kind: ShapeType,
    pub special: Special,
    pub flags: ShapeFlags,
    pub key: u8,
    /// Local-space outline in position units
    pub vertices: Vec<[i8; 2]>,
    pub curves: Vec<ParameterCurve>,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            pose: Pose::default(),
            previous: Pose::default(),
            parent: None,
            kind: ShapeType::Open1,
            special: Special::None,
            flags: ShapeFlags::default(),
            key: 0,
            vertices: Vec::new(),
            curves: Vec::new(),
        }
    }
}

impl Shape {
    /// Raw special byte (variant plus flag bits)
    pub fn special_byte(&self) -> u8 {
        self.special.bits() | self.flags.0
    }

    pub fn curve(&self, target: ParamTarget) -> Option<&ParameterCurve> {
        self.curves.iter().find(|c| c.target == target)
    }

    /// Pose to render at `fraction` of the way back to the previous tick
    pub fn interpolated(&self, fraction: f32) -> Pose {
        self.pose.lerp(&self.previous, fraction)
    }

    /// Copy the live pose into `previous`
    pub fn snapshot(&mut self) {
        self.previous = self.pose;
    }
}
