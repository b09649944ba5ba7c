//! Compact binary level format
//!
//! All levels live in one flat byte array:
//!
//! ```text
//! level_count
//! per level:  shape_count
//! per shape:  x y angle scale_x scale_y      (byte - 128)
//!             parent type special key         (raw, parent is 1-based, 0 = none)
//!             vertex_count { x y }*           (byte - 128)
//!             param_count { id point_count { duration value }* }*
//!                                             (duration raw, value byte - 128)
//! ```

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hierarchy;
use super::shape::{
    ControlPoint, ParamTarget, ParameterCurve, Pose, Shape, ShapeFlags, ShapeType, Special,
};

/// Errors while decoding or instantiating levels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// Input ended before the counts said it would
    Truncated { offset: usize },
    UnknownShapeType { level: usize, shape: usize, value: u8 },
    UnknownParameter { level: usize, shape: usize, id: u8 },
    DuplicateParameter { level: usize, shape: usize, id: u8 },
    ParentOutOfRange { level: usize, shape: usize, parent: u8 },
    ParentCycle { level: usize, shape: usize },
    UnknownLevel(usize),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Truncated { offset } => {
                write!(f, "Level data truncated at byte {}", offset)
            }
            LevelError::UnknownShapeType { level, shape, value } => write!(
                f,
                "Level {} shape {}: unknown shape type {}",
                level, shape, value
            ),
            LevelError::UnknownParameter { level, shape, id } => write!(
                f,
                "Level {} shape {}: unknown parameter id {}",
                level, shape, id
            ),
            LevelError::DuplicateParameter { level, shape, id } => write!(
                f,
                "Level {} shape {}: parameter {} defined twice",
                level, shape, id
            ),
            LevelError::ParentOutOfRange { level, shape, parent } => write!(
                f,
                "Level {} shape {}: parent {} out of range",
                level, shape, parent
            ),
            LevelError::ParentCycle { level, shape } => {
                write!(f, "Level {} shape {}: parent chain loops", level, shape)
            }
            LevelError::UnknownLevel(index) => write!(f, "No level with index {}", index),
        }
    }
}

impl std::error::Error for LevelError {}

/// Byte cursor over level data
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8, LevelError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(LevelError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn signed(&mut self) -> Result<i8, LevelError> {
        Ok(to_signed(self.byte()?))
    }
}

#[inline]
fn to_signed(b: u8) -> i8 {
    (b as i16 - 128) as i8
}

#[inline]
fn from_signed(v: i8) -> u8 {
    (v as i16 + 128) as u8
}

/// Encode a pose value the way the editor exports it
#[inline]
fn encode_value(v: f32) -> u8 {
    (v.round() + 128.0).clamp(0.0, 255.0) as u8
}

/// Immutable shape templates of one level
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Level {
    pub shapes: Vec<Shape>,
}

/// Every level of the game, decoded once at startup
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelSet {
    pub levels: Vec<Level>,
}

impl LevelSet {
    /// Decode the flat level array
    pub fn decode(bytes: &[u8]) -> Result<Self, LevelError> {
        let mut r = Reader::new(bytes);
        let level_count = r.byte()? as usize;
        let mut levels = Vec::with_capacity(level_count);
        for level in 0..level_count {
            levels.push(decode_level(&mut r, level)?);
        }
        if r.pos < bytes.len() {
            log::warn!(
                "Ignoring {} trailing bytes after level data",
                bytes.len() - r.pos
            );
        }
        log::debug!(
            "Decoded {} levels ({} shapes)",
            levels.len(),
            levels.iter().map(|l| l.shapes.len()).sum::<usize>()
        );
        Ok(Self { levels })
    }

    /// Encode back into the flat level array
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![clamp_count(self.levels.len())];
        for level in &self.levels {
            out.push(clamp_count(level.shapes.len()));
            for shape in &level.shapes {
                encode_shape(shape, &mut out);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Deep-copy the given levels into one live shape list
    ///
    /// Parents stay within their own level; indices are rebased onto the
    /// concatenated list.
    pub fn instantiate(&self, indices: &[usize]) -> Result<Vec<Shape>, LevelError> {
        let mut shapes = Vec::new();
        for &index in indices {
            let level = self
                .levels
                .get(index)
                .ok_or(LevelError::UnknownLevel(index))?;
            let base = shapes.len();
            shapes.extend(level.shapes.iter().cloned().map(|mut shape| {
                shape.parent = shape.parent.map(|p| p + base);
                shape
            }));
        }
        Ok(shapes)
    }
}

fn clamp_count(n: usize) -> u8 {
    n.min(u8::MAX as usize) as u8
}

fn decode_level(r: &mut Reader<'_>, level: usize) -> Result<Level, LevelError> {
    let shape_count = r.byte()? as usize;
    let mut shapes = Vec::with_capacity(shape_count);
    let mut parents = Vec::with_capacity(shape_count);
    for index in 0..shape_count {
        let (shape, parent) = decode_shape(r, level, index)?;
        shapes.push(shape);
        parents.push(parent);
    }

    // Parents may point forward within the level, so resolve after all shapes exist
    for (index, &parent) in parents.iter().enumerate() {
        if parent == 0 {
            continue;
        }
        let target = parent as usize - 1;
        if target >= shape_count {
            return Err(LevelError::ParentOutOfRange {
                level,
                shape: index,
                parent,
            });
        }
        shapes[index].parent = Some(target);
    }
    if let Some(shape) = hierarchy::find_cycle(&shapes) {
        return Err(LevelError::ParentCycle { level, shape });
    }

    Ok(Level { shapes })
}

fn decode_shape(r: &mut Reader<'_>, level: usize, index: usize) -> Result<(Shape, u8), LevelError> {
    let x = r.signed()?;
    let y = r.signed()?;
    let angle = r.signed()?;
    let scale_x = r.signed()?;
    let scale_y = r.signed()?;
    let parent = r.byte()?;
    let type_byte = r.byte()?;
    let special = r.byte()?;
    let key = r.byte()?;

    let kind = ShapeType::from_byte(type_byte).ok_or(LevelError::UnknownShapeType {
        level,
        shape: index,
        value: type_byte,
    })?;

    let vertex_count = r.byte()?;
    let mut vertices = Vec::with_capacity(vertex_count as usize);
    for _ in 0..vertex_count {
        vertices.push([r.signed()?, r.signed()?]);
    }

    let param_count = r.byte()?;
    let mut curves: Vec<ParameterCurve> = Vec::with_capacity(param_count as usize);
    for _ in 0..param_count {
        let id = r.byte()?;
        let point_count = r.byte()?;
        let mut points = Vec::with_capacity(point_count as usize);
        for _ in 0..point_count {
            points.push(ControlPoint {
                duration: r.byte()?,
                value: r.signed()?,
            });
        }
        let target = ParamTarget::from_id(id).ok_or(LevelError::UnknownParameter {
            level,
            shape: index,
            id,
        })?;
        if curves.iter().any(|c| c.target == target) {
            return Err(LevelError::DuplicateParameter {
                level,
                shape: index,
                id,
            });
        }
        curves.push(ParameterCurve::new(target, points));
    }

    let pose = Pose {
        position: Vec2::new(x as f32, y as f32),
        angle: angle as f32,
        scale: Vec2::new(scale_x as f32, scale_y as f32),
        context: 0.0,
        time: 0.0,
    };
    let shape = Shape {
        pose,
        previous: pose,
        parent: None,
        kind,
        special: Special::from_bits(special),
        flags: ShapeFlags::from_special_byte(special),
        key,
        vertices,
        curves,
    };
    Ok((shape, parent))
}

fn encode_shape(shape: &Shape, out: &mut Vec<u8>) {
    let p = &shape.pose;
    out.extend([
        encode_value(p.position.x),
        encode_value(p.position.y),
        encode_value(p.angle),
        encode_value(p.scale.x),
        encode_value(p.scale.y),
        shape.parent.map_or(0, |i| clamp_count(i + 1)),
        shape.kind.to_byte(),
        shape.special_byte(),
        shape.key,
    ]);
    out.push(clamp_count(shape.vertices.len()));
    for v in shape.vertices.iter().take(u8::MAX as usize) {
        out.extend([from_signed(v[0]), from_signed(v[1])]);
    }
    out.push(clamp_count(shape.curves.len()));
    for curve in shape.curves.iter().take(u8::MAX as usize) {
        out.push(curve.target.id());
        out.push(clamp_count(curve.points.len()));
        for point in curve.points.iter().take(u8::MAX as usize) {
            out.extend([point.duration, from_signed(point.value)]);
        }
    }
}
