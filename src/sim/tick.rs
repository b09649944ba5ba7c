//! Fixed timestep simulation tick
//!
//! Advances every shape's local clock by one step (forwards or backwards)
//! and applies its parameter curves.

use super::clock::Direction;
use super::hierarchy;
use super::keys::SimulationContext;
use super::shape::{CurveEffect, ParameterCurve, Shape, Special};
use super::state::SimEvent;
use crate::audio::SoundCue;
use crate::consts::{STEP_INTERVAL, TIME_STEP, TRIGGER_DEBOUNCE};

/// Run one discrete step over all shapes, in list order
pub fn tick(
    shapes: &mut [Shape],
    direction: Direction,
    ctx: &mut SimulationContext,
    events: &mut Vec<SimEvent>,
) {
    let rate = direction.sign();
    let step = STEP_INTERVAL as f32;
    let time_step = STEP_INTERVAL * rate as f64;

    for index in 0..shapes.len() {
        shapes[index].snapshot();
        if ctx.is_timelocked(&shapes[index]) {
            continue;
        }

        let root_position = shapes[hierarchy::root(shapes, index)].pose.position;
        let shape = &mut shapes[index];

        shape.pose.time = match shape.special {
            Special::XTime if !ctx.editor => root_position.x as f64 * TIME_STEP,
            Special::YTime if !ctx.editor => root_position.y as f64 * TIME_STEP,
            _ => shape.pose.time + time_step,
        };

        // Every curve samples the later end of the step, so a backward tick
        // undoes exactly what the forward tick added
        let later = match direction {
            Direction::Forward => shape.pose.time,
            Direction::Backward => shape.previous.time,
        };
        let looping = shape.flags.looping();
        let cue = shape.special.sound_cue();

        for curve in &mut shape.curves {
            let effect = curve.target.effect();
            let Some(y) = curve.sample(later, looping) else {
                continue;
            };
            match effect {
                CurveEffect::Trigger => fire_trigger(curve, y, cue, ctx, events),
                CurveEffect::Rate(field) => *shape.pose.field_mut(field) += y * step * rate,
                CurveEffect::Absolute(field) => *shape.pose.field_mut(field) = y,
            }
        }

        if shape.special == Special::ContextSetKeyMinusOne && shape.pose.context >= 0.0 {
            if let Some(key) = shape.key.checked_sub(1) {
                ctx.keys.temporary.insert(key);
            }
        }
    }
}

/// Debounced on wall-clock time, independent of simulation rate or direction
fn fire_trigger(
    curve: &mut ParameterCurve,
    y: f32,
    cue: Option<SoundCue>,
    ctx: &SimulationContext,
    events: &mut Vec<SimEvent>,
) {
    if y <= 0.0 {
        return;
    }
    if let Some(last) = curve.last_trigger {
        if ctx.wall_time <= last + TRIGGER_DEBOUNCE {
            return;
        }
    }
    curve.last_trigger = Some(ctx.wall_time);
    if ctx.editor {
        return;
    }
    if let Some(cue) = cue {
        events.push(SimEvent::Sound(cue));
    }
}
