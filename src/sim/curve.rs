//! Piecewise-linear curve sampling
//!
//! Point `i` holds for `duration_i * TIME_STEP` seconds while blending
//! towards point `i + 1`. The last point is only ever a blend target.

use super::shape::ParameterCurve;
use crate::consts::{CURVE_EPSILON, TIME_STEP};
use crate::lerp;

impl ParameterCurve {
    /// Loop period in seconds (every point's duration counts)
    pub fn duration(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.duration as f64 * TIME_STEP)
            .sum()
    }

    /// Value at `seconds`, or `None` when no segment covers that time
    pub fn sample(&self, seconds: f64, looping: bool) -> Option<f32> {
        let mut left = seconds;
        if looping {
            let duration = self.duration();
            if duration <= 0.0 {
                return None;
            }
            left = left.rem_euclid(duration);
        }

        for pair in self.points.windows(2) {
            let (p0, p1) = (pair[0], pair[1]);
            let span = p0.duration as f64 * TIME_STEP;
            if p0.duration > 0 && left >= 0.0 && left < span + CURVE_EPSILON {
                let t = (left / span).min(1.0) as f32;
                return Some(lerp(p0.value as f32, p1.value as f32, t));
            }
            left -= span;
        }
        None
    }
}
