//! Scalar-to-color mapping for height and erosion visualization.

use serde::{Deserialize, Serialize};
use terrain_core::Rgb8;

/// Two-stop color ramp applied to normalized values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ColorRamp {
    /// Red at 0, yellow at 0.5, green at 1: each channel saturates halfway
    /// (`r = 2(1 - t)`, `g = 2t`, clamped).
    #[default]
    RedGreen,
    /// Straight per-channel blend between two colors.
    Linear { low: Rgb8, high: Rgb8 },
}

impl ColorRamp {
    /// Color at `t`, clamped to [0, 1]. NaN maps to the low end.
    pub fn sample(&self, t: f32) -> Rgb8 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match *self {
            ColorRamp::RedGreen => Rgb8::from_unit((1.0 - t) / 0.5, t / 0.5, 0.0),
            ColorRamp::Linear { low, high } => low.lerp(high, t),
        }
    }

    pub fn low(&self) -> Rgb8 {
        self.sample(0.0)
    }
}

/// Normalize `values` into `[min, max]` and map them through `ramp`.
///
/// A degenerate range (`max <= min`, or a range that is not finite) maps
/// every value to the low end of the ramp instead of dividing by zero.
pub fn colorize(values: &[f32], min: f32, max: f32, ramp: &ColorRamp) -> Vec<Rgb8> {
    let range = max - min;
    if !(range.is_finite() && range > 0.0) {
        if !values.is_empty() {
            log::debug!("Degenerate color range [{min}, {max}], using low ramp color");
        }
        return vec![ramp.low(); values.len()];
    }

    values
        .iter()
        .map(|&v| ramp.sample((v - min) / range))
        .collect()
}
