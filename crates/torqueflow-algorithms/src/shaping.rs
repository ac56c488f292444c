//! Output shaping applied after every strategy.

use torqueflow_filters::sign;

/// Below this magnitude the output floor is not applied.
pub const FLOOR_EPSILON: f32 = 1e-6;

/// Exponent for an output curve setting in `[-1, 1]`.
///
/// Positive curves steepen up to `x^5`, negative curves flatten down to
/// `x^0.25`.
///
/// ```
/// use torqueflow_algorithms::curve_to_power;
///
/// assert_eq!(curve_to_power(0.0), 1.0);
/// assert_eq!(curve_to_power(1.0), 5.0);
/// assert_eq!(curve_to_power(-1.0), 0.25);
/// ```
#[inline]
pub fn curve_to_power(curve: f32) -> f32 {
    if curve >= 0.0 {
        1.0 + curve * 4.0
    } else {
        1.0 + curve * 0.75
    }
}

/// Curve, ceiling and floor, in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputShaping {
    /// Curve setting in `[-1, 1]`; 0 is linear
    pub curve: f32,
    /// Smallest output magnitude for a nonzero signal
    pub minimum: f32,
    /// Largest output magnitude
    pub maximum: f32,
}

impl Default for OutputShaping {
    fn default() -> Self {
        Self {
            curve: 0.0,
            minimum: 0.0,
            maximum: 1.0,
        }
    }
}

impl OutputShaping {
    /// Shape a normalized torque.
    ///
    /// The ceiling wins over the floor if the two are configured inverted.
    pub fn apply(&self, torque: f32) -> f32 {
        if !torque.is_finite() {
            return 0.0;
        }

        let mut out = torque;
        if self.curve != 0.0 && self.curve.is_finite() {
            out = sign(out) * out.abs().powf(curve_to_power(self.curve));
        }

        let ceiling = self.maximum.max(0.0);
        out = out.clamp(-ceiling, ceiling);

        if self.minimum > 0.0 && out.abs() > FLOOR_EPSILON && out.abs() < self.minimum {
            out = sign(out) * self.minimum.min(ceiling);
        }
        out
    }
}
