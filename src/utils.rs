use core::fmt;

/// Two coordinates closer than this are the same coordinate.
pub const EPSILON: f64 = 1e-5;

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

pub(crate) fn approx_zero(a: f64) -> bool {
    approx_eq(a, 0.)
}

/// Renders a value with the shortest decimal text that reads back to it: `97.7`, `5`, `-0.25`.
pub(crate) struct Number(pub f64);

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print `-0`
        if self.0 == 0. {
            f.write_str("0")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
