use core::fmt::Write;
use core::str::FromStr;

use super::{owned_comment, with_comment};
use crate::{
    parser::Line,
    types::{Axis, Position},
    utils::{approx_eq, approx_zero, Number},
    InvalidGCode, MachineState,
};

/// `G0`/`G1`: move to a position, optionally feeding filament.
///
/// Values are held as written, their meaning depends on the movement modes of the state
/// they are applied to.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct LinearMove {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub f: Option<f64>,
    pub comment: Option<String>,
}

impl LinearMove {
    const LETTERS: &'static str = "XYZEF";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn e(mut self, e: f64) -> Self {
        self.e = Some(e);
        self
    }

    pub fn f(mut self, f: f64) -> Self {
        self.f = Some(f);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_command(line: &Line<'_>) -> bool {
        line.code_is('G', 0) || line.code_is('G', 1)
    }

    pub fn parse(line: &Line<'_>) -> Result<Self, InvalidGCode> {
        if !Self::is_command(line) {
            return Err(InvalidGCode::UnexpectedCode(
                line.code().unwrap_or_default().to_owned(),
            ));
        }
        let args = line.inline_arguments::<5>()?;
        if let Some((letter, _)) = args.iter().find(|(l, _)| !Self::LETTERS.contains(*l)) {
            return Err(InvalidGCode::UnexpectedArgument(letter));
        }
        Ok(Self {
            x: args.get('X'),
            y: args.get('Y'),
            z: args.get('Z'),
            e: args.get('E'),
            f: args.get('F'),
            comment: owned_comment(line),
        })
    }

    fn axis_value(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn apply(&self, state: &mut MachineState) {
        for axis in Axis::ALL {
            if let Some(v) = self.axis_value(axis) {
                state.set_axis(axis, v);
            }
        }
        if let Some(e) = self.e {
            state.set_e(e);
        }
        if let Some(f) = self.f {
            state.set_f(f);
        }
    }

    /// Filament fed by this move, relative to the state before it.
    pub fn extrusion(&self, state: &MachineState) -> f64 {
        match self.e {
            Some(e) if state.abs_extruder_mode() => e - state.e(),
            Some(e) => e,
            None => 0.,
        }
    }

    /// Emits absolute coordinates for the axes that actually move, a relative `E` when
    /// filament is fed, and `F` when it changes. Picks `G1` for extruding moves, `G0`
    /// otherwise. A move that changes nothing renders as nothing.
    pub fn render(&self, state: &MachineState) -> String {
        let mut args = String::new();
        for axis in Axis::ALL {
            let Some(v) = self.axis_value(axis) else {
                continue;
            };
            let current = state.axis(axis);
            let target = if state.abs_mode() {
                (!approx_eq(v, current)).then_some(v)
            } else {
                (!approx_zero(v)).then(|| current + v)
            };
            if let Some(target) = target {
                let _ = write!(args, " {}{}", axis.letter(), Number(target));
            }
        }
        if let Some(f) = self.f.filter(|f| !approx_eq(*f, state.f())) {
            let _ = write!(args, " F{}", Number(f));
        }
        let extrusion = self.extrusion(state);
        let extruding = !approx_zero(extrusion);
        if extruding {
            let _ = write!(args, " E{}", Number(extrusion));
        }

        if args.is_empty() {
            return String::new();
        }
        let code = if extruding { "G1" } else { "G0" };
        with_comment(format!("{code}{args}"), self.comment.as_deref())
    }

    /// Where the head would be after this move.
    pub fn resulting_position(&self, state: &MachineState) -> Position {
        state.position_after(self.x, self.y, self.z)
    }

    /// Where the filament would be after this move.
    pub fn resulting_extruder_position(&self, state: &MachineState) -> f64 {
        state.e_after(self.e)
    }
}

impl FromStr for LinearMove {
    type Err = InvalidGCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&Line::split(s))
    }
}
