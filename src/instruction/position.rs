use core::fmt::Write;
use core::str::FromStr;

use super::{owned_comment, with_comment};
use crate::{parser::Line, types::Axis, utils::Number, InvalidGCode, MachineState};

/// `G92`: declare the current position to be the given coordinates, without moving.
///
/// Each named axis gets an offset between machine and logical coordinates, axes that are
/// not named keep theirs.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SetPositionOffset {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub comment: Option<String>,
}

impl SetPositionOffset {
    pub fn new(x: Option<f64>, y: Option<f64>, z: Option<f64>, e: Option<f64>) -> Self {
        Self {
            x,
            y,
            z,
            e,
            comment: None,
        }
    }

    /// `G92 E0`, the usual extruder reset.
    pub fn reset_extruder() -> Self {
        Self::new(None, None, None, Some(0.))
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_command(line: &Line<'_>) -> bool {
        line.code_is('G', 92)
    }

    pub fn parse(line: &Line<'_>) -> Result<Self, InvalidGCode> {
        if !Self::is_command(line) {
            return Err(InvalidGCode::UnexpectedCode(
                line.code().unwrap_or_default().to_owned(),
            ));
        }
        let args = line.arguments()?;
        args.only("XYZE")?;
        Ok(Self {
            x: args.get('X'),
            y: args.get('Y'),
            z: args.get('Z'),
            e: args.get('E'),
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
                state.define_axis(axis, v);
            }
        }
        if let Some(e) = self.e {
            state.define_e(e);
        }
    }

    /// Emits every component the instruction names, zeros included, so `G92 E0` stays
    /// `G92 E0` instead of collapsing to a bare `G92` that no longer names the extruder.
    pub fn render(&self, _state: &MachineState) -> String {
        let mut text = String::from("G92");
        for axis in Axis::ALL {
            if let Some(v) = self.axis_value(axis) {
                let _ = write!(text, " {}{}", axis.letter(), Number(v));
            }
        }
        if let Some(e) = self.e {
            let _ = write!(text, " E{}", Number(e));
        }
        with_comment(text, self.comment.as_deref())
    }
}

impl FromStr for SetPositionOffset {
    type Err = InvalidGCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&Line::split(s))
    }
}
