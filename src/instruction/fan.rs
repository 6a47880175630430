use core::str::FromStr;

use super::{owned_comment, with_comment};
use crate::{parser::Line, utils::Number, InvalidGCode, MachineState};

/// `M106`/`M107`: part cooling fan speed, 0 to 255.
#[derive(Debug, PartialEq, Clone)]
pub struct SetFanSpeed {
    pub speed: f64,
    pub comment: Option<String>,
}

impl SetFanSpeed {
    pub const FULL: f64 = 255.;

    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            comment: None,
        }
    }

    pub fn off() -> Self {
        Self::new(0.)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_command(line: &Line<'_>) -> bool {
        line.code_is('M', 106) || line.code_is('M', 107)
    }

    pub fn parse(line: &Line<'_>) -> Result<Self, InvalidGCode> {
        let args = line.arguments()?;
        let speed = if line.code_is('M', 107) {
            if let Some(letter) = args.letters().next() {
                return Err(InvalidGCode::UnexpectedArgument(letter));
            }
            0.
        } else if line.code_is('M', 106) {
            if args.contains('P') && args.contains('T') {
                return Err(InvalidGCode::Unsupported("multiple fans"));
            }
            args.get('S').or(args.get('I')).unwrap_or(Self::FULL)
        } else {
            return Err(InvalidGCode::UnexpectedCode(
                line.code().unwrap_or_default().to_owned(),
            ));
        };
        Ok(Self {
            speed,
            comment: owned_comment(line),
        })
    }

    pub fn apply(&self, state: &mut MachineState) {
        state.set_fan_speed(self.speed);
    }

    pub fn render(&self, _state: &MachineState) -> String {
        let text = if self.speed == 0. {
            "M107".to_owned()
        } else {
            format!("M106 S{}", Number(self.speed))
        };
        with_comment(text, self.comment.as_deref())
    }
}

impl FromStr for SetFanSpeed {
    type Err = InvalidGCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&Line::split(s))
    }
}
