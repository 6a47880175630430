use core::str::FromStr;

use super::{owned_comment, with_comment};
use crate::{parser::Line, types::Axis, InvalidGCode, MachineState};

/// `G28`: home some axes, or all of them when none is named.
///
/// The `L`, `O` and `R` options are refused. Other letters are passed over.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct AutoHome {
    axes: [bool; 3],
    pub comment: Option<String>,
}

impl AutoHome {
    pub fn new(axes: impl IntoIterator<Item = Axis>) -> Self {
        let mut home = Self::default();
        for axis in axes {
            home.axes[axis.index()] = true;
        }
        home
    }

    pub fn all() -> Self {
        Self::new(Axis::ALL)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Axes named by the instruction, in X, Y, Z order.
    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::ALL.into_iter().filter(|axis| self.axes[axis.index()])
    }

    pub fn is_command(line: &Line<'_>) -> bool {
        line.code_is('G', 28)
    }

    pub fn parse(line: &Line<'_>) -> Result<Self, InvalidGCode> {
        if !Self::is_command(line) {
            return Err(InvalidGCode::UnexpectedCode(
                line.code().unwrap_or_default().to_owned(),
            ));
        }
        let flags = line.flags()?;
        if ['L', 'O', 'R'].into_iter().any(|l| flags.contains(l)) {
            return Err(InvalidGCode::Unsupported("G28 L/O/R options"));
        }
        Ok(Self {
            comment: owned_comment(line),
            ..Self::new(Axis::ALL.into_iter().filter(|axis| flags.contains(axis.letter())))
        })
    }

    pub fn apply(&self, state: &mut MachineState) {
        let all = self.axes().next().is_none();
        for axis in Axis::ALL {
            if all || self.axes[axis.index()] {
                state.set_homed(axis, true);
            }
        }
    }

    pub fn render(&self, _state: &MachineState) -> String {
        let mut text = String::from("G28");
        for axis in self.axes() {
            text.push(' ');
            text.push(axis.letter());
        }
        with_comment(text, self.comment.as_deref())
    }
}

impl FromStr for AutoHome {
    type Err = InvalidGCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&Line::split(s))
    }
}
