//! The closed set of instructions the codec understands.
//!
//! Every kind is built either by parsing one [`Line`] or programmatically, and is then
//! consumed through two operations whose order is fixed by the owning pipeline:
//! - `render` produces canonical text against the state *before* the instruction,
//! - `apply` moves the state past the instruction.
//!
//! The decoder applies each instruction it yields; the encoder renders then applies.
mod fan;
mod heater;
mod home;
mod linear_move;
mod mode;
mod passthrough;
mod position;

use core::fmt;
use core::str::FromStr;

use crate::{parser::Line, InvalidGCode, MachineState};

pub use fan::SetFanSpeed;
pub use heater::SetHeaterTemperature;
pub use home::AutoHome;
pub use linear_move::LinearMove;
pub use mode::{ModeTarget, SetMovementMode};
pub use passthrough::{Empty, Unrecognized};
pub use position::SetPositionOffset;

/// Instruction kinds defined outside this crate, typically produced by a
/// [`Recognizer`](crate::Recognizer) to carry slicer metadata.
pub trait Extension: fmt::Debug + Send {
    fn render(&self, state: &MachineState) -> String;
    fn apply(&self, state: &mut MachineState);
}

#[derive(Debug)]
pub enum Instruction {
    LinearMove(LinearMove),
    SetMovementMode(SetMovementMode),
    SetHeaterTemperature(SetHeaterTemperature),
    SetFanSpeed(SetFanSpeed),
    AutoHome(AutoHome),
    SetPositionOffset(SetPositionOffset),
    Empty(Empty),
    Unrecognized(Unrecognized),
    Extension(Box<dyn Extension>),
}

impl Instruction {
    /// Runs the built-in recognizers in priority order. Lines no recognizer claims are kept
    /// as [`Unrecognized`].
    pub fn parse(line: &Line<'_>) -> Result<Self, InvalidGCode> {
        Ok(if LinearMove::is_command(line) {
            LinearMove::parse(line)?.into()
        } else if SetMovementMode::is_command(line) {
            SetMovementMode::parse(line)?.into()
        } else if SetHeaterTemperature::is_command(line) {
            SetHeaterTemperature::parse(line)?.into()
        } else if SetFanSpeed::is_command(line) {
            SetFanSpeed::parse(line)?.into()
        } else if AutoHome::is_command(line) {
            AutoHome::parse(line)?.into()
        } else if SetPositionOffset::is_command(line) {
            SetPositionOffset::parse(line)?.into()
        } else if Empty::is_command(line) {
            Empty::parse(line)?.into()
        } else {
            Unrecognized::parse(line).into()
        })
    }

    /// Canonical text for this instruction given the state before it. Empty text means
    /// the instruction has nothing to say.
    pub fn render(&self, state: &MachineState) -> String {
        match self {
            Self::LinearMove(i) => i.render(state),
            Self::SetMovementMode(i) => i.render(state),
            Self::SetHeaterTemperature(i) => i.render(state),
            Self::SetFanSpeed(i) => i.render(state),
            Self::AutoHome(i) => i.render(state),
            Self::SetPositionOffset(i) => i.render(state),
            Self::Empty(i) => i.render(state),
            Self::Unrecognized(i) => i.render(state),
            Self::Extension(i) => i.render(state),
        }
    }

    pub fn apply(&self, state: &mut MachineState) {
        match self {
            Self::LinearMove(i) => i.apply(state),
            Self::SetMovementMode(i) => i.apply(state),
            Self::SetHeaterTemperature(i) => i.apply(state),
            Self::SetFanSpeed(i) => i.apply(state),
            Self::AutoHome(i) => i.apply(state),
            Self::SetPositionOffset(i) => i.apply(state),
            Self::Empty(i) => i.apply(state),
            Self::Unrecognized(i) => i.apply(state),
            Self::Extension(i) => i.apply(state),
        }
    }

    /// Trailing comment, without its `;`.
    pub fn comment(&self) -> Option<&str> {
        match self {
            Self::LinearMove(i) => i.comment.as_deref(),
            Self::SetMovementMode(i) => i.comment.as_deref(),
            Self::SetHeaterTemperature(i) => i.comment.as_deref(),
            Self::SetFanSpeed(i) => i.comment.as_deref(),
            Self::AutoHome(i) => i.comment.as_deref(),
            Self::SetPositionOffset(i) => i.comment.as_deref(),
            Self::Empty(i) => i.comment.as_deref(),
            Self::Unrecognized(i) => i.comment(),
            Self::Extension(_) => None,
        }
    }
}

impl FromStr for Instruction {
    type Err = InvalidGCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&Line::split(s))
    }
}

macro_rules! impl_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Instruction {
                fn from(from: $variant) -> Self {
                    Self::$variant(from)
                }
            }
        )*
    };
}
impl_from!(
    LinearMove,
    SetMovementMode,
    SetHeaterTemperature,
    SetFanSpeed,
    AutoHome,
    SetPositionOffset,
    Empty,
    Unrecognized
);

impl<E: Extension + 'static> From<Box<E>> for Instruction {
    fn from(from: Box<E>) -> Self {
        Self::Extension(from)
    }
}

/// Appends `;comment` to a rendered line.
pub(crate) fn with_comment(mut text: String, comment: Option<&str>) -> String {
    if let Some(comment) = comment {
        text.push(';');
        text.push_str(comment);
    }
    text
}

pub(crate) fn owned_comment(line: &Line<'_>) -> Option<String> {
    line.comment().map(str::to_owned)
}
