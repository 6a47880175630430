use core::str::FromStr;

use super::{owned_comment, with_comment};
use crate::{parser::Line, InvalidGCode, MachineState};

/// Which axes a movement mode instruction switches.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ModeTarget {
    /// `G90`/`G91`: X, Y and Z, and E unless the extruder mode was set on its own.
    Motion,
    /// `M82`/`M83`: E only.
    Extruder,
}

/// Switches between absolute and relative interpretation of coordinates.
///
/// Mode changes are never re-emitted: the encoder folds them into the coordinates of the
/// moves that follow, so only a trailing comment survives rendering.
#[derive(Debug, PartialEq, Clone)]
pub struct SetMovementMode {
    pub target: ModeTarget,
    pub absolute: bool,
    pub comment: Option<String>,
}

impl SetMovementMode {
    pub fn new(target: ModeTarget, absolute: bool) -> Self {
        Self {
            target,
            absolute,
            comment: None,
        }
    }

    pub fn absolute() -> Self {
        Self::new(ModeTarget::Motion, true)
    }

    pub fn relative() -> Self {
        Self::new(ModeTarget::Motion, false)
    }

    pub fn absolute_extruder() -> Self {
        Self::new(ModeTarget::Extruder, true)
    }

    pub fn relative_extruder() -> Self {
        Self::new(ModeTarget::Extruder, false)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The code that would set this mode on a printer.
    pub fn code(&self) -> &'static str {
        match (self.target, self.absolute) {
            (ModeTarget::Motion, true) => "G90",
            (ModeTarget::Motion, false) => "G91",
            (ModeTarget::Extruder, true) => "M82",
            (ModeTarget::Extruder, false) => "M83",
        }
    }

    fn from_line(line: &Line<'_>) -> Option<Self> {
        const CODES: [(char, u32, ModeTarget, bool); 4] = [
            ('G', 90, ModeTarget::Motion, true),
            ('G', 91, ModeTarget::Motion, false),
            ('M', 82, ModeTarget::Extruder, true),
            ('M', 83, ModeTarget::Extruder, false),
        ];
        CODES
            .iter()
            .find(|(letter, number, ..)| line.code_is(*letter, *number))
            .map(|&(_, _, target, absolute)| Self::new(target, absolute))
    }

    pub fn is_command(line: &Line<'_>) -> bool {
        Self::from_line(line).is_some()
    }

    pub fn parse(line: &Line<'_>) -> Result<Self, InvalidGCode> {
        let mode = Self::from_line(line).ok_or_else(|| {
            InvalidGCode::UnexpectedCode(line.code().unwrap_or_default().to_owned())
        })?;
        Ok(Self {
            comment: owned_comment(line),
            ..mode
        })
    }

    pub fn apply(&self, state: &mut MachineState) {
        match self.target {
            ModeTarget::Motion => state.set_abs_mode(self.absolute),
            ModeTarget::Extruder => state.set_abs_extruder_mode(self.absolute),
        }
    }

    pub fn render(&self, _state: &MachineState) -> String {
        with_comment(String::new(), self.comment.as_deref())
    }
}

impl FromStr for SetMovementMode {
    type Err = InvalidGCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&Line::split(s))
    }
}

#[cfg(test)]
mod test {
    use super::{ModeTarget, SetMovementMode};
    use crate::MachineState;

    #[test]
    fn all_four_codes() {
        for (text, target, absolute) in [
            ("G90", ModeTarget::Motion, true),
            ("G91", ModeTarget::Motion, false),
            ("M82", ModeTarget::Extruder, true),
            ("m83", ModeTarget::Extruder, false),
        ] {
            let mode: SetMovementMode = text.parse().unwrap();
            assert_eq!((mode.target, mode.absolute), (target, absolute), "{text}");
        }
        assert!("G92".parse::<SetMovementMode>().is_err());
    }

    #[test]
    fn renders_nothing_but_its_comment() {
        let state = MachineState::new();
        assert_eq!(SetMovementMode::relative().render(&state), "");
        assert_eq!(
            "G91 ; go relative"
                .parse::<SetMovementMode>()
                .unwrap()
                .render(&state),
            "; go relative"
        );
    }

    #[test]
    fn extruder_override_is_sticky() {
        let mut state = MachineState::new();
        SetMovementMode::relative().apply(&mut state);
        assert!(!state.abs_extruder_mode());

        SetMovementMode::absolute_extruder().apply(&mut state);
        SetMovementMode::relative().apply(&mut state);
        SetMovementMode::absolute().apply(&mut state);
        SetMovementMode::relative().apply(&mut state);
        assert!(state.abs_extruder_mode());
        assert!(!state.abs_mode());
    }
}
