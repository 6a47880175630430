use super::{owned_comment, with_comment};
use crate::{parser::Line, InvalidGCode, MachineState};

/// A blank line or a line holding only a comment.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Empty {
    pub comment: Option<String>,
}

impl Empty {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commented(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
        }
    }

    pub fn is_command(line: &Line<'_>) -> bool {
        line.is_empty()
    }

    pub fn parse(line: &Line<'_>) -> Result<Self, InvalidGCode> {
        match line.code() {
            None => Ok(Self {
                comment: owned_comment(line),
            }),
            Some(code) => Err(InvalidGCode::UnexpectedCode(code.to_owned())),
        }
    }

    pub fn apply(&self, _state: &mut MachineState) {}

    pub fn render(&self, _state: &MachineState) -> String {
        with_comment(String::new(), self.comment.as_deref())
    }
}

/// Any line no recognizer claimed. Carried verbatim and never interpreted.
#[derive(Debug, PartialEq, Clone)]
pub struct Unrecognized {
    pub text: String,
}

impl Unrecognized {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn parse(line: &Line<'_>) -> Self {
        Self::new(line.text())
    }

    pub fn comment(&self) -> Option<&str> {
        Line::split(&self.text).comment()
    }

    pub fn apply(&self, _state: &mut MachineState) {}

    pub fn render(&self, _state: &MachineState) -> String {
        self.text.clone()
    }
}
