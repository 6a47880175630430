use thiserror::Error;

/// Reasons a line, or a request made of the codec, is not acceptable G-code.
///
/// Every variant is raised while an instruction is being constructed, before it can touch a
/// [`MachineState`](crate::MachineState).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidGCode {
    /// Only the Marlin dialect is implemented.
    #[error("unsupported gcode flavor `{0}`")]
    UnsupportedFlavor(String),
    /// A token that is not a letter immediately followed by a number.
    #[error("malformed argument `{0}`")]
    MalformedArgument(String),
    /// The same letter was given twice on one line.
    #[error("duplicate argument `{0}`")]
    DuplicateArgument(char),
    /// A letter the instruction does not accept.
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(char),
    /// A letter the instruction requires.
    #[error("missing argument `{0}`")]
    MissingArgument(char),
    /// A well formed feature of the firmware that this codec does not model.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    /// Lines are ASCII; anything that is not even UTF-8 is refused.
    #[error("line is not valid utf-8")]
    InvalidUtf8,
    /// A parse constructor was handed a line of another kind.
    #[error("unexpected code `{0}`")]
    UnexpectedCode(String),
}

impl InvalidGCode {
    pub fn is_duplicate_argument(&self) -> bool {
        matches!(self, Self::DuplicateArgument(_))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// `line` is 1-based.
    #[error("line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: InvalidGCode,
    },
    #[error(transparent)]
    InvalidGCode(#[from] InvalidGCode),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The validation failure behind this error, if it is not an I/O error.
    pub fn invalid_gcode(&self) -> Option<&InvalidGCode> {
        match self {
            Self::Decode { source, .. } => Some(source),
            Self::InvalidGCode(e) => Some(e),
            Self::Io(_) => None,
        }
    }
}
