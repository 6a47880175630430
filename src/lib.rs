//! This crate implements a state-tracking G-code decoder and re-encoder for Marlin based
//! 3D printers.
//!
//! The [`Decoder`] turns lines into [`Instruction`]s while following the printer's
//! [`MachineState`] (position, movement modes, temperatures, fan, homing). The [`Encoder`]
//! does the reverse with its own state, and only writes what actually changes something:
//! coordinates come out absolute, filament feeds relative, and moves that go nowhere are
//! dropped.
//!
//! ```
//! let out = marlin_gcode::encode_to_string(
//!     marlin_gcode::decode_str("G91\nG0 X10\nG0 X10\nG0 X0").unwrap(),
//! )
//! .unwrap();
//! assert!(out.ends_with("M83\nG0 X10\nG0 X20\n"));
//! ```
//!
//! Lines the built-in instructions do not cover are carried verbatim. Callers can claim
//! lines first with a [`Recognizer`] and produce their own [`Extension`] instructions.
//!
//! The `async` feature (on by default) adds a `Stream` implementation for decoders over an
//! `AsyncBufRead` source and suspending methods for encoders over an `AsyncWrite` sink.
use core::borrow::Borrow;

mod decoder;
mod encoder;
mod error;
pub mod instruction;
pub mod parser;
mod state;
#[cfg(feature = "async")]
mod stream;
mod types;
mod utils;

pub use decoder::{Decoder, LineDecoder, Recognizer};
pub use encoder::{Encoder, WATERMARK};
pub use error::{Error, InvalidGCode};
pub use instruction::{
    AutoHome, Empty, Extension, Instruction, LinearMove, ModeTarget, SetFanSpeed,
    SetHeaterTemperature, SetMovementMode, SetPositionOffset, Unrecognized,
};
pub use parser::Line;
pub use state::MachineState;
pub use types::{Axis, Flavor, Heater, Position};
pub use utils::EPSILON;

/// Decodes a whole text, failing on the first invalid line.
pub fn decode_str(text: &str) -> Result<Vec<Instruction>, Error> {
    Decoder::new(text.as_bytes()).collect()
}

/// Encodes instructions, preamble included, into a string.
pub fn encode_to_string<I>(instructions: I) -> Result<String, Error>
where
    I: IntoIterator,
    I::Item: Borrow<Instruction>,
{
    let mut encoder = Encoder::new(Vec::new());
    encoder.encode_all(instructions)?;
    let bytes = encoder.finish()?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidGCode(InvalidGCode::InvalidUtf8))
}
