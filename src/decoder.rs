use std::io::BufRead;

use pin_project_lite::pin_project;

use crate::{parser::Line, Error, Flavor, Instruction, InvalidGCode, MachineState};

/// A caller supplied recognizer, consulted before the built-in ones.
///
/// Returning `Ok(None)` passes the line on to the next recognizer. Recognizers must not
/// assume the state already reflects the line they are looking at: it is applied only once
/// a recognizer has claimed it.
pub trait Recognizer: Send {
    fn recognize(
        &self,
        line: &Line<'_>,
        flavor: Flavor,
        state: &MachineState,
    ) -> Result<Option<Instruction>, InvalidGCode>;
}

impl<F> Recognizer for F
where
    F: Fn(&Line<'_>, Flavor, &MachineState) -> Result<Option<Instruction>, InvalidGCode> + Send,
{
    fn recognize(
        &self,
        line: &Line<'_>,
        flavor: Flavor,
        state: &MachineState,
    ) -> Result<Option<Instruction>, InvalidGCode> {
        self(line, flavor, state)
    }
}

/// Turns lines into instructions, one at a time, keeping the state they are read against.
pub struct LineDecoder {
    flavor: Flavor,
    state: MachineState,
    recognizers: Vec<Box<dyn Recognizer>>,
    line_number: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(Flavor::Marlin)
    }
}

impl LineDecoder {
    pub fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            state: MachineState::new(),
            recognizers: Vec::new(),
            line_number: 0,
        }
    }

    /// Recognizers run in the order they were added; the first to claim a line wins.
    pub fn add_recognizer(&mut self, recognizer: impl Recognizer + 'static) {
        self.recognizers.push(Box::new(recognizer));
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Number of lines decoded so far, failed ones included.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Decodes one line, with or without its line terminator, and applies the result.
    /// A line that fails validation leaves the state untouched.
    pub fn decode(&mut self, text: &str) -> Result<Instruction, Error> {
        self.line_number += 1;
        let text = text.trim_end_matches(['\n', '\r']);
        let line = Line::split(text);

        let instruction = self.recognize(&line).map_err(|source| {
            tracing::warn!(line = self.line_number, %source, "invalid gcode");
            Error::Decode {
                line: self.line_number,
                source,
            }
        })?;
        instruction.apply(&mut self.state);
        tracing::trace!(line = self.line_number, ?instruction, "decoded");
        Ok(instruction)
    }

    fn recognize(&self, line: &Line<'_>) -> Result<Instruction, InvalidGCode> {
        for (idx, recognizer) in self.recognizers.iter().enumerate() {
            if let Some(instruction) = recognizer.recognize(line, self.flavor, &self.state)? {
                tracing::trace!(recognizer = idx, "claimed by custom recognizer");
                return Ok(instruction);
            }
        }
        Instruction::parse(line)
    }

    pub(crate) fn decode_bytes(&mut self, bytes: &[u8]) -> Result<Instruction, Error> {
        match core::str::from_utf8(bytes) {
            Ok(text) => self.decode(text),
            Err(_) => {
                self.line_number += 1;
                Err(Error::Decode {
                    line: self.line_number,
                    source: InvalidGCode::InvalidUtf8,
                })
            }
        }
    }
}

pin_project! {
    /// Reads instructions out of a line oriented byte source.
    ///
    /// With a [`BufRead`] source it is an [`Iterator`]; with an `AsyncBufRead` source (feature
    /// `async`) it is a `Stream`. Both pull from the same cursor, and either way the sequence
    /// can only be walked once.
    pub struct Decoder<R> {
        #[pin]
        pub(crate) source: R,
        pub(crate) buffer: Vec<u8>,
        pub(crate) lines: LineDecoder,
        pub(crate) finished: bool,
    }
}

impl<R> Decoder<R> {
    pub fn new(source: R) -> Self {
        Self::with_flavor(source, Flavor::Marlin)
    }

    pub fn with_flavor(source: R, flavor: Flavor) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            lines: LineDecoder::new(flavor),
            finished: false,
        }
    }

    /// Same as [`Decoder::with_flavor`] for a dialect named at runtime.
    pub fn for_flavor_name(source: R, flavor: &str) -> Result<Self, InvalidGCode> {
        Ok(Self::with_flavor(source, flavor.parse()?))
    }

    pub fn add_recognizer(&mut self, recognizer: impl Recognizer + 'static) {
        self.lines.add_recognizer(recognizer);
    }

    pub fn with_recognizer(mut self, recognizer: impl Recognizer + 'static) -> Self {
        self.add_recognizer(recognizer);
        self
    }

    pub fn state(&self) -> &MachineState {
        self.lines.state()
    }

    pub fn line_number(&self) -> usize {
        self.lines.line_number()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Decodes whatever line the buffer holds and empties it, or ends the sequence when the
    /// source had nothing left.
    pub(crate) fn take_line(
        buffer: &mut Vec<u8>,
        lines: &mut LineDecoder,
        finished: &mut bool,
    ) -> Option<Result<Instruction, Error>> {
        if buffer.is_empty() {
            *finished = true;
            tracing::debug!(lines = lines.line_number(), "end of input");
            return None;
        }
        let res = lines.decode_bytes(buffer);
        buffer.clear();
        Some(res)
    }
}

impl<R: BufRead> Decoder<R> {
    /// Blocking pull. `Ok(None)` marks the end of the input.
    pub fn read_instruction(&mut self) -> Result<Option<Instruction>, Error> {
        if self.finished {
            return Ok(None);
        }
        self.source.read_until(b'\n', &mut self.buffer)?;
        Self::take_line(&mut self.buffer, &mut self.lines, &mut self.finished).transpose()
    }
}

impl<R: BufRead> Iterator for Decoder<R> {
    type Item = Result<Instruction, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_instruction().transpose()
    }
}

#[cfg(test)]
mod test {
    use super::{Decoder, LineDecoder};
    use crate::{
        parser::Line, Error, Flavor, Instruction, InvalidGCode, MachineState, Unrecognized,
    };

    fn decode_all(text: &str) -> Vec<Result<Instruction, Error>> {
        Decoder::new(text.as_bytes()).collect()
    }

    #[test]
    fn one_instruction_per_line() {
        let res = decode_all("G0 X5\r\nG91\n\nM104 S200");
        assert_eq!(res.len(), 4);
        assert!(res.iter().all(Result::is_ok));
        assert!(decode_all("").is_empty());
        assert_eq!(decode_all("G0 X5\n").len(), 1);
    }

    #[test]
    fn state_follows_the_stream() {
        let mut decoder = Decoder::new("G91\nG0 X10\nG0 X10\nM83\nG1 E2\nG1 E2".as_bytes());
        while decoder.read_instruction().unwrap().is_some() {}
        assert_eq!(decoder.state().x(), 20.);
        assert_eq!(decoder.state().e(), 4.);
        assert!(decoder.is_finished());
        assert_eq!(decoder.line_number(), 6);
        assert!(decoder.read_instruction().unwrap().is_none());
    }

    #[test]
    fn failures_name_the_line_and_do_not_touch_the_state() {
        let mut decoder = Decoder::new("G0 X1\nG0 X10 X10\nG0 A1\nG0 X3".as_bytes());
        assert!(decoder.read_instruction().is_ok());
        match decoder.read_instruction() {
            Err(Error::Decode { line: 2, source }) => assert!(source.is_duplicate_argument()),
            other => panic!("{other:?}"),
        }
        assert_eq!(decoder.state().x(), 1.);
        assert!(matches!(
            decoder.read_instruction(),
            Err(Error::Decode {
                line: 3,
                source: InvalidGCode::UnexpectedArgument('A')
            })
        ));
        // the caller may skip and carry on
        assert!(decoder.read_instruction().unwrap().is_some());
        assert_eq!(decoder.state().x(), 3.);
    }

    #[test]
    fn non_utf8_lines_are_refused() {
        let mut decoder = Decoder::new(&b"G0 X1\n\xff\xfe\nG0 X2\n"[..]);
        assert!(decoder.read_instruction().is_ok());
        assert!(matches!(
            decoder.read_instruction(),
            Err(Error::Decode {
                line: 2,
                source: InvalidGCode::InvalidUtf8
            })
        ));
        assert!(decoder.read_instruction().is_ok());
    }

    #[test]
    fn unknown_flavors_fail_fast() {
        assert!(matches!(
            Decoder::for_flavor_name(&b""[..], "Klipper"),
            Err(InvalidGCode::UnsupportedFlavor(_))
        ));
        assert!(Decoder::for_flavor_name(&b""[..], "marlin").is_ok());
    }

    fn claims_g1(
        line: &Line<'_>,
        _: Flavor,
        _: &MachineState,
    ) -> Result<Option<Instruction>, InvalidGCode> {
        Ok(line
            .code_is('G', 1)
            .then(|| Unrecognized::new("first").into()))
    }

    fn claims_everything(
        _: &Line<'_>,
        _: Flavor,
        _: &MachineState,
    ) -> Result<Option<Instruction>, InvalidGCode> {
        Ok(Some(Unrecognized::new("second").into()))
    }

    fn refuses_everything(
        _: &Line<'_>,
        _: Flavor,
        _: &MachineState,
    ) -> Result<Option<Instruction>, InvalidGCode> {
        Err(InvalidGCode::Unsupported("nothing"))
    }

    #[test]
    fn custom_recognizers_come_first_in_order() {
        let mut lines = LineDecoder::default();
        lines.add_recognizer(claims_g1);
        lines.add_recognizer(claims_everything);
        let render = |i: Instruction| i.render(&MachineState::new());
        assert_eq!(render(lines.decode("G1 X1").unwrap()), "first");
        assert_eq!(render(lines.decode("G0 X1").unwrap()), "second");
        // claimed lines are still applied, and these ones do nothing
        assert_eq!(lines.state().x(), 0.);
    }

    #[test]
    fn recognizer_errors_are_decode_errors() {
        let mut lines = LineDecoder::default();
        lines.add_recognizer(refuses_everything);
        assert!(matches!(
            lines.decode("G1 X1"),
            Err(Error::Decode { line: 1, .. })
        ));
    }
}
