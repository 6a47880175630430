use core::borrow::Borrow;
use std::io;

#[cfg(feature = "async")]
use futures::{
    io::{AsyncWrite, AsyncWriteExt},
    Stream, StreamExt,
};

use crate::{
    instruction::{SetMovementMode, SetPositionOffset},
    Error, Flavor, Instruction, InvalidGCode, MachineState,
};

/// First line of every encoded file.
pub const WATERMARK: &str = concat!(
    "; G-code generated/modified by ",
    env!("CARGO_PKG_NAME"),
    " ",
    env!("CARGO_PKG_VERSION")
);

const BUFFER_SIZE: usize = 8 * 1024;

/// Writes instructions as canonical G-code, dropping everything that would not change the
/// printer's state.
///
/// The output starts with a fixed preamble that puts the printer in absolute XYZ and
/// relative E mode: every move is written with absolute coordinates and an extrusion delta,
/// whatever the modes of the instructions fed in. Those modes are still tracked, so the
/// state instructions are rendered against reads them the way a decoder would.
///
/// `W` is the buffered writer: [`io::BufWriter`] from [`Encoder::new`], or
/// `futures::io::BufWriter` from [`Encoder::new_async`]. The preamble reaches it with the
/// first instruction or flush.
pub struct Encoder<W> {
    out: W,
    preamble: Option<String>,
    state: MachineState,
    flavor: Flavor,
    closed: bool,
}

impl<W> Encoder<W> {
    fn from_buffered(out: W, flavor: Flavor) -> Self {
        let mut state = MachineState::new();
        let reset = Instruction::from(SetPositionOffset::reset_extruder());
        let lines = [
            WATERMARK.to_owned(),
            format!("; Flavor: {flavor}"),
            reset.render(&state),
            SetMovementMode::absolute().code().to_owned(),
            SetMovementMode::relative_extruder().code().to_owned(),
        ];
        reset.apply(&mut state);

        let mut preamble = String::new();
        for line in lines {
            preamble.push_str(&line);
            preamble.push('\n');
        }
        Self {
            out,
            preamble: Some(preamble),
            state,
            flavor,
            closed: false,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// The state the next instruction will be rendered against.
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Renders then applies, giving the line to write if there is one.
    fn render_line(&mut self, instruction: &Instruction) -> Option<String> {
        let mut text = instruction.render(&self.state);
        instruction.apply(&mut self.state);
        if text.is_empty() {
            return None;
        }
        text.push('\n');
        Some(text)
    }
}

impl<W: io::Write> Encoder<io::BufWriter<W>> {
    pub fn new(sink: W) -> Self {
        Self::with_flavor(sink, Flavor::Marlin)
    }

    pub fn with_flavor(sink: W, flavor: Flavor) -> Self {
        Self::from_buffered(io::BufWriter::with_capacity(BUFFER_SIZE, sink), flavor)
    }

    pub fn for_flavor_name(sink: W, flavor: &str) -> Result<Self, InvalidGCode> {
        Ok(Self::with_flavor(sink, flavor.parse()?))
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    fn write_preamble(&mut self) -> io::Result<()> {
        if let Some(preamble) = self.preamble.take() {
            io::Write::write_all(&mut self.out, preamble.as_bytes())?;
            tracing::debug!(flavor = %self.flavor, "preamble written");
        }
        Ok(())
    }

    pub fn encode(&mut self, instruction: &Instruction) -> io::Result<()> {
        self.write_preamble()?;
        if let Some(line) = self.render_line(instruction) {
            io::Write::write_all(&mut self.out, line.as_bytes())?;
        }
        Ok(())
    }

    pub fn encode_all<I>(&mut self, instructions: I) -> io::Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<Instruction>,
    {
        for instruction in instructions {
            self.encode(instruction.borrow())?;
        }
        Ok(())
    }

    /// Encodes the output of a [`Decoder`](crate::Decoder), stopping at the first error.
    /// Everything encoded before the error is kept.
    pub fn encode_decoded<I>(&mut self, instructions: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Result<Instruction, Error>>,
    {
        for instruction in instructions {
            self.encode(&instruction?)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.write_preamble()?;
        let bytes = self.out.buffer().len();
        io::Write::flush(&mut self.out)?;
        tracing::debug!(bytes, "flushed");
        Ok(())
    }

    /// Flushes and hands the sink back.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush()?;
        self.out.into_inner().map_err(io::IntoInnerError::into_error)
    }
}

#[cfg(feature = "async")]
impl<W: AsyncWrite + Unpin> Encoder<futures::io::BufWriter<W>> {
    pub fn new_async(sink: W) -> Self {
        Self::with_flavor_async(sink, Flavor::Marlin)
    }

    pub fn with_flavor_async(sink: W, flavor: Flavor) -> Self {
        Self::from_buffered(
            futures::io::BufWriter::with_capacity(BUFFER_SIZE, sink),
            flavor,
        )
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    /// Gives the sink back. Whatever was not flushed is lost.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_preamble_async(&mut self) -> io::Result<()> {
        if let Some(preamble) = self.preamble.take() {
            self.out.write_all(preamble.as_bytes()).await?;
            tracing::debug!(flavor = %self.flavor, "preamble written");
        }
        Ok(())
    }

    pub async fn encode_async(&mut self, instruction: &Instruction) -> io::Result<()> {
        self.write_preamble_async().await?;
        if let Some(line) = self.render_line(instruction) {
            self.out.write_all(line.as_bytes()).await?;
        }
        Ok(())
    }

    pub async fn encode_all_async<I>(&mut self, instructions: I) -> io::Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<Instruction>,
    {
        for instruction in instructions {
            self.encode_async(instruction.borrow()).await?;
        }
        Ok(())
    }

    /// Suspending counterpart of [`Encoder::encode_decoded`].
    pub async fn encode_stream<S>(&mut self, instructions: S) -> Result<(), Error>
    where
        S: Stream<Item = Result<Instruction, Error>>,
    {
        futures::pin_mut!(instructions);
        while let Some(instruction) = instructions.next().await {
            self.encode_async(&instruction?).await?;
        }
        Ok(())
    }

    pub async fn flush_async(&mut self) -> io::Result<()> {
        self.write_preamble_async().await?;
        let bytes = self.out.buffer().len();
        self.out.flush().await?;
        tracing::debug!(bytes, "flushed");
        Ok(())
    }

    /// Flushes and closes the sink. The sink is closed once; later calls do nothing.
    pub async fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush_async().await?;
        self.out.close().await?;
        self.closed = true;
        tracing::debug!("sink closed");
        Ok(())
    }
}
