use core::pin::Pin;
use core::task::{Context, Poll};
use std::io;

use futures::io::AsyncBufRead;
use futures::{ready, Stream};

use crate::{Decoder, Error, Instruction};

/// Appends bytes up to and including the next `\n` to `buf`.
///
/// Resolves once a line is complete or the source is exhausted. Whatever was read before a
/// `Pending` stays in `buf`, so polling again resumes the same line.
fn poll_read_line<R: AsyncBufRead + ?Sized>(
    mut reader: Pin<&mut R>,
    cx: &mut Context<'_>,
    buf: &mut Vec<u8>,
) -> Poll<io::Result<()>> {
    loop {
        let (done, used) = {
            let available = ready!(reader.as_mut().poll_fill_buf(cx))?;
            match available.iter().position(|b| *b == b'\n') {
                Some(i) => {
                    buf.extend_from_slice(&available[..=i]);
                    (true, i + 1)
                }
                None => {
                    buf.extend_from_slice(available);
                    (available.is_empty(), available.len())
                }
            }
        };
        reader.as_mut().consume(used);
        if done {
            return Poll::Ready(Ok(()));
        }
    }
}

impl<R: AsyncBufRead> Stream for Decoder<R> {
    type Item = Result<Instruction, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }
        if let Err(e) = ready!(poll_read_line(this.source, cx, this.buffer)) {
            return Poll::Ready(Some(Err(e.into())));
        }
        Poll::Ready(Decoder::<R>::take_line(
            this.buffer,
            this.lines,
            this.finished,
        ))
    }
}

impl<R: AsyncBufRead + Unpin> Decoder<R> {
    /// Suspending counterpart of [`Decoder::read_instruction`].
    pub async fn read_instruction_async(&mut self) -> Result<Option<Instruction>, Error> {
        futures::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx))
            .await
            .transpose()
    }
}
