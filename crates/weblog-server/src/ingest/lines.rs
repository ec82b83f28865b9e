//! Bounded line splitting for source files
//!
//! Lines are split on `\n` and decoded with [`decode_line`]. A line longer than the
//! configured limit is never buffered whole: the reader returns [`Line::Oversized`]
//! and discards the remainder up to the next newline.

use std::borrow::Cow;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use weblog_common::parser::decode_line;

/// Longest line, terminator excluded, handed to the parser
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// One line read from a source file
#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Text(Cow<'a, str>),
    /// Longer than the limit; its content was dropped
    Oversized,
}

/// Line reader over any buffered async source
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    max_len: usize,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_len(inner, MAX_LINE_BYTES)
    }

    pub fn with_max_len(inner: R, max_len: usize) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            max_len,
        }
    }

    /// Next line, or `None` at end of input
    pub async fn next_line(&mut self) -> io::Result<Option<Line<'_>>> {
        self.buf.clear();

        // Room for the content plus its `\n`; a trailing `\r` counts as content
        let limit = self.max_len as u64 + 1;
        let read = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;

        if read == 0 {
            return Ok(None);
        }

        if read as u64 == limit && !self.buf.ends_with(b"\n") {
            self.skip_rest_of_line().await?;
            return Ok(Some(Line::Oversized));
        }

        Ok(Some(Line::Text(decode_line(&self.buf))))
    }

    async fn skip_rest_of_line(&mut self) -> io::Result<()> {
        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }

            match available.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.inner.consume(end + 1);
                    return Ok(());
                },
                None => {
                    let len = available.len();
                    self.inner.consume(len);
                },
            }
        }
    }
}
