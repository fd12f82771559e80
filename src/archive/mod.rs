//! Archive drivers owning one encode or decode operation end to end.
//!
//! An archive owns its codec, name pipeline and reference tracker. Values
//! enter through [`OutArchive::put`] / [`InArchive::take`] as named-value
//! pairs and recurse through their [`Persist`] implementations; the scope
//! helpers [`OutArchive::record`] and [`OutArchive::seq`] (and their input
//! twins) guarantee that every opened bracket is closed on success and
//! failure alike.

pub mod handles;

use std::io::{Read, Write};

use crate::codec::{BinaryDecoder, BinaryEncoder, Decoder, Encoder, TextDecoder, TextEncoder};
use crate::error::{Error, Result};
use crate::persist::Persist;
use crate::tracker::{InTracker, OutTracker};

/// Encoding selected for an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Self-describing JSON text.
    Text,
    /// Compact host-order binary.
    Binary,
}

/// Builder configuring an [`OutArchive`].
pub struct OutArchiveBuilder<'a> {
    sink: Box<dyn Write + 'a>,
    format: Format,
    indent: Option<usize>,
}

impl<'a> OutArchiveBuilder<'a> {
    /// Starts a builder over the given byte sink; the default format is
    /// compact text.
    pub fn new(sink: impl Write + 'a) -> Self {
        Self {
            sink: Box::new(sink),
            format: Format::Text,
            indent: None,
        }
    }

    /// Selects the output format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Selects the text format.
    pub fn text(self) -> Self {
        self.format(Format::Text)
    }

    /// Selects the binary format.
    pub fn binary(self) -> Self {
        self.format(Format::Binary)
    }

    /// Pretty-prints text output with `width` spaces per nesting level.
    pub fn indent(mut self, width: usize) -> Self {
        self.indent = Some(width);
        self
    }

    /// Builds the archive, validating the option combination.
    pub fn build(self) -> Result<OutArchive<'a>> {
        let encoder = match self.format {
            Format::Text => Encoder::Text(TextEncoder::new(self.sink, self.indent)),
            Format::Binary => {
                if self.indent.is_some() {
                    return Err(Error::structural(
                        "indentation applies to the text format only",
                    ));
                }
                Encoder::Binary(BinaryEncoder::new(self.sink)?)
            }
        };
        Ok(OutArchive {
            encoder,
            tracker: OutTracker::default(),
        })
    }
}

/// The stateful driver for one encode operation.
pub struct OutArchive<'a> {
    encoder: Encoder<'a>,
    tracker: OutTracker,
}

impl<'a> std::fmt::Debug for OutArchive<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutArchive").finish_non_exhaustive()
    }
}

impl<'a> OutArchive<'a> {
    /// Creates a compact text archive over the sink.
    pub fn text(sink: impl Write + 'a) -> Self {
        Self {
            encoder: Encoder::Text(TextEncoder::new(Box::new(sink), None)),
            tracker: OutTracker::default(),
        }
    }

    /// Creates a binary archive over the sink, emitting the stream
    /// preamble immediately.
    pub fn binary(sink: impl Write + 'a) -> Result<Self> {
        Ok(Self {
            encoder: Encoder::Binary(BinaryEncoder::new(Box::new(sink))?),
            tracker: OutTracker::default(),
        })
    }

    /// Starts building an archive with explicit options.
    pub fn builder(sink: impl Write + 'a) -> OutArchiveBuilder<'a> {
        OutArchiveBuilder::new(sink)
    }

    /// `false`: this archive writes.
    pub fn is_input(&self) -> bool {
        false
    }

    /// Whether the selected codec is the binary one.
    pub fn is_binary(&self) -> bool {
        self.encoder.is_binary()
    }

    /// Submits one named value. An empty name asks the codec to synthesize
    /// a `valueN` key when the value lands in an object scope.
    pub fn put<T: Persist>(&mut self, name: &str, value: &T) -> Result<()> {
        self.encoder.set_next_name(name);
        value.save(self)
    }

    /// Opens an object scope around `body`; the close runs even when the
    /// body fails.
    pub fn record<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.encoder.open_object()?;
        let result = body(self);
        let closed = self.encoder.close_object();
        result.and(closed)
    }

    /// Opens an array scope around `body`; the close runs even when the
    /// body fails.
    pub fn seq<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.encoder.open_array()?;
        let result = body(self);
        let closed = self.encoder.close_array();
        result.and(closed)
    }

    /// Emits a sequence length ahead of its body.
    pub fn put_len(&mut self, len: u64) -> Result<()> {
        self.encoder.emit_len(len)
    }

    /// Emits an unframed byte span (the contiguous arithmetic fast path);
    /// binary codec only.
    pub fn put_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.encoder.emit_raw(bytes)
    }

    /// Pushes a bare name hint without submitting a value.
    pub(crate) fn hint(&mut self, name: &str) {
        self.encoder.set_next_name(name);
    }

    pub(crate) fn encoder(&mut self) -> &mut Encoder<'a> {
        &mut self.encoder
    }

    pub(crate) fn tracker(&mut self) -> &mut OutTracker {
        &mut self.tracker
    }

    /// Commits buffered output to the sink. For the text codec this renders
    /// the accumulated tree (once).
    pub fn flush(&mut self) -> Result<()> {
        self.encoder.flush()
    }

    /// Flushes and consumes the archive.
    pub fn finish(mut self) -> Result<()> {
        self.flush()?;
        tracing::trace!("output archive finished");
        Ok(())
    }
}

/// Builder configuring an [`InArchive`].
pub struct InArchiveBuilder<'a> {
    source: Box<dyn Read + 'a>,
    format: Format,
}

impl<'a> InArchiveBuilder<'a> {
    /// Starts a builder over the given byte source; the default format is
    /// text.
    pub fn new(source: impl Read + 'a) -> Self {
        Self {
            source: Box::new(source),
            format: Format::Text,
        }
    }

    /// Selects the input format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Selects the text format.
    pub fn text(self) -> Self {
        self.format(Format::Text)
    }

    /// Selects the binary format.
    pub fn binary(self) -> Self {
        self.format(Format::Binary)
    }

    /// Builds the archive. The text codec parses the whole tree here; the
    /// binary codec validates the stream preamble.
    pub fn build(self) -> Result<InArchive<'a>> {
        let decoder = match self.format {
            Format::Text => Decoder::Text(TextDecoder::new(self.source)?),
            Format::Binary => Decoder::Binary(BinaryDecoder::new(self.source)?),
        };
        Ok(InArchive {
            decoder,
            tracker: InTracker::default(),
        })
    }
}

/// The stateful driver for one decode operation.
///
/// The archive keeps a strong handle to every shared instance it
/// reconstructs; dropping the archive releases the ones the decoded graph
/// did not adopt.
pub struct InArchive<'a> {
    decoder: Decoder<'a>,
    tracker: InTracker,
}

impl<'a> std::fmt::Debug for InArchive<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InArchive").finish_non_exhaustive()
    }
}

impl<'a> InArchive<'a> {
    /// Creates a text archive, parsing the whole tree from the source up
    /// front.
    pub fn text(source: impl Read) -> Result<Self> {
        Ok(Self {
            decoder: Decoder::Text(TextDecoder::new(source)?),
            tracker: InTracker::default(),
        })
    }

    /// Creates a binary archive, validating the stream preamble.
    pub fn binary(source: impl Read + 'a) -> Result<Self> {
        Ok(Self {
            decoder: Decoder::Binary(BinaryDecoder::new(Box::new(source))?),
            tracker: InTracker::default(),
        })
    }

    /// Starts building an archive with explicit options.
    pub fn builder(source: impl Read + 'a) -> InArchiveBuilder<'a> {
        InArchiveBuilder::new(source)
    }

    /// `true`: this archive reads.
    pub fn is_input(&self) -> bool {
        true
    }

    /// Whether the selected codec is the binary one.
    pub fn is_binary(&self) -> bool {
        self.decoder.is_binary()
    }

    /// Consumes one named value into `value`.
    pub fn take<T: Persist>(&mut self, name: &str, value: &mut T) -> Result<()> {
        self.decoder.set_next_name(name);
        value.load(self)
    }

    /// Opens an object scope around `body`; the close runs even when the
    /// body fails.
    pub fn record<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.decoder.open_object()?;
        let result = body(self);
        let closed = self.decoder.close_object();
        result.and(closed)
    }

    /// Opens an array scope around `body`; the close runs even when the
    /// body fails.
    pub fn seq<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.decoder.open_array()?;
        let result = body(self);
        let closed = self.decoder.close_array();
        result.and(closed)
    }

    /// Consumes the sequence length preceding a body: a raw `u64` in
    /// binary, the cardinality of the entered array scope in text.
    pub fn take_len(&mut self) -> Result<u64> {
        self.decoder.consume_len()
    }

    /// Fills `buf` from an unframed byte span (the contiguous arithmetic
    /// fast path); binary codec only.
    pub fn take_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        self.decoder.consume_raw(buf)
    }

    /// Pushes a bare name hint without consuming a value.
    pub(crate) fn hint(&mut self, name: &str) {
        self.decoder.set_next_name(name);
    }

    pub(crate) fn decoder(&mut self) -> &mut Decoder<'a> {
        &mut self.decoder
    }

    pub(crate) fn tracker(&mut self) -> &mut InTracker {
        &mut self.tracker
    }
}
