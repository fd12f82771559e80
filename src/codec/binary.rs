//! Binary back end writing host-order fixed-width primitives.
//!
//! Scope brackets and name hints produce no wire bytes. Strings and byte
//! spans are length-prefixed with a `u64`; bulk spans from the contiguous
//! fast path are raw. The stream opens with a two-byte magic and a format
//! version byte; nothing else frames the payload, so the format is intended
//! for same-architecture persistence only.

use std::io::{ErrorKind, Read, Write};

use crate::error::{Error, Result};

/// Stream preamble: magic bytes followed by [`FORMAT_VERSION`].
pub const MAGIC: [u8; 2] = *b"RC";
/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;

/// Streaming binary encoder.
pub struct BinaryEncoder<'a> {
    sink: Box<dyn Write + 'a>,
}

impl<'a> BinaryEncoder<'a> {
    /// Wraps the sink, emitting the stream preamble immediately.
    pub(crate) fn new(mut sink: Box<dyn Write + 'a>) -> Result<Self> {
        sink.write_all(&MAGIC)?;
        sink.write_all(&[FORMAT_VERSION])?;
        Ok(Self { sink })
    }

    pub(crate) fn emit_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write_all(bytes)?;
        Ok(())
    }

    pub(crate) fn emit_str(&mut self, value: &str) -> Result<()> {
        self.emit_raw(&(value.len() as u64).to_ne_bytes())?;
        self.emit_raw(value.as_bytes())
    }

    pub(crate) fn emit_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.emit_raw(&(bytes.len() as u64).to_ne_bytes())?;
        self.emit_raw(bytes)
    }

    pub(crate) fn emit_len(&mut self, len: u64) -> Result<()> {
        self.emit_raw(&len.to_ne_bytes())
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

/// Streaming binary decoder.
pub struct BinaryDecoder<'a> {
    source: Box<dyn Read + 'a>,
}

impl<'a> BinaryDecoder<'a> {
    /// Wraps the source, validating the stream preamble.
    pub(crate) fn new(source: Box<dyn Read + 'a>) -> Result<Self> {
        let mut decoder = Self { source };
        let preamble: [u8; 3] = decoder.read_array()?;
        if preamble[..2] != MAGIC {
            return Err(Error::framing(format!(
                "bad magic {:02x}{:02x}; not a binary archive",
                preamble[0], preamble[1]
            )));
        }
        if preamble[2] != FORMAT_VERSION {
            return Err(Error::framing(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                preamble[2]
            )));
        }
        Ok(decoder)
    }

    /// Reads exactly `buf.len()` bytes; a short read is a framing error.
    pub(crate) fn consume_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        self.source.read_exact(buf).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                Error::framing(format!("short read: {} byte(s) expected", buf.len()))
            } else {
                Error::Io(err)
            }
        })
    }

    /// Reads an exact number of bytes into a fixed-size array.
    #[inline]
    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.consume_raw(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn consume_len(&mut self) -> Result<u64> {
        Ok(u64::from_ne_bytes(self.read_array()?))
    }

    pub(crate) fn consume_str(&mut self) -> Result<String> {
        let bytes = self.consume_bytes()?;
        String::from_utf8(bytes)
            .map_err(|err| Error::framing(format!("string is not valid utf-8: {err}")))
    }

    pub(crate) fn consume_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.consume_len()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::framing(format!("byte span length {len} exceeds address space")))?;
        let mut buf = vec![0u8; len];
        self.consume_raw(&mut buf)?;
        Ok(buf)
    }
}
