//! Format back ends and the narrow interface the archive driver uses.
//!
//! A codec emits and consumes primitives, byte spans, sequence lengths and
//! structural brackets. The two back ends differ in verbosity and framing:
//! the [`text`] codec builds a JSON tree with named object scopes, the
//! [`binary`] codec writes raw host-order bytes and gives scopes no wire
//! representation at all.

pub mod binary;
mod names;
pub mod text;

use crate::error::{Error, Result};

pub use binary::{BinaryDecoder, BinaryEncoder, FORMAT_VERSION, MAGIC};
pub use text::{TextDecoder, TextEncoder};

/// Output back end selected for an archive.
pub enum Encoder<'a> {
    /// JSON tree builder.
    Text(TextEncoder<'a>),
    /// Host-order binary writer.
    Binary(BinaryEncoder<'a>),
}

/// Input back end selected for an archive.
pub enum Decoder<'a> {
    /// JSON tree consumer.
    Text(TextDecoder),
    /// Host-order binary reader.
    Binary(BinaryDecoder<'a>),
}

impl Encoder<'_> {
    /// Capability query used by the driver to choose the contiguous
    /// arithmetic fast path.
    pub(crate) fn is_binary(&self) -> bool {
        matches!(self, Encoder::Binary(_))
    }

    /// Pushes a name hint for the next submission in the current object
    /// scope. Hints never reach the wire in binary mode.
    pub(crate) fn set_next_name(&mut self, name: &str) {
        if let Encoder::Text(enc) = self {
            enc.set_next_name(name);
        }
    }

    pub(crate) fn open_object(&mut self) -> Result<()> {
        if let Encoder::Text(enc) = self {
            enc.open_object();
        }
        Ok(())
    }

    pub(crate) fn close_object(&mut self) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.close_scope(),
            Encoder::Binary(_) => Ok(()),
        }
    }

    pub(crate) fn open_array(&mut self) -> Result<()> {
        if let Encoder::Text(enc) = self {
            enc.open_array();
        }
        Ok(())
    }

    pub(crate) fn close_array(&mut self) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.close_scope(),
            Encoder::Binary(_) => Ok(()),
        }
    }

    pub(crate) fn emit_bool(&mut self, value: bool) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.emit_bool(value),
            Encoder::Binary(enc) => enc.emit_raw(&[value as u8]),
        }
    }

    pub(crate) fn emit_char(&mut self, value: char) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.emit_unsigned(value as u64),
            Encoder::Binary(enc) => enc.emit_raw(&(value as u32).to_ne_bytes()),
        }
    }

    pub(crate) fn emit_f32(&mut self, value: f32) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.emit_float(value as f64),
            Encoder::Binary(enc) => enc.emit_raw(&value.to_ne_bytes()),
        }
    }

    pub(crate) fn emit_f64(&mut self, value: f64) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.emit_float(value),
            Encoder::Binary(enc) => enc.emit_raw(&value.to_ne_bytes()),
        }
    }

    pub(crate) fn emit_str(&mut self, value: &str) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.emit_str(value),
            Encoder::Binary(enc) => enc.emit_str(value),
        }
    }

    /// Self-framed byte span: base64 leaf in text, `u64` length plus raw
    /// bytes in binary.
    pub(crate) fn emit_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.emit_bytes(bytes),
            Encoder::Binary(enc) => enc.emit_bytes(bytes),
        }
    }

    /// Unframed span used by the contiguous arithmetic fast path; the
    /// element count travels separately as a sequence length.
    pub(crate) fn emit_raw(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Encoder::Text(_) => Err(Error::structural(
                "bulk byte spans are not representable in the text codec",
            )),
            Encoder::Binary(enc) => enc.emit_raw(bytes),
        }
    }

    pub(crate) fn emit_len(&mut self, len: u64) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.emit_len(len),
            Encoder::Binary(enc) => enc.emit_len(len),
        }
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        match self {
            Encoder::Text(enc) => enc.flush(),
            Encoder::Binary(enc) => enc.flush(),
        }
    }
}

impl Decoder<'_> {
    pub(crate) fn is_binary(&self) -> bool {
        matches!(self, Decoder::Binary(_))
    }

    pub(crate) fn set_next_name(&mut self, name: &str) {
        if let Decoder::Text(dec) = self {
            dec.set_next_name(name);
        }
    }

    pub(crate) fn open_object(&mut self) -> Result<()> {
        match self {
            Decoder::Text(dec) => dec.open_object(),
            Decoder::Binary(_) => Ok(()),
        }
    }

    pub(crate) fn close_object(&mut self) -> Result<()> {
        match self {
            Decoder::Text(dec) => dec.close_scope(),
            Decoder::Binary(_) => Ok(()),
        }
    }

    pub(crate) fn open_array(&mut self) -> Result<()> {
        match self {
            Decoder::Text(dec) => dec.open_array(),
            Decoder::Binary(_) => Ok(()),
        }
    }

    pub(crate) fn close_array(&mut self) -> Result<()> {
        match self {
            Decoder::Text(dec) => dec.close_scope(),
            Decoder::Binary(_) => Ok(()),
        }
    }

    pub(crate) fn consume_bool(&mut self) -> Result<bool> {
        match self {
            Decoder::Text(dec) => dec.consume_bool(),
            Decoder::Binary(dec) => match dec.read_array::<1>()?[0] {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(Error::structural(format!(
                    "boolean byte must be 0 or 1, found {other}"
                ))),
            },
        }
    }

    pub(crate) fn consume_char(&mut self) -> Result<char> {
        let raw = match self {
            Decoder::Text(dec) => u32::try_from(dec.consume_unsigned()?)
                .map_err(|_| Error::structural("number out of range for char"))?,
            Decoder::Binary(dec) => u32::from_ne_bytes(dec.read_array()?),
        };
        char::from_u32(raw)
            .ok_or_else(|| Error::domain(format!("{raw:#x} is not a unicode scalar value")))
    }

    pub(crate) fn consume_f32(&mut self) -> Result<f32> {
        match self {
            Decoder::Text(dec) => Ok(dec.consume_float()? as f32),
            Decoder::Binary(dec) => Ok(f32::from_ne_bytes(dec.read_array()?)),
        }
    }

    pub(crate) fn consume_f64(&mut self) -> Result<f64> {
        match self {
            Decoder::Text(dec) => dec.consume_float(),
            Decoder::Binary(dec) => Ok(f64::from_ne_bytes(dec.read_array()?)),
        }
    }

    pub(crate) fn consume_str(&mut self) -> Result<String> {
        match self {
            Decoder::Text(dec) => dec.consume_str(),
            Decoder::Binary(dec) => dec.consume_str(),
        }
    }

    pub(crate) fn consume_bytes(&mut self) -> Result<Vec<u8>> {
        match self {
            Decoder::Text(dec) => dec.consume_bytes(),
            Decoder::Binary(dec) => dec.consume_bytes(),
        }
    }

    pub(crate) fn consume_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        match self {
            Decoder::Text(_) => Err(Error::structural(
                "bulk byte spans are not representable in the text codec",
            )),
            Decoder::Binary(dec) => dec.consume_raw(buf),
        }
    }

    pub(crate) fn consume_len(&mut self) -> Result<u64> {
        match self {
            Decoder::Text(dec) => dec.consume_len(),
            Decoder::Binary(dec) => dec.consume_len(),
        }
    }
}

macro_rules! unsigned_codec {
    ($($emit:ident / $consume:ident => $ty:ty),+ $(,)?) => {
        impl Encoder<'_> {
            $(
                pub(crate) fn $emit(&mut self, value: $ty) -> Result<()> {
                    match self {
                        Encoder::Text(enc) => enc.emit_unsigned(value as u64),
                        Encoder::Binary(enc) => enc.emit_raw(&value.to_ne_bytes()),
                    }
                }
            )+
        }

        impl Decoder<'_> {
            $(
                pub(crate) fn $consume(&mut self) -> Result<$ty> {
                    match self {
                        Decoder::Text(dec) => {
                            let value = dec.consume_unsigned()?;
                            <$ty>::try_from(value).map_err(|_| {
                                Error::structural(concat!(
                                    "number out of range for ",
                                    stringify!($ty)
                                ))
                            })
                        }
                        Decoder::Binary(dec) => Ok(<$ty>::from_ne_bytes(dec.read_array()?)),
                    }
                }
            )+
        }
    };
}

macro_rules! signed_codec {
    ($($emit:ident / $consume:ident => $ty:ty),+ $(,)?) => {
        impl Encoder<'_> {
            $(
                pub(crate) fn $emit(&mut self, value: $ty) -> Result<()> {
                    match self {
                        Encoder::Text(enc) => enc.emit_signed(value as i64),
                        Encoder::Binary(enc) => enc.emit_raw(&value.to_ne_bytes()),
                    }
                }
            )+
        }

        impl Decoder<'_> {
            $(
                pub(crate) fn $consume(&mut self) -> Result<$ty> {
                    match self {
                        Decoder::Text(dec) => {
                            let value = dec.consume_signed()?;
                            <$ty>::try_from(value).map_err(|_| {
                                Error::structural(concat!(
                                    "number out of range for ",
                                    stringify!($ty)
                                ))
                            })
                        }
                        Decoder::Binary(dec) => Ok(<$ty>::from_ne_bytes(dec.read_array()?)),
                    }
                }
            )+
        }
    };
}

unsigned_codec! {
    emit_u8 / consume_u8 => u8,
    emit_u16 / consume_u16 => u16,
    emit_u32 / consume_u32 => u32,
    emit_u64 / consume_u64 => u64,
    emit_usize / consume_usize => usize,
}

signed_codec! {
    emit_i8 / consume_i8 => i8,
    emit_i16 / consume_i16 => i16,
    emit_i32 / consume_i32 => i32,
    emit_i64 / consume_i64 => i64,
    emit_isize / consume_isize => isize,
}
