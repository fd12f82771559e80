//! Option/Result discriminated wrappers, tuples, paths, byte buffers and
//! complex numbers.

use std::path::PathBuf;

use crate::archive::{InArchive, OutArchive};
use crate::error::{Error, Result};
use crate::persist::Persist;

/// A present/absent discriminator followed by the payload when present.
impl<T: Persist + Default> Persist for Option<T> {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            ar.put("has_value", &self.is_some())?;
            if let Some(value) = self {
                ar.put("value", value)?;
            }
            Ok(())
        })
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            let mut has_value = false;
            ar.take("has_value", &mut has_value)?;
            *self = if has_value {
                let mut value = T::default();
                ar.take("value", &mut value)?;
                Some(value)
            } else {
                None
            };
            Ok(())
        })
    }
}

/// Same discriminator shape as `Option`, with the error branch stored under
/// `error`.
impl<T, E> Persist for Result<T, E>
where
    T: Persist + Default,
    E: Persist + Default,
{
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            ar.put("has_value", &self.is_ok())?;
            match self {
                Ok(value) => ar.put("value", value),
                Err(error) => ar.put("error", error),
            }
        })
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            let mut has_value = false;
            ar.take("has_value", &mut has_value)?;
            *self = if has_value {
                let mut value = T::default();
                ar.take("value", &mut value)?;
                Ok(value)
            } else {
                let mut error = E::default();
                ar.take("error", &mut error)?;
                Err(error)
            };
            Ok(())
        })
    }
}

macro_rules! tuple_persist {
    ($( ( $($idx:tt $name:ident),+ ) ),+ $(,)?) => {
        $(
            /// Tuple elements travel under their ordinal names.
            impl<$($name: Persist),+> Persist for ($($name,)+) {
                fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
                    ar.record(|ar| {
                        $( ar.put(stringify!($idx), &self.$idx)?; )+
                        Ok(())
                    })
                }

                fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
                    ar.record(|ar| {
                        $( ar.take(stringify!($idx), &mut self.$idx)?; )+
                        Ok(())
                    })
                }
            }
        )+
    };
}

tuple_persist! {
    (0 A),
    (0 A, 1 B),
    (0 A, 1 B, 2 C),
    (0 A, 1 B, 2 C, 3 D),
    (0 A, 1 B, 2 C, 3 D, 4 E),
    (0 A, 1 B, 2 C, 3 D, 4 E, 5 F),
}

/// Paths travel in their Unicode string form; a path that cannot be
/// represented as Unicode has no stable encoding and is rejected.
impl Persist for PathBuf {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        let text = self
            .to_str()
            .ok_or_else(|| Error::domain(format!("path {self:?} is not valid unicode")))?;
        ar.encoder().emit_str(text)
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        *self = PathBuf::from(ar.decoder().consume_str()?);
        Ok(())
    }
}

/// Self-framed byte span: `u64` length plus raw bytes in binary, a base64
/// string leaf in text.
#[cfg(feature = "bytes")]
impl Persist for bytes::Bytes {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.encoder().emit_bytes(self)
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        *self = bytes::Bytes::from(ar.decoder().consume_bytes()?);
        Ok(())
    }
}

#[cfg(feature = "complex")]
impl<T: Persist> Persist for num_complex::Complex<T> {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            ar.put("real", &self.re)?;
            ar.put("imag", &self.im)
        })
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            ar.take("real", &mut self.re)?;
            ar.take("imag", &mut self.im)
        })
    }
}
