use std::fmt;
use std::io;

/// Convenient alias for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can be produced while encoding or decoding an archive.
///
/// Every error is fatal to the archive operation that raised it; there are
/// no retries or partial-success semantics. Scopes opened by the driver are
/// still closed while the error propagates, so the codec state stays
/// consistent for diagnostics.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Wrapper around standard I/O errors from the underlying sink/source.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The byte stream ended early or carried an invalid preamble.
    #[error("framing error: {0}")]
    Framing(String),

    /// The codec state does not admit the requested primitive or scope.
    #[error("structural error: {0}")]
    Structural(String),

    /// A class tag or constructor was missing from the type registry.
    #[error("registry error: {0}")]
    Registry(String),

    /// An object identity was missing, duplicated, or bound to the wrong type.
    #[error("identity error: {0}")]
    Identity(String),

    /// A value was outside the domain the archive can represent.
    #[error("domain error: {0}")]
    Domain(String),
}

impl Error {
    pub(crate) fn framing<T: fmt::Display>(msg: T) -> Self {
        Self::Framing(msg.to_string())
    }

    pub(crate) fn structural<T: fmt::Display>(msg: T) -> Self {
        Self::Structural(msg.to_string())
    }

    pub(crate) fn registry<T: fmt::Display>(msg: T) -> Self {
        Self::Registry(msg.to_string())
    }

    pub(crate) fn identity<T: fmt::Display>(msg: T) -> Self {
        Self::Identity(msg.to_string())
    }

    pub(crate) fn domain<T: fmt::Display>(msg: T) -> Self {
        Self::Domain(msg.to_string())
    }
}
