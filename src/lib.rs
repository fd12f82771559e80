#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Archive drivers and the owning/non-owning handle types.
pub mod archive;
/// Fixed-width bit sequence value type.
pub mod bits;
/// Format back ends (text and binary) behind the codec interface.
pub mod codec;
/// Shared error and result types.
pub mod error;
mod macros;
/// Dispatch traits and the built-in value implementations.
pub mod persist;
/// Process-wide polymorphic class registry.
pub mod registry;
mod tracker;

pub use archive::handles::{Shared, Unique, WeakRef};
pub use archive::{Format, InArchive, InArchiveBuilder, OutArchive, OutArchiveBuilder};
pub use bits::Bits;
pub use error::{Error, Result};
pub use persist::{Fields, Persist, PolyPersist, SeqLen};

/// Discriminant conversion derives used with [`persist_enum!`].
pub use num_enum;

#[doc(hidden)]
pub mod poly {
    //! Driver halves of the trait-object handle implementations, referenced
    //! by [`persist_poly!`](crate::persist_poly) expansions.
    pub use crate::archive::handles::{
        load_shared_poly, load_unique_poly, load_weak_poly, save_shared_poly, save_unique_poly,
        save_weak_poly,
    };
}
