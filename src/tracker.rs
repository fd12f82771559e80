//! Per-archive identity tables for shared, weak and cyclic references.

use std::any::Any;
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

/// Output-side table: identities whose bodies have already been emitted.
///
/// Each identity gets a full body exactly once per archive; later encounters
/// are short-circuited to an id-only record.
#[derive(Default)]
pub(crate) struct OutTracker {
    visited: HashSet<u64>,
}

impl OutTracker {
    /// Returns `true` on the first visit of `id`, marking it visited.
    pub(crate) fn first_visit(&mut self, id: u64) -> bool {
        self.visited.insert(id)
    }
}

/// What was reconstructed for one wire identity.
pub(crate) enum Slot {
    /// The identity belongs to an exclusively owned value; it can never be
    /// aliased, only guarded against duplicate bodies.
    Exclusive,
    /// The identity resolved to an owned shared handle
    /// (`Rc<RefCell<T>>` boxed as `Any`), alive until the archive drops.
    Shared(Box<dyn Any>),
}

/// Input-side table: wire identity to reconstructed handle.
///
/// The map keeps a strong handle for every shared identity so back
/// references decoded later in the stream can alias it, even when the
/// owning encounter was a lifted weak reference. Handles not adopted by the
/// decoded graph die with the archive, which is what lets a weak reference
/// to a never-shared instance expire to empty.
#[derive(Default)]
pub(crate) struct InTracker {
    slots: HashMap<u64, Slot>,
}

impl InTracker {
    /// Installs a handle for `id` before its body is read, so references
    /// inside the body (including cycles) can resolve to it.
    pub(crate) fn install(&mut self, id: u64, slot: Slot) -> Result<()> {
        if self.slots.contains_key(&id) {
            return Err(Error::identity(format!(
                "two bodies were encoded for identity {id}"
            )));
        }
        self.slots.insert(id, slot);
        Ok(())
    }

    pub(crate) fn get(&self, id: u64) -> Option<&Slot> {
        self.slots.get(&id)
    }

    /// Resolves `id` to a previously installed shared handle of type `H`.
    ///
    /// `Ok(None)` means the identity is unknown (the caller decides whether
    /// a body follows on the wire); an exclusive slot or a handle of a
    /// different static type is an identity error.
    pub(crate) fn lookup_shared<H: Clone + 'static>(&self, id: u64) -> Result<Option<H>> {
        match self.slots.get(&id) {
            None => Ok(None),
            Some(Slot::Exclusive) => Err(Error::identity(format!(
                "identity {id} is exclusively owned and cannot be shared"
            ))),
            Some(Slot::Shared(handle)) => {
                let handle = handle.downcast_ref::<H>().ok_or_else(|| {
                    Error::identity(format!(
                        "identity {id} was reconstructed as a different handle type than {}",
                        std::any::type_name::<H>()
                    ))
                })?;
                Ok(Some(handle.clone()))
            }
        }
    }
}
