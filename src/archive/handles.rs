//! Owning and non-owning handles with identity-preserving traversal.
//!
//! Three handle flavors are recognized, mirroring the three ownership
//! shapes a graph node can have:
//!
//! * [`Unique`]: exclusively owned; encoded as its pointee, never tracked
//!   for sharing (a second owning path cannot exist).
//! * [`Shared`]: jointly owned; the first encounter emits the body, later
//!   encounters emit only the identity, and decoding aliases every
//!   encounter to one reconstructed instance.
//! * [`WeakRef`]: non-owning back reference; encoding lifts it to its
//!   shared form (an expired referent encodes as identity 0), decoding
//!   aliases the installed instance.
//!
//! All three wire shapes are an object scope holding `id`, then on a first
//! encounter an optional `type_name` (polymorphic pointees only) and the
//! body under `data`. Identities are pointee addresses: injective among
//! live objects for the duration of one archive, which is all the format
//! requires. Cycles resolve because a handle is installed in the tracker
//! before its body is read.
//!
//! A pointee is *polymorphic* when it is a trait object; the trait must
//! have [`PolyPersist`] as a supertrait and concrete classes must be
//! registered. The [`persist_poly!`] macro derives the handle
//! implementations for `dyn Trait` pointees.
//!
//! [`persist_poly!`]: crate::persist_poly

use std::any::TypeId;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::archive::{InArchive, OutArchive};
use crate::error::{Error, Result};
use crate::persist::{Persist, PolyPersist};
use crate::registry;
use crate::tracker::Slot;

fn identity_of<T: ?Sized>(ptr: *const T) -> u64 {
    ptr as *const u8 as usize as u64
}

/// Shared-owning handle: the pointee lives as long as its longest-lived
/// holder.
pub struct Shared<T: ?Sized> {
    inner: Option<Rc<RefCell<T>>>,
}

impl<T> Shared<T> {
    /// Allocates a new shared pointee.
    pub fn new(value: T) -> Self {
        Self {
            inner: Some(Rc::new(RefCell::new(value))),
        }
    }
}

impl<T: ?Sized> Shared<T> {
    /// A handle owning nothing; encodes as identity 0.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Wraps an existing reference-counted cell.
    pub fn from_rc(rc: Rc<RefCell<T>>) -> Self {
        Self { inner: Some(rc) }
    }

    /// Whether the handle owns nothing.
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// The underlying cell, when the handle owns one.
    pub fn rc(&self) -> Option<&Rc<RefCell<T>>> {
        self.inner.as_ref()
    }

    /// Immutably borrows the pointee.
    ///
    /// # Panics
    ///
    /// Panics when the handle is empty or the pointee is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner
            .as_ref()
            .expect("borrow on an empty Shared handle")
            .borrow()
    }

    /// Mutably borrows the pointee.
    ///
    /// # Panics
    ///
    /// Panics when the handle is empty or the pointee is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.inner
            .as_ref()
            .expect("borrow_mut on an empty Shared handle")
            .borrow_mut()
    }

    /// Creates a non-owning reference to the same pointee.
    pub fn downgrade(&self) -> WeakRef<T> {
        WeakRef {
            inner: self.inner.as_ref().map(Rc::downgrade),
        }
    }

    /// Whether both handles alias the same pointee (two empty handles do
    /// not).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized> Default for Shared<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Non-owning back reference to a [`Shared`] pointee.
pub struct WeakRef<T: ?Sized> {
    inner: Option<Weak<RefCell<T>>>,
}

impl<T: ?Sized> WeakRef<T> {
    /// A reference to nothing.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Recovers an owning handle while the pointee is still alive;
    /// otherwise an empty one.
    pub fn upgrade(&self) -> Shared<T> {
        Shared {
            inner: self.inner.as_ref().and_then(Weak::upgrade),
        }
    }

    /// Whether the referent is gone (or was never set).
    pub fn is_expired(&self) -> bool {
        self.upgrade().is_empty()
    }
}

impl<T: ?Sized> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized> Default for WeakRef<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Exclusive-owning handle.
pub struct Unique<T: ?Sized> {
    inner: Option<Box<T>>,
}

impl<T> Unique<T> {
    /// Allocates a new exclusively owned pointee.
    pub fn new(value: T) -> Self {
        Self {
            inner: Some(Box::new(value)),
        }
    }
}

impl<T: ?Sized> Unique<T> {
    /// A handle owning nothing; encodes as identity 0.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Wraps an existing box.
    pub fn from_box(value: Box<T>) -> Self {
        Self { inner: Some(value) }
    }

    /// Whether the handle owns nothing.
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// The pointee, when the handle owns one.
    pub fn get(&self) -> Option<&T> {
        self.inner.as_deref()
    }

    /// Mutable access to the pointee, when the handle owns one.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.inner.as_deref_mut()
    }
}

impl<T: ?Sized> Default for Unique<T> {
    fn default() -> Self {
        Self::empty()
    }
}

// --- concrete (non-polymorphic) pointees ---------------------------------

fn save_owned<T: Persist + 'static>(
    ar: &mut OutArchive<'_>,
    target: Option<&Rc<RefCell<T>>>,
) -> Result<()> {
    ar.record(|ar| {
        let id = target.map_or(0, |rc| identity_of(Rc::as_ptr(rc)));
        ar.put("id", &id)?;
        let Some(rc) = target else { return Ok(()) };
        if !ar.tracker().first_visit(id) {
            return Ok(());
        }
        ar.put("data", &*rc.borrow())
    })
}

fn load_owned<T: Persist + Default + 'static>(
    ar: &mut InArchive<'_>,
) -> Result<Option<Rc<RefCell<T>>>> {
    let mut resolved = None;
    ar.record(|ar| {
        let mut id = 0u64;
        ar.take("id", &mut id)?;
        if id == 0 {
            return Ok(());
        }
        if let Some(existing) = ar.tracker().lookup_shared::<Rc<RefCell<T>>>(id)? {
            resolved = Some(existing);
            return Ok(());
        }
        let rc = Rc::new(RefCell::new(T::default()));
        ar.tracker().install(id, Slot::Shared(Box::new(rc.clone())))?;
        ar.take("data", &mut *rc.borrow_mut())?;
        resolved = Some(rc);
        Ok(())
    })?;
    Ok(resolved)
}

impl<T: Persist + Default + 'static> Persist for Shared<T> {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        save_owned(ar, self.inner.as_ref())
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        self.inner = load_owned::<T>(ar)?;
        Ok(())
    }
}

impl<T: Persist + Default + 'static> Persist for WeakRef<T> {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        let strong = self.inner.as_ref().and_then(Weak::upgrade);
        save_owned(ar, strong.as_ref())
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        self.inner = load_owned::<T>(ar)?.map(|rc| Rc::downgrade(&rc));
        Ok(())
    }
}

impl<T: Persist + Default + 'static> Persist for Unique<T> {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            let id = self.inner.as_deref().map_or(0, |v| identity_of(v as *const T));
            ar.put("id", &id)?;
            match self.inner.as_deref() {
                None => Ok(()),
                Some(value) => ar.put("data", value),
            }
        })
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            let mut id = 0u64;
            ar.take("id", &mut id)?;
            if id == 0 {
                self.inner = None;
                return Ok(());
            }
            ar.tracker().install(id, Slot::Exclusive)?;
            let mut value = Box::new(T::default());
            ar.take("data", &mut *value)?;
            self.inner = Some(value);
            Ok(())
        })
    }
}

// --- trait-object pointees -----------------------------------------------

fn save_owned_poly<B: PolyPersist + ?Sized + 'static>(
    ar: &mut OutArchive<'_>,
    target: Option<&Rc<RefCell<B>>>,
) -> Result<()> {
    ar.record(|ar| {
        let id = target.map_or(0, |rc| identity_of(Rc::as_ptr(rc)));
        ar.put("id", &id)?;
        let Some(rc) = target else { return Ok(()) };
        if !ar.tracker().first_visit(id) {
            return Ok(());
        }
        let guard = rc.borrow();
        let tag = registry::tag_for(guard.as_any().type_id(), guard.type_label())?;
        ar.put("type_name", &tag)?;
        let entry = registry::entry(&tag)?;
        ar.hint("data");
        (entry.save)(guard.as_any(), ar)
    })
}

fn load_owned_poly<B: PolyPersist + ?Sized + 'static>(
    ar: &mut InArchive<'_>,
) -> Result<Option<Rc<RefCell<B>>>> {
    let mut resolved = None;
    ar.record(|ar| {
        let mut id = 0u64;
        ar.take("id", &mut id)?;
        if id == 0 {
            return Ok(());
        }
        if let Some(existing) = ar.tracker().lookup_shared::<Rc<RefCell<B>>>(id)? {
            resolved = Some(existing);
            return Ok(());
        }
        let mut tag = String::new();
        ar.take("type_name", &mut tag)?;
        let entry = registry::entry(&tag)?;
        let factories = entry.base_factories(TypeId::of::<B>(), std::any::type_name::<B>())?;
        let rc = *(factories.shared)()
            .downcast::<Rc<RefCell<B>>>()
            .map_err(|_| {
                Error::registry(format!(
                    "factory for `{tag}` produced an unexpected handle type"
                ))
            })?;
        ar.tracker().install(id, Slot::Shared(Box::new(rc.clone())))?;
        ar.hint("data");
        {
            let mut guard = rc.borrow_mut();
            (entry.load)(guard.as_any_mut(), ar)?;
        }
        resolved = Some(rc);
        Ok(())
    })?;
    Ok(resolved)
}

/// Driver half of `Shared<dyn Base>` output; called from [`persist_poly!`]
/// expansions.
///
/// [`persist_poly!`]: crate::persist_poly
pub fn save_shared_poly<B: PolyPersist + ?Sized + 'static>(
    handle: &Shared<B>,
    ar: &mut OutArchive<'_>,
) -> Result<()> {
    save_owned_poly(ar, handle.inner.as_ref())
}

/// Driver half of `Shared<dyn Base>` input.
pub fn load_shared_poly<B: PolyPersist + ?Sized + 'static>(
    handle: &mut Shared<B>,
    ar: &mut InArchive<'_>,
) -> Result<()> {
    handle.inner = load_owned_poly::<B>(ar)?;
    Ok(())
}

/// Driver half of `WeakRef<dyn Base>` output: the reference is lifted to
/// its shared form first, so a live referent not yet emitted gets its body
/// here.
pub fn save_weak_poly<B: PolyPersist + ?Sized + 'static>(
    handle: &WeakRef<B>,
    ar: &mut OutArchive<'_>,
) -> Result<()> {
    let strong = handle.inner.as_ref().and_then(Weak::upgrade);
    save_owned_poly(ar, strong.as_ref())
}

/// Driver half of `WeakRef<dyn Base>` input.
pub fn load_weak_poly<B: PolyPersist + ?Sized + 'static>(
    handle: &mut WeakRef<B>,
    ar: &mut InArchive<'_>,
) -> Result<()> {
    handle.inner = load_owned_poly::<B>(ar)?.map(|rc| Rc::downgrade(&rc));
    Ok(())
}

/// Driver half of `Unique<dyn Base>` output.
pub fn save_unique_poly<B: PolyPersist + ?Sized + 'static>(
    handle: &Unique<B>,
    ar: &mut OutArchive<'_>,
) -> Result<()> {
    ar.record(|ar| {
        let id = handle
            .inner
            .as_deref()
            .map_or(0, |v| identity_of(v as *const B));
        ar.put("id", &id)?;
        let Some(value) = handle.inner.as_deref() else {
            return Ok(());
        };
        let tag = registry::tag_for(value.as_any().type_id(), value.type_label())?;
        ar.put("type_name", &tag)?;
        let entry = registry::entry(&tag)?;
        ar.hint("data");
        (entry.save)(value.as_any(), ar)
    })
}

/// Driver half of `Unique<dyn Base>` input.
pub fn load_unique_poly<B: PolyPersist + ?Sized + 'static>(
    handle: &mut Unique<B>,
    ar: &mut InArchive<'_>,
) -> Result<()> {
    ar.record(|ar| {
        let mut id = 0u64;
        ar.take("id", &mut id)?;
        if id == 0 {
            handle.inner = None;
            return Ok(());
        }
        ar.tracker().install(id, Slot::Exclusive)?;
        let mut tag = String::new();
        ar.take("type_name", &mut tag)?;
        let entry = registry::entry(&tag)?;
        let factories = entry.base_factories(TypeId::of::<B>(), std::any::type_name::<B>())?;
        let mut value = *(factories.boxed)().downcast::<Box<B>>().map_err(|_| {
            Error::registry(format!(
                "factory for `{tag}` produced an unexpected handle type"
            ))
        })?;
        ar.hint("data");
        (entry.load)(value.as_any_mut(), ar)?;
        handle.inner = Some(value);
        Ok(())
    })
}
