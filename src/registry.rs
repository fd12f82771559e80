//! Process-wide catalog mapping class tags to factories and dispatch thunks.
//!
//! The registry is the only global in the crate. It is populated during
//! startup (registration is idempotent, the last registration wins) and is
//! expected to be read-only afterwards: call [`freeze`] once registration is
//! complete and every later lookup bypasses the lock entirely. Registering
//! after the freeze is a programming error and panics.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{LazyLock, OnceLock, PoisonError, RwLock};

use crate::archive::{InArchive, OutArchive};
use crate::error::{Error, Result};
use crate::persist::Persist;

/// Serializes a concrete instance through a reference typed as its base.
pub(crate) type SaveThunk = fn(&dyn Any, &mut OutArchive<'_>) -> Result<()>;
/// Deserializes into a concrete instance through a reference typed as its base.
pub(crate) type LoadThunk = fn(&mut dyn Any, &mut InArchive<'_>) -> Result<()>;
/// Default-constructs an instance behind an erased handle. The concrete
/// handle shape is supplied by the [`register_class!`] macro expansion.
///
/// [`register_class!`]: crate::register_class
pub type Factory = fn() -> Box<dyn Any>;

/// Constructors producing the two owning handle shapes for one base trait.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BaseFactories {
    /// Yields a boxed `Rc<RefCell<dyn Base>>`.
    pub(crate) shared: Factory,
    /// Yields a boxed `Box<dyn Base>`.
    pub(crate) boxed: Factory,
}

/// One registered class: stable tag, dispatch thunks, per-base constructors.
#[derive(Clone, Debug)]
pub(crate) struct ClassEntry {
    pub(crate) tag: String,
    pub(crate) save: SaveThunk,
    pub(crate) load: LoadThunk,
    bases: HashMap<TypeId, BaseFactories>,
}

impl ClassEntry {
    pub(crate) fn base_factories(&self, base: TypeId, base_label: &str) -> Result<BaseFactories> {
        self.bases.get(&base).copied().ok_or_else(|| {
            Error::registry(format!(
                "class `{}` is not registered for base `{base_label}`",
                self.tag
            ))
        })
    }
}

#[derive(Clone, Default)]
struct Registry {
    by_tag: HashMap<String, ClassEntry>,
    tags: HashMap<TypeId, String>,
}

static WARM: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(Registry::default()));
static FROZEN: OnceLock<Registry> = OnceLock::new();

fn with_registry<R>(f: impl FnOnce(&Registry) -> R) -> R {
    if let Some(frozen) = FROZEN.get() {
        f(frozen)
    } else {
        let guard = WARM.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

fn save_thunk<T: Persist + 'static>(value: &dyn Any, ar: &mut OutArchive<'_>) -> Result<()> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| Error::registry("registered serializer received a mismatched instance"))?
        .save(ar)
}

fn load_thunk<T: Persist + 'static>(value: &mut dyn Any, ar: &mut InArchive<'_>) -> Result<()> {
    value
        .downcast_mut::<T>()
        .ok_or_else(|| Error::registry("registered deserializer received a mismatched instance"))?
        .load(ar)
}

/// Registers class `T` under `tag`.
///
/// Re-registering a tag replaces the dispatch thunks and keeps any base
/// constructors already attached. Prefer the [`register_class!`] macro,
/// which also wires up base-trait constructors.
///
/// # Panics
///
/// Panics when the registry has already been frozen.
///
/// [`register_class!`]: crate::register_class
pub fn register<T: Persist + Default + Any>(tag: &str) {
    assert!(
        FROZEN.get().is_none(),
        "type registry is frozen; register classes before calling freeze()"
    );
    let mut registry = WARM.write().unwrap_or_else(PoisonError::into_inner);
    tracing::debug!(tag, class = std::any::type_name::<T>(), "registering class");
    let entry = registry
        .by_tag
        .entry(tag.to_owned())
        .or_insert_with(|| ClassEntry {
            tag: tag.to_owned(),
            save: save_thunk::<T>,
            load: load_thunk::<T>,
            bases: HashMap::new(),
        });
    entry.save = save_thunk::<T>;
    entry.load = load_thunk::<T>;
    registry.tags.insert(TypeId::of::<T>(), tag.to_owned());
}

/// Attaches base-trait constructors to an already registered class.
///
/// `B` is the base trait object type (`dyn Base`). Called by the
/// [`register_class!`] macro, which supplies the unsize coercions.
///
/// # Panics
///
/// Panics when the registry is frozen or the tag has not been registered.
///
/// [`register_class!`]: crate::register_class
pub fn register_base<B: ?Sized + 'static>(tag: &str, shared: Factory, boxed: Factory) {
    assert!(
        FROZEN.get().is_none(),
        "type registry is frozen; register classes before calling freeze()"
    );
    let mut registry = WARM.write().unwrap_or_else(PoisonError::into_inner);
    let entry = registry
        .by_tag
        .get_mut(tag)
        .unwrap_or_else(|| panic!("register class `{tag}` before attaching bases"));
    entry
        .bases
        .insert(TypeId::of::<B>(), BaseFactories { shared, boxed });
}

/// Snapshots the registry for lock-free concurrent lookups.
///
/// Idempotent; the first call wins. Must happen after every registration and
/// before the first archive operation on any thread that relies on
/// lock-freedom (lookups before the freeze still work, through the lock).
pub fn freeze() {
    let snapshot = {
        let guard = WARM.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    };
    if FROZEN.set(snapshot).is_ok() {
        tracing::debug!("type registry frozen; lookups are now lock-free");
    }
}

/// Reverse mapping: concrete runtime type to registered tag.
pub(crate) fn tag_for(type_id: TypeId, type_label: &str) -> Result<String> {
    with_registry(|registry| {
        registry.tags.get(&type_id).cloned().ok_or_else(|| {
            Error::registry(format!("type `{type_label}` has no registered class tag"))
        })
    })
}

/// Looks up the entry for `tag`, cloning it out so no lock is held while
/// user serialize functions run.
pub(crate) fn entry(tag: &str) -> Result<ClassEntry> {
    with_registry(|registry| {
        registry
            .by_tag
            .get(tag)
            .cloned()
            .ok_or_else(|| Error::registry(format!("unknown class tag `{tag}`")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::Fields;

    #[derive(Default)]
    struct Probe {
        value: u32,
    }

    impl Fields for Probe {
        fn save_fields(&self, ar: &mut OutArchive<'_>) -> Result<()> {
            ar.put("value", &self.value)
        }

        fn load_fields(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
            ar.take("value", &mut self.value)
        }
    }

    impl Persist for Probe {
        fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
            ar.record(|ar| self.save_fields(ar))
        }

        fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
            ar.record(|ar| self.load_fields(ar))
        }
    }

    #[test]
    fn register_and_look_up_round_trips_the_tag() {
        register::<Probe>("Probe");
        let tag = tag_for(TypeId::of::<Probe>(), "Probe").expect("tag registered");
        assert_eq!(tag, "Probe");
        assert!(entry("Probe").is_ok());
    }

    #[test]
    fn unknown_tag_is_a_registry_error() {
        let err = entry("NoSuchClass").expect_err("tag was never registered");
        assert!(matches!(err, Error::Registry(_)));
    }
}
