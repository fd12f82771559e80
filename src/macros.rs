//! Declaration macros wiring user types into the archive driver.

/// Implements [`Fields`] and [`Persist`] for a record from its field list.
///
/// Fields are submitted in declaration order under their source-level
/// names. The `@inline` marker routes a member through its own `Fields`
/// implementation so a base record's members land directly in this
/// record's scope:
///
/// ```
/// use relic::persist_record;
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
///     age: i32,
/// }
/// persist_record!(Person { name, age });
///
/// #[derive(Default)]
/// struct Employee {
///     person: Person,
///     salary: f64,
/// }
/// persist_record!(Employee { @inline person; salary });
/// ```
///
/// [`Fields`]: crate::Fields
/// [`Persist`]: crate::Persist
#[macro_export]
macro_rules! persist_record {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::Fields for $ty {
            fn save_fields(&self, ar: &mut $crate::OutArchive<'_>) -> $crate::Result<()> {
                $( ar.put(::core::stringify!($field), &self.$field)?; )*
                ::core::result::Result::Ok(())
            }

            fn load_fields(&mut self, ar: &mut $crate::InArchive<'_>) -> $crate::Result<()> {
                $( ar.take(::core::stringify!($field), &mut self.$field)?; )*
                ::core::result::Result::Ok(())
            }
        }

        $crate::__persist_record_scope!($ty);
    };
    ($ty:ty { @inline $base:ident; $($field:ident),* $(,)? }) => {
        impl $crate::Fields for $ty {
            fn save_fields(&self, ar: &mut $crate::OutArchive<'_>) -> $crate::Result<()> {
                $crate::Fields::save_fields(&self.$base, ar)?;
                $( ar.put(::core::stringify!($field), &self.$field)?; )*
                ::core::result::Result::Ok(())
            }

            fn load_fields(&mut self, ar: &mut $crate::InArchive<'_>) -> $crate::Result<()> {
                $crate::Fields::load_fields(&mut self.$base, ar)?;
                $( ar.take(::core::stringify!($field), &mut self.$field)?; )*
                ::core::result::Result::Ok(())
            }
        }

        $crate::__persist_record_scope!($ty);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __persist_record_scope {
    ($ty:ty) => {
        impl $crate::Persist for $ty {
            fn save(&self, ar: &mut $crate::OutArchive<'_>) -> $crate::Result<()> {
                ar.record(|ar| $crate::Fields::save_fields(self, ar))
            }

            fn load(&mut self, ar: &mut $crate::InArchive<'_>) -> $crate::Result<()> {
                ar.record(|ar| $crate::Fields::load_fields(self, ar))
            }
        }
    };
}

/// Implements [`Persist`] for a C-like enum through its discriminant type.
///
/// The enum needs `Copy`, a `From<Enum>` conversion to the discriminant
/// and a `TryFrom<discriminant>` conversion back, which is exactly what
/// `num_enum::IntoPrimitive` and `num_enum::TryFromPrimitive` derive:
///
/// ```
/// use relic::num_enum::{IntoPrimitive, TryFromPrimitive};
/// use relic::persist_enum;
///
/// #[derive(Clone, Copy, IntoPrimitive, TryFromPrimitive)]
/// #[repr(u8)]
/// enum Gender {
///     Male = 0,
///     Female = 1,
/// }
/// persist_enum!(Gender : u8);
///
/// impl Default for Gender {
///     fn default() -> Self {
///         Gender::Male
///     }
/// }
/// ```
///
/// A stream discriminant with no matching variant is a domain error.
///
/// [`Persist`]: crate::Persist
#[macro_export]
macro_rules! persist_enum {
    ($ty:ty : $repr:ty) => {
        impl $crate::Persist for $ty {
            fn save(&self, ar: &mut $crate::OutArchive<'_>) -> $crate::Result<()> {
                let raw: $repr = ::core::convert::From::from(*self);
                $crate::Persist::save(&raw, ar)
            }

            fn load(&mut self, ar: &mut $crate::InArchive<'_>) -> $crate::Result<()> {
                let mut raw: $repr = ::core::default::Default::default();
                $crate::Persist::load(&mut raw, ar)?;
                *self = ::core::convert::TryFrom::try_from(raw).map_err(|_| {
                    $crate::Error::Domain(::std::format!(
                        "invalid discriminant {} for {}",
                        raw,
                        ::core::stringify!($ty)
                    ))
                })?;
                ::core::result::Result::Ok(())
            }
        }
    };
}

/// Implements [`Persist`] for a tagged union (an enum with payloads).
///
/// Each alternative is written as its explicit index plus, for payload
/// alternatives, the payload under `value`. Payload types must be
/// `Default`. A stream index with no matching alternative is a domain
/// error.
///
/// ```
/// use relic::persist_variant;
///
/// #[derive(Default)]
/// enum Shape {
///     #[default]
///     Empty,
///     Circle(f64),
///     Label(String),
/// }
/// persist_variant!(Shape {
///     0 => Empty,
///     1 => Circle(f64),
///     2 => Label(String),
/// });
/// ```
///
/// [`Persist`]: crate::Persist
#[macro_export]
macro_rules! persist_variant {
    ($ty:ident { $($idx:literal => $arm:ident $(( $payload:ty ))?),+ $(,)? }) => {
        impl $crate::Persist for $ty {
            fn save(&self, ar: &mut $crate::OutArchive<'_>) -> $crate::Result<()> {
                ar.record(|ar| {
                    $( $crate::__persist_variant_save!(self, ar, $ty, $idx, $arm $(( $payload ))?); )+
                    ::core::result::Result::Ok(())
                })
            }

            fn load(&mut self, ar: &mut $crate::InArchive<'_>) -> $crate::Result<()> {
                ar.record(|ar| {
                    let mut index: u64 = 0;
                    ar.take("index", &mut index)?;
                    $( $crate::__persist_variant_load!(self, ar, index, $ty, $idx, $arm $(( $payload ))?); )+
                    ::core::result::Result::Err($crate::Error::Domain(::std::format!(
                        "alternative index {} is out of range for {}",
                        index,
                        ::core::stringify!($ty)
                    )))
                })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __persist_variant_save {
    ($self:expr, $ar:expr, $ty:ident, $idx:literal, $arm:ident ( $payload:ty )) => {
        if let $ty::$arm(value) = $self {
            $ar.put("index", &($idx as u64))?;
            return $ar.put("value", value);
        }
    };
    ($self:expr, $ar:expr, $ty:ident, $idx:literal, $arm:ident) => {
        if let $ty::$arm = $self {
            return $ar.put("index", &($idx as u64));
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __persist_variant_load {
    ($self:expr, $ar:expr, $index:expr, $ty:ident, $idx:literal, $arm:ident ( $payload:ty )) => {
        if $index == $idx {
            let mut value: $payload = ::core::default::Default::default();
            $ar.take("value", &mut value)?;
            *$self = $ty::$arm(value);
            return ::core::result::Result::Ok(());
        }
    };
    ($self:expr, $ar:expr, $index:expr, $ty:ident, $idx:literal, $arm:ident) => {
        if $index == $idx {
            *$self = $ty::$arm;
            return ::core::result::Result::Ok(());
        }
    };
}

/// Registers a class in the process-wide type registry.
///
/// The plain form records the tag, default constructor and dispatch
/// thunks. The `bases(..)` form additionally attaches constructors for
/// each base trait whose handles (`Shared<dyn Base>` etc.) may carry the
/// class, supplying the unsize coercions the registry cannot produce
/// itself:
///
/// ```no_run
/// # use relic::{persist_record, persist_poly, register_class, PolyPersist};
/// # trait Animal: PolyPersist {}
/// # #[derive(Default)] struct Dog { name: String }
/// # persist_record!(Dog { name });
/// # impl Animal for Dog {}
/// # persist_poly!(Animal);
/// register_class!(Dog, "Dog", bases(Animal));
/// relic::registry::freeze();
/// ```
///
/// Registration is idempotent (the last registration of a tag wins) and
/// must complete before [`registry::freeze`].
///
/// [`registry::freeze`]: crate::registry::freeze
#[macro_export]
macro_rules! register_class {
    ($ty:ty, $tag:expr) => {
        $crate::registry::register::<$ty>($tag);
    };
    ($ty:ty, $tag:expr, bases($($base:path),+ $(,)?)) => {
        $crate::registry::register::<$ty>($tag);
        $(
            $crate::registry::register_base::<dyn $base>(
                $tag,
                || {
                    let handle: ::std::rc::Rc<::std::cell::RefCell<dyn $base>> =
                        ::std::rc::Rc::new(::std::cell::RefCell::new(
                            <$ty as ::core::default::Default>::default(),
                        ));
                    ::std::boxed::Box::new(handle)
                },
                || {
                    let handle: ::std::boxed::Box<dyn $base> = ::std::boxed::Box::new(
                        <$ty as ::core::default::Default>::default(),
                    );
                    ::std::boxed::Box::new(handle)
                },
            );
        )+
    };
}

/// Derives handle support (`Shared`, `WeakRef`, `Unique`) for trait-object
/// pointees of one or more base traits. Each trait must have
/// [`PolyPersist`] as a supertrait.
///
/// [`PolyPersist`]: crate::PolyPersist
#[macro_export]
macro_rules! persist_poly {
    ($($base:path),+ $(,)?) => {
        $(
            impl $crate::Persist for $crate::Shared<dyn $base> {
                fn save(&self, ar: &mut $crate::OutArchive<'_>) -> $crate::Result<()> {
                    $crate::poly::save_shared_poly(self, ar)
                }

                fn load(&mut self, ar: &mut $crate::InArchive<'_>) -> $crate::Result<()> {
                    $crate::poly::load_shared_poly(self, ar)
                }
            }

            impl $crate::Persist for $crate::WeakRef<dyn $base> {
                fn save(&self, ar: &mut $crate::OutArchive<'_>) -> $crate::Result<()> {
                    $crate::poly::save_weak_poly(self, ar)
                }

                fn load(&mut self, ar: &mut $crate::InArchive<'_>) -> $crate::Result<()> {
                    $crate::poly::load_weak_poly(self, ar)
                }
            }

            impl $crate::Persist for $crate::Unique<dyn $base> {
                fn save(&self, ar: &mut $crate::OutArchive<'_>) -> $crate::Result<()> {
                    $crate::poly::save_unique_poly(self, ar)
                }

                fn load(&mut self, ar: &mut $crate::InArchive<'_>) -> $crate::Result<()> {
                    $crate::poly::load_unique_poly(self, ar)
                }
            }
        )+
    };
}
