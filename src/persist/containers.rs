//! Sequence, associative and adapter container support.
//!
//! Every sequence travels as a length followed by its body. In binary mode
//! a dense slice of fixed-width scalars collapses to a single raw byte span
//! (`len × size_of::<T>()` bytes); everything else is an array scope with
//! one submission per element in iteration order. Keyed containers encode
//! each entry as a `{first, second}` record; set-like containers without
//! write iterators are rebuilt element by element.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};

use crate::archive::{InArchive, OutArchive};
use crate::error::{Error, Result};
use crate::persist::Persist;

fn checked_len(len: u64) -> Result<usize> {
    usize::try_from(len)
        .map_err(|_| Error::structural(format!("sequence length {len} exceeds address space")))
}

/// Length-then-body emission for slice-backed sequences, shared by `Vec`,
/// arrays, heaps and small vectors so they all present the same wire shape.
pub(crate) fn save_slice_elements<T: Persist>(ar: &mut OutArchive<'_>, items: &[T]) -> Result<()> {
    ar.put_len(items.len() as u64)?;
    if ar.is_binary() {
        if let Some(bytes) = T::bulk_bytes(items) {
            return ar.put_raw(bytes);
        }
    }
    ar.seq(|ar| {
        for item in items {
            item.save(ar)?;
        }
        Ok(())
    })
}

impl<T: Persist + Default> Persist for Vec<T> {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        save_slice_elements(ar, self)
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        if ar.is_binary() && T::PACKED {
            let len = checked_len(ar.take_len()?)?;
            self.clear();
            self.resize_with(len, T::default);
            let bytes = T::bulk_bytes_mut(self)
                .ok_or_else(|| Error::structural("packed element type without a byte view"))?;
            return ar.take_raw(bytes);
        }
        ar.seq(|ar| {
            let len = checked_len(ar.take_len()?)?;
            self.clear();
            self.resize_with(len, T::default);
            for item in self.iter_mut() {
                item.load(ar)?;
            }
            Ok(())
        })
    }
}

impl<T: Persist + Default, const N: usize> Persist for [T; N] {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        save_slice_elements(ar, self)
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        if ar.is_binary() && T::PACKED {
            let len = checked_len(ar.take_len()?)?;
            if len != N {
                return Err(Error::structural(format!(
                    "fixed array expects {N} element(s), stream carries {len}"
                )));
            }
            let bytes = T::bulk_bytes_mut(self)
                .ok_or_else(|| Error::structural("packed element type without a byte view"))?;
            return ar.take_raw(bytes);
        }
        ar.seq(|ar| {
            let len = checked_len(ar.take_len()?)?;
            if len != N {
                return Err(Error::structural(format!(
                    "fixed array expects {N} element(s), stream carries {len}"
                )));
            }
            for item in self.iter_mut() {
                item.load(ar)?;
            }
            Ok(())
        })
    }
}

impl<T: Persist + Default> Persist for VecDeque<T> {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.put_len(self.len() as u64)?;
        ar.seq(|ar| {
            for item in self {
                item.save(ar)?;
            }
            Ok(())
        })
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.seq(|ar| {
            let len = checked_len(ar.take_len()?)?;
            self.clear();
            for _ in 0..len {
                let mut item = T::default();
                item.load(ar)?;
                self.push_back(item);
            }
            Ok(())
        })
    }
}

#[cfg(feature = "smallvec")]
impl<A> Persist for smallvec::SmallVec<A>
where
    A: smallvec::Array,
    A::Item: Persist + Default,
{
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        save_slice_elements(ar, self.as_slice())
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        if ar.is_binary() && A::Item::PACKED {
            let len = checked_len(ar.take_len()?)?;
            self.clear();
            for _ in 0..len {
                self.push(A::Item::default());
            }
            let bytes = A::Item::bulk_bytes_mut(self.as_mut_slice())
                .ok_or_else(|| Error::structural("packed element type without a byte view"))?;
            return ar.take_raw(bytes);
        }
        ar.seq(|ar| {
            let len = checked_len(ar.take_len()?)?;
            self.clear();
            for _ in 0..len {
                let mut item = A::Item::default();
                item.load(ar)?;
                self.push(item);
            }
            Ok(())
        })
    }
}

fn save_map_entries<'e, K, V>(
    ar: &mut OutArchive<'_>,
    len: usize,
    entries: impl Iterator<Item = (&'e K, &'e V)>,
) -> Result<()>
where
    K: Persist + 'e,
    V: Persist + 'e,
{
    ar.put_len(len as u64)?;
    ar.seq(|ar| {
        for (key, value) in entries {
            ar.record(|ar| {
                ar.put("first", key)?;
                ar.put("second", value)
            })?;
        }
        Ok(())
    })
}

fn load_map_entry<K, V>(ar: &mut InArchive<'_>) -> Result<(K, V)>
where
    K: Persist + Default,
    V: Persist + Default,
{
    let mut key = K::default();
    let mut value = V::default();
    ar.record(|ar| {
        ar.take("first", &mut key)?;
        ar.take("second", &mut value)
    })?;
    Ok((key, value))
}

impl<K, V, S> Persist for HashMap<K, V, S>
where
    K: Persist + Default + Eq + Hash,
    V: Persist + Default,
    S: BuildHasher + Default,
{
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        save_map_entries(ar, self.len(), self.iter())
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.seq(|ar| {
            let len = checked_len(ar.take_len()?)?;
            self.clear();
            for _ in 0..len {
                let (key, value) = load_map_entry(ar)?;
                self.insert(key, value);
            }
            Ok(())
        })
    }
}

impl<K, V> Persist for BTreeMap<K, V>
where
    K: Persist + Default + Ord,
    V: Persist + Default,
{
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        save_map_entries(ar, self.len(), self.iter())
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.seq(|ar| {
            let len = checked_len(ar.take_len()?)?;
            self.clear();
            for _ in 0..len {
                let (key, value) = load_map_entry(ar)?;
                self.insert(key, value);
            }
            Ok(())
        })
    }
}

impl<T, S> Persist for HashSet<T, S>
where
    T: Persist + Default + Eq + Hash,
    S: BuildHasher + Default,
{
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.put_len(self.len() as u64)?;
        ar.seq(|ar| {
            for item in self {
                item.save(ar)?;
            }
            Ok(())
        })
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.seq(|ar| {
            let len = checked_len(ar.take_len()?)?;
            self.clear();
            for _ in 0..len {
                let mut item = T::default();
                item.load(ar)?;
                self.insert(item);
            }
            Ok(())
        })
    }
}

impl<T> Persist for BTreeSet<T>
where
    T: Persist + Default + Ord,
{
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.put_len(self.len() as u64)?;
        ar.seq(|ar| {
            for item in self {
                item.save(ar)?;
            }
            Ok(())
        })
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.seq(|ar| {
            let len = checked_len(ar.take_len()?)?;
            self.clear();
            for _ in 0..len {
                let mut item = T::default();
                item.load(ar)?;
                self.insert(item);
            }
            Ok(())
        })
    }
}

/// Adapter container: the heap is serialized as its underlying sequence
/// under `container` and rebuilt by range construction, which restores the
/// heap invariant regardless of the stored order.
impl<T> Persist for BinaryHeap<T>
where
    T: Persist + Default + Ord,
{
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            ar.hint("container");
            save_slice_elements(ar, self.as_slice())
        })
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        ar.record(|ar| {
            let mut items: Vec<T> = Vec::new();
            ar.take("container", &mut items)?;
            *self = BinaryHeap::from(items);
            Ok(())
        })
    }
}

/// Transparent wrapper: `Reverse` keeps its inner encoding, which is what
/// lets a min-heap (`BinaryHeap<Reverse<T>>`) round-trip like any other
/// heap.
impl<T: Persist> Persist for Reverse<T> {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        self.0.save(ar)
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        self.0.load(ar)
    }
}
