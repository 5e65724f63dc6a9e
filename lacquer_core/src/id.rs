// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational handles and the slot arena that issues them.
//!
//! Outputs, seats, and layer surfaces are owned by [`Arena`]s inside the
//! context. Protocol callbacks carry a handle as user data instead of a
//! pointer back to their owner, so a callback that races with teardown
//! resolves to `None` rather than to freed state.

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

/// A generational handle type that an [`Arena`] can issue.
pub trait Key: Copy + Eq {
    /// Builds a handle from a slot index and generation.
    fn from_parts(idx: u32, generation: u32) -> Self;

    /// Returns the slot index.
    fn index(self) -> u32;

    /// Returns the generation counter.
    fn generation(self) -> u32;
}

macro_rules! define_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            idx: u32,
            generation: u32,
        }

        impl Key for $name {
            #[inline]
            fn from_parts(idx: u32, generation: u32) -> Self {
                Self { idx, generation }
            }

            #[inline]
            fn index(self) -> u32 {
                self.idx
            }

            #[inline]
            fn generation(self) -> u32 {
                self.generation
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({}@gen{})"), self.idx, self.generation)
            }
        }
    };
}

define_key!(
    /// Handle to a connected display output.
    OutputId
);
define_key!(
    /// Handle to an input seat.
    SeatId
);
define_key!(
    /// Handle to a layer surface.
    SurfaceId
);

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with a free list and generation counters.
///
/// Removing an entry bumps the slot's generation so handles issued before
/// the removal stop resolving. Freed slots are reused in LIFO order.
pub struct Arena<K, T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
    _key: PhantomData<fn() -> K>,
}

impl<K: Key, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T: fmt::Debug> fmt::Debug for Arena<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<K: Key, T> Arena<K, T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            _key: PhantomData,
        }
    }

    /// Number of live entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena has no live entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value and returns its handle.
    pub fn insert(&mut self, value: T) -> K {
        self.insert_with(|_| value)
    }

    /// Inserts a value built from its own handle.
    ///
    /// Protocol objects created for an entry need the handle as user data
    /// before the entry exists; this reserves the slot first.
    pub fn insert_with(&mut self, f: impl FnOnce(K) -> T) -> K {
        let idx = if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                value: None,
            });
            idx
        };
        let slot = &mut self.slots[idx as usize];
        let key = K::from_parts(idx, slot.generation);
        slot.value = Some(f(key));
        self.len += 1;
        key
    }

    /// Removes an entry, returning its value if the handle was live.
    pub fn remove(&mut self, key: K) -> Option<T> {
        let slot = self.slots.get_mut(key.index() as usize)?;
        if slot.generation != key.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(key.index());
        self.len -= 1;
        Some(value)
    }

    /// Whether `key` refers to a live entry.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the entry for `key` if it is live.
    #[must_use]
    pub fn get(&self, key: K) -> Option<&T> {
        let slot = self.slots.get(key.index() as usize)?;
        if slot.generation == key.generation() {
            slot.value.as_ref()
        } else {
            None
        }
    }

    /// Returns the entry for `key` mutably if it is live.
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        let slot = self.slots.get_mut(key.index() as usize)?;
        if slot.generation == key.generation() {
            slot.value.as_mut()
        } else {
            None
        }
    }

    /// Iterates live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            let value = slot.value.as_ref()?;
            Some((key_at::<K>(idx, slot.generation), value))
        })
    }

    /// Iterates live entries mutably in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(idx, slot)| {
            let generation = slot.generation;
            let value = slot.value.as_mut()?;
            Some((key_at::<K>(idx, generation), value))
        })
    }

    /// Collects the handles of all live entries.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Removes every entry, returning them in slot order.
    ///
    /// All outstanding handles are invalidated.
    pub fn drain(&mut self) -> Vec<(K, T)> {
        let mut out = Vec::with_capacity(self.len);
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                out.push((key_at::<K>(idx, slot.generation), value));
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(u32::try_from(idx).unwrap_or(u32::MAX));
            }
        }
        self.len = 0;
        out
    }

    /// Removes and returns all entries matching `pred`.
    pub fn extract_if(&mut self, mut pred: impl FnMut(K, &T) -> bool) -> Vec<(K, T)> {
        let doomed: Vec<K> = self
            .iter()
            .filter(|(key, value)| pred(*key, value))
            .map(|(key, _)| key)
            .collect();
        doomed
            .into_iter()
            .filter_map(|key| self.remove(key).map(|value| (key, value)))
            .collect()
    }
}

fn key_at<K: Key>(idx: usize, generation: u32) -> K {
    K::from_parts(u32::try_from(idx).unwrap_or(u32::MAX), generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::Cell;

    struct DropCounter(Rc<Cell<u32>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn stale_handle_does_not_resolve_after_reuse() {
        let mut arena: Arena<SurfaceId, &str> = Arena::new();
        let first = arena.insert("a");
        assert_eq!(arena.remove(first), Some("a"));

        let second = arena.insert("b");
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.get(second), Some(&"b"));
        assert_eq!(arena.remove(first), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn insert_with_sees_own_handle() {
        let mut arena: Arena<OutputId, OutputId> = Arena::new();
        let id = arena.insert_with(|id| id);
        assert_eq!(arena.get(id), Some(&id));
    }

    #[test]
    fn drain_drops_each_entry_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        let mut arena: Arena<SeatId, DropCounter> = Arena::new();
        let ids: Vec<SeatId> = (0..4)
            .map(|_| arena.insert(DropCounter(drops.clone())))
            .collect();
        let _ = arena.remove(ids[1]);
        assert_eq!(drops.get(), 1);

        let drained = arena.drain();
        assert_eq!(drained.len(), 3);
        drop(drained);
        assert_eq!(drops.get(), 4);

        drop(arena);
        assert_eq!(drops.get(), 4, "arena must not drop drained entries again");
    }

    #[test]
    fn drain_invalidates_handles() {
        let mut arena: Arena<SurfaceId, u32> = Arena::new();
        let id = arena.insert(7);
        let _ = arena.drain();
        assert!(arena.is_empty());
        assert!(!arena.contains(id));
    }

    #[test]
    fn iteration_skips_free_slots() {
        let mut arena: Arena<OutputId, u32> = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        let c = arena.insert(3);
        let _ = arena.remove(b);
        let keys = arena.keys();
        assert_eq!(keys, [a, c]);
        for (_, value) in arena.iter_mut() {
            *value *= 10;
        }
        assert_eq!(arena.get(c), Some(&30));
    }

    #[test]
    fn extract_if_removes_matching_entries() {
        let mut arena: Arena<SurfaceId, u32> = Arena::new();
        let a = arena.insert(1);
        let _ = arena.insert(2);
        let c = arena.insert(3);
        let odd = arena.extract_if(|_, v| v % 2 == 1);
        assert_eq!(odd, [(a, 1), (c, 3)]);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn debug_format_names_handle_type() {
        let id = OutputId::from_parts(3, 1);
        assert_eq!(alloc::format!("{id:?}"), "OutputId(3@gen1)");
    }
}
