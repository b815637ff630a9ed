// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API and generic implementation over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::backends::flatvec::FlatVec;
use crate::backends::rtree::RTree;
use crate::damage::Damage;
use crate::types::{Aabb2D, Scalar};

/// Generational handle for entries.
///
/// A key stays valid until its entry is removed. Reusing the slot bumps the
/// generation, so a stale key never aliases a newer entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index keys are 32-bit; an index never holds 2^32 entries."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry<T, P> {
    generation: u32,
    aabb: Aabb2D<T>,
    payload: P,
}

/// An AABB index parameterized by a spatial backend.
///
/// Mutations reach the backend immediately: a removed entry is never returned
/// by a later query. The regions they touch are accumulated as [`Damage`]
/// until drained with [`take_damage`](Self::take_damage).
///
/// Entries with an empty box are tracked (they have a key and a payload) but
/// kept out of the backend, so they never match a query.
#[derive(Debug)]
pub struct IndexGeneric<T: Copy + PartialOrd + Debug, P: Copy + Debug, B: Backend<T>> {
    entries: Vec<Option<Entry<T, P>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    len: usize,
    damage: Damage<T>,
    backend: B,
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T> + Default,
{
    /// Create an empty index using the backend's default constructor.
    pub fn new() -> Self {
        Self::with_backend(B::default())
    }
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T>,
{
    /// Create an empty index around an explicitly configured backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            damage: Damage::default(),
            backend,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a new AABB with payload. Returns a stable handle `Key`.
    pub fn insert(&mut self, aabb: Aabb2D<T>, payload: P) -> Key {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].wrapping_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.entries.push(None);
            self.generations.push(1);
            (self.entries.len() - 1, 1)
        };
        self.entries[idx] = Some(Entry {
            generation,
            aabb,
            payload,
        });
        self.len += 1;
        if !aabb.is_empty() {
            self.backend.insert(idx, aabb);
        }
        self.damage.record(None, Some(aabb));
        Key::new(idx, generation)
    }

    /// Replace the box of an entry. Returns `false` for a stale key.
    pub fn update(&mut self, key: Key, aabb: Aabb2D<T>) -> bool {
        let Some(e) = self.entry_mut(key) else {
            return false;
        };
        let old = core::mem::replace(&mut e.aabb, aabb);
        if old == aabb {
            return true;
        }
        match (old.is_empty(), aabb.is_empty()) {
            (true, false) => self.backend.insert(key.idx(), aabb),
            (false, true) => self.backend.remove(key.idx()),
            (false, false) => self.backend.update(key.idx(), aabb),
            (true, true) => {}
        }
        self.damage.record(Some(old), Some(aabb));
        true
    }

    /// Remove an entry, returning its payload. Stale keys return `None`.
    pub fn remove(&mut self, key: Key) -> Option<P> {
        self.entry_mut(key)?;
        let e = self.entries[key.idx()].take()?;
        self.free_list.push(key.idx());
        self.len -= 1;
        if !e.aabb.is_empty() {
            self.backend.remove(key.idx());
        }
        self.damage.record(Some(e.aabb), None);
        Some(e.payload)
    }

    /// Box and payload of a live entry.
    pub fn get(&self, key: Key) -> Option<(Aabb2D<T>, P)> {
        self.entries
            .get(key.idx())?
            .as_ref()
            .filter(|e| e.generation == key.1)
            .map(|e| (e.aabb, e.payload))
    }

    /// Whether `key` refers to a live entry.
    pub fn contains_key(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Iterate live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, Aabb2D<T>, P)> + '_ {
        self.entries.iter().enumerate().filter_map(|(i, e)| {
            e.as_ref()
                .map(|e| (Key::new(i, e.generation), e.aabb, e.payload))
        })
    }

    /// Drop every entry. Removed boxes are reported as damage.
    ///
    /// Slots and their generations are kept, so keys issued before the clear
    /// stay stale.
    pub fn clear(&mut self) {
        for e in self.entries.iter_mut().filter_map(Option::take) {
            self.damage.record(Some(e.aabb), None);
        }
        self.free_list.clear();
        self.free_list.extend((0..self.entries.len()).rev());
        self.len = 0;
        self.backend.clear();
    }

    /// Damage accumulated since the last drain.
    pub fn damage(&self) -> &Damage<T> {
        &self.damage
    }

    /// Drain the accumulated damage.
    pub fn take_damage(&mut self) -> Damage<T> {
        core::mem::take(&mut self.damage)
    }

    /// Query for entries whose AABB contains the point.
    pub fn query_point(&self, x: T, y: T) -> impl Iterator<Item = (Key, P)> + '_ {
        self.resolve(self.backend.query_point(x, y))
    }

    /// Query for entries whose AABB intersects the given rectangle.
    pub fn query_rect(&self, rect: Aabb2D<T>) -> impl Iterator<Item = (Key, P)> + '_ {
        self.resolve(self.backend.query_rect(rect))
    }

    /// The spatial backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn resolve<'a>(
        &'a self,
        slots: impl Iterator<Item = usize> + 'a,
    ) -> impl Iterator<Item = (Key, P)> + 'a {
        slots.filter_map(move |i| {
            self.entries
                .get(i)?
                .as_ref()
                .map(|e| (Key::new(i, e.generation), e.payload))
        })
    }

    fn entry_mut(&mut self, key: Key) -> Option<&mut Entry<T, P>> {
        self.entries
            .get_mut(key.idx())?
            .as_mut()
            .filter(|e| e.generation == key.1)
    }
}

impl<T: Copy + PartialOrd + Debug, P: Copy + Debug> Default for Index<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Default index using a flat vector backend.
pub type Index<T, P> = IndexGeneric<T, P, FlatVec<T>>;

/// Index backed by an R-tree.
pub type RTreeIndex<T, P> = IndexGeneric<T, P, RTree<T>>;

impl<T: Scalar, P: Copy + Debug> Index<T, P> {
    /// Create an R-tree-backed index.
    pub fn with_rtree() -> RTreeIndex<T, P> {
        IndexGeneric::with_backend(RTree::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RTreeF64;
    use alloc::vec;

    #[test]
    fn stale_keys_are_rejected_after_slot_reuse() {
        let mut idx: Index<f64, u32> = Index::new();
        let a = idx.insert(Aabb2D::new(0.0, 0.0, 1.0, 1.0), 1);
        assert_eq!(idx.remove(a), Some(1));
        let b = idx.insert(Aabb2D::new(0.0, 0.0, 1.0, 1.0), 2);
        assert_ne!(a, b);
        assert!(!idx.update(a, Aabb2D::new(5.0, 5.0, 6.0, 6.0)));
        assert_eq!(idx.remove(a), None);
        assert_eq!(idx.get(b).map(|(_, p)| p), Some(2));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn keys_from_before_a_clear_stay_stale() {
        let mut idx = Index::<f64, u32>::with_rtree();
        let old = idx.insert(Aabb2D::new(0.0, 0.0, 1.0, 1.0), 111);
        idx.clear();
        assert!(idx.is_empty());
        assert_eq!(idx.take_damage().removed, vec![Aabb2D::new(0.0, 0.0, 1.0, 1.0)]);

        let new = idx.insert(Aabb2D::new(0.0, 0.0, 1.0, 1.0), 222);
        assert_ne!(old, new);
        assert_eq!(idx.get(old), None);
        assert_eq!(idx.remove(old), None);
        assert!(!idx.update(old, Aabb2D::new(5.0, 5.0, 6.0, 6.0)));
        assert_eq!(idx.get(new), Some((Aabb2D::new(0.0, 0.0, 1.0, 1.0), 222)));
        assert_eq!(idx.query_point(0.5, 0.5).map(|(_, p)| p).collect::<Vec<_>>(), vec![222]);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn empty_boxes_are_tracked_but_never_hit() {
        let mut idx = Index::<f64, u32>::with_rtree();
        let empty = Aabb2D::new(1.0, 1.0, 0.0, 0.0);
        let k = idx.insert(empty, 7);
        assert!(idx.contains_key(k));
        assert_eq!(idx.query_rect(Aabb2D::new(-1e9, -1e9, 1e9, 1e9)).count(), 0);
        assert!(idx.damage().is_empty());

        idx.update(k, Aabb2D::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(idx.query_point(2.0, 2.0).map(|(_, p)| p).collect::<Vec<_>>(), vec![7]);
        let dmg = idx.take_damage();
        assert_eq!(dmg.added, vec![Aabb2D::new(0.0, 0.0, 4.0, 4.0)]);

        idx.update(k, empty);
        assert_eq!(idx.query_point(2.0, 2.0).count(), 0);
        assert_eq!(idx.take_damage().removed.len(), 1);
    }

    #[test]
    fn damage_accumulates_until_drained() {
        let mut idx: IndexGeneric<f64, u32, RTreeF64> = IndexGeneric::new();
        let a = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 1);
        let b = idx.insert(Aabb2D::new(20.0, 0.0, 30.0, 10.0), 2);
        let _ = idx.take_damage();

        idx.update(a, Aabb2D::new(5.0, 5.0, 15.0, 15.0));
        idx.remove(b);
        let dmg = idx.take_damage();
        assert_eq!(
            dmg.moved,
            vec![(
                Aabb2D::new(0.0, 0.0, 10.0, 10.0),
                Aabb2D::new(5.0, 5.0, 15.0, 15.0)
            )]
        );
        assert_eq!(dmg.removed, vec![Aabb2D::new(20.0, 0.0, 30.0, 10.0)]);
        assert_eq!(dmg.union(), Some(Aabb2D::new(0.0, 0.0, 30.0, 15.0)));
        assert!(idx.take_damage().is_empty());
    }

    #[test]
    fn removal_is_visible_to_the_next_query() {
        let mut idx = Index::<f64, u32>::with_rtree();
        let keys: Vec<_> = (0..3)
            .map(|i| idx.insert(Aabb2D::from_xywh(f64::from(i) * 5.0, 0.0, 10.0, 10.0), i))
            .collect();
        idx.remove(keys[1]);
        let mut hits: Vec<_> = idx.query_point(10.0, 5.0).map(|(_, p)| p).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 2]);
    }
}
