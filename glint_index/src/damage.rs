// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage accumulated by an [`IndexGeneric`](crate::IndexGeneric) between drains.

use alloc::vec::Vec;

use crate::types::{Aabb2D, union_aabb};

/// Regions touched by index mutations since the last
/// [`take_damage`](crate::IndexGeneric::take_damage).
///
/// Only non-empty boxes are recorded.
#[derive(Clone, Debug)]
pub struct Damage<T> {
    /// Boxes of entries inserted (or grown from empty).
    pub added: Vec<Aabb2D<T>>,
    /// Boxes of entries removed (or shrunk to empty).
    pub removed: Vec<Aabb2D<T>>,
    /// Boxes of entries that changed: (old, new).
    pub moved: Vec<(Aabb2D<T>, Aabb2D<T>)>,
}

impl<T> Default for Damage<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            moved: Vec::new(),
        }
    }
}

impl<T: Copy + PartialOrd> Damage<T> {
    /// True if no damage entries recorded.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }

    /// Every box mentioned by this damage, old and new.
    pub fn boxes(&self) -> impl Iterator<Item = Aabb2D<T>> + '_ {
        self.added
            .iter()
            .copied()
            .chain(self.removed.iter().copied())
            .chain(self.moved.iter().flat_map(|(a, b)| [*a, *b]))
    }

    /// Union of all AABBs affected. Returns `None` if empty.
    pub fn union(&self) -> Option<Aabb2D<T>> {
        let mut it = self.boxes();
        let first = it.next()?;
        Some(it.fold(first, union_aabb))
    }

    pub(crate) fn record(&mut self, old: Option<Aabb2D<T>>, new: Option<Aabb2D<T>>) {
        let old = old.filter(|b| !b.is_empty());
        let new = new.filter(|b| !b.is_empty());
        match (old, new) {
            (None, Some(n)) => self.added.push(n),
            (Some(o), None) => self.removed.push(o),
            (Some(o), Some(n)) if o != n => self.moved.push((o, n)),
            _ => {}
        }
    }
}
