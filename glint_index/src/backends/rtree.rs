// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree backend generic over scalar `T: Scalar` with SAH-like split.
//!
//! Nodes live in an arena and keep a parent link, and every slot remembers the
//! leaf holding it. Removal and in-place updates therefore walk a single
//! leaf-to-root path instead of searching the tree.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::{Aabb2D, Scalar, area, union_aabb};

/// R-tree backend using SAH-like splits and widened accumulator metrics.
pub struct RTree<T: Scalar> {
    max_children: usize,
    min_children: usize,
    root: Option<NodeIdx>,
    nodes: Vec<RNode<T>>,
    free_nodes: Vec<NodeIdx>,
    slots: Vec<Option<SlotEntry<T>>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn get(self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Debug)]
struct SlotEntry<T> {
    leaf: NodeIdx,
    bbox: Aabb2D<T>,
}

#[derive(Clone, Debug)]
struct RNode<T> {
    bbox: Aabb2D<T>,
    parent: Option<NodeIdx>,
    entries: Entries,
}

#[derive(Clone, Debug)]
enum Entries {
    Leaf(Vec<usize>),
    Branch(Vec<NodeIdx>),
}

impl Entries {
    fn len(&self) -> usize {
        match self {
            Self::Leaf(v) => v.len(),
            Self::Branch(v) => v.len(),
        }
    }
}

impl<T: Scalar> Default for RTree<T> {
    fn default() -> Self {
        Self::with_max_children(8)
    }
}

impl<T: Scalar> RTree<T> {
    /// Create an empty tree whose nodes split once they exceed `max_children`.
    ///
    /// `max_children` is raised to at least 2; the minimum fill after a split is half of it.
    pub fn with_max_children(max_children: usize) -> Self {
        let max_children = max_children.max(2);
        Self {
            max_children,
            min_children: max_children / 2,
            root: None,
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Number of levels from the root to the leaves (0 when empty).
    pub fn height(&self) -> usize {
        let mut h = 0;
        let mut cur = self.root;
        while let Some(i) = cur {
            h += 1;
            cur = match &self.nodes[i.get()].entries {
                Entries::Branch(children) => children.first().copied(),
                Entries::Leaf(_) => None,
            };
        }
        h
    }

    fn slot(&self, slot: usize) -> Option<SlotEntry<T>> {
        self.slots.get(slot).copied().flatten()
    }

    fn alloc(&mut self, node: RNode<T>) -> NodeIdx {
        if let Some(i) = self.free_nodes.pop() {
            self.nodes[i.get()] = node;
            i
        } else {
            self.nodes.push(node);
            NodeIdx(self.nodes.len() - 1)
        }
    }

    fn free(&mut self, i: NodeIdx) {
        let n = &mut self.nodes[i.get()];
        n.entries = Entries::Leaf(Vec::new());
        n.parent = None;
        self.free_nodes.push(i);
    }

    fn compute_bbox(&self, i: NodeIdx) -> Option<Aabb2D<T>> {
        match &self.nodes[i.get()].entries {
            Entries::Leaf(slots) => fold_boxes(
                slots
                    .iter()
                    .filter_map(|&s| self.slot(s).map(|e| e.bbox)),
            ),
            Entries::Branch(children) => {
                fold_boxes(children.iter().map(|c| self.nodes[c.get()].bbox))
            }
        }
    }

    /// Recompute boxes from `start` up to the root.
    fn refit_from(&mut self, start: NodeIdx) {
        let mut cur = Some(start);
        while let Some(i) = cur {
            if let Some(bb) = self.compute_bbox(i) {
                self.nodes[i.get()].bbox = bb;
            }
            cur = self.nodes[i.get()].parent;
        }
    }

    /// Descend by least enlargement, then least area.
    fn choose_leaf(&self, root: NodeIdx, bbox: &Aabb2D<T>) -> NodeIdx {
        let mut cur = root;
        loop {
            let Entries::Branch(children) = &self.nodes[cur.get()].entries else {
                return cur;
            };
            let mut best: Option<(T::Acc, T::Acc, NodeIdx)> = None;
            for &c in children {
                let cb = self.nodes[c.get()].bbox;
                let a = area(&cb);
                let grow = area(&union_aabb(cb, *bbox)) - a;
                let better = match best {
                    None => true,
                    Some((bg, ba, _)) => grow < bg || (grow == bg && a < ba),
                };
                if better {
                    best = Some((grow, a, c));
                }
            }
            match best {
                Some((_, _, c)) => cur = c,
                None => return cur,
            }
        }
    }

    /// Point the entries of `owner` back at it after they moved.
    fn adopt(&mut self, owner: NodeIdx) {
        let children = match &self.nodes[owner.get()].entries {
            Entries::Leaf(slots) => {
                for &s in slots {
                    if let Some(e) = self.slots.get_mut(s).and_then(Option::as_mut) {
                        e.leaf = owner;
                    }
                }
                return;
            }
            Entries::Branch(children) => children.clone(),
        };
        for c in children {
            self.nodes[c.get()].parent = Some(owner);
        }
    }

    /// Split an overflowing node in two; returns the new right sibling.
    fn split(&mut self, idx: NodeIdx) -> NodeIdx {
        let entries = core::mem::replace(
            &mut self.nodes[idx.get()].entries,
            Entries::Leaf(Vec::new()),
        );
        let (left, right) = match entries {
            Entries::Leaf(slots) => {
                let items: Vec<(usize, Aabb2D<T>)> = slots
                    .iter()
                    .filter_map(|&s| self.slot(s).map(|e| (s, e.bbox)))
                    .collect();
                let (l, r) = sah_partition(items, self.min_children);
                (Entries::Leaf(l), Entries::Leaf(r))
            }
            Entries::Branch(children) => {
                let items: Vec<(NodeIdx, Aabb2D<T>)> = children
                    .iter()
                    .map(|&c| (c, self.nodes[c.get()].bbox))
                    .collect();
                let (l, r) = sah_partition(items, self.min_children);
                (Entries::Branch(l), Entries::Branch(r))
            }
        };
        let parent = self.nodes[idx.get()].parent;
        let bbox = self.nodes[idx.get()].bbox;
        self.nodes[idx.get()].entries = left;
        let sibling = self.alloc(RNode {
            bbox,
            parent,
            entries: right,
        });
        self.adopt(sibling);
        for n in [idx, sibling] {
            if let Some(bb) = self.compute_bbox(n) {
                self.nodes[n.get()].bbox = bb;
            }
        }
        sibling
    }

    /// Grow ancestors to cover `aabb` and split any node that overflowed.
    fn grow_and_split(&mut self, leaf: NodeIdx, aabb: Aabb2D<T>) {
        let mut cur = Some(leaf);
        while let Some(i) = cur {
            let n = &mut self.nodes[i.get()];
            n.bbox = union_aabb(n.bbox, aabb);
            cur = n.parent;
        }

        let mut cur = leaf;
        while self.nodes[cur.get()].entries.len() > self.max_children {
            let sibling = self.split(cur);
            if let Some(parent) = self.nodes[cur.get()].parent {
                if let Entries::Branch(children) = &mut self.nodes[parent.get()].entries {
                    let at = children
                        .iter()
                        .position(|c| *c == cur)
                        .map_or(children.len(), |p| p + 1);
                    children.insert(at, sibling);
                }
                cur = parent;
            } else {
                let bbox = union_aabb(self.nodes[cur.get()].bbox, self.nodes[sibling.get()].bbox);
                let root = self.alloc(RNode {
                    bbox,
                    parent: None,
                    entries: Entries::Branch(vec![cur, sibling]),
                });
                self.nodes[cur.get()].parent = Some(root);
                self.nodes[sibling.get()].parent = Some(root);
                self.root = Some(root);
                break;
            }
        }
    }

    /// Prune empty nodes on the way up, refit the rest, then collapse a single-child root.
    fn condense(&mut self, start: NodeIdx) {
        let mut cur = Some(start);
        while let Some(i) = cur {
            let parent = self.nodes[i.get()].parent;
            if self.nodes[i.get()].entries.len() == 0 {
                if let Some(p) = parent {
                    if let Entries::Branch(children) = &mut self.nodes[p.get()].entries {
                        children.retain(|c| *c != i);
                    }
                } else {
                    self.root = None;
                }
                self.free(i);
            } else if let Some(bb) = self.compute_bbox(i) {
                self.nodes[i.get()].bbox = bb;
            }
            cur = parent;
        }
        while let Some(root) = self.root {
            let only = match &self.nodes[root.get()].entries {
                Entries::Branch(children) if children.len() == 1 => children[0],
                _ => break,
            };
            self.nodes[only.get()].parent = None;
            self.free(root);
            self.root = Some(only);
        }
    }

    fn collect(&self, hit: impl Fn(&Aabb2D<T>) -> bool) -> Vec<usize> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let n = &self.nodes[i.get()];
            if !hit(&n.bbox) {
                continue;
            }
            match &n.entries {
                Entries::Leaf(slots) => out.extend(
                    slots
                        .iter()
                        .copied()
                        .filter(|&s| self.slot(s).is_some_and(|e| hit(&e.bbox))),
                ),
                Entries::Branch(children) => stack.extend(children.iter().copied()),
            }
        }
        out
    }
}

fn fold_boxes<T: Scalar>(mut it: impl Iterator<Item = Aabb2D<T>>) -> Option<Aabb2D<T>> {
    let first = it.next()?;
    Some(it.fold(first, union_aabb))
}

fn centroid<T: Scalar>(b: &Aabb2D<T>, axis: usize) -> T {
    if axis == 0 {
        T::mid(b.min_x, b.max_x)
    } else {
        T::mid(b.min_y, b.max_y)
    }
}

fn sort_along<E, T: Scalar>(items: &mut [(E, Aabb2D<T>)], axis: usize) {
    items.sort_by(|a, b| {
        centroid(&a.1, axis)
            .partial_cmp(&centroid(&b.1, axis))
            .unwrap_or(Ordering::Equal)
    });
}

/// SAH-like partition: pick the axis and split point `k` minimizing
/// `area(LB_k) * k + area(RB_k) * (n - k)`, keeping `min` entries per side.
fn sah_partition<E: Copy, T: Scalar>(
    mut items: Vec<(E, Aabb2D<T>)>,
    min: usize,
) -> (Vec<E>, Vec<E>) {
    let n = items.len();
    if n < 2 {
        return (items.into_iter().map(|(e, _)| e).collect(), Vec::new());
    }
    let min = min.clamp(1, n / 2);
    let mut best: Option<(T::Acc, usize, usize)> = None;
    for axis in 0..2 {
        sort_along(&mut items, axis);

        let mut prefix = Vec::with_capacity(n);
        let mut acc = items[0].1;
        for (_, b) in &items {
            acc = union_aabb(acc, *b);
            prefix.push(acc);
        }
        let mut suffix = vec![items[n - 1].1; n];
        let mut acc = items[n - 1].1;
        for (dst, (_, b)) in suffix.iter_mut().zip(items.iter()).rev() {
            acc = union_aabb(acc, *b);
            *dst = acc;
        }

        for k in min..=(n - min) {
            let cost = area(&prefix[k - 1]) * T::acc_from_usize(k)
                + area(&suffix[k]) * T::acc_from_usize(n - k);
            if best.is_none_or(|(c, _, _)| cost < c) {
                best = Some((cost, axis, k));
            }
        }
    }
    let (axis, k) = best.map_or((0, n / 2), |(_, axis, k)| (axis, k));
    sort_along(&mut items, axis);
    let right = items.split_off(k);
    (
        items.into_iter().map(|(e, _)| e).collect(),
        right.into_iter().map(|(e, _)| e).collect(),
    )
}

impl<T: Scalar> Backend<T> for RTree<T> {
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>) {
        if self.slot(slot).is_some() {
            self.remove(slot);
        }
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        let Some(root) = self.root else {
            let leaf = self.alloc(RNode {
                bbox: aabb,
                parent: None,
                entries: Entries::Leaf(vec![slot]),
            });
            self.slots[slot] = Some(SlotEntry { leaf, bbox: aabb });
            self.root = Some(leaf);
            return;
        };
        let leaf = self.choose_leaf(root, &aabb);
        if let Entries::Leaf(slots) = &mut self.nodes[leaf.get()].entries {
            slots.push(slot);
        }
        self.slots[slot] = Some(SlotEntry { leaf, bbox: aabb });
        self.grow_and_split(leaf, aabb);
    }

    fn update(&mut self, slot: usize, aabb: Aabb2D<T>) {
        let Some(entry) = self.slot(slot) else {
            self.insert(slot, aabb);
            return;
        };
        if self.nodes[entry.leaf.get()].bbox.contains(&aabb) {
            // Tighten in place: the leaf already covers the new box.
            self.slots[slot] = Some(SlotEntry {
                leaf: entry.leaf,
                bbox: aabb,
            });
            self.refit_from(entry.leaf);
        } else {
            self.remove(slot);
            self.insert(slot, aabb);
        }
    }

    fn remove(&mut self, slot: usize) {
        let Some(entry) = self.slots.get_mut(slot).and_then(Option::take) else {
            return;
        };
        if let Entries::Leaf(slots) = &mut self.nodes[entry.leaf.get()].entries {
            slots.retain(|s| *s != slot);
        }
        self.condense(entry.leaf);
    }

    fn clear(&mut self) {
        self.root = None;
        self.nodes.clear();
        self.free_nodes.clear();
        self.slots.clear();
    }

    fn query_point<'a>(&'a self, x: T, y: T) -> Box<dyn Iterator<Item = usize> + 'a> {
        Box::new(self.collect(|b| b.contains_point(x, y)).into_iter())
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<T>) -> Box<dyn Iterator<Item = usize> + 'a> {
        Box::new(self.collect(|b| b.intersects(&rect)).into_iter())
    }
}

impl<T: Scalar> Debug for RTree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.slots.iter().filter(|e| e.is_some()).count();
        f.debug_struct("RTree")
            .field("max_children", &self.max_children)
            .field("min_children", &self.min_children)
            .field("arena_nodes", &(self.nodes.len() - self.free_nodes.len()))
            .field("alive", &alive)
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

/// R-tree with f32 coordinates and f64 metrics.
pub type RTreeF32 = RTree<f32>;

/// R-tree with f64 coordinates and f64 metrics.
pub type RTreeF64 = RTree<f64>;
