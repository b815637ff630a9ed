// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bookkeeping for properties that point at other nodes.
//!
//! Every `(referrer, property)` pair points at no more than one target. The
//! reverse map lets a mutation of the target dirty every referrer in the same
//! tick. All operations are idempotent.

use std::collections::{BTreeSet, HashMap};

use crate::types::NodeId;

#[derive(Clone, Debug, Default)]
pub(crate) struct RefTable {
    by_target: HashMap<NodeId, BTreeSet<(NodeId, &'static str)>>,
    by_referrer: HashMap<(NodeId, &'static str), NodeId>,
}

impl RefTable {
    /// Point `(referrer, property)` at `target`, replacing any previous target.
    pub(crate) fn set(&mut self, referrer: NodeId, property: &'static str, target: NodeId) {
        if let Some(prev) = self.by_referrer.insert((referrer, property), target)
            && prev != target
        {
            self.unlink(prev, referrer, property);
        }
        self.by_target
            .entry(target)
            .or_default()
            .insert((referrer, property));
    }

    /// Forget whatever `(referrer, property)` pointed at.
    pub(crate) fn clear_property(&mut self, referrer: NodeId, property: &'static str) {
        if let Some(prev) = self.by_referrer.remove(&(referrer, property)) {
            self.unlink(prev, referrer, property);
        }
    }

    /// Forget every reference held by `referrer`.
    pub(crate) fn clear_referrer(&mut self, referrer: NodeId) {
        let held: Vec<_> = self
            .by_referrer
            .keys()
            .filter(|(r, _)| *r == referrer)
            .copied()
            .collect();
        for (r, property) in held {
            self.clear_property(r, property);
        }
    }

    /// Nodes (with the property) that reference `target`, in id order.
    pub(crate) fn referrers(&self, target: NodeId) -> Vec<(NodeId, &'static str)> {
        self.by_target
            .get(&target)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Drop every reference to `target`, returning the former referrers.
    pub(crate) fn remove_target(&mut self, target: NodeId) -> Vec<(NodeId, &'static str)> {
        let Some(set) = self.by_target.remove(&target) else {
            return Vec::new();
        };
        for key in &set {
            self.by_referrer.remove(key);
        }
        set.into_iter().collect()
    }

    fn unlink(&mut self, target: NodeId, referrer: NodeId, property: &'static str) {
        if let Some(set) = self.by_target.get_mut(&target) {
            set.remove(&(referrer, property));
            if set.is_empty() {
                self.by_target.remove(&target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retargeting_moves_the_referrer() {
        let (a, b, t1, t2) = (
            NodeId::new(1, 1),
            NodeId::new(2, 1),
            NodeId::new(3, 1),
            NodeId::new(4, 1),
        );
        let mut refs = RefTable::default();
        refs.set(a, "clip-path", t1);
        refs.set(a, "clip-path", t1);
        refs.set(b, "marker-end", t1);
        assert_eq!(refs.referrers(t1), vec![(a, "clip-path"), (b, "marker-end")]);

        refs.set(a, "clip-path", t2);
        assert_eq!(refs.referrers(t1), vec![(b, "marker-end")]);
        assert_eq!(refs.referrers(t2), vec![(a, "clip-path")]);

        refs.clear_referrer(b);
        refs.clear_referrer(b);
        assert!(refs.referrers(t1).is_empty());
    }

    #[test]
    fn removing_a_target_releases_referrers() {
        let (a, t) = (NodeId::new(1, 1), NodeId::new(2, 1));
        let mut refs = RefTable::default();
        refs.set(a, "clip-path", t);
        assert_eq!(refs.remove_target(t), vec![(a, "clip-path")]);
        assert!(refs.remove_target(t).is_empty());
        // The referrer side was released too, so re-pointing does not resurrect `t`.
        refs.clear_property(a, "clip-path");
        assert!(refs.referrers(t).is_empty());
    }
}
