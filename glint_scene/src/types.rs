// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, shape kinds, lifecycle and dirty flags.

use glint_style::ObjectRef;

/// Identifier for a node in a [`Scene`](crate::Scene).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On [`destroy`](crate::Scene::destroy), the slot is freed; every `NodeId` that
///   pointed to it is now stale and calls with it fail with
///   [`SceneError::UseAfterDestroy`](crate::SceneError::UseAfterDestroy).
/// - On reuse of a freed slot, its generation is incremented, producing a new,
///   distinct `NodeId`.
///
/// Stale ids never alias a different live node because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// The handle style values use to point at this node.
    ///
    /// Pass it as a [`RawValue::Ref`](glint_style::RawValue::Ref) to reference
    /// properties such as `clip-path`; it prints as `ref(N)`.
    pub const fn object_ref(self) -> ObjectRef {
        ObjectRef(((self.1 as u64) << 32) | self.0 as u64)
    }

    /// Recover a node id from an object handle.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Object handles pack two 32-bit halves."
    )]
    pub const fn from_object_ref(r: ObjectRef) -> Self {
        Self(r.0 as u32, (r.0 >> 32) as u32)
    }
}

impl From<NodeId> for ObjectRef {
    fn from(id: NodeId) -> Self {
        id.object_ref()
    }
}

/// Shape tag of a display object. Selects the geometry strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// No geometry of its own; groups children.
    Group,
    /// `cx`, `cy`, `r`
    Circle,
    /// `cx`, `cy`, `rx`, `ry`
    Ellipse,
    /// `x`, `y`, `width`, `height`, corner radius `rx`
    Rect,
    /// `x1`, `y1`, `x2`, `y2`
    Line,
    /// Open `points`
    Polyline,
    /// Closed `points`
    Polygon,
    /// SVG path data in `d`
    Path,
    /// `text` laid out at `x`, `y`
    Text,
    /// `src` placed at `x`, `y`, `width`, `height`
    Image,
}

/// Lifecycle state of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Created, or not connected to the scene root.
    Detached,
    /// Connected to the scene root: indexed and known to the renderer.
    Attached,
    /// Terminal. The id is stale.
    Destroyed,
}

bitflags::bitflags! {
    /// Work pending on a node until the next flush.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        /// Used values need recalculation.
        const STYLE     = 0b0000_0001;
        /// Geometry or render bounds need recomputation.
        const BOUNDS    = 0b0000_0010;
        /// World transform needs recomputation (for the whole subtree).
        const TRANSFORM = 0b0000_0100;
        /// The node needs repainting.
        const RENDER    = 0b0000_1000;
        /// Children paint order needs re-sorting.
        const ORDER     = 0b0001_0000;
    }
}

impl DirtyFlags {
    /// Everything a freshly created node needs.
    pub const FRESH: Self = Self::STYLE
        .union(Self::BOUNDS)
        .union(Self::TRANSFORM)
        .union(Self::RENDER)
        .union(Self::ORDER);
}
