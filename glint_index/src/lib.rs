// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glint Index: a keyed 2D AABB index for culling and picking.
//!
//! - Insert, update, and remove axis-aligned bounding boxes (AABBs) with small payloads.
//! - Query by point or intersecting rectangle.
//! - Every mutation is applied immediately; the regions it touched are accumulated
//!   as [`Damage`] until the caller drains them with [`IndexGeneric::take_damage`].
//!
//! It is generic over the scalar type `T` and does not depend on any geometry crate.
//! The scene layer computes world-space render bounds and feeds them here.
//!
//! Backends are pluggable through [`Backend`]. The default is a flat vector
//! (linear scan); [`RTree`] is the general-purpose choice for scenes with more
//! than a few dozen nodes.
//!
//! # Example
//!
//! ```rust
//! use glint_index::{Aabb2D, Index};
//!
//! let mut idx = Index::<f64, u32>::with_rtree();
//! let a = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 1);
//! let _b = idx.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0), 2);
//! let _ = idx.take_damage();
//!
//! // Move the first box; the old and new regions show up as damage.
//! idx.update(a, Aabb2D::new(20.0, 0.0, 30.0, 10.0));
//! let damage = idx.take_damage();
//! assert_eq!(damage.moved.len(), 1);
//!
//! let hits: Vec<_> = idx.query_point(6.0, 6.0).collect();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].1, 2);
//! ```
//!
//! ## Choosing a backend
//!
//! - `FlatVec` (default): smallest, linear scans. Good for tiny sets or when
//!   updates vastly outnumber queries.
//! - `RTreeF32`/`RTreeF64`: R-tree with SAH-like splits, parent links and
//!   in-place tightening. Removal is a single leaf-to-root walk.
//!   See the [`backends`] docs for the split heuristic.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs. A box whose maximum is below its minimum is
//! empty: it can be stored, but never matches a query.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod damage;
pub mod index;
pub mod types;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::rtree::{RTree, RTreeF32, RTreeF64};
pub use damage::Damage;
pub use index::{Index, IndexGeneric, Key, RTreeIndex};
pub use types::{Aabb2D, Scalar};
