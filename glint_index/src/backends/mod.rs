// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `flatvec`: flat vector with linear scans (small, simple).
//! - `rtree`: R-tree (`T: Scalar`) with parent links and an SAH-like split
//!   (aliases: `RTreeF32`, `RTreeF64`).
//!
//! SAH note
//! --------
//! When a node overflows, its entries are sorted along each axis by centroid and
//! every split point `k` is scored as
//!
//! `cost(k) = area(LB_k) * k + area(RB_k) * (n - k)`
//!
//! where `LB_k` and `RB_k` bound the first `k` and remaining `n - k` entries.
//! Prefix/suffix boxes make each axis O(n). Areas use the widened accumulator.

pub mod flatvec;
pub mod rtree;
