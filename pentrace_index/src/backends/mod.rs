// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle index implementations behind [`RectIndex`](crate::RectIndex).
//!
//! - `rtree`: generic R-tree (`T: Scalar`) with least-enlargement insertion
//!   (aliases: `RTreeI64`, `RTreeF32`, `RTreeF64`).
//! - `flatvec`: flat vector with linear scans (small, simple, exhaustive).
//!
//! Split note
//! ----------
//! An overflowing R-tree node holding `n` children is cut in two along one axis.
//! For each axis the children are sorted by centroid, and each cut `k` (at least
//! `max_fanout / 2` children per side) is scored by
//!
//! `cost(k) = (area(LB_k) + area(RB_k), margin(LB_k) + margin(RB_k))`
//!
//! where `LB_k` and `RB_k` bound the first `k` and remaining `n - k` children.
//! Costs compare lexicographically, so the margin only matters between equal
//! areas (e.g. for point-like boxes). All cuts of an axis are scored in O(n)
//! using prefix/suffix bounding boxes. Metrics use widened accumulators
//! (`f32`→`f64`, `f64`→`f64`, `i64`→`i128`).

pub mod flatvec;
pub mod rtree;
