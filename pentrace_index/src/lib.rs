// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pentrace Index: in-memory spatial indexes for pen-plotter path planning.
//!
//! Two independent structures, both generic over the scalar type `T`
//! (`f32`, `f64` or `i64`) and over a caller-chosen identifier type `I`:
//!
//! - [`RTree`]: stores axis-aligned rectangles and answers "which stored
//!   rectangles intersect this one?" (for overlap and occlusion checks between
//!   path bounding boxes).
//! - [`PointGrid`]: stores points on a uniform grid and answers "which stored
//!   point is nearest?" and "which points lie within this radius?" (for picking
//!   the next path to draw).
//!
//! Both are single-threaded, in-memory, and do not depend on any geometry crate.
//! With the `kurbo` feature, `kurbo::Rect` and `kurbo::Point` convert into
//! [`Aabb2D`] and [`Point2D`].
//!
//! # Example
//!
//! ```rust
//! use pentrace_index::{Aabb2D, RTreeF64};
//!
//! let mut tree = RTreeF64::default();
//! tree.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), "A").unwrap();
//! tree.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0), "B").unwrap();
//! tree.insert(Aabb2D::new(20.0, 20.0, 30.0, 30.0), "C").unwrap();
//!
//! let mut hits = tree.query(Aabb2D::new(4.0, 4.0, 6.0, 6.0)).unwrap();
//! hits.sort_unstable();
//! assert_eq!(hits, ["A", "B"]);
//! assert!(tree.query(Aabb2D::new(100.0, 100.0, 101.0, 101.0)).unwrap().is_empty());
//! ```
//!
//! Nearest neighbors come from the grid; ties go to the point inserted first:
//!
//! ```rust
//! use pentrace_index::{GridF64, Point2D};
//!
//! let mut grid = GridF64::new(10.0).unwrap();
//! grid.insert(Point2D::new(0.0, 0.0), "P1").unwrap();
//! grid.insert(Point2D::new(1.0, 1.0), "P2").unwrap();
//! grid.insert(Point2D::new(50.0, 50.0), "P3").unwrap();
//!
//! assert_eq!(grid.nearest(Point2D::new(0.5, 0.5)).unwrap(), Some("P1"));
//! assert_eq!(grid.nearest(Point2D::new(49.0, 49.0)).unwrap(), Some("P3"));
//! assert_eq!(grid.within_radius(Point2D::new(0.0, 0.0), 2.0).unwrap(), ["P1", "P2"]);
//! ```
//!
//! ## Choosing parameters
//!
//! - R-tree fanout: [`DEFAULT_MAX_FANOUT`] suits a few thousand boxes. Larger
//!   fanouts make shallower trees with wider nodes to scan. [`RTree::bulk_load`]
//!   packs a known set in one pass and gives tighter nodes than repeated inserts.
//! - Grid cell size: near the usual query radius, or the typical distance
//!   between neighboring path ends. Cells far smaller than the spacing make
//!   nearest searches walk many empty rings.
//!
//! ### Float semantics
//!
//! Non-finite coordinates are rejected with [`IndexError::InvalidGeometry`].
//! Areas and squared distances use widened accumulators (f32→f64, f64→f64,
//! i64→i128). The `i64` accumulator saturates instead of
//! overflowing, so metrics past `i128::MAX` compare equal.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod error;
pub mod grid;
pub mod types;

pub use backend::RectIndex;
pub use backends::flatvec::FlatVec;
pub use backends::rtree::{
    DEFAULT_MAX_FANOUT, MAX_FANOUT_LIMIT, RTree, RTreeF32, RTreeF64, RTreeI64,
};
pub use error::{IndexError, Result};
pub use grid::{GridF32, GridF64, GridI64, PointGrid};
pub use types::{Aabb2D, Point2D, Scalar};
