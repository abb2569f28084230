// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trait shared by rectangle indexes.

use alloc::vec::Vec;

use crate::error::Result;
use crate::types::Aabb2D;

/// A rectangle index: rectangles tagged with caller-supplied identifiers,
/// queried by intersection.
///
/// Identifiers are opaque; they are only compared and cloned into results.
pub trait RectIndex<T, I> {
    /// Store `aabb` under `id`.
    ///
    /// Fails without mutating the index on malformed geometry or when `id` is
    /// already stored.
    fn insert(&mut self, aabb: Aabb2D<T>, id: I) -> Result<()>;

    /// Remove the rectangle stored under `id`, returning it.
    fn remove(&mut self, id: &I) -> Option<Aabb2D<T>>;

    /// Remove everything.
    fn clear(&mut self);

    /// Number of stored rectangles.
    fn len(&self) -> usize;

    /// Whether nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all rectangles intersecting `rect` (touching counts), in no
    /// particular order.
    fn query(&self, rect: Aabb2D<T>) -> Result<Vec<I>>;

    /// Ids of all rectangles containing the point, in no particular order.
    fn query_point(&self, x: T, y: T) -> Result<Vec<I>>;
}
