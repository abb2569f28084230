// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector rectangle index with linear scans.
//!
//! Small and simple; good for tiny sets, and the exhaustive reference the
//! R-tree is checked against.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::RectIndex;
use crate::error::{IndexError, Result};
use crate::types::{Aabb2D, Point2D, Scalar};

/// Flat vector of `(id, rectangle)` pairs in insertion order.
pub struct FlatVec<T: Scalar, I> {
    entries: Vec<(I, Aabb2D<T>)>,
}

impl<T: Scalar, I> Default for FlatVec<T, I> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Scalar, I> Debug for FlatVec<T, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlatVec")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<T: Scalar, I: PartialEq + Clone> FlatVec<T, I> {
    /// Store `aabb` under `id`; fails on malformed geometry or a duplicate id.
    pub fn insert(&mut self, aabb: Aabb2D<T>, id: I) -> Result<()> {
        aabb.validate()?;
        if self.entries.iter().any(|(e, _)| *e == id) {
            return Err(IndexError::DuplicateId);
        }
        self.entries.push((id, aabb));
        Ok(())
    }

    /// Remove the rectangle stored under `id`, returning it.
    pub fn remove(&mut self, id: &I) -> Option<Aabb2D<T>> {
        let pos = self.entries.iter().position(|(e, _)| e == id)?;
        Some(self.entries.remove(pos).1)
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored rectangles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of all rectangles intersecting `rect`, in insertion order.
    pub fn query(&self, rect: Aabb2D<T>) -> Result<Vec<I>> {
        rect.validate()?;
        Ok(self
            .entries
            .iter()
            .filter(|(_, a)| a.intersects(&rect))
            .map(|(id, _)| id.clone())
            .collect())
    }

    /// Ids of all rectangles containing the point, in insertion order.
    pub fn query_point(&self, x: T, y: T) -> Result<Vec<I>> {
        Point2D::new(x, y).validate()?;
        Ok(self
            .entries
            .iter()
            .filter(|(_, a)| a.contains_point(x, y))
            .map(|(id, _)| id.clone())
            .collect())
    }
}

impl<T: Scalar, I: PartialEq + Clone> RectIndex<T, I> for FlatVec<T, I> {
    fn insert(&mut self, aabb: Aabb2D<T>, id: I) -> Result<()> {
        Self::insert(self, aabb, id)
    }

    fn remove(&mut self, id: &I) -> Option<Aabb2D<T>> {
        Self::remove(self, id)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn query(&self, rect: Aabb2D<T>) -> Result<Vec<I>> {
        Self::query(self, rect)
    }

    fn query_point(&self, x: T, y: T) -> Result<Vec<I>> {
        Self::query_point(self, x, y)
    }
}
