// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform point grid for nearest-neighbor and radius queries.
//!
//! The plane is cut into square cells of a fixed side. A point lives in the cell
//! `(floor(x / side), floor(y / side))`; cells are allocated on first use and
//! dropped when they empty, so storage follows the data rather than the extent.
//!
//! Queries walk square rings of cells outward from the query point's home cell
//! (ring 0 is the home cell, ring `k` the `8k` cells at Chebyshev distance `k`).
//! A nearest-neighbor search may only stop once the best distance found is
//! below the distance from the query point to the outside of the searched
//! square: a closer point can sit in a diagonal neighbor even when the home
//! cell already produced a candidate.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::{IndexError, Result};
use crate::types::{Point2D, Scalar, le, lt, max_t, min_t};

type CellKey = (i64, i64);

#[derive(Clone, Debug)]
struct GridEntry<T, I> {
    point: Point2D<T>,
    id: I,
    // Insertion order, for tie-breaks.
    seq: u64,
}

/// Bounding range of occupied cell keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct CellExtent {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl CellExtent {
    const fn at(key: CellKey) -> Self {
        Self {
            min_x: key.0,
            min_y: key.1,
            max_x: key.0,
            max_y: key.1,
        }
    }

    fn including(self, key: CellKey) -> Self {
        Self {
            min_x: self.min_x.min(key.0),
            min_y: self.min_y.min(key.1),
            max_x: self.max_x.max(key.0),
            max_y: self.max_y.max(key.1),
        }
    }

    /// First ring around `home` that can contain an occupied cell.
    fn gap(&self, home: CellKey) -> u64 {
        let axis = |c: i64, lo: i64, hi: i64| {
            if c < lo {
                lo.abs_diff(c)
            } else if c > hi {
                c.abs_diff(hi)
            } else {
                0
            }
        };
        axis(home.0, self.min_x, self.max_x).max(axis(home.1, self.min_y, self.max_y))
    }

    /// Whether every occupied cell lies within ring `ring` of `home`.
    fn within_ring(&self, home: CellKey, ring: u64) -> bool {
        [
            home.0.abs_diff(self.min_x),
            home.0.abs_diff(self.max_x),
            home.1.abs_diff(self.min_y),
            home.1.abs_diff(self.max_y),
        ]
        .into_iter()
        .all(|d| d <= ring)
    }
}

fn chebyshev(a: CellKey, b: CellKey) -> u64 {
    a.0.abs_diff(b.0).max(a.1.abs_diff(b.1))
}

fn ring_len(ring: u64) -> u64 {
    if ring == 0 { 1 } else { ring.saturating_mul(8) }
}

/// Keep the closest entry of `bucket` in `best`; equal distances keep the
/// earlier insertion.
fn consider<'a, T: Scalar, I>(
    best: &mut Option<(T::Acc, &'a GridEntry<T, I>)>,
    p: &Point2D<T>,
    bucket: &'a [GridEntry<T, I>],
) {
    for e in bucket {
        let d2 = p.distance_squared(&e.point);
        let better = match *best {
            None => true,
            Some((bd, be)) => lt(d2, bd) || (d2 == bd && e.seq < be.seq),
        };
        if better {
            *best = Some((d2, e));
        }
    }
}

/// Cells at Chebyshev distance exactly `ring` from `home`.
fn ring_cells(home: CellKey, ring: u64) -> impl Iterator<Item = CellKey> {
    let (cx, cy) = home;
    let x0 = cx.saturating_sub_unsigned(ring);
    let x1 = cx.saturating_add_unsigned(ring);
    let y0 = cy.saturating_sub_unsigned(ring);
    let y1 = cy.saturating_add_unsigned(ring);
    let top = (x0..=x1).map(move |x| (x, y0));
    let bottom = (x0..=x1).filter(move |_| ring > 0).map(move |x| (x, y1));
    let sides = (y0.saturating_add(1)..y1).flat_map(move |y| [(x0, y), (x1, y)]);
    top.chain(bottom).chain(sides)
}

/// Uniform grid of points tagged with caller ids.
///
/// An id may tag several points (for example both ends of one pen path);
/// [`PointGrid::remove`] drops all of them.
pub struct PointGrid<T: Scalar, I> {
    cell_size: T,
    cells: BTreeMap<CellKey, Vec<GridEntry<T, I>>>,
    locations: BTreeMap<I, Vec<CellKey>>,
    extent: Option<CellExtent>,
    len: usize,
    next_seq: u64,
}

impl<T: Scalar, I: Ord + Clone> PointGrid<T, I> {
    /// Create an empty grid with square cells of side `cell_size`.
    ///
    /// Pick the side near the typical query radius or nearest-neighbor spacing.
    /// Fails with [`IndexError::InvalidConfiguration`] unless the size is finite
    /// and positive.
    pub fn new(cell_size: T) -> Result<Self> {
        if !(T::is_finite(cell_size) && lt(T::zero(), cell_size)) {
            return Err(IndexError::InvalidConfiguration(
                "cell size must be finite and positive",
            ));
        }
        log::debug!("point grid with cell size {cell_size:?}");
        Ok(Self {
            cell_size,
            cells: BTreeMap::new(),
            locations: BTreeMap::new(),
            extent: None,
            len: 0,
            next_seq: 0,
        })
    }

    /// Build a grid from `(point, id)` pairs.
    pub fn from_points(
        cell_size: T,
        points: impl IntoIterator<Item = (Point2D<T>, I)>,
    ) -> Result<Self> {
        let mut grid = Self::new(cell_size)?;
        for (point, id) in points {
            grid.insert(point, id)?;
        }
        Ok(grid)
    }

    fn key_for(&self, p: &Point2D<T>) -> CellKey {
        (
            T::cell_index(p.x, self.cell_size),
            T::cell_index(p.y, self.cell_size),
        )
    }

    /// Add `point` under `id`. Fails on a non-finite coordinate.
    pub fn insert(&mut self, point: Point2D<T>, id: I) -> Result<()> {
        point.validate()?;
        let key = self.key_for(&point);
        self.cells.entry(key).or_default().push(GridEntry {
            point,
            id: id.clone(),
            seq: self.next_seq,
        });
        self.next_seq += 1;
        self.locations.entry(id).or_default().push(key);
        self.extent = Some(match self.extent {
            Some(e) => e.including(key),
            None => CellExtent::at(key),
        });
        self.len += 1;
        Ok(())
    }

    /// Remove every point tagged `id`; returns how many were removed.
    pub fn remove(&mut self, id: &I) -> usize {
        let Some(keys) = self.locations.remove(id) else {
            return 0;
        };
        let mut removed = 0;
        let mut dropped_cell = false;
        for key in keys {
            let Some(bucket) = self.cells.get_mut(&key) else {
                continue;
            };
            let before = bucket.len();
            bucket.retain(|e| e.id != *id);
            removed += before - bucket.len();
            if bucket.is_empty() {
                self.cells.remove(&key);
                dropped_cell = true;
            }
        }
        self.len -= removed;
        if dropped_cell {
            self.extent = self.occupied_extent();
        }
        removed
    }

    fn occupied_extent(&self) -> Option<CellExtent> {
        let mut keys = self.cells.keys().copied();
        let first = CellExtent::at(keys.next()?);
        Some(keys.fold(first, CellExtent::including))
    }

    /// Id of the stored point closest to `p`, or `None` when the grid is empty.
    ///
    /// Distance ties go to the point inserted first.
    pub fn nearest(&self, p: Point2D<T>) -> Result<Option<I>> {
        Ok(self.nearest_entry(p)?.map(|(id, _)| id))
    }

    /// Like [`PointGrid::nearest`], also returning which stored point matched.
    pub fn nearest_entry(&self, p: Point2D<T>) -> Result<Option<(I, Point2D<T>)>> {
        p.validate()?;
        let Some(extent) = self.extent else {
            return Ok(None);
        };
        let home = self.key_for(&p);
        let occupied = u64::try_from(self.cells.len()).unwrap_or(u64::MAX);

        let mut best: Option<(T::Acc, &GridEntry<T, I>)> = None;

        let mut ring = extent.gap(home);
        loop {
            if ring_len(ring) >= occupied {
                // The ring is wider than the set of occupied cells; finish with
                // one pass over everything not searched yet.
                for (key, bucket) in &self.cells {
                    if chebyshev(home, *key) >= ring {
                        consider(&mut best, &p, bucket);
                    }
                }
                log::trace!("grid nearest: scanned remaining cells from ring {ring}");
                break;
            }
            for key in ring_cells(home, ring) {
                if let Some(bucket) = self.cells.get(&key) {
                    consider(&mut best, &p, bucket);
                }
            }
            if extent.within_ring(home, ring) {
                break;
            }
            if let Some((d2, _)) = best
                && let Some(clear2) = self.clearance_squared(&p, home, ring)
                && lt(d2, clear2)
            {
                log::trace!("grid nearest: settled after ring {ring}");
                break;
            }
            ring += 1;
        }
        Ok(best.map(|(_, e)| (e.id.clone(), e.point)))
    }

    /// Squared distance from `p` to the outside of the square of cells within
    /// `ring` of `home`; `None` if rounding put `p` on or past that boundary.
    fn clearance_squared(&self, p: &Point2D<T>, home: CellKey, ring: u64) -> Option<T::Acc> {
        let k = i64::try_from(ring).ok()?;
        let s = T::widen(self.cell_size);
        let (px, py) = (T::widen(p.x), T::widen(p.y));
        let edge = |c: i64| T::acc_mul(T::acc_from_i64(c), s);
        let left = T::acc_sub(px, edge(home.0.saturating_sub(k)));
        let right = T::acc_sub(edge(home.0.saturating_add(k).saturating_add(1)), px);
        let top = T::acc_sub(py, edge(home.1.saturating_sub(k)));
        let bottom = T::acc_sub(edge(home.1.saturating_add(k).saturating_add(1)), py);
        let m = min_t(min_t(left, right), min_t(top, bottom));
        let zero = T::widen(T::zero());
        lt(zero, m).then(|| T::acc_mul(m, m))
    }

    /// Ids of all stored points within `radius` of `p` (inclusive), without
    /// duplicates, in id order.
    ///
    /// Fails with [`IndexError::InvalidArgument`] for a negative or non-finite
    /// radius.
    pub fn within_radius(&self, p: Point2D<T>, radius: T) -> Result<Vec<I>> {
        p.validate()?;
        if !(T::is_finite(radius) && le(T::zero(), radius)) {
            return Err(IndexError::InvalidArgument(
                "radius must be finite and non-negative",
            ));
        }
        let Some(extent) = self.extent else {
            return Ok(Vec::new());
        };
        let home = self.key_for(&p);
        let s = self.cell_size;
        let reach = [
            home.0.abs_diff(T::cell_index(T::sub(p.x, radius), s)),
            home.0.abs_diff(T::cell_index(T::add(p.x, radius), s)),
            home.1.abs_diff(T::cell_index(T::sub(p.y, radius), s)),
            home.1.abs_diff(T::cell_index(T::add(p.y, radius), s)),
        ]
        .into_iter()
        .fold(0, max_t);
        let r2 = T::acc_mul(T::widen(radius), T::widen(radius));
        let occupied = u64::try_from(self.cells.len()).unwrap_or(u64::MAX);

        let mut found = BTreeSet::new();
        let mut visit = |bucket: &Vec<GridEntry<T, I>>| {
            for e in bucket {
                if le(p.distance_squared(&e.point), r2) {
                    found.insert(e.id.clone());
                }
            }
        };

        let mut ring = extent.gap(home);
        while ring <= reach {
            if ring_len(ring) >= occupied {
                for (key, bucket) in &self.cells {
                    let d = chebyshev(home, *key);
                    if d >= ring && d <= reach {
                        visit(bucket);
                    }
                }
                break;
            }
            for key in ring_cells(home, ring) {
                if let Some(bucket) = self.cells.get(&key) {
                    visit(bucket);
                }
            }
            if extent.within_ring(home, ring) {
                break;
            }
            ring += 1;
        }
        Ok(found.into_iter().collect())
    }

    /// Whether any point is tagged `id`.
    pub fn contains(&self, id: &I) -> bool {
        self.locations.contains_key(id)
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no points are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Side length of a cell.
    pub fn cell_size(&self) -> T {
        self.cell_size
    }

    /// Number of allocated (non-empty) cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Remove all points, keeping the cell size.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.locations.clear();
        self.extent = None;
        self.len = 0;
        self.next_seq = 0;
    }
}

impl<T: Scalar, I> Debug for PointGrid<T, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PointGrid")
            .field("cell_size", &self.cell_size)
            .field("points", &self.len)
            .field("cells", &self.cells.len())
            .field("ids", &self.locations.len())
            .finish_non_exhaustive()
    }
}

/// Point grid with f32 coordinates (f64 distance math).
pub type GridF32<I> = PointGrid<f32, I>;

/// Point grid with f64 coordinates.
pub type GridF64<I> = PointGrid<f64, I>;

/// Point grid with i64 coordinates (i128 distance math).
pub type GridI64<I> = PointGrid<i64, I>;
