// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree over `T: Scalar` rectangles tagged with caller ids.
//!
//! Nodes live in an arena and refer to their children by handle; there are no
//! parent links. Insertion descends by least area enlargement and splits
//! overflowing nodes on the way back up. Removal prunes nodes that become empty
//! but never merges underfull ones.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::backend::RectIndex;
use crate::error::{IndexError, Result};
use crate::types::{Aabb2D, Point2D, Scalar, area, lt, margin, union_aabb};

/// Fanout used by [`RTree::default`].
pub const DEFAULT_MAX_FANOUT: usize = 8;

/// Largest accepted fanout.
pub const MAX_FANOUT_LIMIT: usize = 1024;

/// R-tree mapping caller ids to rectangles, answering intersection queries.
///
/// Each id is stored at most once. See the [module docs](self) for the
/// structural rules.
pub struct RTree<T: Scalar, I> {
    max_fanout: usize,
    min_fill: usize,
    root: Option<NodeIdx>,
    arena: Arena<T>,
    slots: Vec<Option<Slot<T, I>>>,
    free_slots: Vec<usize>,
    by_id: BTreeMap<I, usize>,
}

#[derive(Clone, Debug)]
struct Slot<T, I> {
    id: I,
    bbox: Aabb2D<T>,
}

#[derive(Clone, Debug)]
struct RNode<T> {
    bbox: Aabb2D<T>,
    leaf: bool,
    children: Vec<RChild<T>>,
}

#[derive(Copy, Clone, Debug)]
enum RChild<T> {
    Node(NodeIdx),
    Item { slot: usize, bbox: Aabb2D<T> },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

// (sum of areas, sum of margins), compared lexicographically.
type SplitCost<T> = (<T as Scalar>::Acc, <T as Scalar>::Acc);

fn cheaper<A: PartialOrd>(a: &(A, A), b: &(A, A)) -> bool {
    lt(&a.0, &b.0) || (a.0 == b.0 && lt(&a.1, &b.1))
}

/// Node storage with recycling of pruned nodes.
#[derive(Clone, Debug)]
struct Arena<T> {
    nodes: Vec<RNode<T>>,
    free: Vec<NodeIdx>,
}

impl<T: Scalar> Arena<T> {
    const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    fn alloc(&mut self, node: RNode<T>) -> NodeIdx {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx.get()] = node;
            idx
        } else {
            self.nodes.push(node);
            NodeIdx::new(self.nodes.len() - 1)
        }
    }

    fn release(&mut self, idx: NodeIdx) {
        self.nodes[idx.get()].children = Vec::new();
        self.free.push(idx);
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
    }

    fn live(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn node(&self, idx: NodeIdx) -> &RNode<T> {
        &self.nodes[idx.get()]
    }

    fn node_mut(&mut self, idx: NodeIdx) -> &mut RNode<T> {
        &mut self.nodes[idx.get()]
    }

    fn child_bbox(&self, c: &RChild<T>) -> Aabb2D<T> {
        match c {
            RChild::Node(i) => self.node(*i).bbox,
            RChild::Item { bbox, .. } => *bbox,
        }
    }

    fn children_bbox(&self, children: &[RChild<T>]) -> Option<Aabb2D<T>> {
        let mut it = children.iter();
        let first = self.child_bbox(it.next()?);
        Some(it.fold(first, |acc, c| union_aabb(acc, self.child_bbox(c))))
    }
}

impl<T: Scalar, I: Ord + Clone> Default for RTree<T, I> {
    fn default() -> Self {
        Self::with_fanout(DEFAULT_MAX_FANOUT)
    }
}

impl<T: Scalar, I: Ord + Clone> RTree<T, I> {
    /// Create an empty tree whose nodes hold at most `max_fanout` entries.
    ///
    /// Fails with [`IndexError::InvalidConfiguration`] unless
    /// `2 <= max_fanout <= MAX_FANOUT_LIMIT`.
    pub fn new(max_fanout: usize) -> Result<Self> {
        Self::check_fanout(max_fanout)?;
        Ok(Self::with_fanout(max_fanout))
    }

    fn check_fanout(max_fanout: usize) -> Result<()> {
        if max_fanout < 2 {
            return Err(IndexError::InvalidConfiguration(
                "max fanout must be at least 2",
            ));
        }
        if max_fanout > MAX_FANOUT_LIMIT {
            return Err(IndexError::InvalidConfiguration(
                "max fanout exceeds MAX_FANOUT_LIMIT",
            ));
        }
        Ok(())
    }

    const fn with_fanout(max_fanout: usize) -> Self {
        Self {
            max_fanout,
            min_fill: max_fanout / 2,
            root: None,
            arena: Arena::new(),
            slots: Vec::new(),
            free_slots: Vec::new(),
            by_id: BTreeMap::new(),
        }
    }

    /// Build a packed tree from `entries` in one pass.
    ///
    /// Uses sort-tile-recursive packing: leaves are cut from x-centroid slices
    /// sorted by y-centroid, and parents are packed the same way until a single
    /// root remains. Every entry is validated (and ids checked for duplicates)
    /// before any node is built. The result accepts further inserts and removals.
    pub fn bulk_load(
        max_fanout: usize,
        entries: impl IntoIterator<Item = (Aabb2D<T>, I)>,
    ) -> Result<Self> {
        let mut tree = Self::new(max_fanout)?;
        let mut items: Vec<(usize, Aabb2D<T>)> = Vec::new();
        for (bbox, id) in entries {
            bbox.validate()?;
            if tree.by_id.contains_key(&id) {
                return Err(IndexError::DuplicateId);
            }
            let slot = tree.slots.len();
            tree.by_id.insert(id.clone(), slot);
            tree.slots.push(Some(Slot { id, bbox }));
            items.push((slot, bbox));
        }
        tree.root = Self::bulk_build_nodes(&mut tree.arena, &mut items, max_fanout);
        log::debug!(
            "rtree bulk load: {} entries, height {}, {} nodes",
            items.len(),
            tree.height(),
            tree.arena.live()
        );
        Ok(tree)
    }

    fn bulk_build_nodes(
        arena: &mut Arena<T>,
        items: &mut [(usize, Aabb2D<T>)],
        max_fanout: usize,
    ) -> Option<NodeIdx> {
        if items.is_empty() {
            return None;
        }

        // Leaf level
        let n = items.len();
        let gx = Self::tiles_per_side(n.div_ceil(max_fanout));
        items.sort_by(|a, b| {
            a.1.centroid_x()
                .partial_cmp(&b.1.centroid_x())
                .unwrap_or(Ordering::Equal)
        });
        let mut level: Vec<NodeIdx> = Vec::new();
        for slice in items.chunks_mut(n.div_ceil(gx)) {
            slice.sort_by(|a, b| {
                a.1.centroid_y()
                    .partial_cmp(&b.1.centroid_y())
                    .unwrap_or(Ordering::Equal)
            });
            for chunk in slice.chunks(max_fanout) {
                let children: Vec<RChild<T>> = chunk
                    .iter()
                    .map(|&(slot, bbox)| RChild::Item { slot, bbox })
                    .collect();
                level.push(Self::alloc_packed(arena, children, true));
            }
        }

        // Promote until the level fits under one root
        while level.len() > max_fanout {
            let n_nodes = level.len();
            let gx = Self::tiles_per_side(n_nodes.div_ceil(max_fanout));
            level.sort_by(|&a, &b| {
                arena
                    .node(a)
                    .bbox
                    .centroid_x()
                    .partial_cmp(&arena.node(b).bbox.centroid_x())
                    .unwrap_or(Ordering::Equal)
            });
            let mut next: Vec<NodeIdx> = Vec::new();
            for slice in level.chunks_mut(n_nodes.div_ceil(gx)) {
                slice.sort_by(|&a, &b| {
                    arena
                        .node(a)
                        .bbox
                        .centroid_y()
                        .partial_cmp(&arena.node(b).bbox.centroid_y())
                        .unwrap_or(Ordering::Equal)
                });
                for chunk in slice.chunks(max_fanout) {
                    let children = chunk.iter().copied().map(RChild::Node).collect();
                    next.push(Self::alloc_packed(arena, children, false));
                }
            }
            level = next;
        }

        if level.len() == 1 {
            Some(level[0])
        } else {
            let children = level.into_iter().map(RChild::Node).collect();
            Some(Self::alloc_packed(arena, children, false))
        }
    }

    fn tiles_per_side(num_nodes: usize) -> usize {
        let mut gx = 1_usize;
        while gx * gx < num_nodes {
            gx += 1;
        }
        gx
    }

    fn alloc_packed(arena: &mut Arena<T>, children: Vec<RChild<T>>, leaf: bool) -> NodeIdx {
        let bbox = arena
            .children_bbox(&children)
            .unwrap_or(Aabb2D::new(T::zero(), T::zero(), T::zero(), T::zero()));
        arena.alloc(RNode {
            bbox,
            leaf,
            children,
        })
    }

    /// Store `bbox` under `id`.
    ///
    /// Fails with [`IndexError::InvalidGeometry`] for a malformed rectangle and
    /// [`IndexError::DuplicateId`] if `id` is already stored; in both cases the
    /// tree is left untouched.
    pub fn insert(&mut self, bbox: Aabb2D<T>, id: I) -> Result<()> {
        bbox.validate()?;
        if self.by_id.contains_key(&id) {
            return Err(IndexError::DuplicateId);
        }
        let slot = self.alloc_slot(Slot {
            id: id.clone(),
            bbox,
        });
        self.by_id.insert(id, slot);

        let Some(root) = self.root else {
            let leaf = RNode {
                bbox,
                leaf: true,
                children: vec![RChild::Item { slot, bbox }],
            };
            self.root = Some(self.arena.alloc(leaf));
            return Ok(());
        };
        let split = Self::insert_node(
            &mut self.arena,
            root,
            slot,
            bbox,
            self.max_fanout,
            self.min_fill,
        );
        if let Some(right) = split {
            // Root split: grow by one level.
            let bbox = union_aabb(self.arena.node(root).bbox, self.arena.node(right).bbox);
            let new_root = self.arena.alloc(RNode {
                bbox,
                leaf: false,
                children: vec![RChild::Node(root), RChild::Node(right)],
            });
            self.root = Some(new_root);
            log::debug!("rtree root split, height now {}", self.height());
        }
        Ok(())
    }

    fn alloc_slot(&mut self, entry: Slot<T, I>) -> usize {
        if let Some(slot) = self.free_slots.pop() {
            self.slots[slot] = Some(entry);
            slot
        } else {
            self.slots.push(Some(entry));
            self.slots.len() - 1
        }
    }

    /// Insert below `node`. Returns the new right sibling if `node` split.
    fn insert_node(
        arena: &mut Arena<T>,
        node: NodeIdx,
        slot: usize,
        bbox: Aabb2D<T>,
        max_fanout: usize,
        min_fill: usize,
    ) -> Option<NodeIdx> {
        if arena.node(node).leaf {
            let n = arena.node_mut(node);
            n.children.push(RChild::Item { slot, bbox });
            n.bbox = union_aabb(n.bbox, bbox);
            if n.children.len() <= max_fanout {
                return None;
            }
        } else {
            let idx = Self::choose_child(arena, &arena.node(node).children, &bbox);
            let RChild::Node(child) = arena.node(node).children[idx] else {
                return None;
            };
            let split = Self::insert_node(arena, child, slot, bbox, max_fanout, min_fill);
            let n = arena.node_mut(node);
            n.bbox = union_aabb(n.bbox, bbox);
            let right = split?;
            n.children.insert(idx + 1, RChild::Node(right));
            if n.children.len() <= max_fanout {
                return None;
            }
        }
        Some(Self::split_node(arena, node, min_fill))
    }

    /// Least-enlargement child selection. Ties go to the smaller resulting
    /// area, then to the earlier child.
    fn choose_child(arena: &Arena<T>, children: &[RChild<T>], bbox: &Aabb2D<T>) -> usize {
        let mut best_idx = 0_usize;
        let mut best_cost: Option<SplitCost<T>> = None;
        for (i, c) in children.iter().enumerate() {
            let cb = arena.child_bbox(c);
            let grown = area(&union_aabb(cb, *bbox));
            let cost = (T::acc_sub(grown, area(&cb)), grown);
            if best_cost.as_ref().is_none_or(|bc| cheaper(&cost, bc)) {
                best_cost = Some(cost);
                best_idx = i;
            }
        }
        best_idx
    }

    /// Split an overflowing node in place; the returned node holds the right half.
    fn split_node(arena: &mut Arena<T>, node: NodeIdx, min_fill: usize) -> NodeIdx {
        let old = arena.node(node).bbox;
        let leaf = arena.node(node).leaf;
        let mut left = core::mem::take(&mut arena.node_mut(node).children);
        let right = Self::split_children(arena, &mut left, min_fill);
        let l_bbox = arena.children_bbox(&left).unwrap_or(old);
        let r_bbox = arena.children_bbox(&right).unwrap_or(old);
        log::trace!(
            "rtree split {} node: {} | {}",
            if leaf { "leaf" } else { "internal" },
            left.len(),
            right.len()
        );
        *arena.node_mut(node) = RNode {
            bbox: l_bbox,
            leaf,
            children: left,
        };
        arena.alloc(RNode {
            bbox: r_bbox,
            leaf,
            children: right,
        })
    }

    /// Partition `children` into two non-empty runs along one axis.
    ///
    /// For each axis, children are stably sorted by centroid and every cut `k`
    /// with at least `min_fill` children per side is scored by
    /// `(area(L) + area(R), margin(L) + margin(R))`. The first cheapest cut
    /// wins (x before y, smaller `k` first). `children` keeps the left run and
    /// the right run is returned.
    fn split_children(
        arena: &Arena<T>,
        children: &mut Vec<RChild<T>>,
        min_fill: usize,
    ) -> Vec<RChild<T>> {
        let n = children.len();
        let min_fill = min_fill.clamp(1, (n / 2).max(1));
        let boxes: Vec<Aabb2D<T>> = children.iter().map(|c| arena.child_bbox(c)).collect();

        let mut best: Option<(SplitCost<T>, Axis, usize)> = None;
        for axis in [Axis::X, Axis::Y] {
            let order = Self::centroid_order(&boxes, axis);

            // Prefix and suffix bounding boxes make each cut O(1) to score.
            let mut prefix: Vec<Aabb2D<T>> = Vec::with_capacity(n);
            for &i in &order {
                let bb = prefix.last().map_or(boxes[i], |p| union_aabb(*p, boxes[i]));
                prefix.push(bb);
            }
            let mut suffix: Vec<Aabb2D<T>> = Vec::with_capacity(n);
            for &i in order.iter().rev() {
                let bb = suffix.last().map_or(boxes[i], |s| union_aabb(boxes[i], *s));
                suffix.push(bb);
            }
            suffix.reverse();

            for k in min_fill..=(n - min_fill) {
                let (lb, rb) = (prefix[k - 1], suffix[k]);
                let cost = (
                    T::acc_add(area(&lb), area(&rb)),
                    T::acc_add(margin(&lb), margin(&rb)),
                );
                if best.as_ref().is_none_or(|(bc, _, _)| cheaper(&cost, bc)) {
                    best = Some((cost, axis, k));
                }
            }
        }

        let (axis, k) = best.map_or((Axis::X, n / 2), |(_, axis, k)| (axis, k));
        let order = Self::centroid_order(&boxes, axis);
        let mut taken: Vec<Option<RChild<T>>> =
            core::mem::take(children).into_iter().map(Some).collect();
        let mut ordered: Vec<RChild<T>> = order.iter().filter_map(|&i| taken[i].take()).collect();
        let right = ordered.split_off(k);
        *children = ordered;
        right
    }

    fn centroid_order(boxes: &[Aabb2D<T>], axis: Axis) -> Vec<usize> {
        let mut order: Vec<usize> = (0..boxes.len()).collect();
        order.sort_by(|&a, &b| {
            let (ca, cb) = match axis {
                Axis::X => (boxes[a].centroid_x(), boxes[b].centroid_x()),
                Axis::Y => (boxes[a].centroid_y(), boxes[b].centroid_y()),
            };
            ca.partial_cmp(&cb).unwrap_or(Ordering::Equal)
        });
        order
    }

    /// Remove the rectangle stored under `id`, returning it.
    ///
    /// Nodes emptied by the removal are pruned and their arena slots recycled;
    /// underfull nodes are left as they are.
    pub fn remove(&mut self, id: &I) -> Option<Aabb2D<T>> {
        let slot = self.by_id.remove(id)?;
        let entry = self.slots.get_mut(slot)?.take()?;
        self.free_slots.push(slot);
        if self.by_id.is_empty() {
            self.clear();
            return Some(entry.bbox);
        }
        if let Some(root) = self.root {
            let found = Self::search_remove(&mut self.arena, root, slot, &entry.bbox);
            debug_assert!(found, "stored rectangle must be reachable from the root");
        }
        Some(entry.bbox)
    }

    /// Remove the item for `slot`, descending only into nodes whose bbox
    /// intersects `target`. Recomputes bboxes along the path.
    fn search_remove(arena: &mut Arena<T>, node: NodeIdx, slot: usize, target: &Aabb2D<T>) -> bool {
        if !arena.node(node).bbox.intersects(target) {
            return false;
        }
        if arena.node(node).leaf {
            let Some(pos) = arena
                .node(node)
                .children
                .iter()
                .position(|c| matches!(c, RChild::Item { slot: s, .. } if *s == slot))
            else {
                return false;
            };
            arena.node_mut(node).children.remove(pos);
            if let Some(bb) = arena.children_bbox(&arena.node(node).children) {
                arena.node_mut(node).bbox = bb;
            }
            return true;
        }

        let child_nodes: Vec<(usize, NodeIdx)> = arena
            .node(node)
            .children
            .iter()
            .enumerate()
            .filter_map(|(pos, c)| match c {
                RChild::Node(i) => Some((pos, *i)),
                RChild::Item { .. } => None,
            })
            .collect();
        for (pos, child) in child_nodes {
            if Self::search_remove(arena, child, slot, target) {
                if arena.node(child).children.is_empty() {
                    arena.node_mut(node).children.remove(pos);
                    arena.release(child);
                }
                if let Some(bb) = arena.children_bbox(&arena.node(node).children) {
                    arena.node_mut(node).bbox = bb;
                }
                return true;
            }
        }
        false
    }

    /// Ids of all stored rectangles intersecting `rect`, in no particular order.
    ///
    /// Touching edges count as intersecting. An empty tree yields an empty
    /// result; a malformed `rect` is [`IndexError::InvalidGeometry`].
    pub fn query(&self, rect: Aabb2D<T>) -> Result<Vec<I>> {
        rect.validate()?;
        Ok(self.search(|bbox| bbox.intersects(&rect)))
    }

    /// Ids of all stored rectangles containing the point, in no particular order.
    pub fn query_point(&self, x: T, y: T) -> Result<Vec<I>> {
        Point2D::new(x, y).validate()?;
        Ok(self.search(|bbox| bbox.contains_point(x, y)))
    }

    /// Depth-first search pruning every subtree whose bbox fails `hit`.
    ///
    /// `hit` must be monotone: if it holds for a box it holds for any box
    /// enclosing it.
    fn search(&self, hit: impl Fn(&Aabb2D<T>) -> bool) -> Vec<I> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let n = self.arena.node(i);
            if !hit(&n.bbox) {
                continue;
            }
            for c in &n.children {
                match c {
                    RChild::Node(ci) => stack.push(*ci),
                    RChild::Item { slot, bbox } => {
                        if hit(bbox)
                            && let Some(Some(entry)) = self.slots.get(*slot)
                        {
                            out.push(entry.id.clone());
                        }
                    }
                }
            }
        }
        out
    }

    /// The rectangle stored under `id`.
    pub fn get(&self, id: &I) -> Option<Aabb2D<T>> {
        let slot = *self.by_id.get(id)?;
        self.slots.get(slot)?.as_ref().map(|e| e.bbox)
    }

    /// Whether `id` is stored.
    pub fn contains(&self, id: &I) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of stored rectangles.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Maximum number of entries per node.
    pub fn max_fanout(&self) -> usize {
        self.max_fanout
    }

    /// Bounding box of everything stored, or `None` when empty.
    pub fn bounds(&self) -> Option<Aabb2D<T>> {
        self.root.map(|r| self.arena.node(r).bbox)
    }

    /// Number of levels: 0 when empty, 1 when the root is a leaf.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut cur = self.root;
        while let Some(i) = cur {
            height += 1;
            let n = self.arena.node(i);
            cur = match n.children.first() {
                Some(RChild::Node(ci)) if !n.leaf => Some(*ci),
                _ => None,
            };
        }
        height
    }

    /// All stored `(id, rectangle)` pairs, in slot order.
    pub fn entries(&self) -> impl Iterator<Item = (I, Aabb2D<T>)> + '_ {
        self.slots
            .iter()
            .flatten()
            .map(|e| (e.id.clone(), e.bbox))
    }

    /// Remove everything, keeping the configured fanout.
    pub fn clear(&mut self) {
        self.root = None;
        self.arena.clear();
        self.slots.clear();
        self.free_slots.clear();
        self.by_id.clear();
    }
}

impl<T: Scalar, I: Ord + Clone> RectIndex<T, I> for RTree<T, I> {
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

impl<T: Scalar, I> Debug for RTree<T, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let has_root = self.root.is_some();
        f.debug_struct("RTree")
            .field("max_fanout", &self.max_fanout)
            .field("min_fill", &self.min_fill)
            .field("arena_nodes", &self.arena.nodes.len())
            .field("free_nodes", &self.arena.free.len())
            .field("entries", &self.by_id.len())
            .field("has_root", &has_root)
            .finish_non_exhaustive()
    }
}

/// R-tree with i64 coordinates and i128 metrics.
pub type RTreeI64<I> = RTree<i64, I>;

/// R-tree with f32 coordinates and f64 metrics.
pub type RTreeF32<I> = RTree<f32, I>;

/// R-tree with f64 coordinates and f64 metrics.
pub type RTreeF64<I> = RTree<f64, I>;
