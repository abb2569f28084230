// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Pentrace Index: rectangle queries, nearest points, removal.

use pentrace_index::{Aabb2D, GridI64, Point2D, RTreeI64};

fn main() {
    let mut tree = RTreeI64::default();
    tree.insert(Aabb2D::new(0, 0, 10, 10), 1_u32).unwrap();
    tree.insert(Aabb2D::new(5, 5, 15, 15), 2).unwrap();
    tree.insert(Aabb2D::new(20, 20, 30, 30), 3).unwrap();

    // Query a rectangle and a point
    println!("hits in (8,8)-(12,12): {:?}", tree.query(Aabb2D::new(8, 8, 12, 12)));
    println!("hits at (6,6): {:?}", tree.query_point(6, 6));

    tree.remove(&2);
    println!("after removing 2: {:?}", tree.query_point(6, 6));

    let mut grid = GridI64::new(10).unwrap();
    grid.insert(Point2D::new(0, 0), 'a').unwrap();
    grid.insert(Point2D::new(1, 1), 'b').unwrap();
    grid.insert(Point2D::new(50, 50), 'c').unwrap();
    println!("nearest to (49,49): {:?}", grid.nearest(Point2D::new(49, 49)));
    println!("within 2 of (0,0): {:?}", grid.within_radius(Point2D::new(0, 0), 2));
}
