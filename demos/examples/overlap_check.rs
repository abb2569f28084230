// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlap check.
//!
//! Index the bounding boxes of a few strokes in an R-tree and list the pairs
//! whose boxes overlap, e.g. to decide which strokes may bleed into each other.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p pentrace_demos --example overlap_check`

use kurbo::{Point, Rect};
use pentrace_index::{IndexError, RTreeF64};

fn stroke_bounds(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

fn main() -> Result<(), IndexError> {
    env_logger::init();

    let strokes = [
        ("outline", vec![Point::new(0.0, 0.0), Point::new(80.0, 0.0), Point::new(80.0, 60.0)]),
        ("hatch-1", vec![Point::new(10.0, 10.0), Point::new(30.0, 30.0)]),
        ("hatch-2", vec![Point::new(20.0, 10.0), Point::new(40.0, 30.0)]),
        ("label", vec![Point::new(120.0, 5.0), Point::new(150.0, 5.0)]),
        ("dot", vec![Point::new(79.0, 59.0)]),
    ];

    let mut tree = RTreeF64::new(4)?;
    for (name, points) in strokes {
        let Some(bounds) = stroke_bounds(&points) else {
            continue;
        };
        tree.insert(bounds.into(), name)?;
    }
    log::debug!("indexed {} strokes, tree height {}", tree.len(), tree.height());

    for (name, bounds) in tree.entries() {
        let mut others: Vec<_> = tree
            .query(bounds)?
            .into_iter()
            .filter(|other| *other != name)
            .collect();
        others.sort_unstable();
        println!("{name:>8} overlaps {others:?}");
    }

    // A pen-down region far from everything.
    let clear = tree.query(Rect::new(200.0, 200.0, 210.0, 210.0).into())?;
    println!("strokes near (200, 200): {clear:?}");
    Ok(())
}
