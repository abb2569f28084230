// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Toolpath ordering.
//!
//! Greedy reordering of pen strokes to cut pen-up travel. Both ends of every
//! stroke go into a point grid under the stroke's index; at each step the pen
//! moves to the closest remaining end, draws that stroke (reversed if the
//! matched end was its last point) and removes both of its ends.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p pentrace_demos --example toolpath_order`

use kurbo::{Line, Point};
use pentrace_index::{GridF64, IndexError, Point2D};

fn pen_up_travel(order: &[(usize, bool)], strokes: &[Line]) -> f64 {
    let mut pen = Point::ORIGIN;
    let mut total = 0.0;
    for &(i, reversed) in order {
        let Line { p0, p1 } = strokes[i];
        let (start, end) = if reversed { (p1, p0) } else { (p0, p1) };
        total += pen.distance(start);
        pen = end;
    }
    total
}

fn main() -> Result<(), IndexError> {
    env_logger::init();

    // A ladder of rungs, drawn in a wasteful order.
    let strokes: Vec<Line> = (0..12)
        .map(|i| {
            let y = f64::from((i * 7) % 12) * 10.0;
            Line::new((0.0, y), (50.0, y))
        })
        .collect();

    let mut ends = GridF64::new(20.0)?;
    for (i, line) in strokes.iter().enumerate() {
        ends.insert(line.p0.into(), i)?;
        ends.insert(line.p1.into(), i)?;
    }

    let mut order = Vec::with_capacity(strokes.len());
    let mut pen = Point2D::new(0.0, 0.0);
    while let Some((i, at)) = ends.nearest_entry(pen)? {
        let line = strokes[i];
        let reversed = Point::new(at.x, at.y) == line.p1 && line.p0 != line.p1;
        ends.remove(&i);
        pen = if reversed { line.p0.into() } else { line.p1.into() };
        order.push((i, reversed));
    }

    let given: Vec<_> = (0..strokes.len()).map(|i| (i, false)).collect();
    println!("order: {order:?}");
    println!(
        "pen-up travel: {:.1} as given, {:.1} reordered",
        pen_up_travel(&given, &strokes),
        pen_up_travel(&order, &strokes)
    );
    Ok(())
}
