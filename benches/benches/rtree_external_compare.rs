// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pentrace_index::{Aabb2D, GridF64, Point2D, RTreeF64};

use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb2D::<f64>::from_xywh(x0, y0, cell, cell));
        }
    }
    out
}

fn to_rstar_rects(v: &[Aabb2D<f64>]) -> Vec<Rectangle<[f64; 2]>> {
    v.iter()
        .map(|r| Rectangle::from_corners([r.min_x, r.min_y], [r.max_x, r.max_y]))
        .collect()
}

fn bench_rtree_external_compare_f64(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_external_compare_f64");
    for &n in &[64usize, 128] {
        let rects = gen_grid_rects(n, 10.0);
        let aabb_query = Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0);
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("pentrace_build_query_n{}", n), |b| {
            b.iter_batched(
                RTreeF64::<u32>::default,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(r, i as u32);
                    }
                    let hits = idx.query(aabb_query).map_or(0, |v| v.len());
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("pentrace_build_query_bulk_n{}", n), |b| {
            b.iter_batched(
                || {
                    let entries: Vec<_> = rects
                        .iter()
                        .copied()
                        .enumerate()
                        .map(|(i, r)| (r, i as u32))
                        .collect();
                    entries
                },
                |entries| {
                    let Ok(idx) = RTreeF64::bulk_load(8, entries) else {
                        return;
                    };
                    let hits = idx.query(aabb_query).map_or(0, |v| v.len());
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("rstar_build_query_bulk_n{}", n), |b| {
            b.iter_batched(
                || to_rstar_rects(&rects),
                |rectangles| {
                    let tree = RTree::bulk_load(rectangles);
                    let aabb = AABB::from_corners(
                        [aabb_query.min_x, aabb_query.min_y],
                        [aabb_query.max_x, aabb_query.max_y],
                    );
                    let hits: usize = tree.locate_in_envelope_intersecting(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_nearest_external_compare_f64(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_external_compare_f64");
    let points: Vec<[f64; 2]> = (0..4096)
        .map(|i| {
            let t = i as f64;
            [(t * 37.0) % 2000.0, (t * 91.0) % 2000.0]
        })
        .collect();
    let queries: Vec<[f64; 2]> = (0..256)
        .map(|i| {
            let t = i as f64;
            [(t * 53.0) % 2100.0 - 50.0, (t * 29.0) % 2100.0 - 50.0]
        })
        .collect();
    group.throughput(Throughput::Elements(queries.len() as u64));

    let grid = GridF64::from_points(
        30.0,
        points.iter().map(|p| Point2D::new(p[0], p[1])).zip(0_u32..),
    )
    .expect("valid points");
    group.bench_function("pentrace_grid_nearest", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(grid.nearest(Point2D::new(q[0], q[1])).ok().flatten());
            }
        })
    });

    let tree = RTree::bulk_load(points.clone());
    group.bench_function("rstar_nearest", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(tree.nearest_neighbor(q));
            }
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_rtree_external_compare_f64,
    bench_nearest_external_compare_f64
);
criterion_main!(benches);
