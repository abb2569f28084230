// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pentrace_index::{Aabb2D, FlatVec, GridF64, Point2D, RTree, RTreeF64, RTreeI64};

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

fn gen_grid_rects_i64(n: usize, cell: i64) -> Vec<Aabb2D<i64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as i64 * cell;
            let y0 = y as i64 * cell;
            out.push(Aabb2D::<i64>::from_xywh(x0, y0, cell, cell));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// Bounding boxes of short strokes scattered over a sheet, like a hatched drawing.
fn gen_stroke_rects(count: usize, sheet: f64, max_len: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let x0 = rng.next_f64() * sheet;
        let y0 = rng.next_f64() * sheet;
        let w = rng.next_f64() * max_len;
        let h = rng.next_f64() * max_len;
        out.push(Aabb2D::<f64>::from_xywh(x0, y0, w, h));
    }
    out
}

fn gen_clustered_points(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Point2D<f64>> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((rng.next_f64() * 2000.0, rng.next_f64() * 2000.0));
    }
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            out.push(Point2D::new(cx + dx, cy + dy));
        }
    }
    out
}

fn bench_flatvec(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatvec");
    for &n in &[32usize, 64] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("insert_query_rect_n{}", n), |b| {
            b.iter_batched(
                FlatVec::<f64, u32>::default,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(r, i as u32);
                    }
                    let hits = idx
                        .query(Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0))
                        .map_or(0, |v| v.len());
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_rtree_f64(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_f64");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("insert_query_rect_n{}", n), |b| {
            b.iter_batched(
                RTreeF64::<u32>::default,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(r, i as u32);
                    }
                    let hits = idx
                        .query(Aabb2D::new(100.0, 100.0, 500.0, 500.0))
                        .map_or(0, |v| v.len());
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("bulk_load_query_rect_n{}", n), |b| {
            b.iter_batched(
                || {
                    rects
                        .iter()
                        .copied()
                        .enumerate()
                        .map(|(i, r)| (r, i as u32))
                        .collect::<Vec<_>>()
                },
                |entries| {
                    let Ok(idx) = RTree::bulk_load(8, entries) else {
                        return;
                    };
                    let hits = idx
                        .query(Aabb2D::new(100.0, 100.0, 500.0, 500.0))
                        .map_or(0, |v| v.len());
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    let rects = gen_stroke_rects(8192, 2000.0, 40.0);
    for &fanout in &[4usize, 8, 16, 32] {
        group.bench_function(format!("insert_strokes_fanout{}", fanout), |b| {
            b.iter_batched(
                || RTreeF64::<u32>::new(fanout).unwrap(),
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(r, i as u32);
                    }
                    black_box(idx.height());
                },
                BatchSize::SmallInput,
            )
        });
    }
    let mut tree = RTreeF64::<u32>::default();
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = tree.insert(r, i as u32);
    }
    group.bench_function("query_strokes_overlap", |b| {
        b.iter(|| {
            let mut hits = 0;
            for r in rects.iter().step_by(64) {
                hits += tree.query(*r).map_or(0, |v| v.len());
            }
            black_box(hits)
        })
    });
    group.finish();
}

fn bench_rtree_i64(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_i64");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects_i64(n, 10);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("insert_remove_rect_n{}", n), |b| {
            b.iter_batched(
                RTreeI64::<u32>::default,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(r, i as u32);
                    }
                    for i in (0..rects.len()).step_by(2) {
                        let _ = idx.remove(&(i as u32));
                    }
                    let hits = idx.query(Aabb2D::new(100, 100, 500, 500)).map_or(0, |v| v.len());
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_grid_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_nearest");
    let points = gen_clustered_points(40, 200, 80.0);
    let queries = gen_clustered_points(10, 50, 400.0);
    group.throughput(Throughput::Elements(queries.len() as u64));
    for &cell in &[5.0, 20.0, 80.0] {
        let grid =
            GridF64::from_points(cell, points.iter().copied().zip(0_u32..)).expect("valid points");
        group.bench_function(format!("nearest_cell{}", cell), |b| {
            b.iter(|| {
                for q in &queries {
                    black_box(grid.nearest(*q).ok().flatten());
                }
            })
        });
        group.bench_function(format!("within_radius_cell{}", cell), |b| {
            b.iter(|| {
                let mut hits = 0;
                for q in &queries {
                    hits += grid.within_radius(*q, 25.0).map_or(0, |v| v.len());
                }
                black_box(hits)
            })
        });
    }
    group.bench_function("nearest_linear_scan", |b| {
        b.iter(|| {
            for q in &queries {
                let best = points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| ((p.x - q.x).powi(2) + (p.y - q.y).powi(2), i))
                    .min_by(|a, b| a.0.total_cmp(&b.0));
                black_box(best);
            }
        })
    });
    group.bench_function("greedy_path_order", |b| {
        b.iter_batched(
            || GridF64::from_points(20.0, points.iter().copied().zip(0_u32..)).expect("valid points"),
            |mut grid| {
                let mut pen = Point2D::new(0.0, 0.0);
                while let Ok(Some((id, at))) = grid.nearest_entry(pen) {
                    grid.remove(&id);
                    pen = at;
                }
                black_box(pen);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_flatvec,
    bench_rtree_f64,
    bench_rtree_i64,
    bench_grid_nearest,
);
criterion_main!(benches);
