// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector versus R-tree on the workloads the scene produces.

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glint_index::{Aabb2D, Backend, Index, IndexGeneric};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        ((x >> 11) as f64) / ((1u64 << 53) as f64)
    }
}

fn grid(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            out.push(Aabb2D::from_xywh(x as f64 * cell, y as f64 * cell, cell, cell));
        }
    }
    out
}

fn scattered(count: usize, extent: f64, size: f64) -> Vec<Aabb2D<f64>> {
    let mut rng = Rng(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * (extent - size);
            let y0 = rng.next_f64() * (extent - size);
            Aabb2D::from_xywh(x0, y0, size, size)
        })
        .collect()
}

fn fill<B: Backend<f64>>(idx: &mut IndexGeneric<f64, u32, B>, rects: &[Aabb2D<f64>]) {
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = idx.insert(r, i as u32);
    }
    let _ = idx.take_damage();
}

fn bench_build_and_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_query");
    let viewport = Aabb2D::from_xywh(100.0, 100.0, 400.0, 400.0);
    for &n in &[16usize, 32, 64] {
        let rects = grid(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("flatvec_n{n}"), |b| {
            b.iter_batched(
                Index::<f64, u32>::new,
                |mut idx| {
                    fill(&mut idx, &rects);
                    black_box(idx.query_rect(viewport).count());
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("rtree_n{n}"), |b| {
            b.iter_batched(
                Index::<f64, u32>::with_rtree,
                |mut idx| {
                    fill(&mut idx, &rects);
                    black_box(idx.query_rect(viewport).count());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_move_and_pick(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_pick");
    let rects = scattered(4_000, 2_000.0, 12.0);
    let mut flat = Index::<f64, u32>::new();
    let mut tree = Index::<f64, u32>::with_rtree();
    let flat_keys: Vec<_> = rects.iter().enumerate().map(|(i, r)| flat.insert(*r, i as u32)).collect();
    let tree_keys: Vec<_> = rects.iter().enumerate().map(|(i, r)| tree.insert(*r, i as u32)).collect();

    // A tenth of the boxes shift each frame, then the pointer is hit-tested.
    group.bench_function("flatvec", |b| {
        let mut rng = Rng(7);
        b.iter(|| {
            for key in flat_keys.iter().step_by(10) {
                let dx = rng.next_f64() * 4.0;
                if let Some((aabb, _)) = flat.get(*key) {
                    flat.update(*key, Aabb2D::new(aabb.min_x + dx, aabb.min_y, aabb.max_x + dx, aabb.max_y));
                }
            }
            black_box(flat.take_damage());
            black_box(flat.query_point(1_000.0, 1_000.0).count());
        });
    });
    group.bench_function("rtree", |b| {
        let mut rng = Rng(7);
        b.iter(|| {
            for key in tree_keys.iter().step_by(10) {
                let dx = rng.next_f64() * 4.0;
                if let Some((aabb, _)) = tree.get(*key) {
                    tree.update(*key, Aabb2D::new(aabb.min_x + dx, aabb.min_y, aabb.max_x + dx, aabb.max_y));
                }
            }
            black_box(tree.take_damage());
            black_box(tree.query_point(1_000.0, 1_000.0).count());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build_and_query, bench_move_and_pick);
criterion_main!(benches);
