// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame cost of a scene: partial redraws, full redraws and picking.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glint_scene::{FrameInfo, NodeId, NodeView, ParsedStyle, RenderError, Renderer, Scene, SceneConfig, ShapeKind};
use kurbo::{Point, Rect};

/// Counts nodes and does nothing else.
#[derive(Debug, Default)]
struct Null(usize);

impl Renderer for Null {
    fn begin_frame(&mut self, _: &FrameInfo) -> Result<(), RenderError> {
        Ok(())
    }

    fn render_node(&mut self, _: &NodeView<'_>, _: &ParsedStyle, _: Rect) -> Result<(), RenderError> {
        self.0 += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// `side * side` circles under a handful of groups.
fn build(side: usize) -> (Scene, Vec<NodeId>) {
    let mut scene = Scene::new(SceneConfig::with_size(1_000.0, 1_000.0));
    let root = scene.root();
    let mut circles = Vec::with_capacity(side * side);
    for row in 0..side {
        let group = scene.create_node(ShapeKind::Group);
        scene.append_child(root, group).unwrap();
        scene.set_attribute(group, "fill", "steelblue").unwrap();
        for col in 0..side {
            let c = scene.create_node(ShapeKind::Circle);
            let step = 1_000.0 / side as f64;
            scene
                .set_attributes(
                    c,
                    [
                        ("cx", (step * (col as f64 + 0.5)).to_string()),
                        ("cy", (step * (row as f64 + 0.5)).to_string()),
                        ("r", (step * 0.4).to_string()),
                    ],
                )
                .unwrap();
            scene.append_child(group, c).unwrap();
            circles.push(c);
        }
    }
    (scene, circles)
}

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("frames");
    for &side in &[10usize, 30] {
        let (mut scene, circles) = build(side);
        let mut r = Null::default();
        scene.tick(&mut r).unwrap();

        group.bench_function(format!("idle_{side}"), |b| {
            b.iter(|| black_box(scene.tick(&mut r).unwrap().skipped));
        });

        let mut flip = false;
        group.bench_function(format!("one_moved_{side}"), |b| {
            b.iter(|| {
                flip = !flip;
                let r_value = if flip { "3" } else { "4" };
                scene.set_attribute(circles[0], "r", r_value).unwrap();
                black_box(scene.tick(&mut r).unwrap().rendered.len());
            });
        });

        let root = scene.root();
        group.bench_function(format!("inherited_change_{side}"), |b| {
            b.iter(|| {
                flip = !flip;
                let width = if flip { "2" } else { "1" };
                scene.set_attribute(root, "line-width", width).unwrap();
                black_box(scene.tick(&mut r).unwrap().full_redraw);
            });
        });

        group.bench_function(format!("pick_{side}"), |b| {
            b.iter(|| black_box(scene.pick(Point::new(501.0, 499.0))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
