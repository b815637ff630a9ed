// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build a small scene and watch the scheduler choose between full and
//! partial redraws.
//!
//! Run:
//! - `RUST_LOG=info cargo run -p glint_demos --example scene_basics`
//! - `RUST_LOG=glint_scene=trace` also shows the scheduler's own decisions.

use glint_scene::{
    FrameInfo, NodeView, ParsedStyle, RenderError, Renderer, Scene, SceneConfig, SceneError, ShapeKind,
};
use kurbo::Rect;
use log::info;

/// Logs every call instead of drawing.
#[derive(Debug, Default)]
struct LogRenderer;

impl Renderer for LogRenderer {
    fn on_connect(&mut self, node: &NodeView<'_>) -> Result<(), RenderError> {
        info!("connect {:?} ({:?})", node.id(), node.kind());
        Ok(())
    }

    fn begin_frame(&mut self, frame: &FrameInfo) -> Result<(), RenderError> {
        match frame.dirty_region {
            Some(region) => info!("frame {}: clear {region:?}", frame.frame),
            None => info!("frame {}: clear {}x{}", frame.frame, frame.width, frame.height),
        }
        Ok(())
    }

    fn render_node(&mut self, node: &NodeView<'_>, _style: &ParsedStyle, bounds: Rect) -> Result<(), RenderError> {
        let fill = node.used("fill").and_then(|v| v.as_color());
        info!("  draw {:?} {:?} in {bounds:?}, fill {fill:?}", node.id(), node.kind());
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

fn main() -> Result<(), SceneError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut scene = Scene::new(SceneConfig::with_size(320.0, 200.0));
    let root = scene.root();
    let layer = scene.create_node(ShapeKind::Group);
    scene.append_child(root, layer)?;
    scene.set_attributes(layer, [("fill", "teal"), ("stroke", "black"), ("line-width", "2")])?;

    let sun = scene.create_node(ShapeKind::Circle);
    scene.set_attributes(sun, [("cx", "60"), ("cy", "60"), ("r", "calc(10% + 4px)"), ("fill", "gold")])?;
    scene.append_child(layer, sun)?;

    let ground = scene.create_node(ShapeKind::Rect);
    scene.set_attributes(ground, [("x", "0"), ("y", "150"), ("width", "100%"), ("height", "50")])?;
    scene.append_child(layer, ground)?;

    let label = scene.create_node(ShapeKind::Text);
    scene.set_attributes(label, [("x", "200"), ("y", "40"), ("text", "noon"), ("font-size", "20px")])?;
    scene.append_child(layer, label)?;

    let mut renderer = LogRenderer;
    let report = scene.tick(&mut renderer)?;
    info!("first frame: {:?}", report.full_redraw);

    // One node moves: only its old and new area is repainted.
    scene.set_attribute(sun, "cx", "90")?;
    let report = scene.tick(&mut renderer)?;
    info!("after move: region {:?}, {} node(s)", report.region, report.rendered.len());

    // An inherited property touches every descendant.
    scene.set_attribute(layer, "line-width", "4")?;
    let report = scene.tick(&mut renderer)?;
    info!("after restyle: {:?}", report.full_redraw);

    let report = scene.tick(&mut renderer)?;
    info!("idle frame skipped: {}", report.skipped);
    Ok(())
}
