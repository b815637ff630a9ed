// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared helpers for the scene integration tests.

#![allow(dead_code, reason = "Each test binary uses a different subset.")]

use glint_scene::{FrameInfo, NodeId, NodeView, ParsedStyle, RenderError, Renderer, Scene, SceneConfig, ShapeKind};
use kurbo::Rect;

/// Install a logger once; `RUST_LOG=glint_scene=trace` shows scheduler decisions.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One call made to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Connect(NodeId),
    Disconnect(NodeId),
    Begin { full: bool, region: Option<Rect> },
    Node(NodeId),
    End,
}

/// Records every call; can be told to fail.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
    pub fail_on: Option<NodeId>,
    pub partial: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            partial: true,
            ..Self::default()
        }
    }

    /// Nodes drawn since the last [`clear`](Self::clear).
    pub fn drawn(&self) -> Vec<NodeId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Node(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Renderer for Recorder {
    fn supports_partial_redraw(&self) -> bool {
        self.partial
    }

    fn on_connect(&mut self, node: &NodeView<'_>) -> Result<(), RenderError> {
        self.calls.push(Call::Connect(node.id()));
        Ok(())
    }

    fn on_disconnect(&mut self, id: NodeId) -> Result<(), RenderError> {
        self.calls.push(Call::Disconnect(id));
        Ok(())
    }

    fn begin_frame(&mut self, frame: &FrameInfo) -> Result<(), RenderError> {
        self.calls.push(Call::Begin {
            full: frame.full_redraw,
            region: frame.dirty_region,
        });
        Ok(())
    }

    fn render_node(&mut self, node: &NodeView<'_>, _style: &ParsedStyle, _bounds: Rect) -> Result<(), RenderError> {
        if self.fail_on.take() == Some(node.id()) {
            return Err(RenderError::new("device lost"));
        }
        self.calls.push(Call::Node(node.id()));
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.calls.push(Call::End);
        Ok(())
    }
}

pub fn scene(width: f64, height: f64) -> Scene {
    init_logging();
    Scene::new(SceneConfig::with_size(width, height))
}

/// An attached, filled circle.
pub fn circle(scene: &mut Scene, parent: NodeId, cx: f64, cy: f64, r: f64) -> NodeId {
    let c = scene.create_node(ShapeKind::Circle);
    scene
        .set_attributes(
            c,
            [
                ("cx", cx.to_string()),
                ("cy", cy.to_string()),
                ("r", r.to_string()),
                ("fill", "black".to_owned()),
            ],
        )
        .unwrap();
    scene.append_child(parent, c).unwrap();
    c
}

/// An attached, filled rect.
pub fn rect(scene: &mut Scene, parent: NodeId, r: Rect) -> NodeId {
    let n = scene.create_node(ShapeKind::Rect);
    scene
        .set_attributes(
            n,
            [
                ("x", r.x0.to_string()),
                ("y", r.y0.to_string()),
                ("width", r.width().to_string()),
                ("height", r.height().to_string()),
                ("fill", "black".to_owned()),
            ],
        )
        .unwrap();
    scene.append_child(parent, n).unwrap();
    n
}
