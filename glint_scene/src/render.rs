// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render contract between the scene and a drawing backend.
//!
//! The scene never draws. Each [`Scene::tick`](crate::Scene::tick) drives a
//! [`Renderer`] through one frame:
//!
//! ```text
//! on_disconnect / on_connect   (queued lifecycle notices)
//! begin_frame(&FrameInfo)
//! render_node(..)              (once per visible node in the region, in paint order)
//! end_frame()
//! ```
//!
//! Canvas, SVG and GPU backends and test doubles all implement this trait.

use kurbo::{Affine, Rect};

use crate::error::RenderError;
use crate::geometry::Geometry;
use crate::scene::Scene;
use crate::style::{ParsedStyle, StyleReader, TextMetrics, UsedValue};
use crate::types::{NodeId, ShapeKind};

/// Description of the frame being drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameInfo {
    /// Frame counter, starting at 1.
    pub frame: u64,
    /// Canvas width in CSS pixels.
    pub width: f64,
    /// Canvas height in CSS pixels.
    pub height: f64,
    /// Device pixels per CSS pixel.
    pub device_pixel_ratio: f64,
    /// Whether the whole canvas is redrawn.
    pub full_redraw: bool,
    /// Region to clear and redraw, in CSS pixels. `None` for full redraws.
    pub dirty_region: Option<Rect>,
}

/// A drawing backend.
pub trait Renderer {
    /// Whether the backend can clip drawing to a dirty region.
    fn supports_partial_redraw(&self) -> bool {
        true
    }

    /// A node joined the scene.
    fn on_connect(&mut self, _node: &NodeView<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    /// A node left the scene (or was destroyed).
    fn on_disconnect(&mut self, _id: NodeId) -> Result<(), RenderError> {
        Ok(())
    }

    /// Start a frame: clear the dirty region (or everything).
    fn begin_frame(&mut self, frame: &FrameInfo) -> Result<(), RenderError>;

    /// Draw one node. `render_bounds` is its world-space render box.
    fn render_node(
        &mut self,
        node: &NodeView<'_>,
        style: &ParsedStyle,
        render_bounds: Rect,
    ) -> Result<(), RenderError>;

    /// Finish the frame.
    fn end_frame(&mut self) -> Result<(), RenderError>;
}

/// Read-only view of one node, handed to the [`Renderer`].
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    pub(crate) scene: &'a Scene,
    pub(crate) id: NodeId,
}

impl core::fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeView")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

impl<'a> NodeView<'a> {
    /// The node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Its shape kind.
    pub fn kind(&self) -> ShapeKind {
        self.scene
            .nodes
            .get(self.id)
            .map_or(ShapeKind::Group, |n| n.kind)
    }

    /// Its parent.
    pub fn parent(&self) -> Option<NodeId> {
        self.scene.nodes.get(self.id).and_then(|n| n.parent)
    }

    /// Effective style.
    pub fn style(&self) -> StyleReader<'a> {
        self.scene.reader(self.id)
    }

    /// Effective used value of a property.
    pub fn used(&self, name: &str) -> Option<&'a UsedValue> {
        self.scene.reader(self.id).used(name)
    }

    /// Local to world transform.
    pub fn world_transform(&self) -> Affine {
        self.scene
            .nodes
            .get(self.id)
            .map_or(Affine::IDENTITY, |n| n.world_transform)
    }

    /// Local-space geometry, if the node has any.
    pub fn geometry(&self) -> Option<&'a Geometry> {
        self.scene.nodes.get(self.id)?.geometry.as_ref()
    }

    /// Text layout, for text nodes.
    pub fn text_metrics(&self) -> Option<&'a TextMetrics> {
        self.scene.nodes.get(self.id)?.derived.text.as_ref()
    }
}
