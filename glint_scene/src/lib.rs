// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glint Scene: a renderer-agnostic, retained 2D scene graph.
//!
//! A [`Scene`] owns a tree of styled display objects (circles, rects, paths,
//! text, images and groups). Attributes are CSS-like values, parsed and
//! resolved through a [`PropertyRegistry`]; inherited properties flow down the
//! tree. The scene keeps world transforms, bounds and a spatial index up to
//! date, and on each [`Scene::tick`] drives a [`Renderer`] over only what
//! changed.
//!
//! - [`Scene::set_attribute`] stores a raw value, parses it and computes its used value.
//! - [`Scene::bounds`] and [`Scene::render_bounds`] recompute lazily.
//! - [`Scene::tick`] flushes dirty nodes and redraws a dirty region, or everything.
//! - [`Scene::pick`] and [`Scene::dispatch_pointer`] hit-test and route events.
//!
//! The scene never draws. Backends implement [`Renderer`].
//!
//! ```
//! use glint_scene::{
//!     FrameInfo, NodeView, ParsedStyle, RenderError, Renderer, Scene, SceneConfig, ShapeKind,
//! };
//! use glint_style::Rgba;
//! use kurbo::{Point, Rect};
//!
//! #[derive(Default)]
//! struct Count(usize);
//!
//! impl Renderer for Count {
//!     fn begin_frame(&mut self, _: &FrameInfo) -> Result<(), RenderError> {
//!         Ok(())
//!     }
//!     fn render_node(&mut self, _: &NodeView<'_>, _: &ParsedStyle, _: Rect) -> Result<(), RenderError> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//!     fn end_frame(&mut self) -> Result<(), RenderError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut scene = Scene::new(SceneConfig::with_size(200.0, 100.0));
//! let group = scene.create_node(ShapeKind::Group);
//! let circle = scene.create_node(ShapeKind::Circle);
//! scene.append_child(scene.root(), group).unwrap();
//! scene.append_child(group, circle).unwrap();
//! scene.set_attributes(circle, [("cx", "50"), ("cy", "50"), ("r", "10"), ("fill", "blue")]).unwrap();
//!
//! // `stroke` is inherited.
//! scene.set_attribute(scene.root(), "stroke", "red").unwrap();
//! let stroke = scene.used_value(circle, "stroke").unwrap().and_then(|v| v.as_color());
//! assert_eq!(stroke, Some(Rgba::new(255, 0, 0, 255)));
//!
//! // Line width 1 adds half a pixel on each side.
//! assert_eq!(scene.bounds(circle).unwrap(), Some(Rect::new(40.0, 40.0, 60.0, 60.0)));
//! assert_eq!(scene.render_bounds(circle).unwrap(), Some(Rect::new(39.5, 39.5, 60.5, 60.5)));
//!
//! let mut renderer = Count::default();
//! let report = scene.tick(&mut renderer).unwrap();
//! assert!(report.full_redraw.is_some());
//! assert_eq!(report.rendered, vec![circle]);
//!
//! assert_eq!(scene.pick(Point::new(50.0, 50.0)), Some(circle));
//! ```

mod config;
mod error;
mod event;
mod frame;
mod geometry;
mod pick;
mod refs;
mod registry;
mod render;
mod scene;
mod style;
mod types;

pub use config::{DirtyRectangleConfig, SceneConfig};
pub use error::{RenderError, SceneError};
pub use event::{Event, Listener, ListenerId, ListenerOptions, Phase, PointerKind};
pub use frame::{FrameReport, FullRedrawReason};
pub use geometry::Geometry;
pub use registry::{
    CalcContext, Calculator, PostProcessor, PropertyHandler, PropertyRegistry, TEXT_LAYOUT,
    default_calculator,
};
pub use render::{FrameInfo, NodeView, Renderer};
pub use scene::{Deferred, Scene};
pub use style::{Derived, ParsedStyle, StyleReader, TextMetrics, UsedValue};
pub use types::{DirtyFlags, Lifecycle, NodeId, ShapeKind};
