// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty tracking and the per-frame render scheduler.
//!
//! Each [`Scene::tick`] runs the same fixed passes:
//!
//! 0. deliver queued connect and disconnect notices,
//! 1. take this frame's dirty set and run `before_render` hooks, whose
//!    mutations land in the next frame's set,
//! 2. flush styles, transforms, bounds, index entries and paint order,
//! 3. compute the redraw region from the previous and current render boxes of
//!    dirty nodes plus the regions of removed nodes, clipped to the viewport,
//! 4. skip the frame if nothing changed, otherwise decide between a partial
//!    and a full redraw and drive the [`Renderer`],
//! 5. record what was painted and clear the flushed set.

use std::collections::HashSet;

use glint_index::Aabb2D;
use kurbo::Rect;

use crate::error::{RenderError, SceneError};
use crate::render::{FrameInfo, NodeView, Renderer};
use crate::scene::{Scene, intersect, union};
use crate::types::{DirtyFlags, NodeId};

/// Why a frame redrew the whole canvas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FullRedrawReason {
    /// Nothing was painted before.
    FirstFrame,
    /// The canvas size or device pixel ratio changed.
    Resized,
    /// The previous frame failed part-way.
    RenderError,
    /// The renderer cannot clip to a region.
    NoPartialSupport,
    /// Dirty rectangles are turned off in the config.
    DirtyRectanglesDisabled,
    /// More nodes changed than `dirty_object_num_threshold`.
    DirtyCount,
    /// A larger share of nodes changed than `dirty_object_ratio_threshold`.
    DirtyRatio,
}

/// What a [`Scene::tick`] did.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Frame counter; unchanged when the frame was skipped.
    pub frame: u64,
    /// Nothing changed, so the renderer was not called.
    pub skipped: bool,
    /// Set when the whole canvas was redrawn.
    pub full_redraw: Option<FullRedrawReason>,
    /// Number of attached nodes that changed.
    pub dirty_count: usize,
    /// Redraw region for partial frames.
    pub region: Option<Rect>,
    /// Nodes passed to `render_node`, in paint order.
    pub rendered: Vec<NodeId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Notice {
    Connect(NodeId),
    Disconnect(NodeId),
}

type Hook = Box<dyn FnMut(&mut Scene)>;

#[derive(Default)]
pub(crate) struct FrameState {
    pending: Vec<NodeId>,
    pending_set: HashSet<NodeId>,
    /// Nodes whose render box changed during a flush.
    pub(crate) moved: Vec<NodeId>,
    /// Painted regions of nodes that left the scene.
    pub(crate) removed_regions: Vec<Rect>,
    notices: Vec<Notice>,
    /// Nodes the renderer has been told about.
    known: HashSet<NodeId>,
    forced: Option<FullRedrawReason>,
    frame: u64,
    hooks: Vec<Hook>,
}

impl core::fmt::Debug for FrameState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameState")
            .field("frame", &self.frame)
            .field("pending", &self.pending.len())
            .field("notices", &self.notices.len())
            .field("known", &self.known.len())
            .field("forced", &self.forced)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl FrameState {
    pub(crate) fn queue(&mut self, id: NodeId) {
        if self.pending_set.insert(id) {
            self.pending.push(id);
        }
    }

    fn take_pending(&mut self) -> Vec<NodeId> {
        self.pending_set.clear();
        core::mem::take(&mut self.pending)
    }

    pub(crate) fn notify_connect(&mut self, id: NodeId) {
        self.notices.push(Notice::Connect(id));
    }

    pub(crate) fn notify_disconnect(&mut self, id: NodeId) {
        self.notices.push(Notice::Disconnect(id));
    }

    pub(crate) fn force_full(&mut self, reason: FullRedrawReason) {
        self.forced.get_or_insert(reason);
    }
}

impl Scene {
    /// Run `hook` at the start of every frame, before the flush.
    ///
    /// Mutations made by hooks are flushed with the frame. Nodes whose render
    /// box they change are drawn in this frame; any other change they make is
    /// repainted in the next one.
    pub fn add_before_render_hook(&mut self, hook: impl FnMut(&mut Self) + 'static) {
        self.frame.hooks.push(Box::new(hook));
    }

    /// Number of attached nodes queued for repaint.
    pub fn pending_count(&self) -> usize {
        self.frame.pending.len()
    }

    fn run_hooks(&mut self) {
        let mut hooks = core::mem::take(&mut self.frame.hooks);
        for hook in &mut hooks {
            hook(self);
        }
        // Keep hooks registered from inside a hook.
        hooks.append(&mut self.frame.hooks);
        self.frame.hooks = hooks;
    }

    /// Produce one frame.
    ///
    /// Render errors do not stop the frame: the remaining nodes are drawn,
    /// `end_frame` is called, and the first error is returned. The next frame
    /// is then a full redraw.
    pub fn tick<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> Result<FrameReport, SceneError> {
        let mut first_error: Option<RenderError> = None;
        self.deliver_notices(renderer, &mut first_error);

        let mut dirty = self.frame.take_pending();
        self.run_hooks();
        self.prepare();
        dirty.append(&mut self.frame.moved);

        let mut seen = HashSet::new();
        dirty.retain(|&id| seen.insert(id) && self.nodes.get(id).is_some_and(|n| n.is_attached()));

        let damage = self.index.take_damage();
        let mut region: Option<Rect> = None;
        for r in self
            .frame
            .removed_regions
            .drain(..)
            .chain(damage.removed.iter().map(aabb_rect))
        {
            region = union(region, Some(r));
        }
        for &id in &dirty {
            if let Some(node) = self.nodes.get(id) {
                region = union(region, union(node.painted, node.own_render));
            }
        }
        let viewport = Rect::from_origin_size((0.0, 0.0), self.viewport());
        let region = region.and_then(|r| intersect(r, viewport));

        // An idle frame is skipped whatever the redraw policy says.
        let forced = self.frame.forced.take();
        let idle = forced.is_none() && self.frame.frame > 0 && dirty.is_empty() && region.is_none();
        let reason = if idle {
            None
        } else {
            forced.or_else(|| self.redraw_reason(renderer, dirty.len()))
        };
        if reason.is_none() && region.is_none() {
            for &id in &dirty {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.dirty.remove(DirtyFlags::RENDER);
                }
            }
            if let Some(e) = first_error {
                self.frame.force_full(FullRedrawReason::RenderError);
                return Err(e.into());
            }
            return Ok(FrameReport {
                frame: self.frame.frame,
                skipped: true,
                full_redraw: None,
                dirty_count: dirty.len(),
                region: None,
                rendered: Vec::new(),
            });
        }

        self.frame.frame += 1;
        let full = reason.is_some();
        let info = FrameInfo {
            frame: self.frame.frame,
            width: self.config.width,
            height: self.config.height,
            device_pixel_ratio: self.config.device_pixel_ratio,
            full_redraw: full,
            dirty_region: if full { None } else { region },
        };
        let clip = if full { None } else { region };
        let rendered = self.render_list(viewport, clip);
        log::trace!(
            target: "glint_scene",
            "frame {}: {} dirty, {} to render, full redraw: {reason:?}",
            info.frame,
            dirty.len(),
            rendered.len()
        );

        match renderer.begin_frame(&info) {
            Ok(()) => {
                for &id in &rendered {
                    let Some(node) = self.nodes.get(id) else {
                        continue;
                    };
                    let Some(bounds) = node.own_render else {
                        continue;
                    };
                    let view = NodeView { scene: self, id };
                    if let Err(e) = renderer.render_node(&view, &node.parsed, bounds) {
                        log::warn!(target: "glint_scene", "rendering {id:?}: {e}");
                        first_error.get_or_insert(e);
                    }
                }
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = renderer.end_frame() {
            first_error.get_or_insert(e);
        }

        self.record_painted(&dirty, &rendered, full);
        if let Some(e) = first_error {
            self.frame.force_full(FullRedrawReason::RenderError);
            return Err(e.into());
        }
        Ok(FrameReport {
            frame: self.frame.frame,
            skipped: false,
            full_redraw: reason,
            dirty_count: dirty.len(),
            region: clip,
            rendered,
        })
    }

    fn deliver_notices<R: Renderer + ?Sized>(&mut self, renderer: &mut R, first_error: &mut Option<RenderError>) {
        for notice in core::mem::take(&mut self.frame.notices) {
            let result = match notice {
                Notice::Connect(id) => {
                    let attached = self.nodes.get(id).is_some_and(|n| n.is_attached());
                    if !attached || !self.frame.known.insert(id) {
                        continue;
                    }
                    renderer.on_connect(&NodeView { scene: self, id })
                }
                Notice::Disconnect(id) => {
                    let still_attached = self.nodes.get(id).is_some_and(|n| n.is_attached());
                    if still_attached || !self.frame.known.remove(&id) {
                        continue;
                    }
                    renderer.on_disconnect(id)
                }
            };
            if let Err(e) = result {
                log::warn!(target: "glint_scene", "lifecycle notice {notice:?}: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    fn redraw_reason<R: Renderer + ?Sized>(&self, renderer: &R, dirty_count: usize) -> Option<FullRedrawReason> {
        let policy = &self.config.dirty_rectangle;
        let attached = self.paint_list.len().max(1);
        if self.frame.frame == 0 {
            Some(FullRedrawReason::FirstFrame)
        } else if !renderer.supports_partial_redraw() {
            Some(FullRedrawReason::NoPartialSupport)
        } else if !policy.enabled {
            Some(FullRedrawReason::DirtyRectanglesDisabled)
        } else if dirty_count > policy.dirty_object_num_threshold {
            Some(FullRedrawReason::DirtyCount)
        } else if dirty_count as f64 / attached as f64 > policy.dirty_object_ratio_threshold {
            Some(FullRedrawReason::DirtyRatio)
        } else {
            None
        }
    }

    /// Visible attached nodes with a render box, in paint order.
    fn render_list(&self, viewport: Rect, region: Option<Rect>) -> Vec<NodeId> {
        self.paint_list
            .iter()
            .copied()
            .filter(|&id| {
                let Some(node) = self.nodes.get(id) else {
                    return false;
                };
                let Some(r) = node.own_render.filter(|_| node.is_attached()) else {
                    return false;
                };
                if self.config.enable_culling && intersect(r, viewport).is_none() {
                    return false;
                }
                if region.is_some_and(|region| intersect(r, region).is_none()) {
                    return false;
                }
                self.reader(id).is_visible()
            })
            .collect()
    }

    fn record_painted(&mut self, dirty: &[NodeId], rendered: &[NodeId], full: bool) {
        let dirty: HashSet<NodeId> = dirty.iter().copied().collect();
        let rendered_set: HashSet<NodeId> = rendered.iter().copied().collect();
        let touched: Vec<NodeId> = if full {
            self.paint_list.clone()
        } else {
            dirty.iter().chain(rendered).copied().collect()
        };
        for id in touched {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            node.painted = match (rendered_set.contains(&id), full || dirty.contains(&id)) {
                (true, true) => node.own_render,
                // Redrawn only because it overlaps the region; the old pixels may still be out there.
                (true, false) => union(node.painted, node.own_render),
                (false, true) => None,
                (false, false) => node.painted,
            };
            node.dirty.remove(DirtyFlags::RENDER);
        }
    }
}

fn aabb_rect(b: &Aabb2D<f64>) -> Rect {
    Rect::new(b.min_x, b.min_y, b.max_x, b.max_y)
}
