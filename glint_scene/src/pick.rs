// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Picking: coarse candidates from the spatial index, then precise tests in
//! each candidate's local space.

use kurbo::Point;

use crate::geometry::{self, Geometry};
use crate::scene::{Node, Scene};
use crate::style::{StyleReader, UsedValue};
use crate::types::{NodeId, ShapeKind};

/// How one region (fill or stroke) takes part in hit testing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Region {
    Never,
    /// Only when the region is painted.
    Painted,
    /// Whether painted or not.
    Always,
    /// Only where the paint is not fully transparent.
    Opaque,
}

/// Resolved `pointer-events` policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct HitPolicy {
    visible_only: bool,
    fill: Region,
    stroke: Region,
}

impl HitPolicy {
    fn from_keyword(keyword: &str) -> Option<Self> {
        let (visible_only, fill, stroke) = match keyword {
            "none" => return None,
            "visiblefill" => (true, Region::Always, Region::Never),
            "visiblestroke" => (true, Region::Never, Region::Always),
            "visible" => (true, Region::Always, Region::Always),
            "painted" => (false, Region::Painted, Region::Painted),
            "fill" => (false, Region::Always, Region::Never),
            "stroke" => (false, Region::Never, Region::Always),
            "all" => (false, Region::Always, Region::Always),
            "non-transparent-pixel" => (true, Region::Opaque, Region::Opaque),
            // `auto` and `visiblepainted`
            _ => (true, Region::Painted, Region::Painted),
        };
        Some(Self {
            visible_only,
            fill,
            stroke,
        })
    }
}

impl Scene {
    /// The topmost node whose shape contains `point`.
    ///
    /// Overlaps resolve by paint order: higher `z-index` first, then later in
    /// tree order. Creation order breaks any remaining tie, newest on top.
    pub fn pick(&mut self, point: Point) -> Option<NodeId> {
        self.pick_all(point).into_iter().next()
    }

    /// Every node whose shape contains `point`, topmost first.
    pub fn pick_all(&mut self, point: Point) -> Vec<NodeId> {
        self.prepare();
        let mut hits: Vec<(usize, u64, NodeId)> = self
            .index
            .query_point(point.x, point.y)
            .filter_map(|(_, id)| {
                let node = self.nodes.get(id)?;
                self.hits(id, node, point)
                    .then_some((node.render_order, node.seq, id))
            })
            .collect();
        hits.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        hits.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Precise test of one candidate.
    fn hits(&self, id: NodeId, node: &Node, point: Point) -> bool {
        let Some(shape) = node.geometry.as_ref().filter(|_| node.is_attached()) else {
            return false;
        };
        let style = self.reader(id);
        let Some(policy) = HitPolicy::from_keyword(style.keyword("pointer-events")) else {
            return false;
        };
        if policy.visible_only && !style.is_visible() {
            return false;
        }
        let world = node.world_transform;
        if world.determinant() == 0.0 {
            return false;
        }
        let local = world.inverse() * point;
        let clipped_out = style
            .used("clip-path")
            .and_then(UsedValue::as_node)
            .and_then(|clip| self.own_geometry(clip))
            .is_some_and(|clip| !clip.fill_contains(local));
        if clipped_out {
            return false;
        }
        let fill_hit = fill_counts(policy.fill, node.kind, &style) && shape.fill_contains(local);
        fill_hit || stroke_hit(policy.stroke, shape, &style, local)
    }
}

fn fill_counts(region: Region, kind: ShapeKind, style: &StyleReader<'_>) -> bool {
    // Images paint their box without a fill.
    let fill = style.used("fill");
    match region {
        Region::Never => false,
        Region::Always => true,
        Region::Painted => kind == ShapeKind::Image || fill.is_some_and(|f| !f.is_invisible_paint()),
        Region::Opaque => {
            (kind == ShapeKind::Image || fill.is_some_and(is_opaque)) && style.number("opacity", 1.0) > 0.0
        }
    }
}

fn stroke_hit(region: Region, shape: &Geometry, style: &StyleReader<'_>, local: Point) -> bool {
    let counts = match region {
        Region::Never => false,
        Region::Always => true,
        Region::Painted => geometry::has_stroke(style),
        Region::Opaque => {
            geometry::has_stroke(style)
                && style.used("stroke").is_some_and(is_opaque)
                && style.number("opacity", 1.0) > 0.0
        }
    };
    if !counts {
        return false;
    }
    let reach = (style.number("line-width", 1.0).max(0.0)
        + style.number("increased-line-width-for-hit-testing", 0.0).max(0.0))
        / 2.0;
    shape.outline_distance(local) <= reach
}

fn is_opaque(paint: &UsedValue) -> bool {
    match paint {
        UsedValue::Color(c) => c.a > 0,
        UsedValue::Node(_) => true,
        _ => false,
    }
}
