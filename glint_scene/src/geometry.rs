// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind geometry strategies, render boxes and precise hit tests.
//!
//! Geometry is built from used values in the node's local space. A node with
//! degenerate geometry (zero radius, no points, empty text) has none, and
//! contributes nothing to bounds.

use kurbo::{
    BezPath, Circle, Ellipse, Line, ParamCurveNearest, PathEl, Point, Rect, RoundedRect, Shape,
};

use crate::style::{StyleReader, UsedValue};
use crate::types::ShapeKind;

/// Flattening tolerance for curves.
const TOLERANCE: f64 = 0.1;
/// Ascent as a fraction of the font size, for alphabetic baselines.
const ASCENT: f64 = 0.8;

/// Local-space geometry of a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Circle
    Circle(Circle),
    /// Ellipse
    Ellipse(Ellipse),
    /// Rectangle, possibly rounded.
    Rect(RoundedRect),
    /// Line segment. Never contains a point by fill.
    Line(Line),
    /// Open polyline.
    Polyline(BezPath),
    /// Closed polygon.
    Polygon(BezPath),
    /// Arbitrary path.
    Path(BezPath),
    /// Box of laid-out text.
    Text(Rect),
    /// Box of an image.
    Image(Rect),
}

impl Geometry {
    /// Build the geometry of a node of `kind` from its effective style.
    pub fn from_style(kind: ShapeKind, style: &StyleReader<'_>) -> Option<Self> {
        let n = |name| style.number(name, 0.0);
        match kind {
            ShapeKind::Group => None,
            ShapeKind::Circle => {
                let r = n("r");
                (r > 0.0).then(|| Self::Circle(Circle::new((n("cx"), n("cy")), r)))
            }
            ShapeKind::Ellipse => {
                let (rx, ry) = (n("rx"), n("ry"));
                (rx > 0.0 && ry > 0.0)
                    .then(|| Self::Ellipse(Ellipse::new((n("cx"), n("cy")), (rx, ry), 0.0)))
            }
            ShapeKind::Rect => {
                let (w, h) = (n("width"), n("height"));
                if w <= 0.0 || h <= 0.0 {
                    return None;
                }
                let radius = n("rx").max(0.0).min(w.min(h) / 2.0);
                let rect = Rect::from_origin_size((n("x"), n("y")), (w, h));
                Some(Self::Rect(RoundedRect::from_rect(rect, radius)))
            }
            ShapeKind::Line => Some(Self::Line(Line::new((n("x1"), n("y1")), (n("x2"), n("y2"))))),
            ShapeKind::Polyline | ShapeKind::Polygon => {
                let Some(UsedValue::Points(points)) = style.used("points") else {
                    return None;
                };
                let path = polyline(points, kind == ShapeKind::Polygon)?;
                Some(if kind == ShapeKind::Polygon {
                    Self::Polygon(path)
                } else {
                    Self::Polyline(path)
                })
            }
            ShapeKind::Path => match style.used("d") {
                Some(UsedValue::Path(p)) if !p.elements().is_empty() => Some(Self::Path(p.clone())),
                _ => None,
            },
            ShapeKind::Text => {
                let metrics = style
                    .nodes
                    .get(style.node())
                    .and_then(|node| node.derived.text.as_ref())?;
                if metrics.width <= 0.0 {
                    return None;
                }
                let x = match style.keyword("text-align") {
                    "center" => n("x") - metrics.width / 2.0,
                    "end" | "right" => n("x") - metrics.width,
                    _ => n("x"),
                };
                let y = match style.keyword("text-baseline") {
                    "top" | "hanging" => n("y"),
                    "middle" => n("y") - metrics.height / 2.0,
                    "bottom" | "ideographic" => n("y") - metrics.height,
                    _ => n("y") - metrics.font_size * ASCENT,
                };
                Some(Self::Text(Rect::from_origin_size((x, y), (metrics.width, metrics.height))))
            }
            ShapeKind::Image => {
                let (w, h) = (n("width"), n("height"));
                (w > 0.0 && h > 0.0)
                    .then(|| Self::Image(Rect::from_origin_size((n("x"), n("y")), (w, h))))
            }
        }
    }

    /// Tight local bounding box.
    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Circle(c) => c.bounding_box(),
            Self::Ellipse(e) => e.bounding_box(),
            Self::Rect(r) => r.rect(),
            Self::Line(l) => l.bounding_box(),
            Self::Polyline(p) | Self::Polygon(p) | Self::Path(p) => p.bounding_box(),
            Self::Text(r) | Self::Image(r) => *r,
        }
    }

    /// Whether the filled interior contains `p`.
    pub fn fill_contains(&self, p: Point) -> bool {
        match self {
            Self::Circle(c) => c.contains(p),
            Self::Ellipse(e) => e.contains(p),
            Self::Rect(r) => r.contains(p),
            Self::Line(_) => false,
            Self::Polyline(path) | Self::Polygon(path) | Self::Path(path) => path.contains(p),
            Self::Text(r) | Self::Image(r) => r.contains(p),
        }
    }

    /// Distance from `p` to the outline.
    pub fn outline_distance(&self, p: Point) -> f64 {
        match self {
            Self::Circle(c) => ((p - c.center).hypot() - c.radius).abs(),
            Self::Line(l) => l.nearest(p, TOLERANCE).distance_sq.sqrt(),
            Self::Polyline(path) | Self::Polygon(path) | Self::Path(path) => nearest(path, p),
            other => nearest(&other.to_path(), p),
        }
    }

    /// The outline as a path.
    pub fn to_path(&self) -> BezPath {
        match self {
            Self::Circle(c) => c.to_path(TOLERANCE),
            Self::Ellipse(e) => e.to_path(TOLERANCE),
            Self::Rect(r) => r.to_path(TOLERANCE),
            Self::Line(l) => l.to_path(TOLERANCE),
            Self::Polyline(p) | Self::Polygon(p) | Self::Path(p) => p.clone(),
            Self::Text(r) | Self::Image(r) => r.to_path(TOLERANCE),
        }
    }

    /// First and last vertices, where markers attach.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match self {
            Self::Line(l) => Some((l.p0, l.p1)),
            Self::Polyline(p) | Self::Polygon(p) | Self::Path(p) => {
                let first = p.elements().iter().find_map(|el| match el {
                    PathEl::MoveTo(pt) => Some(*pt),
                    _ => None,
                })?;
                let last = p.elements().iter().rev().find_map(end_point).unwrap_or(first);
                Some((first, last))
            }
            _ => None,
        }
    }
}

fn end_point(el: &PathEl) -> Option<Point> {
    match *el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => Some(p),
        PathEl::ClosePath => None,
    }
}

fn polyline(points: &[Point], closed: bool) -> Option<BezPath> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut path = BezPath::new();
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    if closed {
        path.close_path();
    }
    Some(path)
}

fn nearest(path: &BezPath, p: Point) -> f64 {
    path.segments()
        .map(|seg| seg.nearest(p, TOLERANCE).distance_sq)
        .fold(f64::INFINITY, f64::min)
        .sqrt()
}

/// Whether the node's stroke paints anything.
pub(crate) fn has_stroke(style: &StyleReader<'_>) -> bool {
    !style.used("stroke").is_none_or(UsedValue::is_invisible_paint) && style.number("line-width", 1.0) > 0.0
}

/// Local render box: geometry grown by the stroke and the shadow.
///
/// Markers and clipping involve other nodes and are applied by the scene.
pub(crate) fn render_box(geometry: &Geometry, style: &StyleReader<'_>) -> Rect {
    let mut r = geometry.bounding_box();
    if has_stroke(style) {
        let half = style.number("line-width", 1.0) / 2.0;
        r = r.inflate(half, half);
    }
    let shadow_visible = style
        .used("shadow-color")
        .and_then(UsedValue::as_color)
        .is_some_and(|c| !c.is_transparent());
    if shadow_visible {
        let blur = style.number("shadow-blur", 0.0).max(0.0);
        let offset = (style.number("shadow-offset-x", 0.0), style.number("shadow-offset-y", 0.0));
        r = r.union(r.inflate(blur, blur) + kurbo::Vec2::from(offset));
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polylines_need_two_points() {
        assert!(polyline(&[Point::new(1.0, 1.0)], false).is_none());
        let path = polyline(&[Point::ZERO, Point::new(10.0, 0.0), Point::new(10.0, 10.0)], true).unwrap();
        let g = Geometry::Polygon(path);
        assert_eq!(g.bounding_box(), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(g.fill_contains(Point::new(8.0, 2.0)));
        assert!(!g.fill_contains(Point::new(2.0, 8.0)));
        assert_eq!(g.endpoints(), Some((Point::ZERO, Point::new(10.0, 10.0))));
    }

    #[test]
    fn outline_distance_per_kind() {
        let c = Geometry::Circle(Circle::new((0.0, 0.0), 10.0));
        assert!((c.outline_distance(Point::new(12.0, 0.0)) - 2.0).abs() < 1e-9);
        let l = Geometry::Line(Line::new((0.0, 0.0), (10.0, 0.0)));
        assert!((l.outline_distance(Point::new(5.0, 3.0)) - 3.0).abs() < 1e-6);
        assert!(!l.fill_contains(Point::new(5.0, 0.0)));
        let r = Geometry::Rect(RoundedRect::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0));
        assert!((r.outline_distance(Point::new(5.0, 1.0)) - 1.0).abs() < 1e-6);
    }
}
