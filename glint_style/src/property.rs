// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static property descriptors.
//!
//! The built-in table is a `static` slice; [`builtin`] looks names up through a
//! map built on first use. Descriptors are never mutated after startup.

use std::collections::HashMap;
use std::sync::OnceLock;

use bitflags::bitflags;

use crate::error::StyleError;
use crate::parse::{Syntax, parse};
use crate::value::{ParsedValue, RawValue};

bitflags! {
    /// What a change to a property invalidates.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Affects: u16 {
        /// The node's own geometry bounds.
        const GEOMETRY = 1 << 0;
        /// Render bounds only (stroke width, shadows, markers).
        const RENDER_BOUNDS = 1 << 1;
        /// The local transform.
        const TRANSFORM = 1 << 2;
        /// Paint only; bounds are unaffected.
        const PAINT = 1 << 3;
        /// Paint order among siblings.
        const ORDER = 1 << 4;
        /// Text layout.
        const TEXT = 1 << 5;
        /// Hit testing policy.
        const PICKING = 1 << 6;
    }
}

/// What percentages in a property resolve against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PercentBase {
    /// Percentages are plain fractions.
    None,
    /// Viewport width.
    Width,
    /// Viewport height.
    Height,
    /// Normalized viewport diagonal, `sqrt((w² + h²) / 2)`.
    Diagonal,
    /// The node's used font size.
    FontSize,
}

/// Static metadata for one style property.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    /// Attribute name.
    pub name: &'static str,
    /// Value grammar.
    pub syntax: Syntax,
    /// Initial value as CSS text.
    pub initial: &'static str,
    /// Whether unset values take the parent's value.
    pub inherited: bool,
    /// Whether the value may be interpolated.
    pub animatable: bool,
    /// What a change invalidates.
    pub affects: Affects,
    /// Base for percentages.
    pub percent_base: PercentBase,
}

impl PropertyDescriptor {
    /// A non-inherited, non-animatable descriptor with no side effects.
    pub const fn new(name: &'static str, syntax: Syntax, initial: &'static str) -> Self {
        Self {
            name,
            syntax,
            initial,
            inherited: false,
            animatable: false,
            affects: Affects::empty(),
            percent_base: PercentBase::None,
        }
    }

    /// Mark as inherited.
    pub const fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }

    /// Mark as animatable.
    pub const fn animatable(mut self) -> Self {
        self.animatable = true;
        self
    }

    /// Set the invalidation flags.
    pub const fn affects(mut self, affects: Affects) -> Self {
        self.affects = affects;
        self
    }

    /// Set the percentage base.
    pub const fn percent_base(mut self, base: PercentBase) -> Self {
        self.percent_base = base;
        self
    }

    /// The initial value, parsed.
    pub fn initial_value(&self) -> Result<ParsedValue, StyleError> {
        parse(&RawValue::from(self.initial), self.syntax)
    }
}

const LINE_CAP: &[&str] = &["butt", "round", "square"];
const LINE_JOIN: &[&str] = &["miter", "round", "bevel"];
const VISIBILITY: &[&str] = &["visible", "hidden"];
const POINTER_EVENTS: &[&str] = &[
    "auto",
    "none",
    "visiblepainted",
    "visiblefill",
    "visiblestroke",
    "visible",
    "painted",
    "fill",
    "stroke",
    "all",
    "non-transparent-pixel",
];
const TEXT_ALIGN: &[&str] = &["start", "center", "end", "left", "right"];
const TEXT_BASELINE: &[&str] = &[
    "alphabetic",
    "top",
    "hanging",
    "middle",
    "ideographic",
    "bottom",
];

const GEOMETRY: Affects = Affects::GEOMETRY.union(Affects::RENDER_BOUNDS);
const STROKE_GEOMETRY: Affects = Affects::RENDER_BOUNDS.union(Affects::PAINT);
const TEXT: Affects = Affects::TEXT.union(GEOMETRY);

use PropertyDescriptor as P;

/// The built-in properties.
pub static BUILTIN_PROPERTIES: &[PropertyDescriptor] = &[
    // Paint.
    P::new("fill", Syntax::Paint, "none")
        .inherited()
        .animatable()
        .affects(Affects::PAINT.union(Affects::PICKING)),
    P::new("stroke", Syntax::Paint, "none")
        .inherited()
        .animatable()
        .affects(STROKE_GEOMETRY.union(Affects::PICKING)),
    P::new("opacity", Syntax::NumberPercentage, "1")
        .animatable()
        .affects(Affects::PAINT),
    P::new("fill-opacity", Syntax::NumberPercentage, "1")
        .inherited()
        .animatable()
        .affects(Affects::PAINT),
    P::new("stroke-opacity", Syntax::NumberPercentage, "1")
        .inherited()
        .animatable()
        .affects(Affects::PAINT),
    // Stroke.
    P::new("line-width", Syntax::Length, "1")
        .inherited()
        .animatable()
        .affects(STROKE_GEOMETRY),
    P::new("line-cap", Syntax::Keyword(LINE_CAP), "butt")
        .inherited()
        .affects(STROKE_GEOMETRY),
    P::new("line-join", Syntax::Keyword(LINE_JOIN), "miter")
        .inherited()
        .affects(STROKE_GEOMETRY),
    P::new("line-dash", Syntax::NumberList, "none")
        .inherited()
        .animatable()
        .affects(Affects::PAINT),
    P::new("line-dash-offset", Syntax::Length, "0")
        .inherited()
        .animatable()
        .affects(Affects::PAINT),
    P::new("increased-line-width-for-hit-testing", Syntax::Length, "0")
        .affects(Affects::PICKING),
    // Visibility and order.
    P::new("visibility", Syntax::Keyword(VISIBILITY), "visible")
        .inherited()
        .affects(Affects::PAINT.union(Affects::PICKING)),
    P::new("pointer-events", Syntax::Keyword(POINTER_EVENTS), "auto")
        .inherited()
        .affects(Affects::PICKING),
    P::new("z-index", Syntax::Integer, "0")
        .animatable()
        .affects(Affects::ORDER),
    // Geometry.
    P::new("cx", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Width),
    P::new("cy", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Height),
    P::new("r", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Diagonal),
    P::new("rx", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Width),
    P::new("ry", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Height),
    P::new("x", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Width),
    P::new("y", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Height),
    P::new("width", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Width),
    P::new("height", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Height),
    P::new("x1", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Width),
    P::new("y1", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Height),
    P::new("x2", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Width),
    P::new("y2", Syntax::LengthPercentage, "0")
        .animatable()
        .affects(GEOMETRY)
        .percent_base(PercentBase::Height),
    P::new("points", Syntax::Points, "none")
        .animatable()
        .affects(GEOMETRY),
    P::new("d", Syntax::PathData, "none").affects(GEOMETRY),
    P::new("src", Syntax::Text, "").affects(Affects::PAINT),
    // Text.
    P::new("text", Syntax::Text, "").affects(TEXT),
    P::new("font-size", Syntax::Length, "16px")
        .inherited()
        .animatable()
        .affects(TEXT),
    P::new("font-family", Syntax::Text, "sans-serif")
        .inherited()
        .affects(TEXT),
    P::new("line-height", Syntax::LengthPercentage, "120%")
        .inherited()
        .animatable()
        .affects(TEXT)
        .percent_base(PercentBase::FontSize),
    P::new("letter-spacing", Syntax::Length, "0")
        .inherited()
        .animatable()
        .affects(TEXT),
    P::new("text-align", Syntax::Keyword(TEXT_ALIGN), "start")
        .inherited()
        .affects(TEXT),
    P::new("text-baseline", Syntax::Keyword(TEXT_BASELINE), "alphabetic")
        .inherited()
        .affects(TEXT),
    // Transform.
    P::new("transform", Syntax::Transform, "none")
        .animatable()
        .affects(Affects::TRANSFORM),
    P::new("transform-origin", Syntax::Position, "0 0")
        .animatable()
        .affects(Affects::TRANSFORM),
    // References to other nodes.
    P::new("clip-path", Syntax::Reference, "none").affects(Affects::RENDER_BOUNDS.union(Affects::PICKING)),
    P::new("marker-start", Syntax::Reference, "none").affects(Affects::RENDER_BOUNDS),
    P::new("marker-end", Syntax::Reference, "none").affects(Affects::RENDER_BOUNDS),
    // Effects.
    P::new("shadow-color", Syntax::Color, "transparent")
        .animatable()
        .affects(Affects::RENDER_BOUNDS),
    P::new("shadow-blur", Syntax::Length, "0")
        .animatable()
        .affects(Affects::RENDER_BOUNDS),
    P::new("shadow-offset-x", Syntax::Length, "0")
        .animatable()
        .affects(Affects::RENDER_BOUNDS),
    P::new("shadow-offset-y", Syntax::Length, "0")
        .animatable()
        .affects(Affects::RENDER_BOUNDS),
    // Identity, for `url(#id)` lookups.
    P::new("id", Syntax::Text, ""),
];

/// Look up a built-in descriptor by name.
///
/// ```
/// use glint_style::builtin;
///
/// let stroke = builtin("stroke").unwrap();
/// assert!(stroke.inherited);
/// assert!(builtin("no-such-property").is_none());
/// ```
pub fn builtin(name: &str) -> Option<&'static PropertyDescriptor> {
    static BY_NAME: OnceLock<HashMap<&'static str, usize>> = OnceLock::new();
    let map = BY_NAME.get_or_init(|| {
        BUILTIN_PROPERTIES
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name, i))
            .collect()
    });
    map.get(name).map(|&i| &BUILTIN_PROPERTIES[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_initial_value_parses() {
        for d in BUILTIN_PROPERTIES {
            let v = d.initial_value();
            assert!(v.is_ok(), "initial value of `{}` fails: {v:?}", d.name);
        }
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = BUILTIN_PROPERTIES.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN_PROPERTIES.len());
    }

    #[test]
    fn geometry_implies_render_bounds() {
        for d in BUILTIN_PROPERTIES {
            if d.affects.contains(Affects::GEOMETRY) {
                assert!(d.affects.contains(Affects::RENDER_BOUNDS), "{}", d.name);
            }
        }
    }
}
