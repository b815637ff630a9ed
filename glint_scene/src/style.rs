// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Used values and read access to a node's effective style.

use std::collections::HashMap;

use glint_style::{CssNumeric, CssWide, ParsedValue, Rgba};
use kurbo::{Affine, BezPath, Point};

use crate::registry::PropertyRegistry;
use crate::scene::Nodes;
use crate::types::NodeId;

/// Parsed values a node defines, keyed by property name.
pub type ParsedStyle = HashMap<&'static str, ParsedValue>;

/// Renderer-ready value of a property.
#[derive(Clone, Debug, PartialEq)]
pub enum UsedValue {
    /// `none`, or a reference that does not resolve.
    None,
    /// A resolved number: pixels for lengths, degrees for angles, a fraction for percentages.
    Number(f64),
    /// A color.
    Color(Rgba),
    /// An identifier.
    Keyword(String),
    /// Free text.
    Text(String),
    /// A list of pixel lengths, e.g. a dash array.
    Numbers(Vec<f64>),
    /// Polyline or polygon vertices.
    Points(Vec<Point>),
    /// Path geometry.
    Path(BezPath),
    /// A transform, before `transform-origin` is applied.
    Transform(Affine),
    /// A `transform-origin`, resolved against the node's geometry box at flush.
    Origin(CssNumeric, CssNumeric),
    /// Another node, such as a clip path or a gradient.
    Node(NodeId),
}

impl UsedValue {
    /// The number, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The color, if any.
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// The keyword, if any.
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// The text, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// The referenced node, if any.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether this paints nothing: `none`, or a fully transparent color.
    pub fn is_invisible_paint(&self) -> bool {
        match self {
            Self::None => true,
            Self::Color(c) => c.is_transparent(),
            _ => false,
        }
    }
}

/// Simple text layout produced by the text post-processor.
///
/// Glyph metrics belong to the renderer's font stack; this is an estimate of
/// `0.6em` per character plus letter spacing, enough for bounds and picking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextMetrics {
    /// Lines after splitting on `\n`.
    pub lines: Vec<String>,
    /// Widest line, in pixels.
    pub width: f64,
    /// Total height, in pixels.
    pub height: f64,
    /// Distance between baselines.
    pub line_height: f64,
    /// Font size used for the estimate.
    pub font_size: f64,
}

/// Values derived from several properties at once by post-processors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Derived {
    /// Text layout, for text nodes.
    pub text: Option<TextMetrics>,
}

/// Read access to the effective (inherited or initial) used style of one node.
#[derive(Clone, Copy)]
pub struct StyleReader<'a> {
    pub(crate) nodes: &'a Nodes,
    pub(crate) registry: &'a PropertyRegistry,
    pub(crate) initial: &'a HashMap<&'static str, UsedValue>,
    pub(crate) id: NodeId,
}

impl core::fmt::Debug for StyleReader<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StyleReader")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<'a> StyleReader<'a> {
    /// The node being read.
    pub fn node(&self) -> NodeId {
        self.id
    }

    /// Effective used value of `name`.
    ///
    /// Walks ancestors for inherited properties (and for explicit `inherit`),
    /// and falls back to the initial value. `None` for unregistered names.
    pub fn used(&self, name: &str) -> Option<&'a UsedValue> {
        let descriptor = self.registry.descriptor(name).ok()?;
        self.specified_used(name)
            .or_else(|| self.initial.get(descriptor.name))
    }

    /// Like [`used`](Self::used), but `None` when the value would come from
    /// the initial value rather than from this node or an ancestor.
    pub fn specified_used(&self, name: &str) -> Option<&'a UsedValue> {
        let descriptor = self.registry.descriptor(name).ok()?;
        let mut cur = Some(self.id);
        while let Some(id) = cur {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            if let Some(v) = node.used.get(descriptor.name) {
                return Some(v);
            }
            let explicit_inherit = node
                .parsed
                .get(descriptor.name)
                .and_then(ParsedValue::css_wide)
                .is_some_and(|w| w == CssWide::Inherit || (w == CssWide::Unset && descriptor.inherited));
            if !descriptor.inherited && !explicit_inherit {
                break;
            }
            cur = node.parent;
        }
        None
    }

    /// Effective numeric value, or `default`.
    pub fn number(&self, name: &str, default: f64) -> f64 {
        self.used(name).and_then(UsedValue::as_number).unwrap_or(default)
    }

    /// Effective keyword, or `""`.
    pub fn keyword(&self, name: &str) -> &'a str {
        self.used(name).and_then(UsedValue::as_keyword).unwrap_or("")
    }

    /// Effective text, or `""`.
    pub fn text(&self, name: &str) -> &'a str {
        self.used(name).and_then(UsedValue::as_text).unwrap_or("")
    }

    /// Whether the node is painted at all (`visibility` is not `hidden`).
    pub fn is_visible(&self) -> bool {
        self.keyword("visibility") != "hidden"
    }
}
