// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property registry: descriptors paired with the functions that turn parsed
//! values into used values.
//!
//! Resolution of one property runs in a fixed order:
//!
//! 1. parse the raw value (or take the fast path when CSS parsing is off),
//! 2. resolve CSS-wide keywords (`inherit`, `initial`, `unset`),
//! 3. run the property's [`Calculator`],
//! 4. after the whole batch, run each distinct [`PostProcessor`] once.
//!
//! The scene drives steps 2 to 4; this module owns the tables.

use std::collections::HashMap;

use glint_style::{
    Affects, BUILTIN_PROPERTIES, CssNumeric, ParsedValue, PropertyDescriptor, RawValue, Reference,
    ResolveContext, StyleError, Syntax, Unit,
};
use kurbo::{Affine, BezPath, Point, Size};

use crate::refs::RefTable;
use crate::scene::Nodes;
use crate::style::{Derived, StyleReader, TextMetrics, UsedValue};
use crate::types::{NodeId, ShapeKind};

/// Turns a parsed value into a used value.
///
/// Receives the previous used value, if any. May update the id map and the
/// reference table through the context; doing so must be idempotent because
/// values are recalculated whenever a node restyles.
pub type Calculator =
    fn(&mut CalcContext<'_>, Option<&UsedValue>, &ParsedValue) -> Result<UsedValue, StyleError>;

/// A step that derives values from several properties after a batch.
#[derive(Copy, Clone)]
pub struct PostProcessor {
    /// Identity used to run each post-processor once per batch.
    pub name: &'static str,
    /// The step itself.
    pub run: fn(&StyleReader<'_>, ShapeKind, &mut Derived),
}

impl core::fmt::Debug for PostProcessor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostProcessor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Lays out text once `text`, font and spacing properties are resolved.
pub const TEXT_LAYOUT: PostProcessor = PostProcessor {
    name: "text-layout",
    run: layout_text,
};

/// A registered property.
#[derive(Clone)]
pub struct PropertyHandler {
    /// Static metadata.
    pub descriptor: PropertyDescriptor,
    /// Parsed to used value.
    pub calculator: Calculator,
    /// Optional batch step.
    pub post_processor: Option<PostProcessor>,
    initial: ParsedValue,
}

impl core::fmt::Debug for PropertyHandler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyHandler")
            .field("descriptor", &self.descriptor)
            .field("post_processor", &self.post_processor)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}

impl PropertyHandler {
    /// The initial value, parsed.
    pub fn initial(&self) -> &ParsedValue {
        &self.initial
    }
}

/// The set of properties a scene understands.
///
/// Built once at startup, then shared read-only by the scene.
///
/// ```
/// use glint_scene::{PropertyRegistry, default_calculator};
/// use glint_style::{PropertyDescriptor, Syntax};
///
/// let mut registry = PropertyRegistry::new();
/// let gap = PropertyDescriptor::new("gap", Syntax::Length, "4px").inherited();
/// registry.register(gap, default_calculator(Syntax::Length), None).unwrap();
/// assert!(registry.get("gap").is_some());
/// ```
#[derive(Clone, Debug)]
pub struct PropertyRegistry {
    handlers: Vec<PropertyHandler>,
    by_name: HashMap<&'static str, usize>,
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyRegistry {
    /// A registry with every built-in property.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for descriptor in BUILTIN_PROPERTIES {
            let calculator = match descriptor.name {
                "id" => calc_id,
                "transform" => calc_transform,
                _ => default_calculator(descriptor.syntax),
            };
            let post_processor = descriptor
                .affects
                .contains(Affects::TEXT)
                .then_some(TEXT_LAYOUT);
            // Built-in initial values always parse; a failure here is a table bug.
            if let Err(e) = registry.register(*descriptor, calculator, post_processor) {
                log::error!(target: "glint_scene", "built-in `{}`: {e}", descriptor.name);
            }
        }
        registry
    }

    /// A registry with no properties at all.
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a property, replacing any previous handler with the same name.
    ///
    /// Fails if the descriptor's initial value does not parse with its own syntax.
    pub fn register(
        &mut self,
        descriptor: PropertyDescriptor,
        calculator: Calculator,
        post_processor: Option<PostProcessor>,
    ) -> Result<(), StyleError> {
        let handler = PropertyHandler {
            initial: descriptor.initial_value()?,
            descriptor,
            calculator,
            post_processor,
        };
        if let Some(&i) = self.by_name.get(descriptor.name) {
            self.handlers[i] = handler;
        } else {
            self.by_name.insert(descriptor.name, self.handlers.len());
            self.handlers.push(handler);
        }
        Ok(())
    }

    /// The handler registered under `name`.
    pub fn get(&self, name: &str) -> Option<&PropertyHandler> {
        self.by_name.get(name).map(|&i| &self.handlers[i])
    }

    /// The descriptor registered under `name`.
    pub fn descriptor(&self, name: &str) -> Result<&PropertyDescriptor, StyleError> {
        self.get(name)
            .map(|h| &h.descriptor)
            .ok_or_else(|| StyleError::UnknownProperty(name.to_owned()))
    }

    /// Every registered handler, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyHandler> + '_ {
        self.handlers.iter()
    }

    /// Parse a raw value for `name`.
    pub fn parse(&self, name: &str, raw: &RawValue, css_parsing: bool) -> Result<ParsedValue, StyleError> {
        let syntax = self.descriptor(name)?.syntax;
        if css_parsing {
            glint_style::parse(raw, syntax)
        } else {
            glint_style::parse_fast(raw, syntax)
        }
    }

    /// Interpolate two parsed values of `name`. Fails for non-animatable properties.
    pub fn interpolate(
        &self,
        name: &str,
        from: &ParsedValue,
        to: &ParsedValue,
        t: f64,
    ) -> Result<ParsedValue, StyleError> {
        if !self.descriptor(name)?.animatable {
            return Err(StyleError::NotAnimatable(name.to_owned()));
        }
        glint_style::interpolate(from, to, t)
    }
}

/// State a [`Calculator`] can see and update.
pub struct CalcContext<'a> {
    /// Node being resolved.
    pub node: NodeId,
    /// Its shape kind.
    pub kind: ShapeKind,
    /// Property being resolved.
    pub property: &'static str,
    /// Percentage base and font sizes for this property on this node.
    pub resolve: ResolveContext,
    /// Canvas size in CSS pixels.
    pub viewport: Size,
    pub(crate) nodes: &'a Nodes,
    pub(crate) ids: &'a mut HashMap<String, NodeId>,
    pub(crate) refs: &'a mut RefTable,
}

impl core::fmt::Debug for CalcContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CalcContext")
            .field("node", &self.node)
            .field("kind", &self.kind)
            .field("property", &self.property)
            .field("resolve", &self.resolve)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

impl CalcContext<'_> {
    /// Resolve a numeric value with this context.
    pub fn number(&self, n: &CssNumeric) -> f64 {
        n.resolve(&self.resolve)
    }

    /// Find the live node a reference points at.
    pub fn lookup(&self, reference: &Reference) -> Option<NodeId> {
        let id = match reference {
            Reference::Id(name) => *self.ids.get(name)?,
            Reference::Object(r) => NodeId::from_object_ref(*r),
        };
        self.nodes.get(id).map(|_| id)
    }

    /// Record that the current property references `target` (or nothing).
    pub fn track_reference(&mut self, target: Option<NodeId>) {
        match target {
            Some(t) => self.refs.set(self.node, self.property, t),
            None => self.refs.clear_property(self.node, self.property),
        }
    }
}

/// The calculator built-in properties of `syntax` use.
pub fn default_calculator(syntax: Syntax) -> Calculator {
    match syntax {
        Syntax::Length
        | Syntax::LengthPercentage
        | Syntax::Number
        | Syntax::NumberPercentage
        | Syntax::Integer
        | Syntax::Angle
        | Syntax::Time => calc_number,
        Syntax::Color | Syntax::Paint | Syntax::Reference => calc_paint,
        Syntax::Keyword(_) => calc_keyword,
        Syntax::Text => calc_text,
        Syntax::Transform => calc_transform,
        Syntax::Position => calc_origin,
        Syntax::NumberList => calc_number_list,
        Syntax::Points => calc_points,
        Syntax::PathData => calc_path,
    }
}

fn unexpected(ctx: &CalcContext<'_>, value: &ParsedValue) -> StyleError {
    StyleError::Parse {
        input: value.to_string(),
        reason: format!("not a valid value for `{}`", ctx.property),
    }
}

fn calc_number(
    ctx: &mut CalcContext<'_>,
    _old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    let n = value.as_numeric().ok_or_else(|| unexpected(ctx, value))?;
    Ok(UsedValue::Number(ctx.number(n)))
}

fn calc_keyword(
    ctx: &mut CalcContext<'_>,
    _old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    let k = value.as_keyword().ok_or_else(|| unexpected(ctx, value))?;
    Ok(UsedValue::Keyword(k.to_owned()))
}

fn calc_text(
    ctx: &mut CalcContext<'_>,
    _old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    match value {
        ParsedValue::String(s) | ParsedValue::Keyword(s) => Ok(UsedValue::Text(s.clone())),
        _ => Err(unexpected(ctx, value)),
    }
}

/// Colors, `none`, and references to other nodes.
fn calc_paint(
    ctx: &mut CalcContext<'_>,
    _old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    let target = match value {
        ParsedValue::Color(_) => None,
        ParsedValue::Reference(r) => ctx.lookup(r),
        v if v.is_none() => None,
        _ => return Err(unexpected(ctx, value)),
    };
    ctx.track_reference(target);
    Ok(match (value, target) {
        (ParsedValue::Color(c), _) => UsedValue::Color(*c),
        (_, Some(id)) => UsedValue::Node(id),
        _ => UsedValue::None,
    })
}

/// Keeps the id map in sync: the first node to claim an id keeps it.
fn calc_id(
    ctx: &mut CalcContext<'_>,
    old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    let UsedValue::Text(new) = calc_text(ctx, old, value)? else {
        return Err(unexpected(ctx, value));
    };
    if let Some(UsedValue::Text(prev)) = old
        && ctx.ids.get(prev) == Some(&ctx.node)
    {
        ctx.ids.remove(prev);
    }
    if !new.is_empty() {
        let owner = *ctx.ids.entry(new.clone()).or_insert(ctx.node);
        if owner != ctx.node {
            log::debug!(target: "glint_scene", "id `{new}` already belongs to {owner:?}");
        }
    }
    Ok(UsedValue::Text(new))
}

/// Transform functions compose left to right into one affine.
///
/// Translation percentages resolve against the viewport.
fn calc_transform(
    ctx: &mut CalcContext<'_>,
    _old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    if value.is_none() {
        return Ok(UsedValue::Transform(Affine::IDENTITY));
    }
    let functions = value.as_list().ok_or_else(|| unexpected(ctx, value))?;
    let mut acc = Affine::IDENTITY;
    for f in functions {
        let ParsedValue::Function { name, args } = f else {
            return Err(unexpected(ctx, value));
        };
        acc = acc * transform_function(ctx, name, args).ok_or_else(|| unexpected(ctx, f))?;
    }
    Ok(UsedValue::Transform(acc))
}

fn transform_function(ctx: &CalcContext<'_>, name: &str, args: &[CssNumeric]) -> Option<Affine> {
    let along = |n: &CssNumeric, base: f64| {
        n.resolve(&ResolveContext {
            percent_base: Some(base),
            ..ctx.resolve
        })
    };
    let plain = |n: &CssNumeric| n.resolve(&ctx.resolve);
    let (w, h) = (ctx.viewport.width, ctx.viewport.height);
    Some(match (name, args) {
        ("translate", [x]) => Affine::translate((along(x, w), 0.0)),
        ("translate", [x, y]) => Affine::translate((along(x, w), along(y, h))),
        ("translatex", [x]) => Affine::translate((along(x, w), 0.0)),
        ("translatey", [y]) => Affine::translate((0.0, along(y, h))),
        ("scale", [s]) => Affine::scale(plain(s)),
        ("scale", [sx, sy]) => Affine::scale_non_uniform(plain(sx), plain(sy)),
        ("scalex", [s]) => Affine::scale_non_uniform(plain(s), 1.0),
        ("scaley", [s]) => Affine::scale_non_uniform(1.0, plain(s)),
        ("rotate", [a]) => Affine::rotate(plain(a).to_radians()),
        ("skew", [ax]) => Affine::skew(plain(ax).to_radians().tan(), 0.0),
        ("skew", [ax, ay]) => Affine::skew(plain(ax).to_radians().tan(), plain(ay).to_radians().tan()),
        ("skewx", [a]) => Affine::skew(plain(a).to_radians().tan(), 0.0),
        ("skewy", [a]) => Affine::skew(0.0, plain(a).to_radians().tan()),
        ("matrix", [a, b, c, d, e, f]) => {
            Affine::new([plain(a), plain(b), plain(c), plain(d), plain(e), plain(f)])
        }
        _ => return None,
    })
}

/// `transform-origin`: keywords become percentages, resolved later against
/// the node's geometry box.
fn calc_origin(
    ctx: &mut CalcContext<'_>,
    _old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    let parts = value.as_list().ok_or_else(|| unexpected(ctx, value))?;
    let vertical_first = |k: Option<&str>| matches!(k, Some("top" | "bottom"));
    let horizontal = |k: Option<&str>| matches!(k, Some("left" | "right"));
    let centre = ParsedValue::keyword("center");
    let (x, y) = match parts {
        [only] if vertical_first(only.as_keyword()) => (&centre, only),
        [only] => (only, &centre),
        [a, b] if vertical_first(a.as_keyword()) || horizontal(b.as_keyword()) => (b, a),
        [a, b] => (a, b),
        _ => return Err(unexpected(ctx, value)),
    };
    let component = |v: &ParsedValue| -> Option<CssNumeric> {
        match v.as_keyword() {
            Some("left" | "top") => Some(CssNumeric::new(0.0, Unit::Percent)),
            Some("center") => Some(CssNumeric::new(50.0, Unit::Percent)),
            Some("right" | "bottom") => Some(CssNumeric::new(100.0, Unit::Percent)),
            Some(_) => None,
            None => v.as_numeric().cloned(),
        }
    };
    match (component(x), component(y)) {
        (Some(x), Some(y)) => Ok(UsedValue::Origin(x, y)),
        _ => Err(unexpected(ctx, value)),
    }
}

fn calc_number_list(
    ctx: &mut CalcContext<'_>,
    _old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    if value.is_none() {
        return Ok(UsedValue::Numbers(Vec::new()));
    }
    let items = value.as_list().ok_or_else(|| unexpected(ctx, value))?;
    items
        .iter()
        .map(|v| v.as_numeric().map(|n| ctx.number(n)))
        .collect::<Option<Vec<_>>>()
        .map(UsedValue::Numbers)
        .ok_or_else(|| unexpected(ctx, value))
}

fn calc_points(
    ctx: &mut CalcContext<'_>,
    _old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    if value.is_none() {
        return Ok(UsedValue::Points(Vec::new()));
    }
    let pairs = value.as_list().ok_or_else(|| unexpected(ctx, value))?;
    pairs
        .iter()
        .map(|pair| match pair.as_list()? {
            [x, y] => Some(Point::new(ctx.number(x.as_numeric()?), ctx.number(y.as_numeric()?))),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(UsedValue::Points)
        .ok_or_else(|| unexpected(ctx, value))
}

fn calc_path(
    ctx: &mut CalcContext<'_>,
    _old: Option<&UsedValue>,
    value: &ParsedValue,
) -> Result<UsedValue, StyleError> {
    match value {
        ParsedValue::Path(p) => Ok(UsedValue::Path(p.clone())),
        v if v.is_none() => Ok(UsedValue::Path(BezPath::new())),
        _ => Err(unexpected(ctx, value)),
    }
}

/// Average advance of a glyph, as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.6;
/// Line height when none is set, as a multiple of the font size.
const DEFAULT_LINE_HEIGHT: f64 = 1.2;

fn layout_text(style: &StyleReader<'_>, kind: ShapeKind, derived: &mut Derived) {
    if kind != ShapeKind::Text {
        derived.text = None;
        return;
    }
    let font_size = style.number("font-size", 16.0);
    let spacing = style.number("letter-spacing", 0.0);
    // A percentage set on an ancestor was resolved against the ancestor's font size.
    let line_height = style
        .specified_used("line-height")
        .and_then(UsedValue::as_number)
        .unwrap_or(font_size * DEFAULT_LINE_HEIGHT);
    let lines: Vec<String> = style.text("text").split('\n').map(str::to_owned).collect();
    let width = lines
        .iter()
        .map(|l| l.chars().count() as f64 * (font_size * GLYPH_ADVANCE + spacing))
        .fold(0.0, f64::max);
    derived.text = Some(TextMetrics {
        width,
        height: line_height * lines.len() as f64,
        lines,
        line_height,
        font_size,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_style::PercentBase;

    fn with_ctx<R>(property: &'static str, f: impl FnOnce(&mut CalcContext<'_>) -> R) -> R {
        let nodes = Nodes::default();
        let mut ids = HashMap::new();
        let mut refs = RefTable::default();
        let mut ctx = CalcContext {
            node: NodeId::new(0, 1),
            kind: ShapeKind::Rect,
            property,
            resolve: ResolveContext::default(),
            viewport: Size::new(200.0, 100.0),
            nodes: &nodes,
            ids: &mut ids,
            refs: &mut refs,
        };
        f(&mut ctx)
    }

    fn calc(property: &'static str, text: &str) -> Result<UsedValue, StyleError> {
        let registry = PropertyRegistry::new();
        let parsed = registry.parse(property, &RawValue::from(text), true)?;
        let handler = registry.get(property).unwrap();
        with_ctx(property, |ctx| (handler.calculator)(ctx, None, &parsed))
    }

    #[test]
    fn builtins_are_registered() {
        let registry = PropertyRegistry::new();
        assert_eq!(registry.iter().count(), BUILTIN_PROPERTIES.len());
        assert!(registry.descriptor("stroke").unwrap().inherited);
        assert_eq!(
            registry.descriptor("bogus"),
            Err(StyleError::UnknownProperty("bogus".into()))
        );
        assert!(registry.get("text").unwrap().post_processor.is_some());
        assert!(registry.get("fill").unwrap().post_processor.is_none());
    }

    #[test]
    fn register_rejects_bad_initial_values() {
        let mut registry = PropertyRegistry::empty();
        let bad = PropertyDescriptor::new("gap", Syntax::Length, "wide");
        assert!(registry.register(bad, calc_number, None).is_err());
        assert!(registry.get("gap").is_none());
        let good = PropertyDescriptor::new("gap", Syntax::Length, "2px").percent_base(PercentBase::Width);
        registry.register(good, calc_number, None).unwrap();
        assert_eq!(registry.get("gap").unwrap().initial().to_string(), "2px");
    }

    #[test]
    fn interpolation_needs_animatable() {
        let registry = PropertyRegistry::new();
        let a = registry.parse("r", &RawValue::from(10.0), true).unwrap();
        let b = registry.parse("r", &RawValue::from(20.0), true).unwrap();
        assert_eq!(registry.interpolate("r", &a, &b, 0.5).unwrap().to_string(), "15px");
        let k = ParsedValue::keyword("round");
        assert_eq!(
            registry.interpolate("line-cap", &k, &k, 0.5),
            Err(StyleError::NotAnimatable("line-cap".into()))
        );
    }

    #[test]
    fn numbers_and_keywords() {
        assert_eq!(calc("r", "2em").unwrap(), UsedValue::Number(32.0));
        assert_eq!(calc("opacity", "50%").unwrap(), UsedValue::Number(0.5));
        assert_eq!(calc("line-cap", "round").unwrap(), UsedValue::Keyword("round".into()));
        assert_eq!(calc("line-dash", "4 2").unwrap(), UsedValue::Numbers(vec![4.0, 2.0]));
        assert_eq!(
            calc("points", "0,0 10,5").unwrap(),
            UsedValue::Points(vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0)])
        );
    }

    #[test]
    fn transforms_compose_left_to_right() {
        let UsedValue::Transform(t) = calc("transform", "translate(10px, 50%) scale(2)").unwrap() else {
            panic!("expected a transform");
        };
        // Scale applies first, then the translation.
        assert_eq!(t * Point::new(1.0, 1.0), Point::new(12.0, 52.0));
        assert_eq!(calc("transform", "none").unwrap(), UsedValue::Transform(Affine::IDENTITY));
    }

    #[test]
    fn origin_keywords_become_percentages() {
        let pct = |v| CssNumeric::new(v, Unit::Percent);
        assert_eq!(calc("transform-origin", "center").unwrap(), UsedValue::Origin(pct(50.0), pct(50.0)));
        assert_eq!(
            calc("transform-origin", "top right").unwrap(),
            UsedValue::Origin(pct(100.0), pct(0.0))
        );
        assert_eq!(
            calc("transform-origin", "10px bottom").unwrap(),
            UsedValue::Origin(CssNumeric::px(10.0), pct(100.0))
        );
    }

    #[test]
    fn unresolved_references_are_none() {
        assert_eq!(calc("clip-path", "url(#missing)").unwrap(), UsedValue::None);
        assert_eq!(calc("fill", "none").unwrap(), UsedValue::None);
    }

    #[test]
    fn first_id_owner_wins() {
        let registry = PropertyRegistry::new();
        let parsed = registry.parse("id", &RawValue::from("a"), true).unwrap();
        let nodes = Nodes::default();
        let mut ids = HashMap::new();
        let mut refs = RefTable::default();
        for idx in [3, 4] {
            let mut ctx = CalcContext {
                node: NodeId::new(idx, 1),
                kind: ShapeKind::Group,
                property: "id",
                resolve: ResolveContext::default(),
                viewport: Size::new(1.0, 1.0),
                nodes: &nodes,
                ids: &mut ids,
                refs: &mut refs,
            };
            calc_id(&mut ctx, None, &parsed).unwrap();
        }
        assert_eq!(ids.get("a"), Some(&NodeId::new(3, 1)));
    }
}
