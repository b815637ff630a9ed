// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene: node arena, attribute resolution, tree mutations and the flush
//! that brings cached transforms, bounds, index entries and paint order up to
//! date.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use glint_index::{Aabb2D, Index, Key, RTreeIndex};
use glint_style::{
    Affects, CssNumeric, CssWide, ObjectRef, ParsedValue, PercentBase, PropertyDescriptor, RawValue,
    Reference, ResolveContext, StyleError,
};
use kurbo::{Affine, Point, Rect, Size, Vec2};

use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::event::EventState;
use crate::frame::{FrameState, FullRedrawReason};
use crate::geometry::{self, Geometry};
use crate::registry::{CalcContext, PostProcessor, PropertyRegistry};
use crate::refs::RefTable;
use crate::style::{Derived, ParsedStyle, StyleReader, UsedValue};
use crate::types::{DirtyFlags, Lifecycle, NodeId, ShapeKind};

/// Box for nodes without render bounds. Never matches a query.
const EMPTY_BOX: Aabb2D<f64> = Aabb2D::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);

/// Outcome of [`Scene::resolve_deferred`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Deferred {
    /// The node was alive and the value was applied.
    Applied,
    /// The node was destroyed before the result arrived.
    Discarded,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    pub(crate) kind: ShapeKind,
    pub(crate) seq: u64,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    raw: BTreeMap<String, RawValue>,
    pub(crate) parsed: ParsedStyle,
    pub(crate) used: HashMap<&'static str, UsedValue>,
    pub(crate) derived: Derived,
    pub(crate) dirty: DirtyFlags,
    pub(crate) local_transform: Affine,
    pub(crate) world_transform: Affine,
    pub(crate) geometry: Option<Geometry>,
    /// Geometry box after clipping, local space.
    local_box: Option<Rect>,
    /// Render box after markers and clipping, local space.
    local_render: Option<Rect>,
    /// Render box grown by the picking slop, local space.
    local_hit: Option<Rect>,
    /// World-space own render box.
    pub(crate) own_render: Option<Rect>,
    /// World-space hit box; what the index holds.
    hit_box: Option<Rect>,
    own_bounds: Option<Rect>,
    bounds: Option<Rect>,
    render_bounds: Option<Rect>,
    /// Region covered by the last paint of this node.
    pub(crate) painted: Option<Rect>,
    index_key: Option<Key>,
    pub(crate) render_order: usize,
}

impl Node {
    fn new(generation: u32, kind: ShapeKind, seq: u64) -> Self {
        Self {
            generation,
            kind,
            seq,
            lifecycle: Lifecycle::Detached,
            parent: None,
            children: Vec::new(),
            raw: BTreeMap::new(),
            parsed: ParsedStyle::new(),
            used: HashMap::new(),
            derived: Derived::default(),
            dirty: DirtyFlags::FRESH,
            local_transform: Affine::IDENTITY,
            world_transform: Affine::IDENTITY,
            geometry: None,
            local_box: None,
            local_render: None,
            local_hit: None,
            own_render: None,
            hit_box: None,
            own_bounds: None,
            bounds: None,
            render_bounds: None,
            painted: None,
            index_key: None,
            render_order: 0,
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.lifecycle == Lifecycle::Attached
    }
}

/// Generational slots.
#[derive(Clone, Debug, Default)]
pub(crate) struct Nodes {
    slots: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl Nodes {
    fn alloc(&mut self, kind: ShapeKind, seq: u64) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.slots.push(None);
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        self.slots[idx] = Some(Node::new(generation, kind, seq));
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        let idx = idx as u32;
        NodeId::new(idx, generation)
    }

    fn free(&mut self, id: NodeId) {
        if self.get(id).is_some() {
            self.slots[id.idx()] = None;
            self.free_list.push(id.idx());
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.idx())?
            .as_ref()
            .filter(|n| n.generation == id.1)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.idx())?
            .as_mut()
            .filter(|n| n.generation == id.1)
    }

    fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, n)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            let idx = i as u32;
            n.as_ref().map(|n| NodeId::new(idx, n.generation))
        })
    }
}

/// A retained 2D scene.
///
/// Owns every node, the spatial index and the render scheduler state. All
/// mutation goes through `&mut self`; caches are refreshed lazily by
/// [`prepare`](Self::prepare), [`tick`](Self::tick), picking and bounds
/// queries.
pub struct Scene {
    pub(crate) config: SceneConfig,
    pub(crate) registry: Rc<PropertyRegistry>,
    pub(crate) nodes: Nodes,
    root: NodeId,
    ids: HashMap<String, NodeId>,
    refs: RefTable,
    initial: HashMap<&'static str, UsedValue>,
    pub(crate) index: RTreeIndex<f64, NodeId>,
    pub(crate) frame: FrameState,
    pub(crate) events: EventState,
    /// Attached nodes in paint order.
    pub(crate) paint_list: Vec<NodeId>,
    order_dirty: bool,
    next_seq: u64,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.nodes.ids().count();
        f.debug_struct("Scene")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("nodes_alive", &alive)
            .field("free_list", &self.nodes.free_list.len())
            .field("index_len", &self.index.len())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl Scene {
    /// A scene with the built-in properties.
    pub fn new(config: SceneConfig) -> Self {
        Self::with_registry(config, PropertyRegistry::new())
    }

    /// A scene with a custom property registry.
    pub fn with_registry(config: SceneConfig, registry: PropertyRegistry) -> Self {
        let mut nodes = Nodes::default();
        let root = nodes.alloc(ShapeKind::Group, 0);
        let mut scene = Self {
            config,
            registry: Rc::new(registry),
            nodes,
            root,
            ids: HashMap::new(),
            refs: RefTable::default(),
            initial: HashMap::new(),
            index: Index::<f64, NodeId>::with_rtree(),
            frame: FrameState::default(),
            events: EventState::default(),
            paint_list: Vec::new(),
            order_dirty: true,
            next_seq: 1,
        };
        scene.initial = scene.initial_values();
        scene.connect_subtree(root);
        scene
    }

    /// Used form of every initial value, resolved without any node context.
    fn initial_values(&self) -> HashMap<&'static str, UsedValue> {
        let mut ids = HashMap::new();
        let mut refs = RefTable::default();
        let mut out = HashMap::new();
        for handler in self.registry.iter() {
            let mut ctx = CalcContext {
                node: self.root,
                kind: ShapeKind::Group,
                property: handler.descriptor.name,
                resolve: self.resolve_context_for(&handler.descriptor, 16.0, 16.0),
                viewport: self.viewport(),
                nodes: &self.nodes,
                ids: &mut ids,
                refs: &mut refs,
            };
            match (handler.calculator)(&mut ctx, None, handler.initial()) {
                Ok(v) => {
                    out.insert(handler.descriptor.name, v);
                }
                Err(e) => {
                    log::error!(target: "glint_scene", "initial value of `{}`: {e}", handler.descriptor.name);
                }
            }
        }
        out
    }

    /// The host configuration.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The property registry.
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// Canvas size in CSS pixels.
    pub fn viewport(&self) -> Size {
        Size::new(self.config.width, self.config.height)
    }

    // --- identity and structure ---

    /// The root group. Always attached, never destroyed.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached node.
    pub fn create_node(&mut self, kind: ShapeKind) -> NodeId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.nodes.alloc(kind, seq)
    }

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some()
    }

    /// Lifecycle state. Stale ids report [`Lifecycle::Destroyed`].
    pub fn lifecycle(&self, id: NodeId) -> Lifecycle {
        self.nodes.get(id).map_or(Lifecycle::Destroyed, |n| n.lifecycle)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id).ok_or(SceneError::UseAfterDestroy(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::UseAfterDestroy(id))
    }

    /// Shape kind of a node.
    pub fn kind(&self, id: NodeId) -> Result<ShapeKind, SceneError> {
        Ok(self.node(id)?.kind)
    }

    /// Parent of a node, if any.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.node(id)?.parent)
    }

    /// Children in insertion order.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        Ok(&self.node(id)?.children)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.nodes.get(n).and_then(|n| n.parent);
        }
        false
    }

    /// `id` and its descendants, parents before children.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.nodes.get(n) else {
                continue;
            };
            out.push(n);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Path from the top-most ancestor down to `id`, inclusive.
    pub(crate) fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            out.push(n);
            cur = self.nodes.get(n).and_then(|n| n.parent);
        }
        out.reverse();
        out
    }

    // --- attributes ---

    /// Set one attribute. See [`set_attributes`](Self::set_attributes).
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<RawValue>,
    ) -> Result<(), SceneError> {
        self.set_attributes(id, [(name, value.into())])
    }

    /// Set several attributes as one batch.
    ///
    /// Every value is stored raw, parsed and resolved; post-processors run once
    /// after the batch. Unknown names are stored and otherwise ignored. A value
    /// that fails to parse or resolve keeps the previous used value; the first
    /// such failure is returned after the rest of the batch is applied.
    pub fn set_attributes<'a, V: Into<RawValue>>(
        &mut self,
        id: NodeId,
        attrs: impl IntoIterator<Item = (&'a str, V)>,
    ) -> Result<(), SceneError> {
        self.node(id)?;
        let registry = Rc::clone(&self.registry);
        let css = self.config.enable_css_parsing;
        let mut first_error: Option<SceneError> = None;
        let mut changed: Vec<&'static str> = Vec::new();
        for (name, value) in attrs {
            let raw = value.into();
            let parsed = registry
                .descriptor(name)
                .map(|d| d.name)
                .and_then(|property| Ok((property, registry.parse(property, &raw, css)?)));
            self.node_mut(id)?.raw.insert(name.to_owned(), raw);
            match parsed {
                Ok((property, parsed)) => {
                    self.node_mut(id)?.parsed.insert(property, parsed);
                    changed.retain(|c| *c != property);
                    changed.push(property);
                }
                Err(StyleError::UnknownProperty(_)) => {
                    log::debug!(target: "glint_scene", "{id:?}: unknown property `{name}` stored raw");
                }
                Err(e) => {
                    log::warn!(target: "glint_scene", "{id:?}: `{name}`: {e}");
                    first_error.get_or_insert(e.into());
                }
            }
        }
        // Font-relative values of the batch need the new font size.
        changed.sort_by_key(|name| *name != "font-size");
        for &name in &changed {
            if let Err(e) = self.resolve_property(id, name) {
                first_error.get_or_insert(e.into());
            }
        }
        let post = dedup_post_processors(
            changed
                .iter()
                .filter_map(|name| registry.get(name).and_then(|h| h.post_processor)),
        );
        self.run_post_processors(id, &post);
        self.mark_changed(id, &changed);
        first_error.map_or(Ok(()), Err)
    }

    /// The raw value last set for `name`.
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Result<Option<&RawValue>, SceneError> {
        Ok(self.node(id)?.raw.get(name))
    }

    /// Remove an attribute; the property falls back to inheritance or its initial value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), SceneError> {
        self.node_mut(id)?.raw.remove(name);
        let registry = Rc::clone(&self.registry);
        let Some(handler) = registry.get(name) else {
            return Ok(());
        };
        let property = handler.descriptor.name;
        if self.node_mut(id)?.parsed.remove(property).is_none() {
            return Ok(());
        }
        self.release_property(id, property);
        self.run_post_processors(id, &dedup_post_processors(handler.post_processor));
        self.mark_changed(id, &[property]);
        Ok(())
    }

    /// The parsed value this node defines for `name`.
    pub fn parsed_value(&self, id: NodeId, name: &str) -> Result<Option<&ParsedValue>, SceneError> {
        Ok(self.node(id)?.parsed.get(name))
    }

    /// The effective used value of `name`: own, inherited or initial.
    pub fn used_value(&self, id: NodeId, name: &str) -> Result<Option<&UsedValue>, SceneError> {
        Ok(self.style(id)?.used(name))
    }

    /// Read access to a node's effective style.
    pub fn style(&self, id: NodeId) -> Result<StyleReader<'_>, SceneError> {
        self.node(id)?;
        Ok(self.reader(id))
    }

    pub(crate) fn reader(&self, id: NodeId) -> StyleReader<'_> {
        StyleReader {
            nodes: &self.nodes,
            registry: &self.registry,
            initial: &self.initial,
            id,
        }
    }

    fn resolve_context_for(&self, d: &PropertyDescriptor, font_size: f64, root_font_size: f64) -> ResolveContext {
        let Size { width, height } = self.viewport();
        let percent_base = match d.percent_base {
            PercentBase::None => None,
            PercentBase::Width => Some(width),
            PercentBase::Height => Some(height),
            PercentBase::Diagonal => Some(width.hypot(height) / core::f64::consts::SQRT_2),
            PercentBase::FontSize => Some(font_size),
        };
        ResolveContext {
            percent_base,
            font_size,
            root_font_size,
        }
    }

    fn resolve_context(&self, id: NodeId, d: &PropertyDescriptor) -> ResolveContext {
        // `em` in `font-size` itself refers to the parent's font size.
        let font_source = if d.name == "font-size" {
            self.nodes.get(id).and_then(|n| n.parent)
        } else {
            Some(id)
        };
        let font_size = font_source.map_or(16.0, |n| self.reader(n).number("font-size", 16.0));
        let root_font_size = self.reader(self.root).number("font-size", 16.0);
        self.resolve_context_for(d, font_size, root_font_size)
    }

    /// Parsed to used for one property of one node.
    fn resolve_property(&mut self, id: NodeId, name: &'static str) -> Result<(), StyleError> {
        let registry = Rc::clone(&self.registry);
        let Some(handler) = registry.get(name) else {
            return Err(StyleError::UnknownProperty(name.to_owned()));
        };
        let Some(node) = self.nodes.get(id) else {
            return Ok(());
        };
        let Some(parsed) = node.parsed.get(name) else {
            self.release_property(id, name);
            return Ok(());
        };
        let value = match parsed.css_wide() {
            Some(CssWide::Inherit) => None,
            Some(CssWide::Unset) if handler.descriptor.inherited => None,
            Some(CssWide::Initial | CssWide::Unset) => Some(handler.initial().clone()),
            None => Some(parsed.clone()),
        };
        let Some(value) = value else {
            // Inherited: the reader walks up to the nearest ancestor value.
            self.release_property(id, name);
            return Ok(());
        };
        let kind = node.kind;
        let resolve = self.resolve_context(id, &handler.descriptor);
        let viewport = self.viewport();
        let old = node.used.get(name);
        let mut ctx = CalcContext {
            node: id,
            kind,
            property: name,
            resolve,
            viewport,
            nodes: &self.nodes,
            ids: &mut self.ids,
            refs: &mut self.refs,
        };
        let result = (handler.calculator)(&mut ctx, old, &value);
        let Some(node) = self.nodes.get_mut(id) else {
            return Ok(());
        };
        match result {
            Ok(used) => {
                node.used.insert(name, used);
                if name == "id" {
                    self.mark_id_referrers();
                }
                Ok(())
            }
            Err(e) => {
                log::warn!(target: "glint_scene", "{id:?}: cannot resolve `{name}` ({value}): {e}");
                if !node.used.contains_key(name)
                    && let Some(initial) = self.initial.get(name)
                {
                    node.used.insert(name, initial.clone());
                }
                Err(e)
            }
        }
    }

    /// Drop a node's own used value, undoing calculator side effects.
    fn release_property(&mut self, id: NodeId, name: &'static str) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let old = node.used.remove(name);
        self.refs.clear_property(id, name);
        if let Some(UsedValue::Text(prev)) = old.as_ref().filter(|_| name == "id")
            && self.ids.get(prev) == Some(&id)
        {
            self.ids.remove(prev);
            self.mark_id_referrers();
        }
    }

    fn run_post_processors(&mut self, id: NodeId, post: &[PostProcessor]) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if post.is_empty() {
            return;
        }
        let mut derived = node.derived.clone();
        let kind = node.kind;
        let reader = self.reader(id);
        for p in post {
            (p.run)(&reader, kind, &mut derived);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.derived = derived;
        }
    }

    /// Re-run every calculator and post-processor of a node.
    fn restyle(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let mut names: Vec<&'static str> = node.parsed.keys().copied().collect();
        names.sort_by_key(|n| (*n != "font-size", *n));
        for name in names {
            // Failures were reported when the value was set and keep the old used value.
            let _ = self.resolve_property(id, name);
        }
        let registry = Rc::clone(&self.registry);
        let post = dedup_post_processors(registry.iter().filter_map(|h| h.post_processor));
        self.run_post_processors(id, &post);
    }

    /// Restyle nodes whose `url(#id)` references may now resolve differently.
    fn mark_id_referrers(&mut self) {
        let referrers: Vec<NodeId> = self
            .nodes
            .ids()
            .filter(|&n| {
                self.nodes.get(n).is_some_and(|node| {
                    node.parsed
                        .values()
                        .any(|v| matches!(v, ParsedValue::Reference(Reference::Id(_))))
                })
            })
            .collect();
        for n in referrers {
            self.mark(n, DirtyFlags::STYLE | DirtyFlags::BOUNDS | DirtyFlags::RENDER);
        }
    }

    // --- dirty marking ---

    pub(crate) fn mark(&mut self, id: NodeId, flags: DirtyFlags) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.dirty |= flags;
        if flags.contains(DirtyFlags::ORDER) {
            self.order_dirty = true;
        }
        if flags.contains(DirtyFlags::RENDER) && node.is_attached() {
            self.frame.queue(id);
        }
    }

    fn mark_subtree(&mut self, id: NodeId, flags: DirtyFlags) {
        for n in self.subtree(id) {
            self.mark(n, flags);
        }
    }

    fn mark_changed(&mut self, id: NodeId, changed: &[&'static str]) {
        let registry = Rc::clone(&self.registry);
        let mut flags = DirtyFlags::STYLE | DirtyFlags::RENDER;
        for d in changed.iter().filter_map(|name| registry.descriptor(name).ok()) {
            let own = flags_for(d.affects);
            flags |= own;
            if d.affects.contains(Affects::ORDER)
                && let Some(parent) = self.nodes.get(id).and_then(|n| n.parent)
            {
                self.mark(parent, DirtyFlags::ORDER);
            }
            if d.name == "font-size" {
                // Every `em` below may change.
                let children = self.nodes.get(id).map(|n| n.children.clone()).unwrap_or_default();
                for c in children {
                    self.mark_subtree(c, DirtyFlags::STYLE | DirtyFlags::BOUNDS | DirtyFlags::RENDER);
                }
            } else {
                self.mark_inheritors(id, d.name, d.inherited, own | DirtyFlags::STYLE | DirtyFlags::RENDER);
            }
        }
        self.mark(id, flags);
        self.mark_referrers(id);
    }

    /// Mark descendants that take `name` from `id`, stopping at nodes that define their own.
    ///
    /// A non-inherited property only flows into children that say `inherit` explicitly.
    fn mark_inheritors(&mut self, id: NodeId, name: &str, inherited: bool, flags: DirtyFlags) {
        let children = self.nodes.get(id).map(|n| n.children.clone()).unwrap_or_default();
        for c in children {
            let takes_parent = self.nodes.get(c).is_some_and(|n| match n.parsed.get(name) {
                None => inherited,
                Some(v) => match v.css_wide() {
                    Some(CssWide::Inherit) => true,
                    Some(CssWide::Unset) => inherited,
                    _ => false,
                },
            });
            if !takes_parent {
                continue;
            }
            self.mark(c, flags);
            self.mark_inheritors(c, name, inherited, flags);
        }
    }

    /// Nodes referencing `id` (as clip path, marker, ...) need new render boxes.
    fn mark_referrers(&mut self, id: NodeId) {
        for (referrer, _) in self.refs.referrers(id) {
            self.mark(referrer, DirtyFlags::BOUNDS | DirtyFlags::RENDER);
        }
    }

    /// Nodes holding a reference to `id`.
    pub fn referrers(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self.refs.referrers(id).into_iter().map(|(n, _)| n).collect();
        out.dedup();
        out
    }

    // --- tree mutation ---

    /// Append `child` as the last child of `parent`, moving it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.insert_child(parent, child, None)
    }

    /// Insert `child` before `reference`, which must be a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<(), SceneError> {
        self.insert_child(parent, child, Some(reference))
    }

    fn insert_child(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> Result<(), SceneError> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root {
            return Err(SceneError::RootNode);
        }
        if self.is_ancestor_or_self(child, parent) {
            log::warn!(target: "glint_scene", "rejected: appending {child:?} to {parent:?} would create a cycle");
            return Err(SceneError::CyclicTree { parent, child });
        }
        if let Some(reference) = before
            && self.node(reference)?.parent != Some(parent)
        {
            return Err(SceneError::NotAChild {
                parent,
                child: reference,
            });
        }
        if before == Some(child) {
            // Already in place.
            return Ok(());
        }
        let was_attached = self.node(child)?.is_attached();
        let will_attach = self.node(parent)?.is_attached();
        if let Some(old) = self.node(child)?.parent {
            self.unlink(old, child);
        }
        let siblings = &mut self.node_mut(parent)?.children;
        let at = before
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(siblings.len());
        siblings.insert(at, child);
        self.node_mut(child)?.parent = Some(parent);
        self.mark(parent, DirtyFlags::ORDER | DirtyFlags::BOUNDS);
        self.mark_subtree(child, DirtyFlags::STYLE | DirtyFlags::TRANSFORM | DirtyFlags::BOUNDS | DirtyFlags::RENDER);
        match (was_attached, will_attach) {
            (false, true) => self.connect_subtree(child),
            (true, false) => self.disconnect_subtree(child),
            // Moves within the attached tree are not (dis)connections.
            _ => {}
        }
        Ok(())
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.unlink(parent, child);
        if self.node(child)?.is_attached() {
            self.disconnect_subtree(child);
        }
        Ok(())
    }

    /// Detach `id` from its parent, if it has one.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootNode);
        }
        match self.node(id)?.parent {
            Some(parent) => self.remove_child(parent, id),
            None => Ok(()),
        }
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
        self.mark(parent, DirtyFlags::ORDER | DirtyFlags::BOUNDS | DirtyFlags::RENDER);
        // Inherited values now come from elsewhere.
        self.mark_subtree(child, DirtyFlags::STYLE | DirtyFlags::TRANSFORM | DirtyFlags::BOUNDS);
    }

    fn connect_subtree(&mut self, id: NodeId) {
        for n in self.subtree(id) {
            let Some(node) = self.nodes.get_mut(n) else {
                continue;
            };
            node.lifecycle = Lifecycle::Attached;
            if node.index_key.is_none() {
                node.index_key = Some(self.index.insert(EMPTY_BOX, n));
            }
            self.frame.notify_connect(n);
            self.mark(n, DirtyFlags::FRESH);
        }
    }

    fn disconnect_subtree(&mut self, id: NodeId) {
        for n in self.subtree(id) {
            let Some(node) = self.nodes.get_mut(n) else {
                continue;
            };
            node.lifecycle = Lifecycle::Detached;
            if let Some(key) = node.index_key.take() {
                self.index.remove(key);
            }
            node.own_render = None;
            node.hit_box = None;
            if let Some(painted) = node.painted.take() {
                self.frame.removed_regions.push(painted);
            }
            node.render_order = 0;
            self.frame.notify_disconnect(n);
            self.events.forget_hover(n);
        }
        self.order_dirty = true;
    }

    /// Destroy `id` and its subtree.
    ///
    /// The nodes are detached, their references and listeners released, and
    /// their ids become stale. Nodes that referenced them re-resolve to no
    /// reference.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootNode);
        }
        self.remove(id)?;
        let doomed = self.subtree(id);
        for &n in &doomed {
            self.refs.clear_referrer(n);
            self.events.forget(n);
        }
        self.ids.retain(|_, owner| !doomed.contains(owner));
        let mut orphaned = Vec::new();
        for &n in &doomed {
            orphaned.extend(self.refs.remove_target(n).into_iter().map(|(r, _)| r));
            self.nodes.free(n);
        }
        for r in orphaned {
            self.mark(r, DirtyFlags::STYLE | DirtyFlags::BOUNDS | DirtyFlags::RENDER);
        }
        self.mark_id_referrers();
        log::debug!(target: "glint_scene", "destroyed {} node(s) under {id:?}", doomed.len());
        Ok(())
    }

    /// Copy a node (and, if `deep`, its subtree) into fresh detached nodes.
    ///
    /// Raw attributes are copied and re-resolved. Object references that point
    /// into the copied subtree are re-targeted to the copies.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId, SceneError> {
        self.node(id)?;
        let sources = if deep { self.subtree(id) } else { vec![id] };
        let mut map = HashMap::new();
        for &src in &sources {
            let kind = self.node(src)?.kind;
            map.insert(src, self.create_node(kind));
        }
        for &src in sources.iter().skip(1) {
            if let Some(parent) = self.node(src)?.parent.and_then(|p| map.get(&p).copied()) {
                self.append_child(parent, map[&src])?;
            }
        }
        for &src in &sources {
            let attrs: Vec<(String, RawValue)> = self
                .node(src)?
                .raw
                .iter()
                .map(|(k, v)| (k.clone(), retarget(v, &map)))
                .collect();
            if let Err(e) = self.set_attributes(map[&src], attrs.iter().map(|(k, v)| (k.as_str(), v.clone()))) {
                log::warn!(target: "glint_scene", "cloning {src:?}: {e}");
            }
        }
        Ok(map[&id])
    }

    /// Set the `transform` attribute from an affine.
    pub fn set_local_transform(&mut self, id: NodeId, transform: Affine) -> Result<(), SceneError> {
        let [a, b, c, d, e, f] = transform.as_coeffs();
        self.set_attribute(id, "transform", format!("matrix({a}, {b}, {c}, {d}, {e}, {f})"))
    }

    /// Move a node by replacing the translation of its `transform`.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> Result<(), SceneError> {
        let current = match self.node(id)?.used.get("transform") {
            Some(UsedValue::Transform(t)) => *t,
            _ => Affine::IDENTITY,
        };
        self.set_local_transform(id, current.with_translation(position.to_vec2()))
    }

    /// The node whose `id` attribute is `name`.
    pub fn find_by_id(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied().filter(|&n| self.is_alive(n))
    }

    /// Apply the result of an asynchronous computation, unless the node is gone.
    pub fn resolve_deferred(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<RawValue>,
    ) -> Result<Deferred, SceneError> {
        if !self.is_alive(id) {
            log::debug!(target: "glint_scene", "discarding deferred `{name}` for destroyed {id:?}");
            return Ok(Deferred::Discarded);
        }
        self.set_attribute(id, name, value)?;
        Ok(Deferred::Applied)
    }

    /// Change the canvas size. Percentages re-resolve and the next frame redraws everything.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.config.width = width;
        self.config.height = height;
        self.frame.force_full(FullRedrawReason::Resized);
        for n in self.nodes.ids().collect::<Vec<_>>() {
            self.mark(n, DirtyFlags::STYLE | DirtyFlags::BOUNDS | DirtyFlags::TRANSFORM);
        }
    }

    /// Change the device pixel ratio. The next frame redraws everything.
    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.config.device_pixel_ratio = ratio;
        self.frame.force_full(FullRedrawReason::Resized);
    }

    // --- bounds ---

    /// World-space geometry bounds of a node and its descendants.
    pub fn bounds(&mut self, id: NodeId) -> Result<Option<Rect>, SceneError> {
        self.flush_for(id)?;
        Ok(self.node(id)?.bounds)
    }

    /// World-space render bounds (geometry plus stroke, shadow and markers) of
    /// a node and its descendants.
    pub fn render_bounds(&mut self, id: NodeId) -> Result<Option<Rect>, SceneError> {
        self.flush_for(id)?;
        Ok(self.node(id)?.render_bounds)
    }

    /// Geometry bounds of a node and its descendants in the node's own space.
    pub fn local_bounds(&mut self, id: NodeId) -> Result<Option<Rect>, SceneError> {
        self.flush_for(id)?;
        Ok(self.local_bounds_of(id))
    }

    fn local_bounds_of(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        node.children.iter().fold(node.local_box, |acc, &c| {
            let child = self.nodes.get(c).and_then(|cn| {
                self.local_bounds_of(c)
                    .map(|b| cn.local_transform.transform_rect_bbox(b))
            });
            union(acc, child)
        })
    }

    /// World transform of a node, after a flush.
    pub fn world_transform(&mut self, id: NodeId) -> Result<Affine, SceneError> {
        self.flush_for(id)?;
        Ok(self.node(id)?.world_transform)
    }

    /// Every attached node whose hit box intersects `rect`, in no particular order.
    ///
    /// The hit box is the render box grown by `increased-line-width-for-hit-testing`.
    pub fn query_rect(&mut self, rect: Rect) -> Vec<NodeId> {
        self.prepare();
        self.index
            .query_rect(Aabb2D::new(rect.x0, rect.y0, rect.x1, rect.y1))
            .map(|(_, id)| id)
            .collect()
    }

    // --- flush ---

    fn flush_for(&mut self, id: NodeId) -> Result<(), SceneError> {
        let top = *self
            .path_to_root(id)
            .first()
            .ok_or(SceneError::UseAfterDestroy(id))?;
        self.node(id)?;
        if top == self.root {
            self.prepare();
        } else {
            self.update_recursive(top, Affine::IDENTITY, false);
        }
        Ok(())
    }

    /// Bring styles, transforms, bounds, index entries and paint order up to date.
    pub fn prepare(&mut self) {
        self.update_recursive(self.root, Affine::IDENTITY, false);
        if self.order_dirty {
            self.rebuild_order();
        }
    }

    /// Style top-down, then bounds bottom-up on the way back.
    fn update_recursive(&mut self, id: NodeId, parent_world: Affine, parent_moved: bool) {
        let Some(dirty) = self.nodes.get(id).map(|n| n.dirty) else {
            return;
        };
        if dirty.contains(DirtyFlags::STYLE) {
            self.restyle(id);
        }
        let regeometry = dirty.intersects(DirtyFlags::STYLE | DirtyFlags::BOUNDS);
        if regeometry {
            self.update_geometry(id);
        }
        let retransform = regeometry || dirty.contains(DirtyFlags::TRANSFORM);
        if retransform {
            let local = self.local_transform_of(id);
            if let Some(node) = self.nodes.get_mut(id) {
                node.local_transform = local;
            }
        }
        let moved = parent_moved || retransform;
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if moved {
            node.world_transform = parent_world * node.local_transform;
            let world = node.world_transform;
            let own_render = node.local_render.map(|r| world.transform_rect_bbox(r));
            let hit_box = node.local_hit.map(|r| world.transform_rect_bbox(r));
            node.own_bounds = node.local_box.map(|r| world.transform_rect_bbox(r));
            if hit_box != node.hit_box {
                node.hit_box = hit_box;
                if let Some(key) = node.index_key {
                    self.index.update(key, to_aabb(hit_box));
                }
            }
            if own_render != node.own_render {
                let old = core::mem::replace(&mut node.own_render, own_render);
                if node.is_attached() && (old.is_some() || own_render.is_some()) {
                    self.frame.moved.push(id);
                }
            }
        }
        node.dirty
            .remove(DirtyFlags::STYLE | DirtyFlags::BOUNDS | DirtyFlags::TRANSFORM);
        let world = node.world_transform;
        let children = node.children.clone();
        for &c in &children {
            self.update_recursive(c, world, moved);
        }
        let (mut bounds, mut render_bounds) = self
            .nodes
            .get(id)
            .map_or((None, None), |n| (n.own_bounds, n.own_render));
        for c in children {
            if let Some(child) = self.nodes.get(c) {
                bounds = union(bounds, child.bounds);
                render_bounds = union(render_bounds, child.render_bounds);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.bounds = bounds;
            node.render_bounds = union(render_bounds, bounds);
        }
    }

    /// Recompute local geometry and render box.
    fn update_geometry(&mut self, id: NodeId) {
        let Some(kind) = self.nodes.get(id).map(|n| n.kind) else {
            return;
        };
        let reader = self.reader(id);
        let geometry = Geometry::from_style(kind, &reader);
        let clip = reader
            .used("clip-path")
            .and_then(UsedValue::as_node)
            .and_then(|c| self.own_geometry(c))
            .map(|g| g.bounding_box());
        let mut local_box = geometry.as_ref().map(Geometry::bounding_box);
        let mut local_render = geometry.as_ref().map(|g| {
            let mut r = geometry::render_box(g, &reader);
            if let Some((start, end)) = g.endpoints() {
                for (prop, at) in [("marker-start", start), ("marker-end", end)] {
                    let marker = reader
                        .used(prop)
                        .and_then(UsedValue::as_node)
                        .and_then(|m| self.own_geometry(m));
                    if let Some(m) = marker {
                        r = r.union(m.bounding_box() + at.to_vec2());
                    }
                }
            }
            r
        });
        if let Some(clip) = clip {
            local_box = local_box.and_then(|b| intersect(b, clip));
            local_render = local_render.and_then(|r| intersect(r, clip));
        }
        let slop = reader.number("increased-line-width-for-hit-testing", 0.0).max(0.0) / 2.0;
        let local_hit = local_render.map(|r| r.inflate(slop, slop));
        if let Some(node) = self.nodes.get_mut(id) {
            node.geometry = geometry;
            node.local_box = local_box;
            node.local_render = local_render;
            node.local_hit = local_hit;
        }
    }

    /// Geometry of another node, computed from its current style.
    pub(crate) fn own_geometry(&self, id: NodeId) -> Option<Geometry> {
        let node = self.nodes.get(id)?;
        Geometry::from_style(node.kind, &self.reader(id))
    }

    /// `translate(origin) * transform * translate(-origin)`.
    fn local_transform_of(&self, id: NodeId) -> Affine {
        let Some(node) = self.nodes.get(id) else {
            return Affine::IDENTITY;
        };
        let reader = self.reader(id);
        let transform = match reader.used("transform") {
            Some(UsedValue::Transform(t)) => *t,
            _ => Affine::IDENTITY,
        };
        if transform == Affine::IDENTITY {
            return transform;
        }
        let reference = node.geometry.as_ref().map_or(Rect::ZERO, Geometry::bounding_box);
        let origin = match reader.used("transform-origin") {
            Some(UsedValue::Origin(x, y)) => Vec2::new(
                origin_component(x, reference.x0, reference.width()),
                origin_component(y, reference.y0, reference.height()),
            ),
            _ => Vec2::ZERO,
        };
        Affine::translate(origin) * transform * Affine::translate(-origin)
    }

    /// Stable z-index sort of siblings, then a global paint-order numbering.
    fn rebuild_order(&mut self) {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            order.push(id);
            let mut children: Vec<(f64, NodeId)> = node
                .children
                .iter()
                .map(|&c| (self.reader(c).number("z-index", 0.0), c))
                .collect();
            children.sort_by(|a, b| a.0.total_cmp(&b.0));
            stack.extend(children.into_iter().rev().map(|(_, c)| c));
        }
        for (i, &id) in order.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(id) {
                node.render_order = i;
                node.dirty.remove(DirtyFlags::ORDER);
            }
        }
        log::trace!(target: "glint_scene", "paint order rebuilt for {} node(s)", order.len());
        self.paint_list = order;
        self.order_dirty = false;
    }
}

fn dedup_post_processors(iter: impl IntoIterator<Item = PostProcessor>) -> Vec<PostProcessor> {
    let mut out: Vec<PostProcessor> = Vec::new();
    for p in iter {
        if !out.iter().any(|q| q.name == p.name) {
            out.push(p);
        }
    }
    out
}

fn flags_for(affects: Affects) -> DirtyFlags {
    let mut flags = DirtyFlags::empty();
    if affects.intersects(Affects::GEOMETRY | Affects::RENDER_BOUNDS | Affects::TEXT | Affects::PICKING) {
        flags |= DirtyFlags::BOUNDS;
    }
    if affects.contains(Affects::TRANSFORM) {
        flags |= DirtyFlags::TRANSFORM;
    }
    flags
}

fn origin_component(v: &CssNumeric, start: f64, extent: f64) -> f64 {
    let offset = if v.has_percent() { start } else { 0.0 };
    offset
        + v.resolve(&ResolveContext {
            percent_base: Some(extent),
            ..ResolveContext::default()
        })
}

/// Point object references at their copies.
fn retarget(raw: &RawValue, map: &HashMap<NodeId, NodeId>) -> RawValue {
    let copy_of = |r: ObjectRef| map.get(&NodeId::from_object_ref(r)).map(|c| c.object_ref());
    match raw {
        RawValue::Ref(r) => RawValue::Ref(copy_of(*r).unwrap_or(*r)),
        RawValue::List(items) => RawValue::List(items.iter().map(|i| retarget(i, map)).collect()),
        RawValue::Str(s) => {
            let handle = s
                .trim()
                .strip_prefix("ref(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|n| n.trim().parse::<u64>().ok());
            match handle.and_then(|h| copy_of(ObjectRef(h))) {
                Some(copy) => RawValue::Str(format!("ref({})", copy.0)),
                None => raw.clone(),
            }
        }
        RawValue::Number(_) => raw.clone(),
    }
}

pub(crate) fn union(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, b) => a.or(b),
    }
}

pub(crate) fn intersect(a: Rect, b: Rect) -> Option<Rect> {
    let i = a.intersect(b);
    (a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1).then_some(i)
}

fn to_aabb(r: Option<Rect>) -> Aabb2D<f64> {
    r.map_or(EMPTY_BOX, |r| Aabb2D::new(r.x0, r.y0, r.x1, r.y1))
}
