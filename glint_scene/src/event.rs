// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event listeners, two-phase dispatch, pointer capture and hover tracking.
//!
//! ## Propagation
//!
//! [`Scene::dispatch_event`] snapshots the root→target path before the first
//! listener runs, then visits it in three phases:
//!
//! - [`Phase::Capture`]: capture listeners, root first, excluding the target.
//! - [`Phase::Target`]: capture listeners, then bubble listeners, of the target.
//! - [`Phase::Bubble`]: bubble listeners, parent of the target first. Skipped
//!   when the event does not bubble.
//!
//! [`Event::stop_propagation`] finishes the current node and stops;
//! [`Event::stop_immediate_propagation`] also skips the remaining listeners on
//! the current node.
//!
//! ## Hover
//!
//! [`Scene::dispatch_pointer`] keeps the hovered path. When it changes,
//! `pointerleave` is sent to the nodes that were left, innermost first, then
//! `pointerenter` to the nodes entered, outermost first. Neither bubbles.

use std::collections::HashMap;
use std::rc::Rc;

use kurbo::Point;

use crate::error::SceneError;
use crate::scene::Scene;
use crate::types::NodeId;

/// Phases of event propagation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Root-to-target traversal.
    Capture,
    /// The target node.
    Target,
    /// Target-to-root traversal.
    Bubble,
}

/// An event travelling through the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    kind: String,
    target: Option<NodeId>,
    current_target: Option<NodeId>,
    phase: Phase,
    point: Option<Point>,
    bubbles: bool,
    propagation_stopped: bool,
    immediate_stopped: bool,
    default_prevented: bool,
}

impl Event {
    /// A bubbling event of type `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            current_target: None,
            phase: Phase::Target,
            point: None,
            bubbles: true,
            propagation_stopped: false,
            immediate_stopped: false,
            default_prevented: false,
        }
    }

    /// An event that stops after the target phase.
    pub fn non_bubbling(kind: impl Into<String>) -> Self {
        Self {
            bubbles: false,
            ..Self::new(kind)
        }
    }

    /// Attach a canvas-space pointer position.
    pub fn with_point(mut self, point: Point) -> Self {
        self.point = Some(point);
        self
    }

    /// Event type, such as `"pointerdown"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Node the event was dispatched to.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Node whose listener is running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Pointer position in canvas space, for pointer events.
    pub fn point(&self) -> Option<Point> {
        self.point
    }

    /// Whether the event takes part in the bubble phase.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Stop after the listeners of the current node.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop now, skipping the remaining listeners of the current node too.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
    }

    /// Whether propagation was stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Ask the host to skip its default action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether a listener called [`prevent_default`](Self::prevent_default).
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Options for [`Scene::add_event_listener`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Run in the capture phase instead of the bubble phase.
    pub capture: bool,
    /// Remove the listener before its first call.
    pub once: bool,
}

/// Handle returned by [`Scene::add_event_listener`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Listener callback. Receives the scene, so it may mutate it.
pub type Listener = Rc<dyn Fn(&mut Scene, &mut Event)>;

/// Kinds of pointer input accepted by [`Scene::dispatch_pointer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// `pointerdown`
    Down,
    /// `pointermove`
    Move,
    /// `pointerup`; releases pointer capture.
    Up,
}

impl PointerKind {
    /// The event type dispatched for this input.
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Down => "pointerdown",
            Self::Move => "pointermove",
            Self::Up => "pointerup",
        }
    }
}

struct Entry {
    id: ListenerId,
    kind: String,
    capture: bool,
    once: bool,
    callback: Listener,
}

#[derive(Default)]
pub(crate) struct EventState {
    listeners: HashMap<NodeId, Vec<Entry>>,
    next_id: u64,
    hover: Vec<NodeId>,
    capture: Option<NodeId>,
}

impl core::fmt::Debug for EventState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let count: usize = self.listeners.values().map(Vec::len).sum();
        f.debug_struct("EventState")
            .field("listeners", &count)
            .field("hover", &self.hover)
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

impl EventState {
    /// Drop everything held for a destroyed node.
    pub(crate) fn forget(&mut self, id: NodeId) {
        self.listeners.remove(&id);
        self.forget_hover(id);
    }

    /// A node left the scene: it is no longer hovered or capturing.
    pub(crate) fn forget_hover(&mut self, id: NodeId) {
        if let Some(at) = self.hover.iter().position(|n| *n == id) {
            self.hover.truncate(at);
        }
        if self.capture == Some(id) {
            self.capture = None;
        }
    }

    fn contains(&self, node: NodeId, id: ListenerId) -> bool {
        self.listeners
            .get(&node)
            .is_some_and(|entries| entries.iter().any(|e| e.id == id))
    }

    fn remove(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(entries) = self.listeners.get_mut(&node) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.listeners.remove(&node);
        }
        removed
    }
}

impl Scene {
    /// Listen for events of type `kind` on `node`.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: impl Fn(&mut Self, &mut Event) + 'static,
        options: ListenerOptions,
    ) -> Result<ListenerId, SceneError> {
        self.node(node)?;
        let id = ListenerId(self.events.next_id);
        self.events.next_id += 1;
        self.events.listeners.entry(node).or_default().push(Entry {
            id,
            kind: kind.to_owned(),
            capture: options.capture,
            once: options.once,
            callback: Rc::new(listener),
        });
        Ok(id)
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn remove_event_listener(&mut self, node: NodeId, listener: ListenerId) -> bool {
        self.events.remove(node, listener)
    }

    /// Dispatch `event` to `target` through capture, target and bubble phases.
    ///
    /// Returns `false` if a listener called [`Event::prevent_default`].
    pub fn dispatch_event(&mut self, target: NodeId, event: &mut Event) -> Result<bool, SceneError> {
        self.node(target)?;
        let path = self.path_to_root(target);
        let ancestors = &path[..path.len().saturating_sub(1)];
        event.target = Some(target);
        event.propagation_stopped = false;
        event.immediate_stopped = false;

        'phases: {
            event.phase = Phase::Capture;
            for &n in ancestors {
                self.invoke(n, event, true);
                if event.propagation_stopped {
                    break 'phases;
                }
            }
            event.phase = Phase::Target;
            self.invoke(target, event, true);
            if !event.immediate_stopped {
                self.invoke(target, event, false);
            }
            if event.propagation_stopped || !event.bubbles {
                break 'phases;
            }
            event.phase = Phase::Bubble;
            for &n in ancestors.iter().rev() {
                self.invoke(n, event, false);
                if event.propagation_stopped {
                    break 'phases;
                }
            }
        }
        event.current_target = None;
        Ok(!event.default_prevented)
    }

    /// Run the listeners of one node for one phase.
    fn invoke(&mut self, node: NodeId, event: &mut Event, capture: bool) {
        let due: Vec<(ListenerId, bool, Listener)> = self
            .events
            .listeners
            .get(&node)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.capture == capture && e.kind == event.kind)
                    .map(|e| (e.id, e.once, Rc::clone(&e.callback)))
                    .collect()
            })
            .unwrap_or_default();
        for (id, once, callback) in due {
            if event.immediate_stopped {
                break;
            }
            // Removed by an earlier listener of this step.
            if !self.events.contains(node, id) {
                continue;
            }
            if once {
                self.events.remove(node, id);
            }
            event.current_target = Some(node);
            callback(self, event);
        }
    }

    /// Pick at `point` and dispatch a pointer event.
    ///
    /// While a node holds pointer capture it receives the event wherever the
    /// pointer is. Hover transitions are dispatched first. Returns the target.
    pub fn dispatch_pointer(&mut self, kind: PointerKind, point: Point) -> Result<Option<NodeId>, SceneError> {
        let hit = self.pick(point);
        let target = self
            .events
            .capture
            .filter(|&c| self.is_alive(c))
            .or(hit);
        let path = target.map(|t| self.path_to_root(t)).unwrap_or_default();
        self.update_hover(&path, point)?;
        if let Some(target) = target {
            let mut event = Event::new(kind.event_type()).with_point(point);
            self.dispatch_event(target, &mut event)?;
        }
        if kind == PointerKind::Up {
            self.events.capture = None;
        }
        Ok(target)
    }

    fn update_hover(&mut self, path: &[NodeId], point: Point) -> Result<(), SceneError> {
        let old = core::mem::replace(&mut self.events.hover, path.to_vec());
        let lca = old.iter().zip(path).take_while(|(a, b)| a == b).count();
        for &n in old[lca..].iter().rev() {
            if self.is_alive(n) {
                self.dispatch_event(n, &mut Event::non_bubbling("pointerleave").with_point(point))?;
            }
        }
        for &n in &path[lca..] {
            if self.is_alive(n) {
                self.dispatch_event(n, &mut Event::non_bubbling("pointerenter").with_point(point))?;
            }
        }
        Ok(())
    }

    /// Route pointer events to `node` until the next pointer up.
    pub fn set_pointer_capture(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.node(node)?;
        self.events.capture = Some(node);
        Ok(())
    }

    /// Release pointer capture, if held.
    pub fn release_pointer_capture(&mut self) {
        self.events.capture = None;
    }

    /// Node holding pointer capture.
    pub fn pointer_capture(&self) -> Option<NodeId> {
        self.events.capture
    }

    /// The hovered path, root first.
    pub fn hovered(&self) -> &[NodeId] {
        &self.events.hover
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::types::ShapeKind;

    type Log = Rc<RefCell<Vec<String>>>;

    fn record(log: &Log, label: &'static str) -> impl Fn(&mut Scene, &mut Event) + 'static {
        let log = Rc::clone(log);
        move |_: &mut Scene, e: &mut Event| log.borrow_mut().push(format!("{label}:{:?}", e.phase()))
    }

    fn chain(scene: &mut Scene) -> (NodeId, NodeId) {
        let group = scene.create_node(ShapeKind::Group);
        let leaf = scene.create_node(ShapeKind::Circle);
        scene.append_child(scene.root(), group).unwrap();
        scene.append_child(group, leaf).unwrap();
        (group, leaf)
    }

    #[test]
    fn capture_target_bubble_order() {
        let mut scene = Scene::default();
        let (group, leaf) = chain(&mut scene);
        let log = Log::default();
        let capture = ListenerOptions {
            capture: true,
            ..ListenerOptions::default()
        };
        scene.add_event_listener(group, "tap", record(&log, "group-bubble"), ListenerOptions::default()).unwrap();
        scene.add_event_listener(group, "tap", record(&log, "group-capture"), capture).unwrap();
        scene.add_event_listener(leaf, "tap", record(&log, "leaf"), ListenerOptions::default()).unwrap();
        scene.add_event_listener(leaf, "other", record(&log, "wrong-type"), ListenerOptions::default()).unwrap();

        assert!(scene.dispatch_event(leaf, &mut Event::new("tap")).unwrap());
        assert_eq!(
            *log.borrow(),
            ["group-capture:Capture", "leaf:Target", "group-bubble:Bubble"]
        );

        log.borrow_mut().clear();
        scene.dispatch_event(leaf, &mut Event::non_bubbling("tap")).unwrap();
        assert_eq!(*log.borrow(), ["group-capture:Capture", "leaf:Target"]);
    }

    #[test]
    fn stop_propagation_finishes_the_current_node() {
        let mut scene = Scene::default();
        let (group, leaf) = chain(&mut scene);
        let log = Log::default();
        scene
            .add_event_listener(
                leaf,
                "tap",
                |_, e| {
                    e.stop_propagation();
                    e.prevent_default();
                },
                ListenerOptions::default(),
            )
            .unwrap();
        scene.add_event_listener(leaf, "tap", record(&log, "leaf-second"), ListenerOptions::default()).unwrap();
        scene.add_event_listener(group, "tap", record(&log, "group"), ListenerOptions::default()).unwrap();

        let mut event = Event::new("tap");
        assert!(!scene.dispatch_event(leaf, &mut event).unwrap());
        assert!(event.default_prevented());
        assert_eq!(*log.borrow(), ["leaf-second:Target"]);
    }

    #[test]
    fn stop_immediate_skips_remaining_listeners() {
        let mut scene = Scene::default();
        let (_, leaf) = chain(&mut scene);
        let log = Log::default();
        scene
            .add_event_listener(leaf, "tap", |_, e| e.stop_immediate_propagation(), ListenerOptions::default())
            .unwrap();
        scene.add_event_listener(leaf, "tap", record(&log, "skipped"), ListenerOptions::default()).unwrap();
        scene.dispatch_event(leaf, &mut Event::new("tap")).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn once_listeners_run_once_and_removal_works() {
        let mut scene = Scene::default();
        let (_, leaf) = chain(&mut scene);
        let log = Log::default();
        let once = ListenerOptions {
            once: true,
            ..ListenerOptions::default()
        };
        scene.add_event_listener(leaf, "tap", record(&log, "once"), once).unwrap();
        let id = scene.add_event_listener(leaf, "tap", record(&log, "always"), ListenerOptions::default()).unwrap();
        scene.dispatch_event(leaf, &mut Event::new("tap")).unwrap();
        scene.dispatch_event(leaf, &mut Event::new("tap")).unwrap();
        assert_eq!(*log.borrow(), ["once:Target", "always:Target", "always:Target"]);

        assert!(scene.remove_event_listener(leaf, id));
        assert!(!scene.remove_event_listener(leaf, id));
        scene.dispatch_event(leaf, &mut Event::new("tap")).unwrap();
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn listeners_may_mutate_the_scene() {
        let mut scene = Scene::default();
        let (group, leaf) = chain(&mut scene);
        scene
            .add_event_listener(
                leaf,
                "tap",
                |scene, e| {
                    if let Some(t) = e.target() {
                        scene.destroy(t).unwrap();
                    }
                },
                ListenerOptions::default(),
            )
            .unwrap();
        let log = Log::default();
        scene.add_event_listener(group, "tap", record(&log, "group"), ListenerOptions::default()).unwrap();
        scene.dispatch_event(leaf, &mut Event::new("tap")).unwrap();
        // The path was fixed before the first listener ran.
        assert_eq!(*log.borrow(), ["group:Bubble"]);
        assert!(!scene.is_alive(leaf));
        assert!(matches!(
            scene.dispatch_event(leaf, &mut Event::new("tap")),
            Err(SceneError::UseAfterDestroy(_))
        ));
    }

    #[test]
    fn hover_leaves_inner_first_and_enters_outer_first() {
        let mut scene = Scene::default();
        let group = scene.create_node(ShapeKind::Group);
        let a = scene.create_node(ShapeKind::Rect);
        let b = scene.create_node(ShapeKind::Rect);
        scene.append_child(scene.root(), group).unwrap();
        scene.append_child(group, a).unwrap();
        scene.append_child(scene.root(), b).unwrap();
        for (n, x) in [(a, "0"), (b, "100")] {
            scene
                .set_attributes(n, [("x", x), ("y", "0"), ("width", "50"), ("height", "50"), ("fill", "red")])
                .unwrap();
        }
        let log = Log::default();
        for (n, label) in [(group, "group"), (a, "a"), (b, "b")] {
            for kind in ["pointerenter", "pointerleave"] {
                let log = Rc::clone(&log);
                scene
                    .add_event_listener(
                        n,
                        kind,
                        move |_, e| log.borrow_mut().push(format!("{}:{label}", e.kind())),
                        ListenerOptions::default(),
                    )
                    .unwrap();
            }
        }

        assert_eq!(scene.dispatch_pointer(PointerKind::Move, Point::new(10.0, 10.0)).unwrap(), Some(a));
        assert_eq!(scene.hovered(), [scene.root(), group, a]);
        assert_eq!(scene.dispatch_pointer(PointerKind::Move, Point::new(110.0, 10.0)).unwrap(), Some(b));
        assert_eq!(
            *log.borrow(),
            [
                "pointerenter:group",
                "pointerenter:a",
                "pointerleave:a",
                "pointerleave:group",
                "pointerenter:b",
            ]
        );
    }

    #[test]
    fn pointer_capture_overrides_picking_until_up() {
        let mut scene = Scene::default();
        let a = scene.create_node(ShapeKind::Rect);
        scene
            .set_attributes(a, [("width", "50"), ("height", "50"), ("fill", "red")])
            .unwrap();
        scene.append_child(scene.root(), a).unwrap();

        assert_eq!(scene.dispatch_pointer(PointerKind::Down, Point::new(10.0, 10.0)).unwrap(), Some(a));
        scene.set_pointer_capture(a).unwrap();
        assert_eq!(scene.dispatch_pointer(PointerKind::Move, Point::new(200.0, 100.0)).unwrap(), Some(a));
        assert_eq!(scene.dispatch_pointer(PointerKind::Up, Point::new(200.0, 100.0)).unwrap(), Some(a));
        assert_eq!(scene.pointer_capture(), None);
        assert_eq!(scene.dispatch_pointer(PointerKind::Move, Point::new(200.0, 100.0)).unwrap(), None);
    }
}
