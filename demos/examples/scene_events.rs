// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer picking, hover transitions and capture/bubble dispatch.
//!
//! Run:
//! - `RUST_LOG=info cargo run -p glint_demos --example scene_events`

use glint_scene::{Event, ListenerOptions, PointerKind, Scene, SceneConfig, SceneError, ShapeKind};
use kurbo::Point;
use log::info;

fn log_event(scene: &mut Scene, event: &mut Event) {
    let name = event
        .current_target()
        .and_then(|id| scene.get_attribute(id, "id").ok().flatten().map(|v| v.to_string()))
        .unwrap_or_default();
    info!("{:<12} {:?} at {name}", event.kind(), event.phase());
}

fn main() -> Result<(), SceneError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut scene = Scene::new(SceneConfig::with_size(200.0, 200.0));
    let root = scene.root();
    let panel = scene.create_node(ShapeKind::Group);
    scene.set_attribute(panel, "id", "panel")?;
    scene.append_child(root, panel)?;

    let button = scene.create_node(ShapeKind::Rect);
    scene.set_attributes(
        button,
        [("id", "button"), ("x", "20"), ("y", "20"), ("width", "60"), ("height", "30"), ("fill", "navy")],
    )?;
    scene.append_child(panel, button)?;

    let ring = scene.create_node(ShapeKind::Circle);
    scene.set_attributes(
        ring,
        [("id", "ring"), ("cx", "140"), ("cy", "140"), ("r", "30"), ("fill", "none"), ("stroke", "red")],
    )?;
    // Make the thin outline easier to hit.
    scene.set_attribute(ring, "increased-line-width-for-hit-testing", "8")?;
    scene.append_child(panel, ring)?;

    for kind in ["pointerdown", "pointerenter", "pointerleave"] {
        scene.add_event_listener(panel, kind, log_event, ListenerOptions { capture: true, once: false })?;
        scene.add_event_listener(button, kind, log_event, ListenerOptions::default())?;
        scene.add_event_listener(ring, kind, log_event, ListenerOptions::default())?;
    }
    scene.add_event_listener(panel, "pointerdown", log_event, ListenerOptions::default())?;

    // The ring's interior is unpainted: only its outline picks.
    info!("pick centre of ring: {:?}", scene.pick(Point::new(140.0, 140.0)));
    info!("pick near outline:  {:?}", scene.pick(Point::new(172.0, 140.0)));

    for point in [Point::new(30.0, 30.0), Point::new(171.0, 140.0), Point::new(5.0, 5.0)] {
        info!("-- move to {point:?}");
        scene.dispatch_pointer(PointerKind::Move, point)?;
    }
    info!("-- press on the button");
    scene.dispatch_pointer(PointerKind::Down, Point::new(40.0, 30.0))?;
    Ok(())
}
