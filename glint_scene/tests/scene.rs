// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree structure, style resolution, bounds and the spatial index.

mod common;

use common::{circle, rect, scene};
use glint_scene::{Deferred, Lifecycle, SceneError, ShapeKind, UsedValue};
use glint_style::Rgba;
use kurbo::{Point, Rect};

const RED: Rgba = Rgba::new(255, 0, 0, 255);
const BLUE: Rgba = Rgba::new(0, 0, 255, 255);

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn stroke_inherits_through_groups() {
    let mut scene = scene(200.0, 100.0);
    let group = scene.create_node(ShapeKind::Group);
    scene.append_child(scene.root(), group).unwrap();
    let c = circle(&mut scene, group, 50.0, 50.0, 10.0);

    scene.set_attribute(scene.root(), "stroke", "red").unwrap();
    let stroke = scene.used_value(c, "stroke").unwrap().and_then(UsedValue::as_color);
    assert_eq!(stroke, Some(RED));

    // A value on the group shadows the root's.
    scene.set_attribute(group, "stroke", "blue").unwrap();
    let stroke = scene.used_value(c, "stroke").unwrap().and_then(UsedValue::as_color);
    assert_eq!(stroke, Some(BLUE));

    // Explicit `inherit` skips the node's own value.
    scene.set_attribute(c, "stroke", "inherit").unwrap();
    let stroke = scene.used_value(c, "stroke").unwrap().and_then(UsedValue::as_color);
    assert_eq!(stroke, Some(BLUE));

    scene.remove_attribute(group, "stroke").unwrap();
    let stroke = scene.used_value(c, "stroke").unwrap().and_then(UsedValue::as_color);
    assert_eq!(stroke, Some(RED));
}

#[test]
fn inherited_line_width_updates_descendant_bounds_in_one_flush() {
    let mut scene = scene(200.0, 100.0);
    let group = scene.create_node(ShapeKind::Group);
    scene.append_child(scene.root(), group).unwrap();
    let c = circle(&mut scene, group, 50.0, 50.0, 10.0);
    scene.set_attribute(c, "stroke", "black").unwrap();
    assert_eq!(scene.render_bounds(c).unwrap(), Some(Rect::new(39.5, 39.5, 60.5, 60.5)));

    scene.set_attribute(group, "line-width", "4").unwrap();
    assert_eq!(scene.render_bounds(c).unwrap(), Some(Rect::new(38.0, 38.0, 62.0, 62.0)));
    assert_eq!(scene.render_bounds(group).unwrap(), Some(Rect::new(38.0, 38.0, 62.0, 62.0)));
}

#[test]
fn explicit_inherit_of_a_geometry_property_tracks_the_parent() {
    let mut scene = scene(200.0, 100.0);
    let group = scene.create_node(ShapeKind::Group);
    scene.append_child(scene.root(), group).unwrap();
    scene.set_attribute(group, "r", "10").unwrap();
    let c = circle(&mut scene, group, 50.0, 50.0, 1.0);
    scene.set_attribute(c, "r", "inherit").unwrap();
    assert_eq!(scene.bounds(c).unwrap(), Some(Rect::new(40.0, 40.0, 60.0, 60.0)));

    scene.set_attribute(group, "r", "30").unwrap();
    assert_eq!(scene.used_value(c, "r").unwrap().and_then(UsedValue::as_number), Some(30.0));
    assert_eq!(scene.bounds(c).unwrap(), Some(Rect::new(20.0, 20.0, 80.0, 80.0)));
    assert_eq!(scene.query_rect(Rect::new(75.0, 49.0, 76.0, 51.0)), [c]);

    // A sibling without `inherit` keeps its own radius.
    let other = circle(&mut scene, group, 150.0, 50.0, 5.0);
    scene.set_attribute(group, "r", "20").unwrap();
    assert_eq!(scene.bounds(other).unwrap(), Some(Rect::new(145.0, 45.0, 155.0, 55.0)));
    assert_eq!(scene.bounds(c).unwrap(), Some(Rect::new(30.0, 30.0, 70.0, 70.0)));
}

#[test]
fn font_relative_lengths_follow_inherited_font_size() {
    let mut scene = scene(200.0, 100.0);
    let group = scene.create_node(ShapeKind::Group);
    scene.append_child(scene.root(), group).unwrap();
    let c = circle(&mut scene, group, 50.0, 50.0, 10.0);
    scene.set_attribute(c, "r", "2em").unwrap();
    assert_eq!(scene.used_value(c, "r").unwrap().and_then(UsedValue::as_number), Some(32.0));

    scene.set_attribute(group, "font-size", "5px").unwrap();
    scene.prepare();
    assert_eq!(scene.used_value(c, "r").unwrap().and_then(UsedValue::as_number), Some(10.0));
}

#[test]
fn calc_mixes_units_and_percentages() {
    let mut scene = scene(200.0, 100.0);
    let root = scene.root();
    let c = circle(&mut scene, root, 0.0, 0.0, 1.0);
    scene.set_attribute(c, "cx", "calc(25% + 10px)").unwrap();
    assert_eq!(scene.used_value(c, "cx").unwrap().and_then(UsedValue::as_number), Some(60.0));

    // Percentages re-resolve against the new viewport.
    scene.resize(400.0, 100.0);
    scene.prepare();
    assert_eq!(scene.used_value(c, "cx").unwrap().and_then(UsedValue::as_number), Some(110.0));
}

#[test]
fn bad_values_keep_the_previous_used_value() {
    let mut scene = scene(200.0, 100.0);
    let root = scene.root();
    let c = circle(&mut scene, root, 50.0, 50.0, 10.0);
    let err = scene.set_attribute(c, "r", "ten pixels").unwrap_err();
    assert!(matches!(err, SceneError::Style(_)), "{err:?}");
    assert_eq!(scene.used_value(c, "r").unwrap().and_then(UsedValue::as_number), Some(10.0));

    // Unknown names are stored but otherwise ignored.
    scene.set_attribute(c, "data-label", "hello").unwrap();
    assert!(scene.get_attribute(c, "data-label").unwrap().is_some());
    assert_eq!(scene.used_value(c, "data-label").unwrap(), None);
}

#[test]
fn bounds_are_contained_in_render_bounds() {
    let mut scene = scene(300.0, 150.0);
    let root = scene.root();
    let c = circle(&mut scene, root, 100.0, 60.0, 20.0);
    scene
        .set_attributes(
            c,
            [
                ("stroke", "black"),
                ("line-width", "6"),
                ("shadow-color", "rgba(0, 0, 0, 0.5)"),
                ("shadow-blur", "4"),
                ("shadow-offset-x", "10"),
            ],
        )
        .unwrap();
    let bounds = scene.bounds(c).unwrap().unwrap();
    let render = scene.render_bounds(c).unwrap().unwrap();
    assert_eq!(bounds, Rect::new(80.0, 40.0, 120.0, 80.0));
    assert_eq!(render.union(bounds), render);
    assert!(render.x1 > 120.0 + 3.0, "shadow extends the render box: {render:?}");
}

#[test]
fn transforms_compose_down_the_tree() {
    let mut scene = scene(300.0, 150.0);
    let group = scene.create_node(ShapeKind::Group);
    scene.append_child(scene.root(), group).unwrap();
    scene.set_attribute(group, "transform", "translate(100px, 10px)").unwrap();
    let r = rect(&mut scene, group, Rect::new(0.0, 0.0, 20.0, 10.0));
    scene.set_attribute(r, "transform", "scale(2)").unwrap();

    assert_eq!(scene.bounds(r).unwrap(), Some(Rect::new(100.0, 10.0, 140.0, 30.0)));
    assert_eq!(scene.local_bounds(r).unwrap(), Some(Rect::new(0.0, 0.0, 20.0, 10.0)));

    // Rotate about the rect's center.
    scene
        .set_attributes(r, [("transform", "rotate(90deg)"), ("transform-origin", "center")])
        .unwrap();
    let b = scene.bounds(r).unwrap().unwrap();
    assert!(close(b.x0, 105.0) && close(b.y0, 5.0), "{b:?}");
    assert!(close(b.width(), 10.0) && close(b.height(), 20.0), "{b:?}");

    scene.set_position(group, Point::new(0.0, 0.0)).unwrap();
    let b = scene.bounds(r).unwrap().unwrap();
    assert!(close(b.x0, 5.0) && close(b.y0, -5.0), "{b:?}");
}

#[test]
fn text_bounds_come_from_the_layout_estimate() {
    let mut scene = scene(300.0, 150.0);
    let t = scene.create_node(ShapeKind::Text);
    scene
        .set_attributes(t, [("text", "hello"), ("font-size", "10px"), ("x", "0"), ("y", "20")])
        .unwrap();
    scene.append_child(scene.root(), t).unwrap();
    let b = scene.bounds(t).unwrap().unwrap();
    assert!(close(b.width(), 30.0), "{b:?}");
    assert!(close(b.height(), 12.0), "{b:?}");
    // Alphabetic baseline at y = 20.
    assert!(close(b.y0, 12.0), "{b:?}");

    scene.set_attribute(t, "text-align", "center").unwrap();
    let b = scene.bounds(t).unwrap().unwrap();
    assert!(close(b.x0, -15.0), "{b:?}");
}

#[test]
fn index_holds_only_attached_nodes() {
    let mut scene = scene(300.0, 150.0);
    let root = scene.root();
    let a = rect(&mut scene, root, Rect::new(0.0, 0.0, 10.0, 10.0));
    let b = rect(&mut scene, root, Rect::new(20.0, 0.0, 30.0, 10.0));
    let c = rect(&mut scene, root, Rect::new(40.0, 0.0, 50.0, 10.0));
    let mut all = scene.query_rect(Rect::new(0.0, 0.0, 300.0, 150.0));
    all.sort();
    assert_eq!(all, [a, b, c]);

    scene.remove_child(root, b).unwrap();
    let mut all = scene.query_rect(Rect::new(0.0, 0.0, 300.0, 150.0));
    all.sort();
    assert_eq!(all, [a, c]);
    assert_eq!(scene.lifecycle(b), Lifecycle::Detached);

    // Re-attaching puts it back.
    scene.append_child(root, b).unwrap();
    assert_eq!(scene.query_rect(Rect::new(20.0, 0.0, 30.0, 10.0)), [b]);
}

#[test]
fn cyclic_reparenting_is_rejected() {
    let mut scene = scene(300.0, 150.0);
    let outer = scene.create_node(ShapeKind::Group);
    let inner = scene.create_node(ShapeKind::Group);
    scene.append_child(scene.root(), outer).unwrap();
    scene.append_child(outer, inner).unwrap();

    let err = scene.append_child(inner, outer).unwrap_err();
    assert_eq!(err, SceneError::CyclicTree { parent: inner, child: outer });
    assert!(matches!(scene.append_child(inner, inner), Err(SceneError::CyclicTree { .. })));
    assert_eq!(scene.parent(outer).unwrap(), Some(scene.root()));
    assert_eq!(scene.children(outer).unwrap(), [inner]);
    assert!(scene.children(inner).unwrap().is_empty());

    assert_eq!(scene.append_child(inner, scene.root()), Err(SceneError::RootNode));
}

#[test]
fn insert_before_and_z_index_set_paint_order() {
    let mut scene = scene(300.0, 150.0);
    let root = scene.root();
    let a = rect(&mut scene, root, Rect::new(0.0, 0.0, 50.0, 50.0));
    let b = scene.create_node(ShapeKind::Rect);
    scene
        .set_attributes(b, [("width", "50"), ("height", "50"), ("fill", "red")])
        .unwrap();
    scene.insert_before(root, b, a).unwrap();
    assert_eq!(scene.children(root).unwrap(), [b, a]);
    assert_eq!(scene.pick(Point::new(10.0, 10.0)), Some(a));

    scene.set_attribute(b, "z-index", "1").unwrap();
    assert_eq!(scene.pick(Point::new(10.0, 10.0)), Some(b));
    assert_eq!(scene.pick_all(Point::new(10.0, 10.0)), [b, a]);
}

#[test]
fn inserting_a_node_before_itself_keeps_its_place() {
    let mut scene = scene(300.0, 150.0);
    let root = scene.root();
    let a = rect(&mut scene, root, Rect::new(0.0, 0.0, 10.0, 10.0));
    let b = rect(&mut scene, root, Rect::new(20.0, 0.0, 30.0, 10.0));
    let c = rect(&mut scene, root, Rect::new(40.0, 0.0, 50.0, 10.0));

    scene.insert_before(root, a, a).unwrap();
    assert_eq!(scene.children(root).unwrap(), [a, b, c]);
    scene.insert_before(root, b, b).unwrap();
    assert_eq!(scene.children(root).unwrap(), [a, b, c]);
}

#[test]
fn destroyed_ids_are_stale() {
    let mut scene = scene(300.0, 150.0);
    let group = scene.create_node(ShapeKind::Group);
    scene.append_child(scene.root(), group).unwrap();
    let c = circle(&mut scene, group, 10.0, 10.0, 5.0);

    scene.destroy(group).unwrap();
    assert_eq!(scene.lifecycle(c), Lifecycle::Destroyed);
    assert_eq!(scene.set_attribute(c, "r", "1"), Err(SceneError::UseAfterDestroy(c)));
    assert!(scene.children(scene.root()).unwrap().is_empty());
    assert!(scene.query_rect(Rect::new(0.0, 0.0, 300.0, 150.0)).is_empty());

    // The slot is reused under a new generation.
    let fresh = scene.create_node(ShapeKind::Circle);
    assert!(scene.is_alive(fresh));
    assert!(!scene.is_alive(c) && !scene.is_alive(group));
    assert_eq!(scene.destroy(scene.root()), Err(SceneError::RootNode));
}

#[test]
fn references_follow_their_targets() {
    let mut scene = scene(300.0, 150.0);
    let root = scene.root();
    let clip = scene.create_node(ShapeKind::Rect);
    scene
        .set_attributes(clip, [("width", "10"), ("height", "10")])
        .unwrap();
    let c = circle(&mut scene, root, 10.0, 10.0, 10.0);
    scene.set_attribute(c, "clip-path", clip.object_ref()).unwrap();
    assert_eq!(scene.bounds(c).unwrap(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    assert_eq!(scene.referrers(clip), [c]);

    // Growing the clip re-clips the referrer in the same flush.
    scene.set_attribute(clip, "width", "15").unwrap();
    assert_eq!(scene.bounds(c).unwrap(), Some(Rect::new(0.0, 0.0, 15.0, 10.0)));

    // Destroying it leaves the referrer unclipped.
    scene.destroy(clip).unwrap();
    scene.prepare();
    assert_eq!(scene.used_value(c, "clip-path").unwrap(), Some(&UsedValue::None));
    assert_eq!(scene.bounds(c).unwrap(), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
}

#[test]
fn id_references_resolve_when_the_id_appears() {
    let mut scene = scene(300.0, 150.0);
    let root = scene.root();
    let c = circle(&mut scene, root, 10.0, 10.0, 10.0);
    scene.set_attribute(c, "clip-path", "url(#mask)").unwrap();
    assert_eq!(scene.used_value(c, "clip-path").unwrap(), Some(&UsedValue::None));

    let clip = scene.create_node(ShapeKind::Rect);
    scene
        .set_attributes(clip, [("id", "mask"), ("width", "5"), ("height", "5")])
        .unwrap();
    assert_eq!(scene.find_by_id("mask"), Some(clip));
    assert_eq!(scene.bounds(c).unwrap(), Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
    assert_eq!(scene.used_value(c, "clip-path").unwrap(), Some(&UsedValue::Node(clip)));
}

#[test]
fn deep_clones_retarget_internal_references() {
    let mut scene = scene(300.0, 150.0);
    let group = scene.create_node(ShapeKind::Group);
    scene.append_child(scene.root(), group).unwrap();
    let clip = rect(&mut scene, group, Rect::new(0.0, 0.0, 5.0, 5.0));
    let c = circle(&mut scene, group, 10.0, 10.0, 10.0);
    scene.set_attribute(c, "clip-path", clip.object_ref()).unwrap();

    let copy = scene.clone_node(group, true).unwrap();
    assert_eq!(scene.lifecycle(copy), Lifecycle::Detached);
    let children = scene.children(copy).unwrap().to_vec();
    assert_eq!(children.len(), 2);
    let (clip_copy, c_copy) = (children[0], children[1]);
    assert_ne!(clip_copy, clip);
    assert_eq!(scene.used_value(c_copy, "clip-path").unwrap(), Some(&UsedValue::Node(clip_copy)));

    // A shallow clone keeps pointing at the original.
    let lone = scene.clone_node(c, false).unwrap();
    assert!(scene.children(lone).unwrap().is_empty());
    assert_eq!(scene.used_value(lone, "clip-path").unwrap(), Some(&UsedValue::Node(clip)));
}

#[test]
fn deferred_results_for_destroyed_nodes_are_discarded() {
    let mut scene = scene(300.0, 150.0);
    let img = scene.create_node(ShapeKind::Image);
    assert_eq!(scene.resolve_deferred(img, "width", 64.0).unwrap(), Deferred::Applied);
    scene.destroy(img).unwrap();
    assert_eq!(scene.resolve_deferred(img, "width", 64.0).unwrap(), Deferred::Discarded);
}
