//! Scene Integration Tests
//!
//! Exercises the document end to end:
//! - Anchor/stretch layout through real proxies
//! - JSON round trips and tolerant loading
//! - Snapshot undo/redo through the editor
//! - Feedback suppression between proxies and transforms

use proptest::prelude::*;
use stage_core::{
    AnchorFlags, Button, Editor, EntityId, Manipulation, Point, Rect, SceneDocument, Size,
    Text, Transform,
};

/// Create an image panel of the given size at the origin of the canvas.
fn panel(doc: &mut SceneDocument, width: f64, height: f64) -> EntityId {
    let id = doc.create_image_element("Panel", None).expect("create panel");
    doc.update_component::<Transform, _>(id, |t| t.set_scale(Size::new(width, height)));
    id
}

/// Create a fixed-size child under `parent`.
fn sized_child(doc: &mut SceneDocument, parent: EntityId, width: f64, height: f64) -> EntityId {
    let id = doc
        .create_image_element("Child", Some(parent))
        .expect("create child");
    doc.update_component::<Transform, _>(id, |t| t.set_scale(Size::new(width, height)));
    id
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_right_anchor_places_from_right_edge() {
    let mut doc = SceneDocument::new();
    let parent = panel(&mut doc, 400.0, 300.0);
    let child = sized_child(&mut doc, parent, 50.0, 20.0);
    doc.update_component::<Transform, _>(child, |t| {
        t.set_position(Point::new(10.0, 10.0));
        t.set_anchors(AnchorFlags::RIGHT)
    });
    doc.run_pending();

    let proxy = doc.proxy(child).expect("proxy");
    assert!(approx(proxy.position().x, 340.0));
    assert!(approx(proxy.position().y, 10.0));
    assert_eq!(proxy.local_rect().size(), Size::new(50.0, 20.0));
}

#[test]
fn test_horizontal_stretch_fills_parent() {
    let mut doc = SceneDocument::new();
    let parent = panel(&mut doc, 400.0, 300.0);
    let child = sized_child(&mut doc, parent, 50.0, 20.0);
    doc.update_component::<Transform, _>(child, |t| {
        t.set_position(Point::new(20.0, 0.0));
        t.set_stretch(AnchorFlags::LEFT | AnchorFlags::RIGHT)
    });
    doc.run_pending();

    let proxy = doc.proxy(child).expect("proxy");
    assert!(approx(proxy.local_rect().width, 360.0));
    assert!(approx(proxy.local_rect().height, 20.0));
}

#[test]
fn test_nested_rotation_maps_to_canvas() {
    let mut doc = SceneDocument::new();
    let parent = panel(&mut doc, 400.0, 300.0);
    let child = sized_child(&mut doc, parent, 50.0, 20.0);
    doc.update_component::<Transform, _>(parent, |t| {
        t.set_position(Point::new(100.0, 100.0));
        t.set_rotation_degrees(90.0)
    });
    doc.update_component::<Transform, _>(child, |t| t.set_position(Point::new(10.0, 0.0)));
    doc.run_pending();

    let origin = doc
        .canvas_transform(child)
        .expect("transform")
        .apply(Point::ZERO);
    assert!(approx(origin.x, 100.0));
    assert!(approx(origin.y, 110.0));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_export_load_round_trip() {
    let mut doc = SceneDocument::new();
    let title = doc.create_text_element("Title", None).expect("create");
    let start = doc.create_button_element("Start", None).expect("create");
    let icon = doc.create_image_element("Icon", Some(start)).expect("create");
    doc.update_component::<Text, _>(title, |t| {
        t.set_text("Hello");
        t.set_alignment(AnchorFlags::CENTER_X | AnchorFlags::BOTTOM)
    });
    doc.update_component::<Button, _>(start, |b| b.set_slice_left(12));
    doc.update_component::<Transform, _>(icon, |t| {
        t.set_anchors(AnchorFlags::RIGHT | AnchorFlags::CENTER_Y)
    });

    let exported = doc.export_json().expect("export");
    let mut loaded = SceneDocument::new();
    loaded.load_json(&exported).expect("load");

    assert_eq!(loaded.root(), doc.root());
    assert_eq!(loaded.export_json().expect("export"), exported);
    assert_eq!(
        loaded.component::<Text>(title).map(Text::alignment),
        Some(AnchorFlags::CENTER_X | AnchorFlags::BOTTOM)
    );
    assert_eq!(
        loaded.tree().get(start).map(|e| e.children().to_vec()),
        Some(vec![icon])
    );
    assert!(loaded.is_consistent());
}

#[test]
fn test_load_repairs_fields_and_skips_unknown_kinds() {
    let json = br##"{
        "id": "not-a-uuid",
        "name": "Root",
        "components": [],
        "children": [
            {
                "name": "Label",
                "components": [
                    { "kind": "Transform", "x": "oops", "y": 1e300, "anchors": 17 },
                    { "kind": "Sparkle" },
                    { "kind": "Text", "text": "Hi", "pixelSize": -4, "color": "#zzz" }
                ]
            }
        ]
    }"##;
    let mut doc = SceneDocument::new();
    doc.load_json(json).expect("load");

    let label = doc
        .tree()
        .get(doc.root())
        .and_then(|root| root.children().first().copied())
        .expect("label");
    let transform = doc.component::<Transform>(label).expect("transform");
    assert_eq!(transform.position(), Point::ZERO);
    assert_eq!(transform.anchors(), AnchorFlags::CENTER_X);

    let text = doc.component::<Text>(label).expect("text");
    assert_eq!(text.text(), "Hi");
    assert_eq!(text.pixel_size(), 24);
    assert_eq!(doc.tree().get(label).map(|e| e.components().len()), Some(2));
}

// ============================================================================
// Undo / Redo
// ============================================================================

#[test]
fn test_duplicate_undo_redo_is_byte_identical() {
    let mut editor = Editor::default();
    let a = editor
        .document_mut()
        .create_text_element("A", None)
        .expect("create");
    editor
        .document_mut()
        .create_button_element("B", None)
        .expect("create");
    let s0 = editor.document().export_json().expect("export");

    editor.duplicate(a).expect("duplicate");
    let s1 = editor.document().export_json().expect("export");
    assert_eq!(editor.document().entity_count(), 4);

    assert!(editor.undo().expect("undo"));
    assert_eq!(editor.document().export_json().expect("export"), s0);
    assert_eq!(editor.document().entity_count(), 3);

    assert!(editor.redo().expect("redo"));
    assert_eq!(editor.document().export_json().expect("export"), s1);
    assert!(editor.document().is_consistent());
}

#[test]
fn test_undo_loses_selection() {
    let mut editor = Editor::default();
    let a = editor
        .document_mut()
        .create_text_element("A", None)
        .expect("create");
    editor.document_mut().set_selected(Some(a));
    editor.duplicate(a).expect("duplicate");
    editor.undo().expect("undo");
    assert_eq!(editor.document().selected(), None);
}

// ============================================================================
// Feedback Suppression
// ============================================================================

#[test]
fn test_refresh_never_writes_transform() {
    let mut doc = SceneDocument::new();
    let parent = panel(&mut doc, 400.0, 300.0);
    let child = sized_child(&mut doc, parent, 50.0, 20.0);
    doc.update_component::<Transform, _>(child, |t| {
        t.set_anchors(AnchorFlags::BOTTOM | AnchorFlags::CENTER_X)
    });
    let before = doc.component::<Transform>(child).cloned();
    doc.run_pending();

    assert_eq!(doc.component::<Transform>(child).cloned(), before);
    assert_eq!(doc.stats().gesture_writes, 0);
    assert!(doc.stats().suppressed_signals > 0);
}

#[test]
fn test_drag_writes_one_position() {
    let mut doc = SceneDocument::new();
    let id = doc.create_button_element("Drag me", None).expect("create");
    doc.run_pending();

    let drag = Manipulation::Drag {
        delta_x: 25.0,
        delta_y: 5.0,
    };
    assert!(doc.apply_manipulation(id, &drag));
    doc.run_pending();

    assert_eq!(doc.stats().gesture_writes, 1);
    assert_eq!(
        doc.component::<Transform>(id).map(Transform::position),
        Some(Point::new(25.0, 5.0))
    );
    assert!(!doc.has_pending());
}

#[test]
fn test_root_ignores_gestures() {
    let mut doc = SceneDocument::new();
    let root = doc.root();
    assert!(!doc.apply_manipulation(root, &Manipulation::Move { x: 5.0, y: 5.0 }));
    assert_eq!(doc.stats().gesture_writes, 0);
}

#[test]
fn test_direct_gestures_leave_root_pinned() {
    let mut doc = SceneDocument::new();
    let root = doc.root();
    assert!(!doc.move_proxy(root, Point::new(300.0, 300.0)));
    assert!(!doc.rotate_proxy(root, 45.0));
    assert!(!doc.resize_proxy(root, Size::new(10.0, 10.0)));

    let proxy = doc.proxy(root).expect("root proxy");
    assert_eq!(proxy.local_rect(), Rect::new(0.0, 0.0, 1920.0, 1080.0));
    assert_eq!(proxy.position(), Point::ZERO);
    assert!(proxy.rotation().abs() < f64::EPSILON);

    let child = sized_child(&mut doc, root, 50.0, 20.0);
    doc.update_component::<Transform, _>(child, |t| t.set_anchors(AnchorFlags::RIGHT));
    doc.run_pending();
    let geometry = doc.proxy(child).expect("child proxy");
    assert!(approx(geometry.position().x, 1870.0));
    assert_eq!(doc.stats().gesture_writes, 0);
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_cycle_prevention() {
    let mut doc = SceneDocument::new();
    let a = doc.create_image_element("A", None).expect("create");
    let b = doc.create_image_element("B", Some(a)).expect("create");
    let c = doc.create_image_element("C", Some(b)).expect("create");
    let before = doc.export_json().expect("export");

    assert!(!doc.reparent(a, c, None));
    assert!(!doc.reparent(a, a, None));
    assert!(!doc.reparent(doc.root(), a, None));
    assert_eq!(doc.export_json().expect("export"), before);
}

#[test]
fn test_reparent_relayouts_in_new_parent() {
    let mut doc = SceneDocument::new();
    let left = panel(&mut doc, 200.0, 100.0);
    let right = panel(&mut doc, 600.0, 100.0);
    let child = sized_child(&mut doc, left, 50.0, 20.0);
    doc.update_component::<Transform, _>(child, |t| t.set_anchors(AnchorFlags::RIGHT));
    doc.run_pending();
    assert!(approx(doc.proxy(child).map_or(0.0, |p| p.position().x), 150.0));

    assert!(doc.reparent(child, right, None));
    doc.run_pending();
    assert!(approx(doc.proxy(child).map_or(0.0, |p| p.position().x), 550.0));
}

proptest! {
    #[test]
    fn prop_move_lands_where_dropped(bits in 0i64..64, x in 0.0f64..800.0, y in 0.0f64..600.0) {
        let mut doc = SceneDocument::new();
        let parent = panel(&mut doc, 800.0, 600.0);
        let child = sized_child(&mut doc, parent, 40.0, 30.0);
        doc.update_component::<Transform, _>(child, |t| {
            t.set_anchors(AnchorFlags::from_bits_lossy(bits))
        });
        doc.run_pending();

        doc.move_proxy(child, Point::new(x, y));
        doc.run_pending();

        let p = doc.proxy(child).expect("proxy").position();
        prop_assert!((p.x - x).abs() < 1e-6);
        prop_assert!((p.y - y).abs() < 1e-6);
        prop_assert!(doc.stats().gesture_writes <= 1);
    }
}
