//! Integration tests: bidirectional style synchronization, keyboard-driven
//! deletion with its in-place-editing suppression, and the stale guard on
//! asynchronous image loads.

use pretty_assertions::assert_eq;
use sd_core::{Color, SessionError, StyleProperty};
use sd_session::{HeadlessFactory, ObjectRef, SceneHandle, Session};

fn png_fixture() -> Vec<u8> {
    let mut bytes = Vec::new();
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 120, 255, 255]));
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn active_ref(scene: &SceneHandle) -> ObjectRef {
    scene.borrow().active().expect("an object should be active")
}

// ─── Pull: scene → style state ───────────────────────────────────────────

#[test]
fn selecting_a_text_object_overwrites_style_state() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory.clone());
    session.create_document("doc").unwrap();
    let scene = factory.last_scene().unwrap();

    session.add_text();
    let first = active_ref(&scene);
    session.set_style(StyleProperty::Bold(true));
    session.set_style(StyleProperty::Fill(Color::rgb(0xFF, 0x00, 0x00)));

    session.add_text();
    let second = active_ref(&scene);
    assert_ne!(first, second);
    session.set_style(StyleProperty::Bold(false));
    assert!(!session.style().bold);

    // Clicking the first object pulls its style back wholesale.
    scene.borrow_mut().click(first);
    session.pump_scene_events();
    assert!(session.style().bold);
    assert_eq!(session.style().fill, Color::rgb(0xFF, 0x00, 0x00));
}

#[test]
fn cleared_or_non_text_selection_keeps_last_style() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory.clone());
    session.create_document("doc").unwrap();

    session.add_text();
    session.set_style(StyleProperty::Italic(true));

    // Deleting the active object clears the selection; the style state
    // stays put for the next text object.
    session.delete_active();
    assert!(session.style().italic);

    // An image selection is not text-capable and pulls nothing.
    session.add_image(png_fixture()).unwrap();
    assert!(session.style().italic);
}

// ─── Push: style state → scene ───────────────────────────────────────────

#[test]
fn push_writes_single_property_to_active_text() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory.clone());
    session.create_document("doc").unwrap();
    let scene = factory.last_scene().unwrap();

    session.add_text();
    let renders_before = scene.borrow().renders();
    session.set_style(StyleProperty::Underline(true));
    assert!(session.style().underline);
    assert!(scene.borrow().renders() > renders_before, "push re-renders");

    session.save_document().unwrap();
    let content = session
        .store()
        .documents()
        .first()
        .unwrap()
        .content
        .clone()
        .unwrap();
    let style = content.objects[0].text_style().unwrap();
    assert!(style.underline);
    assert!(!style.bold, "only the pushed property changed");
}

#[test]
fn push_to_an_image_selection_changes_state_only() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory.clone());
    session.create_document("doc").unwrap();
    let scene = factory.last_scene().unwrap();

    session.add_image(png_fixture()).unwrap();
    let renders_before = scene.borrow().renders();
    session.set_style(StyleProperty::Bold(true));

    assert!(session.style().bold);
    assert_eq!(
        scene.borrow().renders(),
        renders_before,
        "no write, no re-render"
    );
}

// ─── Keyboard deletion ───────────────────────────────────────────────────

#[test]
fn delete_key_respects_in_place_editing() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory.clone());
    session.create_document("doc").unwrap();
    let scene = factory.last_scene().unwrap();

    session.add_text();
    let rf = active_ref(&scene);

    // Mid-edit: the keystroke belongs to the text editor.
    scene.borrow_mut().set_editing(rf, true);
    session.handle_key("Delete", false, false, false, false);
    assert_eq!(scene.borrow().object_count(), 1, "suppressed");

    // Editing done: the same key removes the object.
    scene.borrow_mut().set_editing(rf, false);
    session.handle_key("Backspace", false, false, false, false);
    assert_eq!(scene.borrow().object_count(), 0);
    assert_eq!(scene.borrow().active(), None);
}

#[test]
fn delete_with_no_active_object_changes_nothing() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory.clone());
    session.create_document("doc").unwrap();
    let scene = factory.last_scene().unwrap();

    session.handle_key("Delete", false, false, false, false);
    session.delete_active();
    assert_eq!(scene.borrow().object_count(), 0);
    assert!(!scene.borrow().is_disposed());
}

// ─── Image insertion ─────────────────────────────────────────────────────

#[test]
fn image_insert_activates_and_scales() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory.clone());
    session.create_document("doc").unwrap();
    let scene = factory.last_scene().unwrap();

    session.add_image(png_fixture()).unwrap();
    assert_eq!(scene.borrow().object_count(), 1);
    assert!(scene.borrow().active().is_some());

    session.save_document().unwrap();
    let content = session
        .store()
        .documents()
        .first()
        .unwrap()
        .content
        .clone()
        .unwrap();
    match &content.objects[0].kind {
        sd_core::ObjectKind::Image { source, scale } => {
            assert_eq!(*scale, 0.5);
            assert_eq!((source.width(), source.height()), (2, 2));
        }
        other => panic!("expected an image object, got {other:?}"),
    }
}

#[test]
fn undecodable_bytes_leave_the_scene_unchanged() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory.clone());
    session.create_document("doc").unwrap();
    let scene = factory.last_scene().unwrap();

    let err = session.add_image(b"definitely not an image".to_vec());
    assert!(matches!(err, Err(SessionError::ImageDecode(_))));
    assert_eq!(scene.borrow().object_count(), 0);

    // The session is still healthy afterwards.
    session.add_image(png_fixture()).unwrap();
    assert_eq!(scene.borrow().object_count(), 1);
}

#[test]
fn stale_image_load_is_discarded_after_a_switch() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory.clone());
    session.create_document("A").unwrap();

    let pending = session.begin_image_load().expect("scene is mounted");
    session.create_document("B").unwrap();

    let result = session.finish_image_load(pending, png_fixture());
    assert!(matches!(result, Err(SessionError::StaleOperation)));

    // Neither the disposed scene nor the new one received the image.
    for scene in factory.scenes() {
        assert_eq!(scene.borrow().object_count(), 0);
    }
}

#[test]
fn stale_image_load_is_discarded_after_close() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory);
    session.create_document("A").unwrap();

    let pending = session.begin_image_load().unwrap();
    session.select_document(None);

    let result = session.finish_image_load(pending, png_fixture());
    assert!(matches!(result, Err(SessionError::StaleOperation)));
}

#[test]
fn remounting_the_same_document_invalidates_old_tokens() {
    let factory = HeadlessFactory::new();
    let mut session = Session::new(factory);
    let a = session.create_document("A").unwrap();

    let pending = session.begin_image_load().unwrap();
    session.select_document(None);
    session.select_document(Some(a));

    // Same document, new mount: the old token must not apply.
    let result = session.finish_image_load(pending, png_fixture());
    assert!(matches!(result, Err(SessionError::StaleOperation)));
}
