//! Headless reference implementation of the scene engine contract.
//!
//! Retains objects, tracks the active one, and queues selection events, but
//! performs no painting, hit testing, or transform math; those belong to a
//! real rendering backend. Rasterization produces a background-colored PNG
//! of the surface, enough for thumbnails in GUI-less hosts.
//!
//! The factory hands out shared handles to every scene it constructs and
//! counts live engines, so invariant checks (at most one mounted scene) and
//! in-place-editing simulation stay observable from the outside.

use crate::engine::{
    EngineOptions, ObjectClass, ObjectRef, ObjectSnapshot, RasterFormat, SceneEngine,
    SceneEngineFactory, SceneEvent, SceneEvents, SurfaceId,
};
use sd_core::{Color, ObjectKind, Result, SceneContent, SceneObject, SessionError, StyleProperty};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Shared handle to a constructed scene's state.
pub type SceneHandle = Rc<RefCell<SceneState>>;

struct Retained {
    rf: ObjectRef,
    object: SceneObject,
    editing: bool,
}

/// The retained state of one headless scene.
pub struct SceneState {
    pub surface: SurfaceId,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub options: EngineOptions,
    objects: Vec<Retained>,
    next_ref: u64,
    active: Option<ObjectRef>,
    events: VecDeque<SceneEvent>,
    renders: u32,
    disposed: bool,
}

impl SceneState {
    fn mint(&mut self) -> ObjectRef {
        self.next_ref += 1;
        ObjectRef::new(self.next_ref)
    }

    fn position_of(&self, rf: ObjectRef) -> Option<usize> {
        self.objects.iter().position(|r| r.rf == rf)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn active(&self) -> Option<ObjectRef> {
        self.active
    }

    pub fn renders(&self) -> u32 {
        self.renders
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Put an object in or out of its in-place text-editing sub-state, as a
    /// real engine would when the user double-clicks into a textbox.
    pub fn set_editing(&mut self, rf: ObjectRef, editing: bool) {
        if let Some(pos) = self.position_of(rf) {
            self.objects[pos].editing = editing;
        }
    }

    /// Simulate the user clicking an object on the surface.
    pub fn click(&mut self, rf: ObjectRef) {
        self.activate(rf);
    }

    fn activate(&mut self, rf: ObjectRef) {
        if self.disposed || self.position_of(rf).is_none() {
            return;
        }
        if self.active != Some(rf) {
            self.active = Some(rf);
            self.events.push_back(SceneEvent::SelectionChanged(rf));
        }
    }

    fn snapshot_content(&self) -> SceneContent {
        SceneContent {
            objects: self.objects.iter().map(|r| r.object.clone()).collect(),
        }
    }
}

/// A live headless scene plus its hook back into the factory's live count.
pub struct HeadlessEngine {
    scene: SceneHandle,
    factory: Rc<RefCell<FactoryShared>>,
}

impl HeadlessEngine {
    /// The shared state handle, for tests and host-side inspection.
    pub fn scene(&self) -> SceneHandle {
        Rc::clone(&self.scene)
    }
}

impl SceneEngine for HeadlessEngine {
    fn restore(&mut self, content: &SceneContent) -> Result<()> {
        let mut scene = self.scene.borrow_mut();
        if scene.disposed {
            return Err(SessionError::Restore("scene already disposed".into()));
        }
        scene.objects.clear();
        scene.active = None;
        scene.events.clear();
        for object in &content.objects {
            let rf = scene.mint();
            scene.objects.push(Retained {
                rf,
                object: object.clone(),
                editing: false,
            });
        }
        Ok(())
    }

    fn serialize(&self) -> SceneContent {
        self.scene.borrow().snapshot_content()
    }

    fn rasterize(&self, format: RasterFormat, scale: f32) -> Result<Vec<u8>> {
        let RasterFormat::Png = format;
        let scene = self.scene.borrow();
        let w = ((scene.width as f32 * scale).round() as u32).max(1);
        let h = ((scene.height as f32 * scale).round() as u32).max(1);
        let bg = scene.background;
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([bg.r, bg.g, bg.b, bg.a]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| SessionError::Rasterize(e.to_string()))?;
        Ok(bytes)
    }

    fn add_object(&mut self, object: SceneObject) -> ObjectRef {
        let mut scene = self.scene.borrow_mut();
        let rf = scene.mint();
        if !scene.disposed {
            scene.objects.push(Retained {
                rf,
                object,
                editing: false,
            });
        }
        rf
    }

    fn remove_object(&mut self, object: ObjectRef) {
        let mut scene = self.scene.borrow_mut();
        let Some(pos) = scene.position_of(object) else {
            return;
        };
        scene.objects.remove(pos);
        if scene.active == Some(object) {
            scene.active = None;
            scene.events.push_back(SceneEvent::SelectionCleared);
        }
    }

    fn set_active(&mut self, object: ObjectRef) {
        self.scene.borrow_mut().activate(object);
    }

    fn active(&self) -> Option<ObjectRef> {
        self.scene.borrow().active
    }

    fn snapshot(&self, object: ObjectRef) -> Option<ObjectSnapshot> {
        let scene = self.scene.borrow();
        let pos = scene.position_of(object)?;
        let retained = &scene.objects[pos];
        Some(match &retained.object.kind {
            ObjectKind::Text { style, .. } => ObjectSnapshot {
                class: ObjectClass::Text,
                text_style: Some(*style),
                editing: retained.editing,
            },
            ObjectKind::Image { .. } => ObjectSnapshot {
                class: ObjectClass::Image,
                text_style: None,
                editing: false,
            },
        })
    }

    fn set_property(&mut self, object: ObjectRef, property: StyleProperty) {
        let mut scene = self.scene.borrow_mut();
        let Some(pos) = scene.position_of(object) else {
            return;
        };
        if let ObjectKind::Text { style, .. } = &mut scene.objects[pos].object.kind {
            style.apply(property);
        }
    }

    fn render(&mut self) {
        let mut scene = self.scene.borrow_mut();
        if !scene.disposed {
            scene.renders += 1;
        }
    }

    fn poll_events(&mut self) -> SceneEvents {
        self.scene.borrow_mut().events.drain(..).collect()
    }

    fn dispose(&mut self) {
        let mut scene = self.scene.borrow_mut();
        if scene.disposed {
            return;
        }
        scene.disposed = true;
        scene.objects.clear();
        scene.events.clear();
        scene.active = None;
        self.factory.borrow_mut().live -= 1;
    }
}

impl Drop for HeadlessEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ─── Factory ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct FactoryShared {
    live: usize,
    constructed: usize,
    scenes: Vec<SceneHandle>,
}

/// Cheaply cloneable factory for headless engines.
///
/// Clones share the same counters and scene list, so a host (or test) can
/// keep one clone for observation and move another into the session.
#[derive(Clone, Default)]
pub struct HeadlessFactory {
    shared: Rc<RefCell<FactoryShared>>,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines constructed and not yet disposed.
    pub fn live_engines(&self) -> usize {
        self.shared.borrow().live
    }

    /// Total engines ever constructed.
    pub fn constructed(&self) -> usize {
        self.shared.borrow().constructed
    }

    /// State handles of every scene ever constructed, oldest first.
    pub fn scenes(&self) -> Vec<SceneHandle> {
        self.shared.borrow().scenes.iter().map(Rc::clone).collect()
    }

    /// The most recently constructed scene.
    pub fn last_scene(&self) -> Option<SceneHandle> {
        self.shared.borrow().scenes.last().map(Rc::clone)
    }
}

impl SceneEngineFactory for HeadlessFactory {
    fn construct(
        &mut self,
        surface: SurfaceId,
        width: u32,
        height: u32,
        background: Color,
        options: EngineOptions,
    ) -> Box<dyn SceneEngine> {
        let scene = Rc::new(RefCell::new(SceneState {
            surface,
            width,
            height,
            background,
            options,
            objects: Vec::new(),
            next_ref: 0,
            active: None,
            events: VecDeque::new(),
            renders: 0,
            disposed: false,
        }));
        let mut shared = self.shared.borrow_mut();
        shared.live += 1;
        shared.constructed += 1;
        shared.scenes.push(Rc::clone(&scene));
        drop(shared);
        Box::new(HeadlessEngine {
            scene,
            factory: Rc::clone(&self.shared),
        })
    }
}
