//! The multi-document session manager.
//!
//! One [`Session`] owns the document store, the global style state, and at
//! most one mounted scene at a time:
//!
//! - **Lifecycle**: selecting a document constructs an engine through the
//!   factory and restores saved content into it; switching away drops the
//!   [`Mount`], whose teardown disposes the engine exactly once. The old
//!   scene is always gone before the next one exists.
//!
//! - **Style sync**: selection events pulled from the mounted scene
//!   overwrite the style state wholesale when a text object becomes active;
//!   control pushes write single properties through to the active text
//!   object and re-render. With nothing text-capable active, pushes only
//!   update the state, which the next text object inherits.
//!
//! Edits live only in the mounted scene. [`Session::save_document`] is the
//! single persistence point; switching documents without saving discards
//! everything since the last save.

use crate::engine::{EngineOptions, RasterFormat, SceneEngine, SceneEngineFactory, SurfaceId};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use sd_core::{
    Color, DocumentId, DocumentStore, ImageResource, ObjectKind, Position, Result, SceneObject,
    SessionError, StyleProperty, TextStyle, Thumbnail,
};

// ─── Configuration ───────────────────────────────────────────────────────

/// Surface and insertion defaults.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub surface_width: u32,
    pub surface_height: u32,
    pub background: Color,
    /// Where a new text object lands.
    pub text_position: Position,
    pub text_font_size: f32,
    /// Initial content of a new text object.
    pub default_text: String,
    /// Where a new image lands.
    pub image_position: Position,
    /// Uniform scale applied to inserted images.
    pub image_scale: f32,
    /// Raster scale for saved thumbnails.
    pub thumbnail_scale: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            surface_width: 800,
            surface_height: 500,
            background: Color::rgb(0xF8, 0xF8, 0xF8),
            text_position: Position::new(100.0, 100.0),
            text_font_size: 24.0,
            default_text: "Hello".into(),
            image_position: Position::new(100.0, 100.0),
            image_scale: 0.5,
            thumbnail_scale: 0.5,
        }
    }
}

// ─── Mount ───────────────────────────────────────────────────────────────

/// The scoped-resource handle for one mounted scene.
///
/// Dropping the mount disposes the engine; that runs exactly once per mount
/// and runs even when restore never completed.
struct Mount {
    document: DocumentId,
    epoch: u64,
    engine: Box<dyn SceneEngine>,
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.engine.dispose();
    }
}

/// Token for an in-flight image load, stamped with the originating mount's
/// epoch. A completion whose epoch no longer matches is discarded.
#[derive(Debug, Clone, Copy)]
pub struct PendingImage {
    document: DocumentId,
    epoch: u64,
}

// ─── Session ─────────────────────────────────────────────────────────────

/// The session controller: document store, style state, and scene lifecycle
/// in one explicitly-owned value. No ambient globals; hosts hold exactly
/// one of these per editing session.
pub struct Session {
    config: SessionConfig,
    factory: Box<dyn SceneEngineFactory>,
    store: DocumentStore,
    style: TextStyle,
    pending_title: String,
    selected: Option<DocumentId>,
    mount: Option<Mount>,
    epochs: u64,
}

impl Session {
    pub fn new<F: SceneEngineFactory + 'static>(factory: F) -> Self {
        Self::with_config(factory, SessionConfig::default())
    }

    pub fn with_config<F: SceneEngineFactory + 'static>(factory: F, config: SessionConfig) -> Self {
        Self {
            config,
            factory: Box::new(factory),
            store: DocumentStore::new(),
            style: TextStyle::default(),
            pending_title: String::new(),
            selected: None,
            mount: None,
            epochs: 0,
        }
    }

    // ─── Read access ─────────────────────────────────────────────────────

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// The current style state (the controls' values).
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn selected(&self) -> Option<DocumentId> {
        self.selected
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    pub fn pending_title(&self) -> &str {
        &self.pending_title
    }

    pub fn set_pending_title(&mut self, title: impl Into<String>) {
        self.pending_title = title.into();
    }

    // ─── Documents ───────────────────────────────────────────────────────

    /// Create a document and make it the selection (mounting a fresh,
    /// empty scene).
    ///
    /// # Errors
    /// [`SessionError::EmptyTitle`] when the trimmed title is empty; no
    /// state changes.
    pub fn create_document(&mut self, title: &str) -> Result<DocumentId> {
        let id = self.store.create(title)?;
        self.select_document(Some(id));
        Ok(id)
    }

    /// Create a document from the pending title, clearing it on success.
    pub fn submit_pending_title(&mut self) -> Result<DocumentId> {
        let title = self.pending_title.clone();
        let id = self.create_document(&title)?;
        self.pending_title.clear();
        Ok(id)
    }

    /// Change the selection, tearing down the old scene (if any) before the
    /// next one is constructed. Re-selecting the current document is a
    /// no-op; unknown ids are ignored.
    pub fn select_document(&mut self, selection: Option<DocumentId>) {
        if selection == self.selected {
            return;
        }
        if let Some(id) = selection
            && !self.store.contains(id)
        {
            log::warn!("ignoring selection of unknown document {id}");
            return;
        }

        // Unmounted strictly before the next mount exists.
        self.mount = None;
        self.selected = selection;
        if let Some(id) = selection {
            self.mount_scene(id);
        }
    }

    /// Remove a document. Deleting the selected one clears the selection
    /// and tears its scene down in the same step.
    pub fn delete_document(&mut self, id: DocumentId) {
        if self.selected == Some(id) {
            self.mount = None;
            self.selected = None;
        }
        self.store.remove(id);
    }

    /// Serialize the mounted scene and write content plus a fresh thumbnail
    /// into its document record. Silent no-op with no mounted scene.
    ///
    /// # Errors
    /// [`SessionError::Rasterize`] when the engine cannot export the
    /// thumbnail; the record is left untouched.
    pub fn save_document(&mut self) -> Result<()> {
        let Some(mount) = self.mount.as_mut() else {
            return Ok(());
        };
        let content = mount.engine.serialize();
        let png = mount
            .engine
            .rasterize(RasterFormat::Png, self.config.thumbnail_scale)?;
        self.store.save(mount.document, content, Thumbnail::new(png));
        Ok(())
    }

    fn mount_scene(&mut self, id: DocumentId) {
        debug_assert!(self.mount.is_none(), "previous scene must be gone");
        let mut engine = self.factory.construct(
            SurfaceId::for_document(id),
            self.config.surface_width,
            self.config.surface_height,
            self.config.background,
            EngineOptions::default(),
        );
        if let Some(content) = self.store.get(id).and_then(|d| d.content.as_ref())
            && let Err(err) = engine.restore(content)
        {
            log::warn!("restore of {id} failed, scene starts empty: {err}");
        }
        self.epochs += 1;
        self.mount = Some(Mount {
            document: id,
            epoch: self.epochs,
            engine,
        });
        self.pump_scene_events();
    }

    // ─── Editing operations ──────────────────────────────────────────────

    /// Insert a text object with the current style baked in, activate it,
    /// and re-render. Silent no-op with no mounted scene.
    pub fn add_text(&mut self) {
        let Some(mount) = self.mount.as_mut() else {
            return;
        };
        let object = SceneObject::new(
            self.config.text_position,
            ObjectKind::Text {
                content: self.config.default_text.clone(),
                font_size: self.config.text_font_size,
                style: self.style,
            },
        );
        let rf = mount.engine.add_object(object);
        mount.engine.set_active(rf);
        mount.engine.render();
        self.pump_scene_events();
    }

    /// First phase of image insertion: capture the mount the load belongs
    /// to. `None` with no mounted scene (the operation is a no-op then).
    pub fn begin_image_load(&self) -> Option<PendingImage> {
        self.mount.as_ref().map(|m| PendingImage {
            document: m.document,
            epoch: m.epoch,
        })
    }

    /// Second phase: decode the read bytes and insert the image into the
    /// scene the load was begun against.
    ///
    /// # Errors
    /// [`SessionError::StaleOperation`] when that scene has been unmounted
    /// meanwhile; the result is discarded and callers must not surface
    /// this. [`SessionError::ImageDecode`] for unreadable bytes; the scene
    /// is left unchanged.
    pub fn finish_image_load(
        &mut self,
        pending: PendingImage,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let current = self.mount.as_ref().map(|m| m.epoch);
        if current != Some(pending.epoch) {
            log::debug!(
                "discarding image load for {}: originating scene unmounted",
                pending.document
            );
            return Err(SessionError::StaleOperation);
        }
        let source = ImageResource::decode(bytes)?;
        if let Some(mount) = self.mount.as_mut() {
            let object = SceneObject::new(
                self.config.image_position,
                ObjectKind::Image {
                    source,
                    scale: self.config.image_scale,
                },
            );
            let rf = mount.engine.add_object(object);
            mount.engine.set_active(rf);
            mount.engine.render();
        }
        self.pump_scene_events();
        Ok(())
    }

    /// Both image phases back to back, for hosts that already have the
    /// bytes in hand. Silent no-op with no mounted scene.
    pub fn add_image(&mut self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        match self.begin_image_load() {
            Some(pending) => self.finish_image_load(pending, bytes),
            None => Ok(()),
        }
    }

    /// Push one style property: the state field updates immediately, and
    /// an active text object receives the property and a re-render.
    pub fn set_style(&mut self, property: StyleProperty) {
        self.style.apply(property);
        let Some(mount) = self.mount.as_mut() else {
            return;
        };
        let Some(active) = mount.engine.active() else {
            return;
        };
        let text_capable = mount
            .engine
            .snapshot(active)
            .is_some_and(|s| s.text_style.is_some());
        if text_capable {
            mount.engine.set_property(active, property);
            mount.engine.render();
        }
    }

    /// Remove the active object. No-op with no mount or no active object;
    /// suppressed while the object is being text-edited in place, so the
    /// keystroke reaches the editor instead of deleting the object.
    pub fn delete_active(&mut self) {
        let Some(mount) = self.mount.as_mut() else {
            return;
        };
        let Some(active) = mount.engine.active() else {
            return;
        };
        if mount.engine.snapshot(active).is_some_and(|s| s.editing) {
            return;
        }
        mount.engine.remove_object(active);
        mount.engine.render();
        self.pump_scene_events();
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Feed a key event through the shortcut map. Active only while a scene
    /// is mounted; that scoping is the handler's install/remove pairing.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) {
        if self.mount.is_none() {
            return;
        }
        if let Some(ShortcutAction::DeleteActive) = ShortcutMap::resolve(key, ctrl, shift, alt, meta)
        {
            self.delete_active();
        }
    }

    // ─── Scene events ────────────────────────────────────────────────────

    /// Drain the mounted scene's selection events and apply the style pull:
    /// a newly active text object overwrites the style state wholesale; a
    /// cleared or non-text selection keeps the last value.
    ///
    /// The session pumps after each of its own operations; hosts call this
    /// after engine-side interactions (canvas clicks) as well.
    pub fn pump_scene_events(&mut self) {
        let Some(mount) = self.mount.as_mut() else {
            return;
        };
        for _event in mount.engine.poll_events() {
            // Both changed- and cleared-class events re-read the active
            // object, matching the most complete source variant.
            if let Some(style) = mount
                .engine
                .active()
                .and_then(|rf| mount.engine.snapshot(rf))
                .and_then(|s| s.text_style)
            {
                self.style = style;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessFactory;

    #[test]
    fn create_selects_and_mounts() {
        let factory = HeadlessFactory::new();
        let mut session = Session::new(factory.clone());
        let id = session.create_document("First").unwrap();
        assert_eq!(session.selected(), Some(id));
        assert!(session.is_mounted());
        assert_eq!(factory.live_engines(), 1);
    }

    #[test]
    fn submit_pending_title_clears_on_success_only() {
        let factory = HeadlessFactory::new();
        let mut session = Session::new(factory);
        session.set_pending_title("   ");
        assert!(session.submit_pending_title().is_err());
        assert_eq!(session.pending_title(), "   ", "kept for correction");

        session.set_pending_title("Sketch");
        session.submit_pending_title().unwrap();
        assert_eq!(session.pending_title(), "");
    }

    #[test]
    fn style_push_without_mount_updates_state_only() {
        let factory = HeadlessFactory::new();
        let mut session = Session::new(factory);
        session.set_style(StyleProperty::Bold(true));
        assert!(session.style().bold);
    }

    #[test]
    fn operations_without_mount_are_noops() {
        let factory = HeadlessFactory::new();
        let mut session = Session::new(factory.clone());
        session.add_text();
        session.delete_active();
        session.handle_key("Delete", false, false, false, false);
        session.save_document().unwrap();
        assert!(session.add_image(b"irrelevant".to_vec()).is_ok());
        assert_eq!(factory.constructed(), 0);
    }

    #[test]
    fn surface_is_keyed_by_document() {
        let factory = HeadlessFactory::new();
        let mut session = Session::new(factory.clone());
        let id = session.create_document("Keyed").unwrap();
        let scene = factory.last_scene().unwrap();
        assert_eq!(
            scene.borrow().surface,
            SurfaceId::for_document(id)
        );
        assert_eq!(scene.borrow().width, 800);
        assert_eq!(scene.borrow().height, 500);
    }
}
