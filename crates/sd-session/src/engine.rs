//! The scene engine contract.
//!
//! The retained-mode 2D engine that owns objects, selection, hit testing and
//! pixel rendering is an external collaborator. The session only calls this
//! interface; any rendering library that can satisfy it slots in behind the
//! [`SceneEngineFactory`]. The crate ships one implementation, the headless
//! reference engine in [`crate::headless`], used by tests and GUI-less
//! embedders.
//!
//! Selection notifications are delivered queue-style: the engine accumulates
//! [`SceneEvent`]s and the session drains them with [`SceneEngine::poll_events`]
//! after every operation. Only the mounted engine's queue is ever drained,
//! and the queue dies with the engine on dispose, which is what pairs the
//! subscription with the mount.

use sd_core::{Color, DocumentId, Result, SceneContent, SceneObject, StyleProperty, TextStyle};
use smallvec::SmallVec;
use std::fmt;

/// Engine-assigned handle to one retained object in a live scene.
///
/// Valid only for the scene that minted it; refs are never reused across
/// restores or mounts.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(u64);

impl ObjectRef {
    pub fn new(raw: u64) -> Self {
        ObjectRef(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// The presentation target a scene binds to, keyed by document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn for_document(id: DocumentId) -> Self {
        SurfaceId(format!("canvas-{}", id.as_u64()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Construction options passed through to the engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Whether interactive selection is enabled on the surface.
    pub interactive_selection: bool,
    /// Keep stacking order stable while objects are manipulated.
    pub preserve_stacking: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            interactive_selection: true,
            preserve_stacking: true,
        }
    }
}

/// Raster export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
}

/// Coarse object classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Text,
    Image,
}

/// Read-only view of one retained object, for capability checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    pub class: ObjectClass,
    /// Present iff the object is text-capable.
    pub text_style: Option<TextStyle>,
    /// Whether the object is in its in-place text-editing sub-state.
    pub editing: bool,
}

/// Selection notifications emitted by a live scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// A new or different object became active.
    SelectionChanged(ObjectRef),
    /// The active object went away.
    SelectionCleared,
}

/// Drained event batch. Selection changes come at most a couple at a time.
pub type SceneEvents = SmallVec<[SceneEvent; 2]>;

/// One live, mounted scene. Object-safe so engines stay swappable behind
/// `Box<dyn SceneEngine>`.
pub trait SceneEngine {
    /// Rebuild the retained graph from serialized content. Completion is the
    /// return; a scene is not interactive until this returns.
    fn restore(&mut self, content: &SceneContent) -> Result<()>;

    /// Pure read of the current graph as portable content.
    fn serialize(&self) -> SceneContent;

    /// Export the surface as raster bytes at `scale`.
    fn rasterize(&self, format: RasterFormat, scale: f32) -> Result<Vec<u8>>;

    fn add_object(&mut self, object: SceneObject) -> ObjectRef;
    fn remove_object(&mut self, object: ObjectRef);

    fn set_active(&mut self, object: ObjectRef);
    fn active(&self) -> Option<ObjectRef>;

    /// Capability view of an object; `None` for refs the scene no longer
    /// retains.
    fn snapshot(&self, object: ObjectRef) -> Option<ObjectSnapshot>;

    /// Write a single style property to a text-capable object. Non-text
    /// refs are ignored.
    fn set_property(&mut self, object: ObjectRef, property: StyleProperty);

    fn render(&mut self);

    /// Drain pending selection events, oldest first.
    fn poll_events(&mut self) -> SceneEvents;

    /// Release every resource the scene holds. Idempotent.
    fn dispose(&mut self);
}

/// Constructs one engine per mount.
pub trait SceneEngineFactory {
    fn construct(
        &mut self,
        surface: SurfaceId,
        width: u32,
        height: u32,
        background: Color,
        options: EngineOptions,
    ) -> Box<dyn SceneEngine>;
}
