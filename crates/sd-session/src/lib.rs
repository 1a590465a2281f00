pub mod engine;
pub mod headless;
pub mod session;
pub mod shortcuts;

pub use engine::{
    EngineOptions, ObjectClass, ObjectRef, ObjectSnapshot, RasterFormat, SceneEngine,
    SceneEngineFactory, SceneEvent, SceneEvents, SurfaceId,
};
pub use headless::{HeadlessFactory, SceneHandle};
pub use session::{PendingImage, Session, SessionConfig};
pub use shortcuts::{ShortcutAction, ShortcutMap};
