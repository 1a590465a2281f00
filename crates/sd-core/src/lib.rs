pub mod document;
pub mod error;
pub mod id;
pub mod image;
pub mod model;

pub use document::{Document, DocumentStore, Thumbnail};
pub use error::{Result, SessionError};
pub use id::DocumentId;
pub use image::ImageResource;
pub use model::*;
