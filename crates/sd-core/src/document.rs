//! Document records and the in-memory document store.

use crate::error::{Result, SessionError};
use crate::id::DocumentId;
use crate::image::base64_bytes;
use crate::model::SceneContent;
use serde::{Deserialize, Serialize};

/// A low-resolution raster preview of a document, PNG-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(with = "base64_bytes")]
    png: Vec<u8>,
}

impl Thumbnail {
    pub fn new(png: Vec<u8>) -> Self {
        Self { png }
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }
}

/// One drawing document.
///
/// `content` and `thumbnail` stay absent until the first save and are
/// replaced wholesale by each save. Records are owned exclusively by the
/// [`DocumentStore`]; nothing else holds one past a single operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: Option<SceneContent>,
    pub thumbnail: Option<Thumbnail>,
}

impl Document {
    fn new(title: String) -> Self {
        Self {
            id: DocumentId::next(),
            title,
            content: None,
            thumbnail: None,
        }
    }

    /// Whether this document has ever been saved.
    pub fn is_saved(&self) -> bool {
        self.content.is_some()
    }
}

/// Ordered collection of documents, insertion order preserved.
///
/// Lives for the whole session; there is no persistence beyond memory.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new document with a fresh id.
    ///
    /// # Errors
    /// [`SessionError::EmptyTitle`] if `title` trims to nothing. The title
    /// is stored as entered, untrimmed.
    pub fn create(&mut self, title: &str) -> Result<DocumentId> {
        if title.trim().is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        let doc = Document::new(title.to_string());
        let id = doc.id;
        self.documents.push(doc);
        Ok(id)
    }

    /// Replace a record's content and thumbnail wholesale.
    ///
    /// Unknown ids are a silent no-op. Unreachable through a session, whose
    /// mount always refers to a stored id.
    pub fn save(&mut self, id: DocumentId, content: SceneContent, thumbnail: Thumbnail) {
        if let Some(doc) = self.documents.iter_mut().find(|d| d.id == id) {
            doc.content = Some(content);
            doc.thumbnail = Some(thumbnail);
        }
    }

    /// Remove a record. Returns whether it existed.
    pub fn remove(&mut self, id: DocumentId) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        self.documents.len() != before
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.get(id).is_some()
    }

    /// All documents in insertion order, for list display.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjectKind, Position, SceneObject, TextStyle};
    use pretty_assertions::assert_eq;

    fn text_content() -> SceneContent {
        SceneContent {
            objects: vec![SceneObject::new(
                Position::new(100.0, 100.0),
                ObjectKind::Text {
                    content: "Hello".into(),
                    font_size: 24.0,
                    style: TextStyle::default(),
                },
            )],
        }
    }

    #[test]
    fn create_validates_title() {
        let mut store = DocumentStore::new();
        assert!(matches!(store.create(""), Err(SessionError::EmptyTitle)));
        assert!(matches!(store.create("   "), Err(SessionError::EmptyTitle)));
        assert!(store.is_empty(), "failed create leaves no record");

        let id = store.create("  Draft ").unwrap();
        assert_eq!(store.get(id).unwrap().title, "  Draft ");
    }

    #[test]
    fn create_preserves_insertion_order() {
        let mut store = DocumentStore::new();
        let a = store.create("a").unwrap();
        let b = store.create("b").unwrap();
        let c = store.create("c").unwrap();
        let ids: Vec<_> = store.documents().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn save_replaces_wholesale_and_ignores_unknown() {
        let mut store = DocumentStore::new();
        let id = store.create("doc").unwrap();
        assert!(!store.get(id).unwrap().is_saved());

        store.save(id, text_content(), Thumbnail::new(vec![1, 2, 3]));
        let doc = store.get(id).unwrap();
        assert_eq!(doc.content.as_ref().unwrap().len(), 1);
        assert_eq!(doc.thumbnail.as_ref().unwrap().png_bytes(), &[1, 2, 3]);

        // Unknown id: nothing happens
        let ghost = DocumentId::next();
        store.save(ghost, SceneContent::default(), Thumbnail::new(vec![]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_reports_existence() {
        let mut store = DocumentStore::new();
        let id = store.create("doc").unwrap();
        assert!(store.remove(id));
        assert!(!store.remove(id));
        assert!(!store.contains(id));
    }
}
