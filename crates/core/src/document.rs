//! Knowledge base document types and the store abstraction.
//!
//! The retrieval pipeline treats documents as read-only input; the store
//! also exposes write operations for the admin surface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// A curated knowledge base document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Unique document ID
    pub id: String,

    /// Human-readable title; doubles as the cited source
    pub title: String,

    /// The document body
    pub content: String,

    /// When this document was created
    pub created_at: DateTime<Utc>,

    /// When this document was last edited. Invariant: `updated_at >= created_at`.
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeDocument {
    /// Create a new document with fresh id and timestamps.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields accepted when updating a document in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// The knowledge document store.
///
/// `list` is what the turn pipeline consumes on every turn; the remaining
/// operations serve the admin CRUD surface.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// A human-readable name for this store backend.
    fn name(&self) -> &str;

    /// All documents, most recently updated first.
    async fn list(&self) -> std::result::Result<Vec<KnowledgeDocument>, StoreError>;

    /// Fetch one document by id.
    async fn get(&self, id: &str) -> std::result::Result<Option<KnowledgeDocument>, StoreError>;

    /// Insert a new document and return it with id and timestamps filled in.
    async fn add(
        &self,
        title: String,
        content: String,
    ) -> std::result::Result<KnowledgeDocument, StoreError>;

    /// Apply a patch to an existing document, refreshing `updated_at`.
    async fn update(
        &self,
        id: &str,
        patch: DocumentPatch,
    ) -> std::result::Result<KnowledgeDocument, StoreError>;

    /// Delete a document. Returns false when the id was unknown.
    async fn delete(&self, id: &str) -> std::result::Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_timestamps_agree() {
        let doc = KnowledgeDocument::new("Resume tips", "Keep it to one page.");
        assert!(doc.updated_at >= doc.created_at);
        assert!(!doc.id.is_empty());
    }

    #[test]
    fn patch_deserializes_partial_body() {
        let patch: DocumentPatch = serde_json::from_str(r#"{"content":"new body"}"#).unwrap();
        assert!(patch.title.is_none());
        assert_eq!(patch.content.as_deref(), Some("new body"));
    }
}
