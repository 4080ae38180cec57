//! In-memory document store — the default backend for ephemeral deployments
//! and tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use chatarbor_core::document::{DocumentPatch, DocumentStore, KnowledgeDocument};
use chatarbor_core::error::StoreError;

/// A document store backed by a Vec behind an RwLock.
pub struct InMemoryDocumentStore {
    documents: RwLock<Vec<KnowledgeDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Create a store pre-populated with documents.
    pub fn with_documents(documents: Vec<KnowledgeDocument>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list(&self) -> Result<Vec<KnowledgeDocument>, StoreError> {
        let documents = self.documents.read().await;
        let mut all = documents.clone();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|d| d.id == id).cloned())
    }

    async fn add(&self, title: String, content: String) -> Result<KnowledgeDocument, StoreError> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(StoreError::InvalidDocument(
                "Title and content are required".into(),
            ));
        }

        let doc = KnowledgeDocument::new(title, content);
        self.documents.write().await.push(doc.clone());
        Ok(doc)
    }

    async fn update(&self, id: &str, patch: DocumentPatch) -> Result<KnowledgeDocument, StoreError> {
        let mut documents = self.documents.write().await;
        let doc = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(content) = patch.content {
            doc.content = content;
        }
        doc.updated_at = Utc::now();

        Ok(doc.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().await;
        let len_before = documents.len();
        documents.retain(|d| d.id != id);
        Ok(documents.len() < len_before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_get() {
        let store = InMemoryDocumentStore::new();
        let doc = store
            .add("Resume tips".into(), "Keep it to one page.".into())
            .await
            .unwrap();

        let fetched = store.get(&doc.id).await.unwrap();
        assert_eq!(fetched.unwrap().title, "Resume tips");
    }

    #[tokio::test]
    async fn blank_fields_rejected() {
        let store = InMemoryDocumentStore::new();
        let err = store.add("  ".into(), "body".into()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn list_orders_by_recency() {
        let store = InMemoryDocumentStore::new();
        let first = store.add("First".into(), "a".into()).await.unwrap();
        let _second = store.add("Second".into(), "b".into()).await.unwrap();

        // Touching the first document moves it to the front
        store
            .update(
                &first.id,
                DocumentPatch {
                    content: Some("updated".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all[0].title, "First");
    }

    #[tokio::test]
    async fn update_refreshes_timestamp() {
        let store = InMemoryDocumentStore::new();
        let doc = store.add("Doc".into(), "v1".into()).await.unwrap();

        let updated = store
            .update(
                &doc.id,
                DocumentPatch {
                    title: None,
                    content: Some("v2".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content, "v2");
        assert_eq!(updated.title, "Doc");
        assert!(updated.updated_at >= doc.updated_at);
    }

    #[tokio::test]
    async fn update_unknown_id_errors() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .update("missing", DocumentPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = InMemoryDocumentStore::new();
        let doc = store.add("Doc".into(), "body".into()).await.unwrap();

        assert!(store.delete(&doc.id).await.unwrap());
        assert!(!store.delete(&doc.id).await.unwrap());
        assert!(store.get(&doc.id).await.unwrap().is_none());
    }
}
