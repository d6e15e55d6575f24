// ./infrastructure/src/persistence/in_memory_repository.rs
use application::{ApplicationError, DocumentHandle, DocumentRepository};
use async_trait::async_trait;
use domain::Document;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Ordered, append-only document storage held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    // Insertion order; no secondary indexes
    documents: Arc<RwLock<Vec<DocumentHandle>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    #[instrument(skip(self, document))]
    async fn append(&self, document: Document) -> Result<DocumentHandle, ApplicationError> {
        let handle = DocumentHandle::new(document);
        let mut documents = self.documents.write();
        documents.push(handle.clone());
        debug!(position = documents.len() - 1, "Appended document to in-memory store");
        Ok(handle)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<DocumentHandle>, ApplicationError> {
        // Handles are Arc clones, the records themselves stay shared
        let documents = self.documents.read().clone();
        debug!(count = documents.len(), "Listing documents from in-memory store");
        Ok(documents)
    }

    async fn count(&self) -> Result<usize, ApplicationError> {
        Ok(self.documents.read().len())
    }

    /// Scans under the read lock instead of cloning the whole sequence.
    #[instrument(skip(self, predicate))]
    async fn find_first(
        &self,
        predicate: &(dyn for<'a> Fn(&'a Document) -> bool + Send + Sync),
    ) -> Result<Option<DocumentHandle>, ApplicationError> {
        let documents = self.documents.read();
        let found = documents
            .iter()
            .position(|handle| handle.with(|doc| predicate(doc)));
        trace!(scanned = documents.len(), position = ?found, "In-memory scan finished");
        Ok(found.map(|position| documents[position].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Author;

    fn doc(title: &str, content: &str) -> Document {
        Document::new(title, content, Author::new("a1", "Ada"))
    }

    #[tokio::test]
    async fn preserves_insertion_order() {
        let repository = InMemoryDocumentRepository::new();
        for title in ["first", "second", "third"] {
            repository.append(doc(title, title)).await.unwrap();
        }

        let titles: Vec<String> = repository
            .list()
            .await
            .unwrap()
            .iter()
            .map(DocumentHandle::title)
            .collect();
        assert_eq!(titles, ["first", "second", "third"]);
        assert_eq!(repository.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn find_first_returns_earliest_match() {
        let repository = InMemoryDocumentRepository::new();
        let first = repository.append(doc("one", "same")).await.unwrap();
        repository.append(doc("two", "same")).await.unwrap();

        let found = repository
            .find_first(&|stored: &Document| stored.content() == "same")
            .await
            .unwrap()
            .unwrap();
        assert!(found.ptr_eq(&first));

        let none = repository
            .find_first(&|stored: &Document| stored.content() == "other")
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let repository = InMemoryDocumentRepository::new();
        let alias = repository.clone();
        alias.append(doc("one", "x")).await.unwrap();
        assert_eq!(repository.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listed_handles_are_live() {
        let repository = InMemoryDocumentRepository::new();
        repository.append(doc("draft", "x")).await.unwrap();

        let listed = repository.list().await.unwrap();
        listed[0].update(|doc| doc.set_title("final"));

        let again = repository.list().await.unwrap();
        assert_eq!(again[0].title(), "final");
    }
}
