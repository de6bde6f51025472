use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{
    validate_collection_path, validate_document_path, Document, DocumentStore, Fields,
    StoreError, StoreResult, WriteOperation, MAX_BATCH_WRITES,
};

/// Process-local document store used for tests and `STORE_BACKEND=memory`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<BTreeMap<String, Fields>>>,
    commits: Arc<Mutex<Vec<usize>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes of every successful commit, in order.
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }

    fn documents(&self) -> MutexGuard<'_, BTreeMap<String, Fields>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn children<'a>(
        store: &'a BTreeMap<String, Fields>,
        collection: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Fields)> + 'a {
        let prefix = format!("{}/", collection);
        store.iter().filter(move |(path, _)| {
            path.strip_prefix(&prefix)
                .map(|rest| !rest.contains('/'))
                .unwrap_or(false)
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Document>> {
        validate_document_path(path)?;
        Ok(self
            .documents()
            .get(path)
            .map(|fields| Document::new(path, fields.clone())))
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        validate_collection_path(collection)?;
        let store = self.documents();
        Ok(Self::children(&store, collection)
            .map(|(path, fields)| Document::new(path.as_str(), fields.clone()))
            .collect())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        validate_collection_path(collection)?;
        let store = self.documents();
        Ok(Self::children(&store, collection)
            .filter(|(_, fields)| fields.get(field) == Some(value))
            .map(|(path, fields)| Document::new(path.as_str(), fields.clone()))
            .collect())
    }

    async fn set(&self, path: &str, fields: Fields) -> StoreResult<()> {
        validate_document_path(path)?;
        self.documents().insert(path.to_string(), fields);
        Ok(())
    }

    async fn merge(&self, path: &str, fields: Fields) -> StoreResult<()> {
        validate_document_path(path)?;
        let mut store = self.documents();
        let existing = store
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        validate_document_path(path)?;
        self.documents().remove(path);
        Ok(())
    }

    async fn commit(&self, writes: Vec<WriteOperation>) -> StoreResult<()> {
        if writes.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchTooLarge(writes.len()));
        }
        for write in &writes {
            validate_document_path(write.path())?;
        }

        let size = writes.len();
        let mut store = self.documents();
        for write in writes {
            match write {
                WriteOperation::Set { path, fields } => {
                    store.insert(path, fields);
                }
                WriteOperation::Delete { path } => {
                    store.remove(&path);
                }
            }
        }
        drop(store);

        self.commits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn list_only_returns_direct_children() {
        let store = MemoryStore::new();
        store
            .set("leaderboards/season", fields(json!({ "name": "season" })))
            .await
            .unwrap();
        store
            .set(
                "leaderboards/season/leaderboardEntries/u1",
                fields(json!({ "points": 3 })),
            )
            .await
            .unwrap();

        let boards = store.list("leaderboards").await.unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].id, "season");

        let entries = store
            .list("leaderboards/season/leaderboardEntries")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "u1");
    }

    #[tokio::test]
    async fn merge_requires_existing_document() {
        let store = MemoryStore::new();
        let err = store
            .merge("matches/m1", fields(json!({ "venue": "Eden" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store
            .set("matches/m1", fields(json!({ "venue": "Eden", "status": "upcoming" })))
            .await
            .unwrap();
        store
            .merge("matches/m1", fields(json!({ "status": "live" })))
            .await
            .unwrap();
        let doc = store.get("matches/m1").await.unwrap().unwrap();
        assert_eq!(doc.fields["venue"], json!("Eden"));
        assert_eq!(doc.fields["status"], json!("live"));
    }

    #[tokio::test]
    async fn commit_enforces_batch_limit() {
        let store = MemoryStore::new();
        let writes: Vec<_> = (0..=MAX_BATCH_WRITES)
            .map(|i| WriteOperation::Delete {
                path: format!("teams/t{}", i),
            })
            .collect();
        let err = store.commit(writes).await.unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge(501)));
        assert!(store.commit_sizes().is_empty());
    }

    #[tokio::test]
    async fn query_filters_on_field_equality() {
        let store = MemoryStore::new();
        store
            .set("questions/q1", fields(json!({ "matchId": "m1" })))
            .await
            .unwrap();
        store
            .set("questions/q2", fields(json!({ "matchId": "m2" })))
            .await
            .unwrap();

        let hits = store
            .query_eq("questions", "matchId", &json!("m2"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "q2");
    }
}
