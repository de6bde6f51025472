use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod connection;
pub mod firestore;
pub mod memory;
pub mod value;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// Hard limit on the number of writes a single Firestore commit accepts.
pub const MAX_BATCH_WRITES: usize = 500;

pub type Fields = Map<String, Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode document: {0}")]
    Decode(String),

    #[error("could not encode document: {0}")]
    Encode(String),

    #[error("batch of {0} writes exceeds the limit of {MAX_BATCH_WRITES}")]
    BatchTooLarge(usize),

    #[error("invalid document path: {0}")]
    InvalidPath(String),

    #[error("access token unavailable: {0}")]
    Auth(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A document read from the store. `fields` holds plain JSON: timestamps come
/// back as RFC 3339 strings and integers as JSON numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: String,
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: impl Into<String>, fields: Fields) -> Self {
        let path = path.into();
        let id = path.rsplit('/').next().unwrap_or_default().to_string();
        Document { path, id, fields }
    }

    /// Deserializes the document, exposing its id as an `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| StoreError::Decode(format!("{}: {}", self.path, e)))
    }
}

/// Serializes a model into document fields. The `id` field is dropped since it
/// lives in the document path.
pub fn to_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value).map_err(|e| StoreError::Encode(e.to_string()))? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(StoreError::Encode(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

pub fn document_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, id)
}

/// Collection paths have an odd number of segments, documents an even one.
pub fn validate_collection_path(path: &str) -> StoreResult<()> {
    let segments = path.split('/').filter(|s| !s.is_empty()).count();
    if segments == 0 || segments % 2 == 0 || path.split('/').any(str::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

pub fn validate_document_path(path: &str) -> StoreResult<()> {
    let segments = path.split('/').filter(|s| !s.is_empty()).count();
    if segments == 0 || segments % 2 == 1 || path.split('/').any(str::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    Set { path: String, fields: Fields },
    Delete { path: String },
}

impl WriteOperation {
    pub fn path(&self) -> &str {
        match self {
            WriteOperation::Set { path, .. } | WriteOperation::Delete { path } => path,
        }
    }
}

/// The subset of a document database this service needs. Implemented over the
/// Firestore REST API and in memory.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn get(&self, path: &str) -> StoreResult<Option<Document>>;

    /// Every document directly inside `collection`.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>>;

    /// Creates or fully replaces the document.
    async fn set(&self, path: &str, fields: Fields) -> StoreResult<()>;

    /// Overwrites only the given fields. The document must exist.
    async fn merge(&self, path: &str, fields: Fields) -> StoreResult<()>;

    async fn delete(&self, path: &str) -> StoreResult<()>;

    /// Applies up to [`MAX_BATCH_WRITES`] writes atomically.
    async fn commit(&self, writes: Vec<WriteOperation>) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Team {
        id: String,
        name: String,
    }

    #[test]
    fn decode_exposes_id_from_path() {
        let fields = to_fields(&Team {
            id: "ignored".into(),
            name: "Mumbai".into(),
        })
        .unwrap();
        assert!(!fields.contains_key("id"));

        let doc = Document::new("teams/mi", fields);
        let team: Team = doc.decode().unwrap();
        assert_eq!(team.id, "mi");
        assert_eq!(team.name, "Mumbai");
    }

    #[test]
    fn to_fields_rejects_non_objects() {
        assert!(matches!(to_fields(&json!(3)), Err(StoreError::Encode(_))));
    }

    #[test]
    fn path_shapes() {
        assert!(validate_collection_path("matches").is_ok());
        assert!(validate_collection_path("leaderboards/season/leaderboardEntries").is_ok());
        assert!(validate_collection_path("matches/m1").is_err());
        assert!(validate_document_path("matches/m1").is_ok());
        assert!(validate_document_path("matches//m1").is_err());
        assert!(validate_document_path("matches").is_err());
    }
}
