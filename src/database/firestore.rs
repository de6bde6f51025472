use async_trait::async_trait;
use reqwest::{Client, IntoUrl, Method, RequestBuilder, StatusCode, Url};
use serde_json::{json, Value};

use crate::services::google_auth::SharedTokenProvider;

use super::value::{decode_fields, encode_fields, encode_value};
use super::{
    validate_collection_path, validate_document_path, Document, DocumentStore, Fields,
    StoreError, StoreResult, WriteOperation, MAX_BATCH_WRITES,
};

const FIRESTORE_HOST: &str = "https://firestore.googleapis.com";
const PAGE_SIZE: usize = 300;

/// Firestore over its v1 REST API.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    tokens: SharedTokenProvider,
    /// `https://host/v1/projects/{p}/databases/(default)`
    base_url: String,
    /// `projects/{p}/databases/(default)/documents`
    documents_root: String,
}

impl FirestoreStore {
    pub fn new(project_id: &str, tokens: SharedTokenProvider) -> Self {
        Self::with_host(FIRESTORE_HOST, project_id, tokens)
    }

    /// Points at the local emulator, e.g. `localhost:8080`.
    pub fn emulator(emulator_host: &str, project_id: &str, tokens: SharedTokenProvider) -> Self {
        Self::with_host(&format!("http://{}", emulator_host), project_id, tokens)
    }

    fn with_host(host: &str, project_id: &str, tokens: SharedTokenProvider) -> Self {
        let database = format!("projects/{}/databases/(default)", project_id);
        Self {
            client: Client::new(),
            tokens,
            base_url: format!("{}/v1/{}", host.trim_end_matches('/'), database),
            documents_root: format!("{}/documents", database),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/documents{}", self.base_url, suffix)
    }

    /// URL of a document or collection with each path segment
    /// percent-encoded, so ids holding `?`, `#` or `%` stay inside their
    /// segment. `suffix` is appended verbatim to the last one (`:runQuery`).
    fn document_url(&self, path: &str, suffix: &str) -> StoreResult<Url> {
        let mut url =
            Url::parse(&self.url("")).map_err(|e| StoreError::InvalidPath(e.to_string()))?;
        let mut segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if let Some(last) = segments.last_mut() {
            last.push_str(suffix);
        }
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidPath(path.to_string()))?
            .extend(&segments);
        Ok(url)
    }

    fn resource_name(&self, path: &str) -> String {
        format!("{}/{}", self.documents_root, path)
    }

    fn relative_path<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(&self.documents_root)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(name)
    }

    async fn request(&self, method: Method, url: impl IntoUrl) -> StoreResult<RequestBuilder> {
        let builder = self.client.request(method, url);
        match self
            .tokens
            .access_token()
            .await
            .map_err(|e| StoreError::Auth(e.to_string()))?
        {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    async fn send(&self, builder: RequestBuilder) -> StoreResult<Option<Value>> {
        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "firestore request failed");
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(Some(response.json::<Value>().await?))
    }

    fn decode_document(&self, resource: &Value) -> StoreResult<Document> {
        let name = resource
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("document without a name".into()))?;
        let fields = decode_fields(resource.get("fields"))?;
        Ok(Document::new(self.relative_path(name), fields))
    }

    fn encode_write(&self, write: &WriteOperation) -> Value {
        match write {
            WriteOperation::Set { path, fields } => json!({
                "update": {
                    "name": self.resource_name(path),
                    "fields": encode_fields(fields),
                }
            }),
            WriteOperation::Delete { path } => json!({ "delete": self.resource_name(path) }),
        }
    }
}

/// Splits `a/b/c` into the parent document (`a/b`) and the collection id (`c`).
fn split_collection(collection: &str) -> (Option<&str>, &str) {
    match collection.rsplit_once('/') {
        Some((parent, id)) => (Some(parent), id),
        None => (None, collection),
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Document>> {
        validate_document_path(path)?;
        let builder = self.request(Method::GET, self.document_url(path, "")?).await?;
        match self.send(builder).await? {
            Some(resource) => self.decode_document(&resource).map(Some),
            None => Ok(None),
        }
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        validate_collection_path(collection)?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut builder = self
                .request(Method::GET, self.document_url(collection, "")?)
                .await?
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }

            let Some(page) = self.send(builder).await? else {
                break;
            };
            if let Some(resources) = page.get("documents").and_then(Value::as_array) {
                for resource in resources {
                    documents.push(self.decode_document(resource)?);
                }
            }

            match page.get("nextPageToken").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }

        tracing::debug!(collection, count = documents.len(), "listed collection");
        Ok(documents)
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        validate_collection_path(collection)?;
        let (parent, collection_id) = split_collection(collection);
        let url = match parent {
            Some(parent) => self.document_url(parent, ":runQuery")?,
            None => Url::parse(&self.url(":runQuery"))
                .map_err(|e| StoreError::InvalidPath(e.to_string()))?,
        };

        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection_id }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": encode_value(value),
                    }
                }
            }
        });

        let builder = self.request(Method::POST, url).await?.json(&body);
        let results = self.send(builder).await?.unwrap_or(Value::Array(Vec::new()));
        let rows = results
            .as_array()
            .ok_or_else(|| StoreError::Decode("runQuery did not return an array".into()))?;

        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(|resource| self.decode_document(resource))
            .collect()
    }

    async fn set(&self, path: &str, fields: Fields) -> StoreResult<()> {
        validate_document_path(path)?;
        let builder = self
            .request(Method::PATCH, self.document_url(path, "")?)
            .await?
            .json(&json!({ "fields": encode_fields(&fields) }));
        self.send(builder).await?;
        Ok(())
    }

    async fn merge(&self, path: &str, fields: Fields) -> StoreResult<()> {
        validate_document_path(path)?;
        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let builder = self
            .request(Method::PATCH, self.document_url(path, "")?)
            .await?
            .query(&query)
            .json(&json!({ "fields": encode_fields(&fields) }));
        match self.send(builder).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        validate_document_path(path)?;
        let builder = self
            .request(Method::DELETE, self.document_url(path, "")?)
            .await?;
        self.send(builder).await?;
        Ok(())
    }

    async fn commit(&self, writes: Vec<WriteOperation>) -> StoreResult<()> {
        if writes.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchTooLarge(writes.len()));
        }
        for write in &writes {
            validate_document_path(write.path())?;
        }

        let encoded: Vec<Value> = writes.iter().map(|w| self.encode_write(w)).collect();
        let builder = self
            .request(Method::POST, self.url(":commit"))
            .await?
            .json(&json!({ "writes": encoded }));
        self.send(builder).await?;

        tracing::debug!(writes = writes.len(), "committed batch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::google_auth::NoopTokenProvider;
    use std::sync::Arc;

    fn store() -> FirestoreStore {
        FirestoreStore::emulator("localhost:8080", "demo-cricket", Arc::new(NoopTokenProvider))
    }

    #[test]
    fn builds_resource_urls() {
        let store = store();
        assert_eq!(
            store.url("/matches/m1"),
            "http://localhost:8080/v1/projects/demo-cricket/databases/(default)/documents/matches/m1"
        );
        assert_eq!(
            store.resource_name("teams/csk"),
            "projects/demo-cricket/databases/(default)/documents/teams/csk"
        );
        assert_eq!(
            store.relative_path("projects/demo-cricket/databases/(default)/documents/teams/csk"),
            "teams/csk"
        );
    }

    #[test]
    fn escapes_reserved_characters_in_ids() {
        let store = store();
        let base = "http://localhost:8080/v1/projects/demo-cricket/databases/(default)/documents";
        assert_eq!(
            store.document_url("matches/a?b#c%d", "").unwrap().as_str(),
            format!("{}/matches/a%3Fb%23c%25d", base)
        );
        assert_eq!(
            store.document_url("leaderboards/s1", ":runQuery").unwrap().as_str(),
            format!("{}/leaderboards/s1:runQuery", base)
        );
    }

    #[test]
    fn encodes_commit_writes() {
        let store = store();
        let delete = store.encode_write(&WriteOperation::Delete {
            path: "leaderboards/s1/leaderboardEntries/u1".into(),
        });
        assert_eq!(
            delete["delete"],
            "projects/demo-cricket/databases/(default)/documents/leaderboards/s1/leaderboardEntries/u1"
        );

        let mut fields = Fields::new();
        fields.insert("points".into(), json!(4));
        let set = store.encode_write(&WriteOperation::Set {
            path: "leaderboards/s1/leaderboardEntries/u2".into(),
            fields,
        });
        assert_eq!(set["update"]["fields"]["points"], json!({ "integerValue": "4" }));
    }

    #[test]
    fn splits_subcollections() {
        assert_eq!(split_collection("matches"), (None, "matches"));
        assert_eq!(
            split_collection("leaderboards/s1/leaderboardEntries"),
            (Some("leaderboards/s1"), "leaderboardEntries")
        );
    }
}
