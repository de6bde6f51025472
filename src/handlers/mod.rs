use serde::de::DeserializeOwned;

use crate::database::document_path;
use crate::dtos::check_document_id;
use crate::errors::{AppError, Result};
use crate::state::AppState;

pub mod auth;
pub mod config;
pub mod health;
pub mod leaderboards;
pub mod matches;
pub mod predictions;
pub mod questions;
pub mod stream;
pub mod teams;
pub mod users;

/// Reads and decodes `{collection}/{id}`, answering 404 when it is missing.
pub(crate) async fn load<T: DeserializeOwned>(
    state: &AppState,
    collection: &str,
    id: &str,
) -> Result<T> {
    check_document_id(id, "id")?;
    let document = state
        .store
        .get(&document_path(collection, id))
        .await?
        .ok_or_else(|| AppError::not_found(format!("{}/{}", collection, id)))?;
    Ok(document.decode()?)
}

pub(crate) async fn load_all<T: DeserializeOwned>(state: &AppState, collection: &str) -> Result<Vec<T>> {
    let documents = state.store.list(collection).await?;
    let items = documents
        .iter()
        .map(|doc| doc.decode())
        .collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(items)
}
