//! Leaderboard reset and rebuild.
//!
//! Entries are derived data. Both flows touch only
//! `leaderboards/{id}/leaderboardEntries`; prediction records are read, never
//! written.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::database::{
    document_path, to_fields, DocumentStore, StoreError, WriteOperation, MAX_BATCH_WRITES,
};
use crate::models::leaderboard::{self, entries_collection, Leaderboard, LeaderboardEntry};
use crate::models::prediction::{self, PredictionAnswer};
use crate::models::user::{self, UserProfile};

#[derive(Error, Debug)]
pub enum ResetError {
    #[error("failed to read leaderboard entries: {0}")]
    Read(#[source] StoreError),

    #[error("batch commit failed after deleting {deleted_before_failure} entries: {source}")]
    Commit {
        deleted_before_failure: usize,
        #[source]
        source: StoreError,
    },

    #[error("deleted {deleted} entries but failed to update the summary: {source}")]
    Summary {
        deleted: usize,
        #[source]
        source: StoreError,
    },
}

impl ResetError {
    pub fn deleted_before_failure(&self) -> usize {
        match self {
            ResetError::Read(_) => 0,
            ResetError::Commit {
                deleted_before_failure,
                ..
            } => *deleted_before_failure,
            ResetError::Summary { deleted, .. } => *deleted,
        }
    }
}

#[derive(Error, Debug)]
pub enum RebuildError {
    #[error("failed to read predictions: {0}")]
    Read(#[from] StoreError),

    #[error(transparent)]
    Reset(#[from] ResetError),

    #[error("batch commit failed after writing {written_before_failure} entries: {source}")]
    Write {
        written_before_failure: usize,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildSummary {
    pub removed: usize,
    pub written: usize,
}

/// Deletes every entry of the leaderboard in commits of at most
/// [`MAX_BATCH_WRITES`] and returns how many were deleted. Batches run in
/// order; the first failing commit stops the rest. Deletes are idempotent, so
/// repeating a reset is safe.
pub async fn reset_leaderboard(
    store: &dyn DocumentStore,
    leaderboard_id: &str,
) -> Result<usize, ResetError> {
    let collection = entries_collection(leaderboard_id);
    let entries = store.list(&collection).await.map_err(ResetError::Read)?;

    if entries.is_empty() {
        tracing::info!(leaderboard_id, "leaderboard already empty");
        return Ok(0);
    }

    let mut deleted = 0;
    for (batch_number, chunk) in entries.chunks(MAX_BATCH_WRITES).enumerate() {
        let writes: Vec<WriteOperation> = chunk
            .iter()
            .map(|doc| WriteOperation::Delete {
                path: doc.path.clone(),
            })
            .collect();
        let size = writes.len();

        if let Err(source) = store.commit(writes).await {
            tracing::error!(
                leaderboard_id,
                batch = batch_number + 1,
                deleted,
                error = %source,
                "leaderboard reset aborted"
            );
            return Err(ResetError::Commit {
                deleted_before_failure: deleted,
                source,
            });
        }

        deleted += size;
        tracing::debug!(leaderboard_id, batch = batch_number + 1, size, "deleted batch");
    }

    tracing::info!(leaderboard_id, deleted, "leaderboard reset");
    Ok(deleted)
}

/// Resets the leaderboard and records it as empty in `leaderboards/{id}`.
/// Used by the admin endpoint and the maintenance CLI.
pub async fn reset_and_mark(
    store: &dyn DocumentStore,
    leaderboard_id: &str,
) -> Result<usize, ResetError> {
    let deleted = reset_leaderboard(store, leaderboard_id).await?;
    write_summary(store, leaderboard_id, 0)
        .await
        .map_err(|source| ResetError::Summary { deleted, source })?;
    Ok(deleted)
}

async fn write_summary(
    store: &dyn DocumentStore,
    leaderboard_id: &str,
    entry_count: usize,
) -> Result<(), StoreError> {
    let meta = Leaderboard {
        id: leaderboard_id.to_string(),
        entry_count,
        updated_at: Some(Utc::now()),
    };
    store
        .set(
            &document_path(leaderboard::COLLECTION, leaderboard_id),
            to_fields(&meta)?,
        )
        .await
}

/// Recomputes the leaderboard from `predictionAnswers`: reset, then write one
/// entry per user who has predicted.
pub async fn rebuild_leaderboard(
    store: &dyn DocumentStore,
    leaderboard_id: &str,
) -> Result<RebuildSummary, RebuildError> {
    let answers: Vec<PredictionAnswer> = store
        .list(prediction::COLLECTION)
        .await?
        .iter()
        .map(|doc| doc.decode::<PredictionAnswer>())
        .collect::<Result<_, _>>()?;

    let names: HashMap<String, String> = store
        .list(user::COLLECTION)
        .await?
        .iter()
        .filter_map(|doc| doc.decode::<UserProfile>().ok())
        .filter_map(|profile| profile.display_name.map(|name| (profile.id, name)))
        .collect();

    let entries = rank_entries(&answers, &names);
    let removed = reset_leaderboard(store, leaderboard_id).await?;

    let collection = entries_collection(leaderboard_id);
    let mut written = 0;
    for chunk in entries.chunks(MAX_BATCH_WRITES) {
        let writes = chunk
            .iter()
            .map(|entry| -> Result<WriteOperation, StoreError> {
                Ok(WriteOperation::Set {
                    path: document_path(&collection, &entry.user_id),
                    fields: to_fields(entry)?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        let size = writes.len();

        store
            .commit(writes)
            .await
            .map_err(|source| RebuildError::Write {
                written_before_failure: written,
                source,
            })?;
        written += size;
    }

    write_summary(store, leaderboard_id, written).await?;

    tracing::info!(leaderboard_id, removed, written, "leaderboard rebuilt");
    Ok(RebuildSummary { removed, written })
}

/// Aggregates answers per user and assigns competition ranks ("1, 2, 2, 4"):
/// points first, then correct predictions; equal users share a rank.
pub fn rank_entries(
    answers: &[PredictionAnswer],
    display_names: &HashMap<String, String>,
) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<&str, (i64, u32, u32)> = HashMap::new();
    for answer in answers {
        let total = totals.entry(answer.user_id.as_str()).or_default();
        total.0 += answer.points_awarded.unwrap_or(0);
        if answer.is_correct == Some(true) {
            total.1 += 1;
        }
        total.2 += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = totals
        .into_iter()
        .map(|(user_id, (points, correct, total))| LeaderboardEntry {
            user_id: user_id.to_string(),
            display_name: display_names.get(user_id).cloned(),
            points,
            correct_predictions: correct,
            total_predictions: total,
            rank: 0,
        })
        .collect();

    let by_score = |a: &LeaderboardEntry, b: &LeaderboardEntry| {
        b.points
            .cmp(&a.points)
            .then(b.correct_predictions.cmp(&a.correct_predictions))
    };
    entries.sort_by(|a, b| by_score(a, b).then_with(|| a.user_id.cmp(&b.user_id)));

    for i in 0..entries.len() {
        entries[i].rank = if i > 0 && by_score(&entries[i - 1], &entries[i]) == Ordering::Equal {
            entries[i - 1].rank
        } else {
            i as u32 + 1
        };
    }
    entries
}

/// Entries ordered by rank.
pub async fn list_entries(
    store: &dyn DocumentStore,
    leaderboard_id: &str,
) -> Result<Vec<LeaderboardEntry>, StoreError> {
    let mut entries: Vec<LeaderboardEntry> = store
        .list(&entries_collection(leaderboard_id))
        .await?
        .iter()
        .map(|doc| doc.decode::<LeaderboardEntry>())
        .collect::<Result<_, _>>()?;
    entries.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.user_id.cmp(&b.user_id)));
    Ok(entries)
}

pub async fn list_leaderboards(store: &dyn DocumentStore) -> Result<Vec<Leaderboard>, StoreError> {
    store
        .list(leaderboard::COLLECTION)
        .await?
        .iter()
        .map(|doc| doc.decode())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Document, Fields, MemoryStore, StoreResult};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    async fn seed_entries(store: &MemoryStore, leaderboard_id: &str, count: usize) {
        let collection = entries_collection(leaderboard_id);
        for i in 0..count {
            let entry = LeaderboardEntry {
                user_id: format!("u{}", i),
                display_name: None,
                points: i as i64,
                correct_predictions: 0,
                total_predictions: 0,
                rank: 0,
            };
            store
                .set(
                    &document_path(&collection, &entry.user_id),
                    to_fields(&entry).unwrap(),
                )
                .await
                .unwrap();
        }
    }

    fn answer(user: &str, points: i64, correct: bool) -> PredictionAnswer {
        PredictionAnswer {
            id: String::new(),
            user_id: user.to_string(),
            match_id: "m1".to_string(),
            question_id: None,
            answer: "csk".to_string(),
            submitted_at: Utc::now(),
            is_correct: Some(correct),
            points_awarded: Some(points),
        }
    }

    #[tokio::test]
    async fn empty_leaderboard_resets_to_zero_without_commits() {
        let store = MemoryStore::new();
        assert_eq!(reset_leaderboard(&store, "season").await.unwrap(), 0);
        assert!(store.commit_sizes().is_empty());
    }

    #[tokio::test]
    async fn resets_in_batches_of_five_hundred() {
        let store = MemoryStore::new();
        seed_entries(&store, "season", 1200).await;

        let deleted = reset_leaderboard(&store, "season").await.unwrap();
        assert_eq!(deleted, 1200);
        assert_eq!(store.commit_sizes(), vec![500, 500, 200]);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn reset_keeps_prediction_history_and_other_boards() {
        let store = MemoryStore::new();
        seed_entries(&store, "season", 3).await;
        seed_entries(&store, "weekly", 2).await;
        let record = to_fields(&answer("u1", 2, true)).unwrap();
        store
            .set("predictionAnswers/u1_m1_winner", record)
            .await
            .unwrap();

        assert_eq!(reset_leaderboard(&store, "season").await.unwrap(), 3);
        assert!(store
            .get("predictionAnswers/u1_m1_winner")
            .await
            .unwrap()
            .is_some());
        assert_eq!(
            store.list(&entries_collection("weekly")).await.unwrap().len(),
            2
        );

        // Repeating is harmless.
        assert_eq!(reset_leaderboard(&store, "season").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reset_and_mark_records_an_empty_summary() {
        let store = MemoryStore::new();
        seed_entries(&store, "season", 4).await;
        let stale = Leaderboard {
            id: "season".to_string(),
            entry_count: 4,
            updated_at: None,
        };
        store
            .set("leaderboards/season", to_fields(&stale).unwrap())
            .await
            .unwrap();

        assert_eq!(reset_and_mark(&store, "season").await.unwrap(), 4);

        let boards = list_leaderboards(&store).await.unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].entry_count, 0);
        assert!(boards[0].updated_at.is_some());
        assert!(list_entries(&store, "season").await.unwrap().is_empty());
    }

    /// Fails the nth commit (1-based), delegating everything else.
    struct FailingStore {
        inner: MemoryStore,
        fail_on: usize,
        commits: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn get(&self, path: &str) -> StoreResult<Option<Document>> {
            self.inner.get(path).await
        }
        async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
            self.inner.list(collection).await
        }
        async fn query_eq(
            &self,
            collection: &str,
            field: &str,
            value: &Value,
        ) -> StoreResult<Vec<Document>> {
            self.inner.query_eq(collection, field, value).await
        }
        async fn set(&self, path: &str, fields: Fields) -> StoreResult<()> {
            self.inner.set(path, fields).await
        }
        async fn merge(&self, path: &str, fields: Fields) -> StoreResult<()> {
            self.inner.merge(path, fields).await
        }
        async fn delete(&self, path: &str) -> StoreResult<()> {
            self.inner.delete(path).await
        }
        async fn commit(&self, writes: Vec<WriteOperation>) -> StoreResult<()> {
            let n = self.commits.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(StoreError::Status {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            self.inner.commit(writes).await
        }
    }

    #[tokio::test]
    async fn failed_batch_aborts_and_reports_partial_count() {
        let inner = MemoryStore::new();
        seed_entries(&inner, "season", 1200).await;
        let store = FailingStore {
            inner: inner.clone(),
            fail_on: 2,
            commits: AtomicUsize::new(0),
        };

        let err = reset_leaderboard(&store, "season").await.unwrap_err();
        assert_eq!(err.deleted_before_failure(), 500);
        // The third batch never ran.
        assert_eq!(store.commits.load(AtomicOrdering::SeqCst), 2);
        assert_eq!(inner.commit_sizes(), vec![500]);
        assert_eq!(inner.len(), 700);
    }

    #[test]
    fn ranks_share_positions_on_ties() {
        let answers = vec![
            answer("alice", 3, true),
            answer("alice", 0, false),
            answer("bob", 3, true),
            answer("carol", 5, true),
            answer("dave", 1, true),
        ];
        let names = HashMap::from([("carol".to_string(), "Carol".to_string())]);
        let entries = rank_entries(&answers, &names);

        let summary: Vec<(&str, i64, u32)> = entries
            .iter()
            .map(|e| (e.user_id.as_str(), e.points, e.rank))
            .collect();
        assert_eq!(
            summary,
            vec![("carol", 5, 1), ("alice", 3, 2), ("bob", 3, 2), ("dave", 1, 4)]
        );
        assert_eq!(entries[0].display_name.as_deref(), Some("Carol"));
        assert_eq!(entries[1].total_predictions, 2);
        assert_eq!(entries[1].correct_predictions, 1);
    }

    #[tokio::test]
    async fn rebuild_replaces_entries_from_predictions() {
        let store = MemoryStore::new();
        seed_entries(&store, "season", 4).await;
        for (id, record) in [
            ("alice_m1_winner", answer("alice", 2, true)),
            ("bob_m1_winner", answer("bob", 0, false)),
        ] {
            store
                .set(
                    &document_path(prediction::COLLECTION, id),
                    to_fields(&record).unwrap(),
                )
                .await
                .unwrap();
        }

        let summary = rebuild_leaderboard(&store, "season").await.unwrap();
        assert_eq!(summary, RebuildSummary { removed: 4, written: 2 });

        let entries = list_entries(&store, "season").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_id, "alice");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(
            store.list(prediction::COLLECTION).await.unwrap().len(),
            2
        );

        let boards = list_leaderboards(&store).await.unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].entry_count, 2);
    }
}
