//! Change subscriptions over a document collection.
//!
//! A [`Subscription`] owns the polling task. Dropping it, or calling
//! [`Subscription::unsubscribe`], stops the task, so every exit path tears the
//! listener down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::database::{Document, DocumentStore};

const SNAPSHOT_BUFFER: usize = 8;

pub struct Subscription {
    collection: String,
    receiver: mpsc::Receiver<Vec<Document>>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Next snapshot of the collection. The first snapshot is delivered right
    /// away; later ones only when something changed. `None` once the
    /// subscription has ended.
    pub async fn next(&mut self) -> Option<Vec<Document>> {
        self.receiver.recv().await
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!(collection = %self.collection, "unsubscribed");
    }
}

pub fn subscribe(
    store: Arc<dyn DocumentStore>,
    collection: impl Into<String>,
    interval: Duration,
) -> Subscription {
    let collection = collection.into();
    let (sender, receiver) = mpsc::channel(SNAPSHOT_BUFFER);
    let task = tokio::spawn(poll_collection(store, collection.clone(), interval, sender));
    tracing::debug!(%collection, ?interval, "subscribed");

    Subscription {
        collection,
        receiver,
        task,
    }
}

async fn poll_collection(
    store: Arc<dyn DocumentStore>,
    collection: String,
    interval: Duration,
    sender: mpsc::Sender<Vec<Document>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last: Option<Vec<Document>> = None;

    loop {
        ticker.tick().await;
        let mut snapshot = match store.list(&collection).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!(%collection, error = %e, "subscription poll failed");
                continue;
            }
        };
        snapshot.sort_by(|a, b| a.path.cmp(&b.path));

        if last.as_ref() == Some(&snapshot) {
            continue;
        }
        if sender.send(snapshot.clone()).await.is_err() {
            break;
        }
        last = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn delivers_initial_and_changed_snapshots() {
        let store = MemoryStore::new();
        let fields = json!({ "text": "Who wins the toss?" }).as_object().cloned().unwrap();
        store.set("questions/q1", fields.clone()).await.unwrap();

        let mut subscription = subscribe(
            Arc::new(store.clone()),
            "questions",
            Duration::from_millis(10),
        );
        assert_eq!(subscription.collection(), "questions");

        let first = subscription.next().await.unwrap();
        assert_eq!(first.len(), 1);

        store.set("questions/q2", fields).await.unwrap();
        let second = subscription.next().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].id, "q2");

        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_polling() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let subscription = subscribe(store.clone(), "matches", Duration::from_millis(5));
        // The task holds one clone of the store while it runs.
        assert!(Arc::strong_count(&store) >= 2);

        drop(subscription);
        for _ in 0..100 {
            if Arc::strong_count(&store) == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("polling task kept running after unsubscribe");
    }
}
