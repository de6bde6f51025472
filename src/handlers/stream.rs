use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use serde_json::Value;
use tokio::time::{Interval, MissedTickBehavior};

use crate::database::Document;
use crate::errors::{AppError, Result};
use crate::models::cricket_match::{self, Match, MatchView};
use crate::models::question;
use crate::services::subscription::{subscribe, Subscription};
use crate::state::AppState;

/// Server-sent snapshots of a public collection. The subscription lives inside
/// the response stream and is cancelled when the client disconnects.
///
/// Match windows depend on the clock as well as the stored documents, so the
/// payload is re-rendered on every poll tick and sent whenever it differs from
/// the last one delivered.
pub async fn stream_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    if collection != cricket_match::COLLECTION && collection != question::COLLECTION {
        return Err(AppError::not_found(format!("stream {}", collection)));
    }

    let mut ticker = tokio::time::interval(state.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let snapshots = SnapshotStream {
        subscription: subscribe(state.store.clone(), collection, state.poll_interval),
        ticker,
        documents: None,
        last_sent: None,
    };

    let events = stream::unfold(snapshots, |mut snapshots| async move {
        let payload = snapshots.next_payload().await?;
        let event = Event::default().event("snapshot").data(payload.to_string());
        Some((Ok(event), snapshots))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

struct SnapshotStream {
    subscription: Subscription,
    ticker: Interval,
    documents: Option<Vec<Document>>,
    last_sent: Option<Value>,
}

impl SnapshotStream {
    /// `None` once the subscription has ended.
    async fn next_payload(&mut self) -> Option<Value> {
        loop {
            tokio::select! {
                documents = self.subscription.next() => match documents {
                    Some(documents) => self.documents = Some(documents),
                    None => return None,
                },
                _ = self.ticker.tick() => {}
            }

            let Some(documents) = &self.documents else {
                continue;
            };
            let payload = snapshot_payload(self.subscription.collection(), documents, Utc::now());
            if self.last_sent.as_ref() != Some(&payload) {
                self.last_sent = Some(payload.clone());
                return Some(payload);
            }
        }
    }
}

/// Matches carry their prediction window as of `now`; questions lose the
/// correct option.
fn snapshot_payload(collection: &str, documents: &[Document], now: DateTime<Utc>) -> Value {
    let items: Vec<Value> = documents
        .iter()
        .filter_map(|doc| {
            if collection == cricket_match::COLLECTION {
                let game: Match = match doc.decode() {
                    Ok(game) => game,
                    Err(e) => {
                        tracing::warn!(path = %doc.path, error = %e, "skipping undecodable match");
                        return None;
                    }
                };
                serde_json::to_value(MatchView::at(game, now)).ok()
            } else {
                let mut fields = doc.fields.clone();
                fields.remove("correctOption");
                fields.insert("id".into(), Value::String(doc.id.clone()));
                Some(Value::Object(fields))
            }
        })
        .collect();
    Value::Array(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn match_snapshots_carry_window() {
        let fields = json!({
            "team1Id": "csk",
            "team2Id": "mi",
            "venue": "Chepauk",
            "startTime": (Utc::now() + chrono::Duration::hours(3)).to_rfc3339(),
            "status": "upcoming",
        })
        .as_object()
        .cloned()
        .unwrap();
        let documents = vec![Document::new("matches/m1", fields)];
        let now = Utc::now();
        let payload = snapshot_payload("matches", &documents, now);
        assert_eq!(payload[0]["id"], "m1");
        assert_eq!(payload[0]["predictionsOpen"], true);

        // Same documents, later clock: the window is recomputed.
        let later = snapshot_payload("matches", &documents, now + chrono::Duration::hours(4));
        assert_eq!(later[0]["predictionsOpen"], false);
        assert_eq!(later[0]["predictionWindow"], "closed");
    }

    #[test]
    fn question_snapshots_hide_answers() {
        let fields = json!({
            "matchId": "m1",
            "text": "Top scorer?",
            "options": ["A", "B"],
            "correctOption": "A",
        })
        .as_object()
        .cloned()
        .unwrap();
        let documents = vec![Document::new("questions/q1", fields)];

        let payload = snapshot_payload("questions", &documents, Utc::now());
        assert_eq!(payload[0]["id"], "q1");
        assert!(payload[0].get("correctOption").is_none());
        assert_eq!(payload[0]["text"], "Top scorer?");
    }
}
