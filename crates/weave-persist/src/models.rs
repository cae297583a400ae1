use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weave_llm::Message;
use weave_types::{ChatMetadata, DEFAULT_CHAT_NAME};

/// Snapshot of a thread's full message list after one committed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub checkpoint_id: String,
    /// Logical timestamp in microseconds, strictly increasing per thread
    pub ts: i64,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(thread_id: impl Into<String>, messages: Vec<Message>, previous_ts: Option<i64>) -> Self {
        let created_at = Utc::now();
        Self {
            thread_id: thread_id.into(),
            checkpoint_id: uuid::Uuid::new_v4().to_string(),
            ts: next_ts(previous_ts, created_at.timestamp_micros()),
            messages,
            created_at,
        }
    }
}

/// `max(now, previous + 1)`
pub fn next_ts(previous: Option<i64>, now_micros: i64) -> i64 {
    match previous {
        Some(prev) => now_micros.max(prev + 1),
        None => now_micros,
    }
}

/// Newest checkpoint of one thread, as seen by the listing scan
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointHead {
    pub thread_id: String,
    pub ts: i64,
}

impl CheckpointHead {
    /// Wall-clock reading of the logical timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_micros(self.ts).single().unwrap_or_else(Utc::now)
    }
}

/// Rows removed by a thread deletion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub checkpoints: u64,
    pub metadata: u64,
}

/// Join checkpoint heads with metadata rows into the thread listing
///
/// Heads are deduplicated by max `ts` and rows by max `updated_at`. Threads
/// without a row are listed as `"New Chat"` stamped with their newest
/// checkpoint. Result is sorted by `updated_at` descending, ties by thread id.
pub fn merge_listing(heads: Vec<CheckpointHead>, rows: Vec<ChatMetadata>) -> Vec<ChatMetadata> {
    let mut latest_heads: HashMap<String, CheckpointHead> = HashMap::new();
    for head in heads {
        match latest_heads.get(&head.thread_id) {
            Some(existing) if existing.ts >= head.ts => {}
            _ => {
                latest_heads.insert(head.thread_id.clone(), head);
            }
        }
    }

    let mut merged: HashMap<String, ChatMetadata> = HashMap::new();
    for row in rows {
        match merged.get(&row.thread_id) {
            Some(existing) if existing.updated_at >= row.updated_at => {}
            _ => {
                merged.insert(row.thread_id.clone(), row);
            }
        }
    }

    for (thread_id, head) in latest_heads {
        merged.entry(thread_id).or_insert_with_key(|thread_id| {
            let at = head.timestamp();
            ChatMetadata {
                thread_id: thread_id.clone(),
                chat_name: DEFAULT_CHAT_NAME.to_string(),
                created_at: at,
                updated_at: at,
                message_count: 1,
            }
        });
    }

    let mut listing: Vec<ChatMetadata> = merged.into_values().collect();
    listing.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.thread_id.cmp(&b.thread_id))
    });
    listing
}
