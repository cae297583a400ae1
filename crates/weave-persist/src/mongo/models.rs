use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use weave_llm::Message;
use weave_types::ChatMetadata;

use crate::models::Checkpoint;

/// Checkpoint document in `{namespace}-checkpoints`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCheckpoint {
    pub thread_id: String,
    pub checkpoint_id: String,
    pub ts: i64,
    pub messages: Vec<Message>,
    pub created_at: bson::DateTime,
}

/// Metadata document in `{namespace}-metadata`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMetadata {
    pub thread_id: String,
    pub chat_name: String,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
    #[serde(default)]
    pub message_count: i64,
}

/// Row of the `$group` stage used for listing
#[derive(Debug, Clone, Deserialize)]
pub struct MongoCheckpointHead {
    #[serde(rename = "_id")]
    pub thread_id: String,
    pub ts: i64,
}

pub fn to_bson_datetime(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

pub fn from_bson_datetime(at: bson::DateTime) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(at.timestamp_millis())
        .single()
        .unwrap_or_else(Utc::now)
}

impl From<Checkpoint> for MongoCheckpoint {
    fn from(c: Checkpoint) -> Self {
        Self {
            thread_id: c.thread_id,
            checkpoint_id: c.checkpoint_id,
            ts: c.ts,
            messages: c.messages,
            created_at: to_bson_datetime(c.created_at),
        }
    }
}

impl From<MongoCheckpoint> for Checkpoint {
    fn from(c: MongoCheckpoint) -> Self {
        Self {
            thread_id: c.thread_id,
            checkpoint_id: c.checkpoint_id,
            ts: c.ts,
            messages: c.messages,
            created_at: from_bson_datetime(c.created_at),
        }
    }
}

impl From<MongoMetadata> for ChatMetadata {
    fn from(m: MongoMetadata) -> Self {
        Self {
            thread_id: m.thread_id,
            chat_name: m.chat_name,
            created_at: from_bson_datetime(m.created_at),
            updated_at: from_bson_datetime(m.updated_at),
            message_count: m.message_count.max(0) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_millis_precision() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).single().unwrap();
        assert_eq!(from_bson_datetime(to_bson_datetime(at)), at);
    }

    #[test]
    fn test_negative_count_clamped() {
        let now = bson::DateTime::now();
        let meta: ChatMetadata = MongoMetadata {
            thread_id: "t".into(),
            chat_name: "x".into(),
            created_at: now,
            updated_at: now,
            message_count: -3,
        }
        .into();
        assert_eq!(meta.message_count, 0);
    }
}
