use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name shown for threads that have not been named yet
pub const DEFAULT_CHAT_NAME: &str = "New Chat";

/// Listing row for one thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMetadata {
    pub thread_id: String,
    pub chat_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u64,
}

impl ChatMetadata {
    /// Row for a thread first seen at `at`
    pub fn new(thread_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            thread_id: thread_id.into(),
            chat_name: DEFAULT_CHAT_NAME.to_string(),
            created_at: at,
            updated_at: at,
            message_count: 0,
        }
    }

    /// Apply an upsert patch: name if given, bump `updated_at`, add to the count
    pub fn apply(&mut self, patch: &MetadataPatch, at: DateTime<Utc>) {
        if let Some(name) = &patch.chat_name {
            self.chat_name = name.clone();
        }
        self.updated_at = at;
        self.message_count += patch.message_count_increment;
    }
}

/// Partial update for [`ChatMetadata`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataPatch {
    pub chat_name: Option<String>,
    pub message_count_increment: u64,
}

impl MetadataPatch {
    /// Patch recorded after a committed turn
    pub fn turn() -> Self {
        Self {
            chat_name: None,
            message_count_increment: 1,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.chat_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_apply_patch() {
        let t0 = Utc::now();
        let mut meta = ChatMetadata::new("t1", t0);
        assert_eq!(meta.chat_name, DEFAULT_CHAT_NAME);

        let t1 = t0 + Duration::seconds(5);
        meta.apply(&MetadataPatch::turn(), t1);
        assert_eq!(meta.message_count, 1);
        assert_eq!(meta.updated_at, t1);
        assert_eq!(meta.created_at, t0);
        assert_eq!(meta.chat_name, DEFAULT_CHAT_NAME);

        meta.apply(&MetadataPatch::default().with_name("Rust Questions"), t1);
        assert_eq!(meta.chat_name, "Rust Questions");
        assert_eq!(meta.message_count, 1);
    }
}
