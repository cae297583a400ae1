use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use weave_llm::Message;
use weave_types::{ChatMetadata, MetadataPatch};

use crate::error::Result;
use crate::models::{merge_listing, Checkpoint, CheckpointHead, DeleteReport};
use crate::store::ThreadStore;

#[derive(Default)]
struct Tables {
    checkpoints: HashMap<String, Vec<Checkpoint>>,
    metadata: HashMap<String, ChatMetadata>,
}

/// Process-local store used by tests and by deployments without MongoDB
#[derive(Default)]
pub struct InMemoryThreadStore {
    tables: RwLock<Tables>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every checkpoint of a thread, oldest first
    pub async fn checkpoint_history(&self, thread_id: &str) -> Vec<Checkpoint> {
        self.tables
            .read()
            .await
            .checkpoints
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn load_latest_checkpoint(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let tables = self.tables.read().await;
        Ok(tables
            .checkpoints
            .get(thread_id)
            .and_then(|history| history.iter().max_by_key(|c| c.ts))
            .cloned())
    }

    async fn save_checkpoint(&self, thread_id: &str, messages: Vec<Message>) -> Result<Checkpoint> {
        let mut tables = self.tables.write().await;
        let history = tables.checkpoints.entry(thread_id.to_string()).or_default();
        let previous = history.iter().map(|c| c.ts).max();

        let checkpoint = Checkpoint::new(thread_id, messages, previous);
        history.push(checkpoint.clone());

        tracing::debug!(thread_id = %thread_id, ts = checkpoint.ts, "checkpoint saved");
        Ok(checkpoint)
    }

    async fn upsert_metadata(&self, thread_id: &str, patch: MetadataPatch) -> Result<ChatMetadata> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let row = tables
            .metadata
            .entry(thread_id.to_string())
            .or_insert_with(|| ChatMetadata::new(thread_id, now));
        row.apply(&patch, now);
        Ok(row.clone())
    }

    async fn get_metadata(&self, thread_id: &str) -> Result<Option<ChatMetadata>> {
        Ok(self.tables.read().await.metadata.get(thread_id).cloned())
    }

    async fn rename_thread(&self, thread_id: &str, chat_name: &str) -> Result<Option<ChatMetadata>> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;

        if !tables.metadata.contains_key(thread_id) {
            if !tables.checkpoints.contains_key(thread_id) {
                return Ok(None);
            }
            let mut row = ChatMetadata::new(thread_id, now);
            row.message_count = 1;
            tables.metadata.insert(thread_id.to_string(), row);
        }

        let Some(row) = tables.metadata.get_mut(thread_id) else {
            return Ok(None);
        };
        row.apply(&MetadataPatch::default().with_name(chat_name), now);
        Ok(Some(row.clone()))
    }

    async fn list_threads(&self) -> Result<Vec<ChatMetadata>> {
        let tables = self.tables.read().await;
        let heads = tables
            .checkpoints
            .iter()
            .flat_map(|(thread_id, history)| {
                history.iter().map(move |c| CheckpointHead {
                    thread_id: thread_id.clone(),
                    ts: c.ts,
                })
            })
            .collect();
        let rows = tables.metadata.values().cloned().collect();
        Ok(merge_listing(heads, rows))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<DeleteReport> {
        let mut tables = self.tables.write().await;
        let checkpoints = tables
            .checkpoints
            .remove(thread_id)
            .map(|history| history.len() as u64)
            .unwrap_or(0);
        let metadata = u64::from(tables.metadata.remove(thread_id).is_some());

        tracing::info!(thread_id = %thread_id, checkpoints, metadata, "thread deleted");
        Ok(DeleteReport { checkpoints, metadata })
    }
}
