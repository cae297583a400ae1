use async_trait::async_trait;
use weave_types::{ChatMetadata, MetadataPatch};

use crate::error::Result;
use crate::models::{Checkpoint, DeleteReport};

/// Checkpoint and metadata persistence for one chat mode
///
/// Checkpoints are append-only; only the newest one per thread is read back.
/// Callers serialize writes per thread, cross-thread calls are independent.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Newest checkpoint of a thread, `None` for an unknown thread
    async fn load_latest_checkpoint(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Append a checkpoint holding the full message list
    async fn save_checkpoint(
        &self,
        thread_id: &str,
        messages: Vec<weave_llm::Message>,
    ) -> Result<Checkpoint>;

    /// Create the row on first call, otherwise bump `updated_at` and apply the patch
    async fn upsert_metadata(&self, thread_id: &str, patch: MetadataPatch) -> Result<ChatMetadata>;

    async fn get_metadata(&self, thread_id: &str) -> Result<Option<ChatMetadata>>;

    /// Set the chat name without touching `message_count`
    ///
    /// Returns `None` when the thread has neither metadata nor checkpoints.
    async fn rename_thread(&self, thread_id: &str, chat_name: &str) -> Result<Option<ChatMetadata>>;

    /// One entry per thread, most recently updated first
    async fn list_threads(&self) -> Result<Vec<ChatMetadata>>;

    /// Remove every checkpoint and the metadata row; deleting twice is fine
    async fn delete_thread(&self, thread_id: &str) -> Result<DeleteReport>;

    /// Connectivity check
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
