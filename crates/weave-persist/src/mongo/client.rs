use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use std::time::Duration;
use weave_llm::Message;
use weave_types::{ChatMetadata, MetadataPatch, DEFAULT_CHAT_NAME};

use super::models::{to_bson_datetime, MongoCheckpoint, MongoCheckpointHead, MongoMetadata};
use crate::error::Result;
use crate::models::{merge_listing, Checkpoint, CheckpointHead, DeleteReport};
use crate::store::ThreadStore;

/// Build the process-wide client and verify connectivity with `ping`
pub async fn connect_client(uri: &str, pool_size: u32, timeout_ms: u64) -> Result<Client> {
    let mut options = ClientOptions::parse(uri).await?;
    options.app_name = Some("weave".to_string());
    options.max_pool_size = Some(pool_size.max(1));
    options.server_selection_timeout = Some(Duration::from_millis(timeout_ms));
    options.connect_timeout = Some(Duration::from_millis(timeout_ms));

    let client = Client::with_options(options)?;
    client.database("admin").run_command(doc! { "ping": 1 }).await?;

    tracing::info!(pool_size, "connected to MongoDB");
    Ok(client)
}

/// MongoDB-backed store for one namespace (`user-chat`, `user-project`)
#[derive(Clone)]
pub struct MongoThreadStore {
    client: Client,
    checkpoints: Collection<MongoCheckpoint>,
    metadata: Collection<MongoMetadata>,
}

impl MongoThreadStore {
    /// Wrap a shared client; collections are `{namespace}-checkpoints` and `{namespace}-metadata`
    pub fn from_client(client: Client, database: &str, namespace: &str) -> Self {
        let db = client.database(database);
        Self {
            checkpoints: db.collection(&format!("{}-checkpoints", namespace)),
            metadata: db.collection(&format!("{}-metadata", namespace)),
            client,
        }
    }

    pub async fn connect(
        uri: &str,
        database: &str,
        namespace: &str,
        pool_size: u32,
        timeout_ms: u64,
    ) -> Result<Self> {
        let client = connect_client(uri, pool_size, timeout_ms).await?;
        let store = Self::from_client(client, database, namespace);
        store.ensure_indexes().await?;
        Ok(store)
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        self.checkpoints
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "thread_id": 1, "ts": -1 })
                    .build(),
            )
            .await?;

        self.metadata
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "thread_id": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "updated_at": -1 })
                    .build(),
            ])
            .await?;

        tracing::debug!(
            checkpoints = %self.checkpoints.name(),
            metadata = %self.metadata.name(),
            "indexes ensured"
        );
        Ok(())
    }

    async fn latest_ts(&self, thread_id: &str) -> Result<Option<i64>> {
        let head = self
            .checkpoints
            .clone_with_type::<Document>()
            .find_one(doc! { "thread_id": thread_id })
            .sort(doc! { "ts": -1 })
            .projection(doc! { "ts": 1 })
            .await?;
        Ok(head.and_then(|d| d.get_i64("ts").ok()))
    }
}

#[async_trait]
impl ThreadStore for MongoThreadStore {
    async fn load_latest_checkpoint(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let latest = self
            .checkpoints
            .find_one(doc! { "thread_id": thread_id })
            .sort(doc! { "ts": -1 })
            .await?;
        Ok(latest.map(Into::into))
    }

    async fn save_checkpoint(&self, thread_id: &str, messages: Vec<Message>) -> Result<Checkpoint> {
        let previous = self.latest_ts(thread_id).await?;
        let checkpoint = Checkpoint::new(thread_id, messages, previous);

        self.checkpoints
            .insert_one(MongoCheckpoint::from(checkpoint.clone()))
            .await?;

        tracing::debug!(thread_id = %thread_id, ts = checkpoint.ts, "checkpoint saved");
        Ok(checkpoint)
    }

    async fn upsert_metadata(&self, thread_id: &str, patch: MetadataPatch) -> Result<ChatMetadata> {
        let now = to_bson_datetime(Utc::now());

        let mut set_on_insert = doc! { "created_at": now };
        let mut set = doc! { "updated_at": now };
        match &patch.chat_name {
            Some(name) => {
                set.insert("chat_name", name.as_str());
            }
            None => {
                set_on_insert.insert("chat_name", DEFAULT_CHAT_NAME);
            }
        }
        let increment = i64::try_from(patch.message_count_increment).unwrap_or(i64::MAX);

        let updated = self
            .metadata
            .find_one_and_update(
                doc! { "thread_id": thread_id },
                doc! {
                    "$setOnInsert": set_on_insert,
                    "$set": set,
                    "$inc": { "message_count": increment },
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        match updated {
            Some(row) => Ok(row.into()),
            None => Err(crate::PersistError::Internal(format!(
                "metadata upsert returned no document for {}",
                thread_id
            ))),
        }
    }

    async fn get_metadata(&self, thread_id: &str) -> Result<Option<ChatMetadata>> {
        let row = self
            .metadata
            .find_one(doc! { "thread_id": thread_id })
            .await?;
        Ok(row.map(Into::into))
    }

    async fn rename_thread(&self, thread_id: &str, chat_name: &str) -> Result<Option<ChatMetadata>> {
        let has_row = self
            .metadata
            .count_documents(doc! { "thread_id": thread_id })
            .limit(1)
            .await?
            > 0;
        if !has_row && self.latest_ts(thread_id).await?.is_none() {
            return Ok(None);
        }

        let now = to_bson_datetime(Utc::now());
        let updated = self
            .metadata
            .find_one_and_update(
                doc! { "thread_id": thread_id },
                doc! {
                    "$setOnInsert": { "created_at": now, "message_count": 1_i64 },
                    "$set": { "chat_name": chat_name, "updated_at": now },
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        Ok(updated.map(Into::into))
    }

    async fn list_threads(&self) -> Result<Vec<ChatMetadata>> {
        let heads: Vec<CheckpointHead> = self
            .checkpoints
            .aggregate(vec![doc! {
                "$group": { "_id": "$thread_id", "ts": { "$max": "$ts" } }
            }])
            .with_type::<MongoCheckpointHead>()
            .await?
            .map_ok(|h| CheckpointHead {
                thread_id: h.thread_id,
                ts: h.ts,
            })
            .try_collect()
            .await?;

        let rows: Vec<ChatMetadata> = self
            .metadata
            .find(doc! {})
            .sort(doc! { "updated_at": -1 })
            .await?
            .map_ok(Into::into)
            .try_collect()
            .await?;

        Ok(merge_listing(heads, rows))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<DeleteReport> {
        let filter = doc! { "thread_id": thread_id };
        let checkpoints = self.checkpoints.delete_many(filter.clone()).await?.deleted_count;
        let metadata = self.metadata.delete_many(filter).await?.deleted_count;

        tracing::info!(thread_id = %thread_id, checkpoints, metadata, "thread deleted");
        Ok(DeleteReport { checkpoints, metadata })
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        tracing::info!("MongoDB client shut down");
        Ok(())
    }
}
