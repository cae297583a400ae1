//! Thread & metadata persistence for Weave
//!
//! [`ThreadStore`] is the contract the conversation graph depends on. The
//! in-memory implementation is always available; the MongoDB one is behind the
//! `mongodb` feature.

pub mod error;
pub mod memory;
pub mod models;
pub mod store;

#[cfg(feature = "mongodb")]
pub mod mongo;

pub use error::{PersistError, Result};
pub use memory::InMemoryThreadStore;
pub use models::{merge_listing, next_ts, Checkpoint, CheckpointHead, DeleteReport};
pub use store::ThreadStore;

#[cfg(feature = "mongodb")]
pub use mongo::{connect_client, MongoThreadStore};
