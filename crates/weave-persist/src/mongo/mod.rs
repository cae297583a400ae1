mod client;
mod models;

pub use client::{connect_client, MongoThreadStore};
pub use models::{MongoCheckpoint, MongoMetadata};
