//! Emulated streaming for backends that only return complete responses
//!
//! A compatibility shim: the finished reply is re-cut into word groups and
//! replayed with a fixed delay. Chunk content and order are deterministic,
//! elapsed time is not.

use std::time::Duration;
use weave_types::TurnEvent;

use crate::streaming::EventSink;

/// Split `text` into groups of `words_per_chunk` words
///
/// Whitespace is kept: each chunk owns the whitespace that follows its last
/// word, and leading whitespace belongs to the first chunk, so concatenating
/// the chunks reproduces `text` exactly.
pub fn split_chunks(text: &str, words_per_chunk: usize) -> Vec<String> {
    let words_per_chunk = words_per_chunk.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut words = 0;
    let mut in_word = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == words_per_chunk {
                chunks.push(std::mem::take(&mut current));
                words = 0;
            }
            words += 1;
            in_word = true;
        }
        current.push(ch);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkEmulator {
    words_per_chunk: usize,
    delay: Duration,
}

impl ChunkEmulator {
    pub fn new(words_per_chunk: usize, delay: Duration) -> Self {
        Self {
            words_per_chunk: words_per_chunk.max(1),
            delay,
        }
    }

    /// Replay `text` as chunk events tagged with `message_id`
    ///
    /// Stops as soon as the sink closes. Returns the number of chunks delivered.
    pub async fn play(&self, text: &str, message_id: &str, thread_id: &str, sink: &EventSink) -> usize {
        let mut delivered = 0;

        for (i, chunk) in split_chunks(text, self.words_per_chunk).into_iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if !sink.send(TurnEvent::chunk(chunk, message_id, thread_id)).await {
                tracing::debug!(delivered, "emulated stream stopped, consumer gone");
                break;
            }
            delivered += 1;
        }

        delivered
    }
}
