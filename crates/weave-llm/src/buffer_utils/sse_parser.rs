use anyhow::Result;
use futures::StreamExt;
use reqwest::Response;

use super::buffering::CircularLineBuffer;
use crate::streaming::StreamEvent;
use crate::traits::EventStream;

/// Strategy for turning one SSE `data:` payload into stream events
pub trait SseLineParser: Send {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>>;

    /// Check if this payload signals end of stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// Payload of an SSE `data:` line; the space after the colon is optional
pub fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
}

/// Generic SSE stream parser
///
/// At most one `Done` event is yielded: a provider-level finish followed by a
/// `[DONE]` marker collapses into the first.
pub fn parse_sse_stream<P: SseLineParser + 'static>(response: Response, parser: P) -> EventStream {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = CircularLineBuffer::with_capacity(4096);
        let mut finished = false;

        'outer: while let Some(chunk_result) = byte_chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    break;
                }
            };
            buffer.extend(&bytes);

            while let Some(line_result) = buffer.next_line() {
                let line = match line_result {
                    Ok(line) => line,
                    Err(e) => {
                        yield Err(e);
                        continue;
                    }
                };

                let Some(data) = sse_data(&line) else {
                    continue;
                };

                if parser.is_done_marker(data) {
                    if !finished {
                        yield Ok(StreamEvent::Done { finish_reason: None });
                    }
                    break 'outer;
                }

                match parser.parse_data_line(data) {
                    Ok(events) => {
                        for event in events {
                            if event.is_done() {
                                if finished {
                                    continue;
                                }
                                finished = true;
                            }
                            yield Ok(event);
                        }
                    }
                    Err(e) => yield Err(e),
                }
            }
        }

        if !finished {
            if let Some(line) = buffer.take_remainder() {
                if let Some(data) = sse_data(&line) {
                    if !parser.is_done_marker(data) {
                        match parser.parse_data_line(data) {
                            Ok(events) => {
                                for event in events {
                                    yield Ok(event);
                                }
                            }
                            Err(e) => yield Err(e),
                        }
                    }
                }
            }
        }
    })
}
