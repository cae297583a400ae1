use axum::extract::Json;
use axum::response::sse::{Event, KeepAlive};
use axum::response::{IntoResponse, Sse};
use axum::routing::post;
use axum::Router;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::sync::oneshot;
use weave_llm::{
    AnthropicBackend, ChatCompletionsBackend, ChatRequest, Message, ModelBackend, ModelId, StreamEvent,
};

async fn start_mock_server(app: Router) -> (SocketAddr, oneshot::Sender<()>) {
    let (tx, rx) = oneshot::channel::<()>();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                rx.await.ok();
            })
            .await
            .unwrap();
    });

    (addr, tx)
}

fn sse(events: Vec<String>) -> axum::response::Response {
    let stream = stream::iter(
        events
            .into_iter()
            .map(|data| Ok::<_, Infallible>(Event::default().data(data))),
    );
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

async fn mock_chat_completions(Json(payload): Json<Value>) -> axum::response::Response {
    if payload["stream"].as_bool().unwrap_or(false) {
        sse(vec![
            json!({"id":"chatcmpl-42","choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}).to_string(),
            json!({"id":"chatcmpl-42","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}).to_string(),
            json!({"id":"chatcmpl-42","choices":[{"index":0,"delta":{"content":" there"},"finish_reason":null}]}).to_string(),
            json!({"id":"chatcmpl-42","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}).to_string(),
            "[DONE]".to_string(),
        ])
    } else {
        Json(json!({
            "id": "chatcmpl-7",
            "model": payload["model"],
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "web_search", "arguments": "{\"query\":\"rust\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }))
        .into_response()
    }
}

async fn mock_messages(Json(payload): Json<Value>) -> axum::response::Response {
    if payload["stream"].as_bool().unwrap_or(false) {
        sse(vec![
            json!({"type":"message_start","message":{"id":"msg_abc","role":"assistant","content":[]}}).to_string(),
            json!({"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}).to_string(),
            json!({"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}).to_string(),
            json!({"type":"content_block_stop","index":0}).to_string(),
            json!({"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":1}}).to_string(),
            json!({"type":"message_stop"}).to_string(),
        ])
    } else {
        Json(json!({
            "id": "msg_abc",
            "model": payload["model"],
            "content": [{"type": "text", "text": format!("system was: {}", payload["system"].as_str().unwrap_or(""))}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 5, "output_tokens": 2}
        }))
        .into_response()
    }
}

async fn mock_failure() -> axum::response::Response {
    (axum::http::StatusCode::UNAUTHORIZED, "invalid api key").into_response()
}

#[tokio::test]
async fn test_openai_streaming_normalized() {
    let app = Router::new().route("/v1/chat/completions", post(mock_chat_completions));
    let (addr, shutdown) = start_mock_server(app).await;

    let backend = ChatCompletionsBackend::openai(ModelId::Gpt4oMini, "sk-test")
        .unwrap()
        .with_base_url(format!("http://{}/v1", addr));

    let events: Vec<StreamEvent> = backend
        .chat_stream(ChatRequest::new("gpt-4o-mini", vec![Message::human("hi")]))
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Start { id: "chatcmpl-42".to_string() },
            StreamEvent::Message { content: "Hello".to_string() },
            StreamEvent::Message { content: " there".to_string() },
            StreamEvent::Done { finish_reason: Some("stop".to_string()) },
        ]
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_openai_complete_with_tool_calls() {
    let app = Router::new().route("/v1/chat/completions", post(mock_chat_completions));
    let (addr, shutdown) = start_mock_server(app).await;

    let backend = ChatCompletionsBackend::openai(ModelId::Gpt4o, "sk-test")
        .unwrap()
        .with_base_url(format!("http://{}/v1", addr));

    let response = backend
        .chat(ChatRequest::new("gpt-4o", vec![Message::human("search rust")]))
        .await
        .unwrap();

    assert_eq!(response.id.as_deref(), Some("chatcmpl-7"));
    assert_eq!(response.usage.as_ref().unwrap().total_tokens, 15);

    let message = response.into_message();
    assert_eq!(message.id(), "chatcmpl-7");
    assert!(message.has_tool_calls());
    assert_eq!(message.tool_calls()[0].name(), "web_search");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_anthropic_streaming_normalized() {
    let app = Router::new().route("/v1/messages", post(mock_messages));
    let (addr, shutdown) = start_mock_server(app).await;

    let backend = AnthropicBackend::new(ModelId::Claude35Haiku, "test-key")
        .unwrap()
        .with_base_url(format!("http://{}/v1", addr));

    let events: Vec<StreamEvent> = backend
        .chat_stream(ChatRequest::new("claude", vec![Message::human("hi")]))
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Start { id: "msg_abc".to_string() },
            StreamEvent::Message { content: "Hi".to_string() },
            StreamEvent::Done { finish_reason: Some("end_turn".to_string()) },
        ]
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_anthropic_complete_sends_system_field() {
    let app = Router::new().route("/v1/messages", post(mock_messages));
    let (addr, shutdown) = start_mock_server(app).await;

    let backend = AnthropicBackend::new(ModelId::ClaudeSonnet4, "test-key")
        .unwrap()
        .with_base_url(format!("http://{}/v1", addr));

    let response = backend
        .chat(ChatRequest::new(
            "claude",
            vec![Message::system("be kind"), Message::human("hello")],
        ))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("system was: be kind"));
    assert_eq!(response.finish_reason.as_deref(), Some("end_turn"));

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_provider_error_keeps_cause() {
    let app = Router::new().route("/v1/chat/completions", post(mock_failure));
    let (addr, shutdown) = start_mock_server(app).await;

    let backend = ChatCompletionsBackend::openai(ModelId::Gpt4o, "sk-bad")
        .unwrap()
        .with_base_url(format!("http://{}/v1", addr));

    let err = backend
        .chat(ChatRequest::new("gpt-4o", vec![Message::human("hi")]))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("401"));
    assert!(text.contains("invalid api key"));

    let _ = shutdown.send(());
}
