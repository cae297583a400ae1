use axum::extract::Json;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::oneshot;
use weave_llm::ToolCall;
use weave_tools::{FnTool, ToolError, ToolRegistry, ToolSpec, WebSearchTool};

fn echo_tool() -> Arc<dyn ToolSpec> {
    Arc::new(FnTool::new(
        "echo",
        "Echo the text argument",
        json!({"type": "object", "properties": {"text": {"type": "string"}}}),
        |args: Value| async move {
            args["text"]
                .as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| ToolError::invalid_arguments("echo", "missing text"))
        },
    ))
}

#[tokio::test]
async fn test_execute_known_tool() {
    let registry = ToolRegistry::new(vec![echo_tool()]);
    let call = ToolCall::new("c1", "echo", r#"{"text":"hello"}"#);

    assert_eq!(registry.execute(&call).await.unwrap(), "hello");
}

#[tokio::test]
async fn test_unknown_tool() {
    let registry = ToolRegistry::new(vec![echo_tool()]);
    let call = ToolCall::new("c1", "delete_everything", "{}");

    let err = registry.execute(&call).await.unwrap_err();
    assert!(matches!(err, ToolError::UnknownTool(ref name) if name == "delete_everything"));
}

#[tokio::test]
async fn test_malformed_arguments() {
    let registry = ToolRegistry::new(vec![echo_tool()]);
    let call = ToolCall::new("c1", "echo", "{not json");

    let err = registry.execute(&call).await.unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments { .. }));
}

#[test]
fn test_definitions_in_registration_order() {
    let other: Arc<dyn ToolSpec> = Arc::new(FnTool::new("zeta", "z", json!({}), |_| async {
        Ok("z".to_string())
    }));
    let registry = ToolRegistry::new(vec![other, echo_tool()]);

    let names: Vec<String> = registry.definitions().iter().map(|t| t.name().to_string()).collect();
    assert_eq!(names, vec!["zeta", "echo"]);
    assert_eq!(registry.len(), 2);
    assert!(ToolRegistry::empty().is_empty());
}

async fn mock_tavily(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(headers["authorization"], "Bearer tvly-test");
    assert_eq!(body["max_results"], 3);
    Json(json!({
        "query": body["query"],
        "results": [
            {"title": "One", "url": "https://one.example", "content": "first"},
            {"title": "Two", "url": "https://two.example", "content": "second"},
            {"title": "Three", "url": "https://three.example", "content": "third"},
            {"title": "Four", "url": "https://four.example", "content": "fourth"}
        ]
    }))
}

#[tokio::test]
async fn test_web_search_against_mock() {
    let (tx, rx) = oneshot::channel::<()>();
    let app = Router::new().route("/search", post(mock_tavily));
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

    let tool = WebSearchTool::new("tvly-test")
        .unwrap()
        .with_base_url(format!("http://{}", addr));

    let text = tool.execute(json!({"query": "rust"})).await.unwrap();
    assert!(text.contains("•Title: One"));
    assert!(text.contains("•Title: Three"));
    assert!(!text.contains("Four"));

    let err = tool.execute(json!({})).await.unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments { .. }));

    let _ = tx.send(());
}
