use weave_llm::{ChatResponse, Content, ContentBlock, Message, MessageKind, ToolCall};

#[test]
fn test_message_serializes_with_kind_tag() {
    let msg = Message::human("Hello");
    let json = serde_json::to_value(&msg).unwrap();

    assert_eq!(json["kind"], "Human");
    assert_eq!(json["content"], "Hello");
    assert!(json["id"].as_str().unwrap().starts_with("human_"));
}

#[test]
fn test_ai_message_survives_checkpoint_encoding() {
    let msg = Message::ai_with_tools("", vec![ToolCall::new("call_1", "web_search", "{}")]);
    let json = serde_json::to_string(&msg).unwrap();
    let back: Message = serde_json::from_str(&json).unwrap();

    assert_eq!(back, msg);
    assert_eq!(back.kind(), MessageKind::AIResponse);
    assert_eq!(back.tool_calls()[0].id, "call_1");
}

#[test]
fn test_block_content_encoding() {
    let content = Content::blocks(vec![
        ContentBlock::text("hi"),
        ContentBlock::image_url("data:image/png;base64,AAAA"),
        ContentBlock::file("a.csv", "--- Content of a.csv ---\nx,y"),
    ]);
    let json = serde_json::to_value(&content).unwrap();

    assert_eq!(json[0]["type"], "text");
    assert_eq!(json[1]["type"], "image_url");
    assert_eq!(json[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    assert_eq!(json[2]["type"], "file");
    assert_eq!(content.to_plain_text(), "hi\n\n--- Content of a.csv ---\nx,y");
}

#[test]
fn test_content_emptiness() {
    assert!(Content::text("").is_empty());
    assert!(Content::blocks(vec![ContentBlock::text("")]).is_empty());
    assert!(!Content::blocks(vec![ContentBlock::image_url("http://x/y.png")]).is_empty());
}

#[test]
fn test_tool_call_empty_arguments() {
    let call = ToolCall::new("c", "noop", "");
    assert_eq!(call.arguments_value().unwrap(), serde_json::json!({}));
}

#[test]
fn test_response_without_id_gets_local_id() {
    let response = ChatResponse {
        id: None,
        content: Some("ok".to_string()),
        tool_calls: None,
        usage: None,
        finish_reason: Some("stop".to_string()),
        model: None,
        raw: serde_json::Value::Null,
    };

    let message = response.into_message();
    assert!(message.id().starts_with("msg_"));
    assert_eq!(message.content().as_text(), Some("ok"));
    assert!(!message.has_tool_calls());
}
