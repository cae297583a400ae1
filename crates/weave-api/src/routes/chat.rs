use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, patch, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use utoipa::ToSchema;
use weave_llm::{Message, ModelId};
use weave_types::{ChatMetadata, Delivery, TurnEvent, TurnInput, DEFAULT_CHAT_NAME};

use crate::{
    error::{ApiError, ApiResult},
    extract::{TurnRequest, TurnRequestBody},
    state::ModeRuntime,
};

pub const MAX_CHAT_NAME_CHARS: usize = 100;

/// Routes of one mode, mounted under `/api/conversation` or `/api/project`
pub fn routes<S>(runtime: Arc<ModeRuntime>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/chat/start", post(start_chat))
        .route("/chat/continue", post(continue_chat))
        .route("/chat/:thread_id", get(get_chat).delete(delete_chat))
        .route("/chat/:thread_id/name", patch(rename_chat))
        .route("/chats", get(list_chats))
        .with_state(runtime)
}

/// Complete (non-streamed) assistant reply
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub thread_id: String,
    pub content: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub thread_id: String,
    pub chat_name: String,
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatsResponse {
    #[schema(value_type = Vec<Object>)]
    pub chats: Vec<ChatMetadata>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameRequest {
    #[serde(default)]
    pub chat_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RenameResponse {
    pub success: bool,
    pub thread_id: String,
    pub chat_name: String,
}

/// Start a new thread
#[utoipa::path(
    post,
    path = "/api/conversation/chat/start",
    request_body(content = TurnRequestBody, description = "JSON body or multipart form with `file` parts"),
    responses(
        (status = 200, description = "Complete message, or an event stream when streaming", body = MessageResponse),
        (status = 400, description = "Invalid message, file or model")
    ),
    tag = "chat"
)]
pub async fn start_chat(State(runtime): State<Arc<ModeRuntime>>, request: TurnRequest) -> ApiResult<Response> {
    if request.message.trim().is_empty() {
        return Err(ApiError::Validation("Valid message required".to_string()));
    }
    run_turn(runtime, request, None).await
}

/// Continue an existing thread
#[utoipa::path(
    post,
    path = "/api/conversation/chat/continue",
    request_body(content = TurnRequestBody, description = "JSON body or multipart form with `file` parts"),
    responses(
        (status = 200, description = "Complete message, or an event stream when streaming", body = MessageResponse),
        (status = 400, description = "Missing thread id, invalid message, file or model")
    ),
    tag = "chat"
)]
pub async fn continue_chat(State(runtime): State<Arc<ModeRuntime>>, request: TurnRequest) -> ApiResult<Response> {
    let thread_id = request
        .thread_id
        .clone()
        .filter(|t| !t.trim().is_empty() && !request.message.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("thread_id and valid message required".to_string()))?;
    run_turn(runtime, request, Some(thread_id)).await
}

async fn run_turn(runtime: Arc<ModeRuntime>, request: TurnRequest, thread_id: Option<String>) -> ApiResult<Response> {
    let model = request
        .model
        .as_deref()
        .map(str::parse::<ModelId>)
        .transpose()
        .map_err(|e| ApiError::Configuration(e.to_string()))?;

    // Missing credentials answer 400 before any stream opens
    let llm_config = runtime.llm_config(model);
    runtime.graph.check_model(llm_config.model)?;

    let delivery = Delivery::from_flag(request.stream.unwrap_or(runtime.mode().streams_by_default()));
    let message = runtime.composer.compose(&request.message, &request.attachments).await;

    let mut input = TurnInput::new(message, llm_config, delivery);
    if let Some(thread_id) = thread_id {
        input = input.with_thread(thread_id);
    }

    tracing::info!(
        mode = %runtime.mode(),
        thread_id = ?input.thread_id,
        model = %input.llm_config.model,
        attachments = request.attachments.len(),
        streaming = delivery == Delivery::Stream,
        "turn requested"
    );

    match delivery {
        Delivery::Stream => Ok(event_stream(runtime.graph.spawn_run(input)).into_response()),
        Delivery::Complete => {
            let outcome = runtime.graph.run(input).await?;
            Ok(Json(MessageResponse {
                id: outcome.message.id().to_string(),
                thread_id: outcome.thread_id,
                content: outcome.message.content().to_plain_text(),
                role: outcome.message.kind().as_str().to_string(),
                chat_name: outcome.chat_name,
            })
            .into_response())
        }
    }
}

/// Turn events as SSE `data:` lines; internal events are not forwarded
fn event_stream(
    receiver: tokio::sync::mpsc::Receiver<TurnEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = ReceiverStream::new(receiver)
        .filter(|event| futures::future::ready(event.is_client_visible()))
        .map(|event| {
            let sse = Event::default().json_data(&event).unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to encode turn event");
                Event::default().data(json!({ "type": "error", "error": e.to_string() }).to_string())
            });
            Ok::<Event, Infallible>(sse)
        });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Full message list of a thread
#[utoipa::path(
    get,
    path = "/api/conversation/chat/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread messages", body = ChatResponse),
        (status = 404, description = "Chat not found")
    ),
    tag = "chat"
)]
pub async fn get_chat(
    State(runtime): State<Arc<ModeRuntime>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ChatResponse>> {
    let checkpoint = runtime
        .store()
        .load_latest_checkpoint(&thread_id)
        .await?
        .ok_or_else(|| ApiError::ChatNotFound(thread_id.clone()))?;

    let chat_name = runtime
        .store()
        .get_metadata(&thread_id)
        .await?
        .map(|m| m.chat_name)
        .unwrap_or_else(|| DEFAULT_CHAT_NAME.to_string());

    let messages = checkpoint
        .messages
        .into_iter()
        .filter(|m| !matches!(m, Message::ToolResult { .. }) && !m.content().is_empty())
        .collect();

    Ok(Json(ChatResponse {
        thread_id,
        chat_name,
        messages,
    }))
}

/// Threads of this mode, most recently updated first
#[utoipa::path(
    get,
    path = "/api/conversation/chats",
    responses((status = 200, description = "Chat list", body = ChatsResponse)),
    tag = "chat"
)]
pub async fn list_chats(State(runtime): State<Arc<ModeRuntime>>) -> ApiResult<Json<ChatsResponse>> {
    let chats = runtime.store().list_threads().await?;
    Ok(Json(ChatsResponse { chats }))
}

#[utoipa::path(
    patch,
    path = "/api/conversation/chat/{thread_id}/name",
    params(("thread_id" = String, Path, description = "Thread ID")),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Chat renamed", body = RenameResponse),
        (status = 400, description = "Missing or too long name"),
        (status = 404, description = "Chat not found")
    ),
    tag = "chat"
)]
pub async fn rename_chat(
    State(runtime): State<Arc<ModeRuntime>>,
    Path(thread_id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> ApiResult<Json<RenameResponse>> {
    let chat_name = request.chat_name.trim();
    if chat_name.is_empty() {
        return Err(ApiError::Validation("Valid chat name required".to_string()));
    }
    if chat_name.chars().count() > MAX_CHAT_NAME_CHARS {
        return Err(ApiError::Validation("Chat name too long".to_string()));
    }

    let metadata = runtime
        .store()
        .rename_thread(&thread_id, chat_name)
        .await?
        .ok_or_else(|| ApiError::ChatNotFound(thread_id.clone()))?;

    Ok(Json(RenameResponse {
        success: true,
        thread_id,
        chat_name: metadata.chat_name,
    }))
}

/// Delete a thread and its metadata; deleting twice is not an error
#[utoipa::path(
    delete,
    path = "/api/conversation/chat/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread ID")),
    responses((status = 200, description = "Deleted row counts")),
    tag = "chat"
)]
pub async fn delete_chat(
    State(runtime): State<Arc<ModeRuntime>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let report = runtime.graph.delete_thread(&thread_id).await?;

    tracing::info!(
        mode = %runtime.mode(),
        thread_id = %thread_id,
        checkpoints = report.checkpoints,
        metadata = report.metadata,
        "chat deleted"
    );

    Ok(Json(json!({
        "success": true,
        "deleted": {
            "checkpoints": report.checkpoints,
            "metadata": report.metadata,
        }
    })))
}
