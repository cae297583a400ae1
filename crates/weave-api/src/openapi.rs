use axum::Json;
use utoipa::OpenApi;

use crate::extract::TurnRequestBody;
use crate::routes::{chat, health};

/// Paths are documented under `/api/conversation`; `/api/project` serves the same routes.
#[derive(OpenApi)]
#[openapi(
    info(title = "Weave API", description = "Chat and project generation pipelines"),
    paths(
        health::health_check,
        chat::start_chat,
        chat::continue_chat,
        chat::get_chat,
        chat::list_chats,
        chat::rename_chat,
        chat::delete_chat,
    ),
    components(schemas(
        TurnRequestBody,
        chat::MessageResponse,
        chat::ChatResponse,
        chat::ChatsResponse,
        chat::RenameRequest,
        chat::RenameResponse,
        health::HealthResponse,
    )),
    tags(
        (name = "chat", description = "Threads of one mode"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
