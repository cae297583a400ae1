use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use weave_graph::GraphError;
use weave_persist::PersistError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing request fields; the message is shown as is
    #[error("{0}")]
    Validation(String),

    #[error("Chat not found")]
    ChatNotFound(String),

    /// Unknown model or missing provider credentials
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Graph(GraphError),

    #[error(transparent)]
    Persist(PersistError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Configuration(_) => StatusCode::BAD_REQUEST,
            Self::ChatNotFound(_) => StatusCode::NOT_FOUND,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Graph(_) | Self::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::Configuration(message) => Self::Configuration(message),
            GraphError::Store(store) => store.into(),
            other => Self::Graph(other),
        }
    }
}

impl From<PersistError> for ApiError {
    fn from(e: PersistError) -> Self {
        if e.is_unavailable() {
            Self::StoreUnavailable(e.to_string())
        } else {
            Self::Persist(e)
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::Validation(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "request failed");
        } else {
            tracing::debug!(status = %status, error = %message, "request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
