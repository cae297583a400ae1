use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use weave_input::{is_supported_mime, Attachment, MAX_ATTACHMENTS, MAX_ATTACHMENT_BYTES};

use crate::error::ApiError;

pub const UNSUPPORTED_FILE: &str = "Only image, PDF, Word, CSV, TXT, JSON files are supported";
pub const TOO_MANY_FILES: &str = "Too many files";
pub const FILE_TOO_LARGE: &str = "File too large";

/// JSON form of a start/continue request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TurnRequestBody {
    #[serde(default)]
    pub message: String,
    pub thread_id: Option<String>,
    /// Model identifier, e.g. `gpt-4o-mini`
    pub model: Option<String>,
    /// Overrides the mode's default delivery
    pub stream: Option<bool>,
}

/// Start/continue request, from JSON or `multipart/form-data`
///
/// Multipart fields: `message`, `thread_id`, `model`, `stream` and up to
/// five `file` parts.
#[derive(Debug, Default)]
pub struct TurnRequest {
    pub message: String,
    pub thread_id: Option<String>,
    pub model: Option<String>,
    pub stream: Option<bool>,
    pub attachments: Vec<Attachment>,
}

impl From<TurnRequestBody> for TurnRequest {
    fn from(body: TurnRequestBody) -> Self {
        Self {
            message: body.message,
            thread_id: body.thread_id,
            model: body.model,
            stream: body.stream,
            attachments: Vec::new(),
        }
    }
}

impl TurnRequest {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut request = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" | "files" => {
                    if request.attachments.len() >= MAX_ATTACHMENTS {
                        return Err(ApiError::Validation(TOO_MANY_FILES.to_string()));
                    }
                    let mime_type = field.content_type().unwrap_or_default().to_string();
                    if !is_supported_mime(&mime_type) {
                        return Err(ApiError::Validation(UNSUPPORTED_FILE.to_string()));
                    }
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await?;
                    if data.len() > MAX_ATTACHMENT_BYTES {
                        return Err(ApiError::Validation(FILE_TOO_LARGE.to_string()));
                    }
                    request.attachments.push(Attachment::new(filename, mime_type, data.to_vec()));
                }
                "message" => request.message = field.text().await?,
                "thread_id" => request.thread_id = Some(field.text().await?).filter(|t| !t.trim().is_empty()),
                "model" => request.model = Some(field.text().await?).filter(|m| !m.trim().is_empty()),
                "stream" => request.stream = parse_flag(&field.text().await?),
                other => tracing::debug!(field = %other, "ignoring unknown form field"),
            }
        }

        Ok(request)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[async_trait]
impl<S> FromRequest<S> for TurnRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else {
            let Json(body) = Json::<TurnRequestBody>::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            Ok(body.into())
        }
    }
}
