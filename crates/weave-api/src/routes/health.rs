use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: BTreeMap<String, String>,
}

/// Health check endpoint
///
/// Reports each mode's store; the route itself always answers 200.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = BTreeMap::new();
    let mut healthy = true;

    for runtime in state.modes() {
        let status = match runtime.store().ping().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!(mode = %runtime.mode(), error = %e, "store ping failed");
                healthy = false;
                "disconnected"
            }
        };
        services.insert(format!("store:{}", runtime.mode().namespace()), status.to_string());
    }

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
