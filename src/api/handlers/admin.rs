use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use super::{dispatch, unexpected_reply};
use crate::api::response::{ApiError, JSend};
use crate::api::session::Caller;
use crate::service::{Call, Reply};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct WipeResponse {
    pub files_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn wipe_all(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<JSend<WipeResponse>>, ApiError> {
    match dispatch(&state, &caller.identity, Call::WipeAll).await? {
        Reply::Wiped { files } => Ok(JSend::success(WipeResponse {
            files_deleted: files,
        })),
        other => Err(unexpected_reply(other)),
    }
}
