use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use super::{dispatch, unexpected_reply};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::api::session::Caller;
use crate::service::{Call, Reply};
use crate::storage::models::{ConfigPatch, RuntimeConfig};
use crate::AppState;

pub async fn get_config(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<JSend<RuntimeConfig>>, ApiError> {
    config_reply(dispatch(&state, &caller.identity, Call::GetConfig).await?)
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    AppJson(patch): AppJson<ConfigPatch>,
) -> Result<Json<JSend<RuntimeConfig>>, ApiError> {
    config_reply(dispatch(&state, &caller.identity, Call::UpdateConfig(patch)).await?)
}

pub async fn reset_config(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<JSend<RuntimeConfig>>, ApiError> {
    config_reply(dispatch(&state, &caller.identity, Call::ResetConfig).await?)
}

fn config_reply(reply: Reply) -> Result<Json<JSend<RuntimeConfig>>, ApiError> {
    match reply {
        Reply::Config(config) => Ok(JSend::success(config)),
        other => Err(unexpected_reply(other)),
    }
}
