use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{dispatch, unexpected_reply};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::api::session::Caller;
use crate::service::{Call, Reply};
use crate::storage::models::{Password, Role};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub name: String,
    pub password: Password,
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub identity: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub expires_at: String,
    pub identity: String,
    pub roles: Vec<Role>,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    AppJson(req): AppJson<CredentialsRequest>,
) -> Result<Json<JSend<IdentityResponse>>, ApiError> {
    let call = Call::Register {
        name: req.name.trim().to_string(),
        password: req.password,
    };
    match dispatch(&state, &caller.identity, call).await? {
        Reply::Identity { identity, roles } => Ok(JSend::success(IdentityResponse {
            identity: identity.to_string(),
            roles,
        })),
        other => Err(unexpected_reply(other)),
    }
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    AppJson(req): AppJson<CredentialsRequest>,
) -> Result<Json<JSend<LoginResponse>>, ApiError> {
    let call = Call::Login {
        name: req.name.trim().to_string(),
        password: req.password,
    };
    let (identity, roles) = match dispatch(&state, &caller.identity, call).await? {
        Reply::Identity { identity, roles } => (identity, roles),
        other => return Err(unexpected_reply(other)),
    };

    let (token, expires_at) = state.sessions.create(identity.clone()).await;
    tracing::debug!(identity = %identity, "Opened session");

    Ok(JSend::success(LoginResponse {
        expires_at: expires_at.to_rfc3339(),
        identity: identity.to_string(),
        roles,
        token,
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<JSend<LogoutResponse>>, ApiError> {
    match dispatch(&state, &caller.identity, Call::Logout).await? {
        Reply::LoggedOut => {}
        other => return Err(unexpected_reply(other)),
    }

    let logged_out = match caller.token {
        Some(ref token) => state.sessions.revoke(token).await,
        None => false,
    };
    if logged_out {
        tracing::debug!(identity = %caller.identity, "Closed session");
    }

    Ok(JSend::success(LogoutResponse { logged_out }))
}

pub async fn whoami(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<JSend<IdentityResponse>>, ApiError> {
    match dispatch(&state, &caller.identity, Call::WhoAmI).await? {
        Reply::Identity { identity, roles } => Ok(JSend::success(IdentityResponse {
            identity: identity.to_string(),
            roles,
        })),
        other => Err(unexpected_reply(other)),
    }
}
