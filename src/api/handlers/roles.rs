use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::{dispatch, unexpected_reply};
use crate::api::response::{ApiError, JSend};
use crate::api::session::Caller;
use crate::service::{Call, Reply};
use crate::storage::models::Role;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub identity: String,
    pub roles: Vec<Role>,
}

pub async fn list_all_roles(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<JSend<BTreeMap<String, Vec<Role>>>>, ApiError> {
    match dispatch(&state, &caller.identity, Call::ListAllUserRoles).await? {
        Reply::RoleMap(map) => Ok(JSend::success(map)),
        other => Err(unexpected_reply(other)),
    }
}

pub async fn roles_of(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(identity): Path<String>,
) -> Result<Json<JSend<RolesResponse>>, ApiError> {
    let call = Call::RolesOf {
        identity: identity.clone(),
    };
    roles_reply(dispatch(&state, &caller.identity, call).await?, identity)
}

pub async fn grant_role(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((identity, role)): Path<(String, String)>,
) -> Result<Json<JSend<RolesResponse>>, ApiError> {
    let call = Call::GrantRole {
        identity: identity.clone(),
        role: parse_role(&role)?,
    };
    roles_reply(dispatch(&state, &caller.identity, call).await?, identity)
}

pub async fn revoke_role(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((identity, role)): Path<(String, String)>,
) -> Result<Json<JSend<RolesResponse>>, ApiError> {
    let call = Call::RevokeRole {
        identity: identity.clone(),
        role: parse_role(&role)?,
    };
    roles_reply(dispatch(&state, &caller.identity, call).await?, identity)
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse::<Role>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

fn roles_reply(reply: Reply, identity: String) -> Result<Json<JSend<RolesResponse>>, ApiError> {
    match reply {
        Reply::Roles(roles) => Ok(JSend::success(RolesResponse { identity, roles })),
        other => Err(unexpected_reply(other)),
    }
}
