mod admin;
mod auth;
mod files;
mod roles;
mod settings;

use crate::api::response::ApiError;
use crate::service::{Call, Reply};
use crate::storage::models::Identity;
use crate::AppState;

pub use admin::{health, wipe_all};
pub use auth::{login, logout, register, whoami};
pub use files::{create_file, delete_file, get_file, list_files};
pub use roles::{grant_role, list_all_roles, revoke_role, roles_of};
pub use settings::{get_config, reset_config, update_config};

/// Run one call through the router, waiting for calls that arrived earlier.
async fn dispatch(state: &AppState, caller: &Identity, call: Call) -> Result<Reply, ApiError> {
    let mut service = state.service.lock().await;
    Ok(service.dispatch(caller, call)?)
}

fn unexpected_reply(reply: Reply) -> ApiError {
    tracing::error!(?reply, "Router returned an unexpected reply");
    ApiError::internal("Unexpected reply from router")
}
