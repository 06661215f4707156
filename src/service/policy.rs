//! The authorization table: the minimum role each operation requires.

use std::fmt;

use crate::error::CoreError;
use crate::storage::models::{Identity, Role, RoleSet};

/// Every operation the router dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListFiles,
    GetFile,
    UploadFile,
    DeleteFile,
    Register,
    Login,
    Logout,
    WhoAmI,
    RolesOf,
    GrantRole,
    RevokeRole,
    ListAllUserRoles,
    GetConfig,
    UpdateConfig,
    ResetConfig,
    WipeAll,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListFiles => "list_files",
            Operation::GetFile => "get_file",
            Operation::UploadFile => "upload_file",
            Operation::DeleteFile => "delete_file",
            Operation::Register => "register",
            Operation::Login => "login",
            Operation::Logout => "logout",
            Operation::WhoAmI => "whoami",
            Operation::RolesOf => "roles_of",
            Operation::GrantRole => "grant_role",
            Operation::RevokeRole => "revoke_role",
            Operation::ListAllUserRoles => "list_all_user_roles",
            Operation::GetConfig => "get_config",
            Operation::UpdateConfig => "update_config",
            Operation::ResetConfig => "reset_config",
            Operation::WipeAll => "wipe_all",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Minimum role for an operation, `None` when it is public.
///
/// Deleting another identity's file additionally requires Admin; the upload
/// gate decides that once it knows the file's uploader.
pub fn required_role(operation: Operation) -> Option<Role> {
    match operation {
        Operation::Register | Operation::Login | Operation::Logout | Operation::WhoAmI => None,
        Operation::ListFiles | Operation::GetFile | Operation::RolesOf | Operation::GetConfig => {
            Some(Role::Viewer)
        }
        Operation::UploadFile | Operation::DeleteFile => Some(Role::Publisher),
        Operation::GrantRole
        | Operation::RevokeRole
        | Operation::ListAllUserRoles
        | Operation::UpdateConfig
        | Operation::ResetConfig
        | Operation::WipeAll => Some(Role::Admin),
    }
}

/// True if any held role ranks at or above `required`.
pub fn satisfies(roles: &RoleSet, required: Role) -> bool {
    roles.iter().any(|role| *role >= required)
}

pub fn authorize(caller: &Identity, roles: &RoleSet, operation: Operation) -> Result<(), CoreError> {
    match required_role(operation) {
        Some(required) if !satisfies(roles, required) => Err(CoreError::Unauthorized(format!(
            "{operation} requires the {required} role ({caller} holds {})",
            describe(roles)
        ))),
        _ => Ok(()),
    }
}

fn describe(roles: &RoleSet) -> String {
    if roles.is_empty() {
        return "no roles".to_string();
    }
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
