//! The request router and the components it dispatches to.
//!
//! Calls are handled one at a time: `dispatch` takes `&mut self`, runs
//! synchronously to completion and never suspends. Authorization is decided
//! once per call from the table in [`policy`].

mod config_store;
mod gate;
pub mod password;
pub mod policy;
mod registry;

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::CoreError;
use crate::storage::models::{
    ConfigPatch, FileMeta, Identity, Password, Role, RoleSet, RuntimeConfig, StoredFile,
};
use crate::storage::Database;

use config_store::ConfigStore;
use gate::UploadGate;
use policy::Operation;
use registry::Registry;

/// A call on the public operation surface.
#[derive(Debug, Clone)]
pub enum Call {
    ListFiles,
    UploadFile {
        filename: String,
        content_type: Option<String>,
        content: Bytes,
    },
    GetFile {
        id: String,
    },
    DeleteFile {
        id: String,
    },
    Register {
        name: String,
        password: Password,
    },
    Login {
        name: String,
        password: Password,
    },
    Logout,
    WhoAmI,
    RolesOf {
        identity: String,
    },
    GrantRole {
        identity: String,
        role: Role,
    },
    RevokeRole {
        identity: String,
        role: Role,
    },
    ListAllUserRoles,
    GetConfig,
    UpdateConfig(ConfigPatch),
    ResetConfig,
    WipeAll,
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::ListFiles => Operation::ListFiles,
            Call::UploadFile { .. } => Operation::UploadFile,
            Call::GetFile { .. } => Operation::GetFile,
            Call::DeleteFile { .. } => Operation::DeleteFile,
            Call::Register { .. } => Operation::Register,
            Call::Login { .. } => Operation::Login,
            Call::Logout => Operation::Logout,
            Call::WhoAmI => Operation::WhoAmI,
            Call::RolesOf { .. } => Operation::RolesOf,
            Call::GrantRole { .. } => Operation::GrantRole,
            Call::RevokeRole { .. } => Operation::RevokeRole,
            Call::ListAllUserRoles => Operation::ListAllUserRoles,
            Call::GetConfig => Operation::GetConfig,
            Call::UpdateConfig(_) => Operation::UpdateConfig,
            Call::ResetConfig => Operation::ResetConfig,
            Call::WipeAll => Operation::WipeAll,
        }
    }
}

/// Successful result of a call.
#[derive(Debug, Clone)]
pub enum Reply {
    Files(Vec<FileMeta>),
    File(FileMeta),
    Content(StoredFile),
    Deleted,
    Identity { identity: Identity, roles: Vec<Role> },
    LoggedOut,
    Roles(Vec<Role>),
    RoleMap(BTreeMap<String, Vec<Role>>),
    Config(RuntimeConfig),
    Wiped { files: u64 },
}

/// Owner of all service state: files, role assignments and runtime config.
pub struct Service {
    db: Database,
}

impl Service {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Seed `admin` as Admin, with `password`, if no Admin exists yet.
    pub fn bootstrap(&mut self, admin: &Identity, password: Option<&Password>) -> Result<(), CoreError> {
        Registry::new(&self.db).bootstrap(admin, password)
    }

    /// Check that `caller` may upload right now and return the current size
    /// limit, without touching the store. The transport calls this before it
    /// reads an upload body; `UploadFile` repeats every check.
    pub fn upload_allowance(&self, caller: &Identity) -> Result<u64, CoreError> {
        let roles = Registry::new(&self.db).roles_of(caller)?;
        policy::authorize(caller, &roles, Operation::UploadFile)?;
        UploadGate::new(&self.db).admit()
    }

    /// Authorize and execute one call on behalf of `caller`.
    pub fn dispatch(&mut self, caller: &Identity, call: Call) -> Result<Reply, CoreError> {
        let operation = call.operation();
        let registry = Registry::new(&self.db);
        let roles = registry.roles_of(caller)?;

        let result = policy::authorize(caller, &roles, operation)
            .and_then(|()| self.execute(caller, &roles, call));

        match &result {
            Ok(_) => tracing::debug!(caller = %caller, operation = %operation, "Call completed"),
            Err(e) => tracing::debug!(
                caller = %caller,
                operation = %operation,
                kind = ?e.kind(),
                error = %e,
                "Call failed"
            ),
        }
        result
    }

    fn execute(&self, caller: &Identity, roles: &RoleSet, call: Call) -> Result<Reply, CoreError> {
        let registry = Registry::new(&self.db);
        let config = ConfigStore::new(&self.db);
        let gate = UploadGate::new(&self.db);

        match call {
            Call::ListFiles => Ok(Reply::Files(self.db.list_files()?)),
            Call::UploadFile {
                filename,
                content_type,
                content,
            } => gate
                .handle_upload(caller, &filename, content_type.as_deref(), &content)
                .map(Reply::File),
            Call::GetFile { id } => Ok(Reply::Content(self.db.get_file(&id)?)),
            Call::DeleteFile { id } => gate.handle_delete(caller, roles, &id).map(|()| Reply::Deleted),
            Call::Register { name, password } => {
                let identity = Identity::new(name);
                let roles = registry.register(&identity, &password)?;
                Ok(identity_reply(identity, roles))
            }
            Call::Login { name, password } => {
                let identity = Identity::new(name);
                let roles = registry.login(&identity, &password)?;
                Ok(identity_reply(identity, roles))
            }
            Call::Logout => Ok(Reply::LoggedOut),
            Call::WhoAmI => Ok(identity_reply(caller.clone(), roles.clone())),
            Call::RolesOf { identity } => {
                let roles = registry.roles_of(&Identity::new(identity))?;
                Ok(Reply::Roles(roles.into_iter().collect()))
            }
            Call::GrantRole { identity, role } => {
                let roles = registry.grant(caller, &Identity::new(identity), role)?;
                Ok(Reply::Roles(roles.into_iter().collect()))
            }
            Call::RevokeRole { identity, role } => {
                let roles = registry.revoke(caller, &Identity::new(identity), role)?;
                Ok(Reply::Roles(roles.into_iter().collect()))
            }
            Call::ListAllUserRoles => Ok(Reply::RoleMap(registry.list_all()?)),
            Call::GetConfig => Ok(Reply::Config(config.get()?)),
            Call::UpdateConfig(patch) => {
                if patch.is_empty() {
                    return Err(CoreError::InvalidInput(
                        "at least one field (max_file_size, uploads_enabled, custom_domain) must be provided"
                            .to_string(),
                    ));
                }
                Ok(Reply::Config(config.update(patch)?))
            }
            Call::ResetConfig => Ok(Reply::Config(config.reset()?)),
            Call::WipeAll => {
                let files = self.db.clear_files()?;
                tracing::warn!(files, wiped_by = %caller, "Wiped all files");
                Ok(Reply::Wiped { files })
            }
        }
    }
}

fn identity_reply(identity: Identity, roles: RoleSet) -> Reply {
    Reply::Identity {
        identity,
        roles: roles.into_iter().collect(),
    }
}
