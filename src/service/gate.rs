//! The upload gate: every write to the file store passes through here.

use crate::error::CoreError;
use crate::storage::models::{FileMeta, Identity, Role, RoleSet};
use crate::storage::{Database, StoreError};

use super::config_store::ConfigStore;
use super::policy;

const MAX_FILENAME_LEN: usize = 255;
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub(crate) struct UploadGate<'a> {
    db: &'a Database,
}

impl<'a> UploadGate<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Current upload size limit, or `UploadsDisabled`
    pub fn admit(&self) -> Result<u64, CoreError> {
        let config = ConfigStore::new(self.db).get()?;
        if !config.uploads_enabled {
            return Err(CoreError::UploadsDisabled);
        }
        Ok(config.max_file_size)
    }

    /// Store a new file under a fresh id.
    ///
    /// The caller's role has already been checked against the authorization
    /// table by the router.
    pub fn handle_upload(
        &self,
        caller: &Identity,
        filename: &str,
        content_type: Option<&str>,
        content: &[u8],
    ) -> Result<FileMeta, CoreError> {
        let limit = self.admit()?;

        let size = content.len() as u64;
        if size > limit {
            return Err(CoreError::QuotaExceeded { size, limit });
        }

        validate_filename(filename)?;
        let content_type = resolve_content_type(filename, content_type);

        let id = uuid::Uuid::new_v4().to_string();
        let meta = self
            .db
            .put_file(&id, filename, &content_type, content, caller)
            .map_err(|e| match e {
                StoreError::Conflict(id) => {
                    CoreError::InvalidInput(format!("generated file id '{id}' collided"))
                }
                other => other.into(),
            })?;

        tracing::debug!(file_id = %id, uploader = %caller, byte_size = size, "Stored file");
        Ok(meta)
    }

    /// Delete a file if the caller uploaded it or holds Admin
    pub fn handle_delete(&self, caller: &Identity, roles: &RoleSet, id: &str) -> Result<(), CoreError> {
        let meta = self
            .db
            .get_file_meta(id)?
            .ok_or_else(|| CoreError::NotFound(format!("file '{id}' not found")))?;

        if meta.uploader != *caller && !policy::satisfies(roles, Role::Admin) {
            return Err(CoreError::Unauthorized(format!(
                "only the uploader or an Admin may delete file '{id}'"
            )));
        }

        self.db.delete_file(id)?;
        tracing::debug!(file_id = %id, deleted_by = %caller, "Deleted file");
        Ok(())
    }
}

fn validate_filename(filename: &str) -> Result<(), CoreError> {
    if filename.trim().is_empty() {
        return Err(CoreError::InvalidInput("filename must not be empty".to_string()));
    }
    if filename.len() > MAX_FILENAME_LEN {
        return Err(CoreError::InvalidInput(format!(
            "filename must be at most {MAX_FILENAME_LEN} bytes"
        )));
    }
    if filename
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(CoreError::InvalidInput(
            "filename must not contain path separators or control characters".to_string(),
        ));
    }
    Ok(())
}

/// Caller's content type, else a guess from the extension, else octet-stream.
fn resolve_content_type(filename: &str, content_type: Option<&str>) -> String {
    content_type
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && *ct != FALLBACK_CONTENT_TYPE)
        .map(|ct| ct.to_string())
        .or_else(|| mime_guess::from_path(filename).first().map(|m| m.to_string()))
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}
