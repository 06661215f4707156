use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default upload limit restored by a config reset (50 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Upper bound accepted for `max_file_size` (1 GB).
pub const MAX_FILE_SIZE_HARD_CAP: u64 = 1_000_000_000;

/// Opaque caller reference resolved by the transport before the core runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The identity of a caller without a session. It never holds roles.
    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Access roles, ranked Viewer < Publisher < Admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Viewer,
    Publisher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "Viewer",
            Role::Publisher => "Publisher",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role '{0}' (expected Viewer, Publisher or Admin)")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "publisher" => Ok(Role::Publisher),
            "admin" => Ok(Role::Admin),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

pub type RoleSet = BTreeSet<Role>;

/// A plaintext password as received from a caller. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Stored password verifier (PBKDF2-HMAC-SHA256).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub iterations: u32,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

/// Metadata of a stored file. Content is kept in its own table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub byte_size: u64,
    /// Hex-encoded SHA-256 of the content
    pub sha256: String,
    pub uploader: Identity,
    pub uploaded_at: DateTime<Utc>,
    pub sequence: u64,
}

/// A file record with its content, as returned by a get.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub meta: FileMeta,
    pub content: Bytes,
}

/// Mutable runtime policy. A single record owned by the config store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub max_file_size: u64,
    pub uploads_enabled: bool,
    #[serde(default)]
    pub custom_domain: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            uploads_enabled: true,
            custom_domain: None,
        }
    }
}

/// Partial update for [`RuntimeConfig`]. Unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub uploads_enabled: Option<bool>,
    #[serde(default)]
    pub custom_domain: Option<String>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        self.max_file_size.is_none()
            && self.uploads_enabled.is_none()
            && self.custom_domain.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("viewer".parse::<Role>().unwrap(), Role::Viewer);
        assert_eq!("Publisher".parse::<Role>().unwrap(), Role::Publisher);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn roles_are_ranked() {
        assert!(Role::Viewer < Role::Publisher);
        assert!(Role::Publisher < Role::Admin);
    }

    #[test]
    fn role_serializes_as_variant_name() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let password = Password::new("hunter2-hunter2");
        assert_eq!(format!("{password:?}"), "Password(***)");
        assert_eq!(password.expose(), "hunter2-hunter2");
    }

    #[test]
    fn identity_is_transparent_in_json() {
        let id = Identity::new("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
        assert!(Identity::anonymous().is_anonymous());
    }
}
