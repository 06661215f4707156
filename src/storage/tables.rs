use redb::TableDefinition;

/// File metadata: uuid -> FileMeta (msgpack)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// File content: uuid -> raw bytes
pub const FILE_CONTENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("file_contents");

/// Upload order index: sequence -> uuid (for insertion-ordered listing)
pub const FILE_ORDER: TableDefinition<u64, &str> = TableDefinition::new("file_order");

/// Role assignments: identity -> msgpack Vec of roles
pub const USER_ROLES: TableDefinition<&str, &[u8]> = TableDefinition::new("user_roles");

/// Password verifiers: identity -> msgpack Credential
pub const CREDENTIALS: TableDefinition<&str, &[u8]> = TableDefinition::new("credentials");

/// Singleton records keyed by name (runtime config)
pub const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

/// Monotonic counters keyed by name
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

pub const RUNTIME_CONFIG_KEY: &str = "runtime_config";
pub const FILE_SEQUENCE_KEY: &str = "file_sequence";
pub const LAST_UPLOAD_MICROS_KEY: &str = "last_upload_micros";
