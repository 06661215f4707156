use crate::error::CoreError;
use crate::storage::models::{ConfigPatch, RuntimeConfig, MAX_FILE_SIZE_HARD_CAP};
use crate::storage::Database;

const MAX_DOMAIN_LEN: usize = 253;

/// Holder of the runtime policy singleton.
pub(crate) struct ConfigStore<'a> {
    db: &'a Database,
}

impl<'a> ConfigStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self) -> Result<RuntimeConfig, CoreError> {
        Ok(self.db.load_runtime_config()?)
    }

    /// Apply the provided fields, leaving the rest untouched
    pub fn update(&self, patch: ConfigPatch) -> Result<RuntimeConfig, CoreError> {
        validate_patch(&patch)?;

        let mut config = self.db.load_runtime_config()?;
        if let Some(size) = patch.max_file_size {
            config.max_file_size = size;
        }
        if let Some(enabled) = patch.uploads_enabled {
            config.uploads_enabled = enabled;
        }
        if let Some(domain) = patch.custom_domain {
            config.custom_domain = Some(domain);
        }
        self.db.save_runtime_config(&config)?;

        tracing::info!(
            max_file_size = config.max_file_size,
            uploads_enabled = config.uploads_enabled,
            custom_domain = ?config.custom_domain,
            "Updated runtime config"
        );
        Ok(config)
    }

    pub fn reset(&self) -> Result<RuntimeConfig, CoreError> {
        let config = RuntimeConfig::default();
        self.db.save_runtime_config(&config)?;

        tracing::info!("Reset runtime config to defaults");
        Ok(config)
    }
}

fn validate_patch(patch: &ConfigPatch) -> Result<(), CoreError> {
    if let Some(size) = patch.max_file_size {
        if size == 0 {
            return Err(CoreError::InvalidInput(
                "max_file_size must be greater than 0".to_string(),
            ));
        }
        if size > MAX_FILE_SIZE_HARD_CAP {
            return Err(CoreError::InvalidInput(format!(
                "max_file_size must not exceed {MAX_FILE_SIZE_HARD_CAP} bytes"
            )));
        }
    }
    if let Some(ref domain) = patch.custom_domain {
        if !is_valid_domain(domain) {
            return Err(CoreError::InvalidInput(format!(
                "'{domain}' is not a valid domain name"
            )));
        }
    }
    Ok(())
}

fn is_valid_domain(domain: &str) -> bool {
    let valid_chars = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    valid_chars
        && domain.len() <= MAX_DOMAIN_LEN
        && domain.contains('.')
        && !domain.starts_with(&['-', '.'][..])
        && !domain.ends_with(&['-', '.'][..])
}
