use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::RuntimeConfig;
use super::tables::*;

impl Database {
    /// Load the runtime config. A missing record reads as the default.
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SETTINGS)?;

        match table.get(RUNTIME_CONFIG_KEY)? {
            Some(data) => Ok(rmp_serde::from_slice(data.value())?),
            None => Ok(RuntimeConfig::default()),
        }
    }

    /// Replace the stored runtime config
    pub fn save_runtime_config(&self, config: &RuntimeConfig) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTINGS)?;
            let data = rmp_serde::to_vec_named(config)?;
            table.insert(RUNTIME_CONFIG_KEY, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
