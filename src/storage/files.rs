use bytes::Bytes;
use chrono::{DateTime, Utc};
use redb::ReadableTable;
use thiserror::Error;

use super::db::{Database, DatabaseError};
use super::models::{FileMeta, Identity, StoredFile};
use super::tables::*;

/// Failures of the file store contract.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file '{0}' not found")]
    NotFound(String),
    #[error("file id '{0}' already exists")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StoreError::Database(e.into())
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::Database(e.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        StoreError::Database(e.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        StoreError::Database(e.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        StoreError::Database(e.into())
    }
}

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Insert a new file. Assigns the upload sequence, timestamp, size and
    /// digest. Fails with `Conflict` if the id is taken.
    pub fn put_file(
        &self,
        id: &str,
        filename: &str,
        content_type: &str,
        content: &[u8],
        uploader: &Identity,
    ) -> Result<FileMeta, StoreError> {
        debug_assert!(!id.is_empty(), "file id must not be empty");

        let write_txn = self.begin_write()?;
        let meta = {
            let mut files = write_txn.open_table(FILES)?;
            if files.get(id)?.is_some() {
                return Err(StoreError::Conflict(id.to_string()));
            }

            let mut counters = write_txn.open_table(COUNTERS)?;
            let sequence = counters
                .get(FILE_SEQUENCE_KEY)?
                .map(|v| v.value())
                .unwrap_or(0)
                + 1;
            let last_micros = counters
                .get(LAST_UPLOAD_MICROS_KEY)?
                .map(|v| v.value())
                .unwrap_or(0);
            let uploaded_at = monotonic_timestamp(last_micros);

            let meta = FileMeta {
                id: id.to_string(),
                filename: filename.to_string(),
                content_type: content_type.to_string(),
                byte_size: content.len() as u64,
                sha256: sha256_hex(content),
                uploader: uploader.clone(),
                uploaded_at,
                sequence,
            };

            let data = rmp_serde::to_vec_named(&meta)?;
            files.insert(id, data.as_slice())?;

            let mut contents = write_txn.open_table(FILE_CONTENTS)?;
            contents.insert(id, content)?;

            let mut order = write_txn.open_table(FILE_ORDER)?;
            order.insert(sequence, id)?;

            counters.insert(FILE_SEQUENCE_KEY, sequence)?;
            counters.insert(
                LAST_UPLOAD_MICROS_KEY,
                uploaded_at.timestamp_micros().max(0) as u64,
            )?;

            meta
        };
        write_txn.commit()?;
        Ok(meta)
    }

    /// Get a file's metadata and content by id
    pub fn get_file(&self, id: &str) -> Result<StoredFile, StoreError> {
        let read_txn = self.begin_read()?;
        let files = read_txn.open_table(FILES)?;

        let meta: FileMeta = match files.get(id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Err(StoreError::NotFound(id.to_string())),
        };

        let contents = read_txn.open_table(FILE_CONTENTS)?;
        let content = match contents.get(id)? {
            Some(data) => Bytes::copy_from_slice(data.value()),
            None => Bytes::new(),
        };

        Ok(StoredFile { meta, content })
    }

    /// Get a file's metadata without loading its content
    pub fn get_file_meta(&self, id: &str) -> Result<Option<FileMeta>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// List file metadata in upload order
    pub fn list_files(&self) -> Result<Vec<FileMeta>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let order = read_txn.open_table(FILE_ORDER)?;
        let files_table = read_txn.open_table(FILES)?;

        let mut files = Vec::new();
        for result in order.iter()? {
            let (_, id) = result?;
            if let Some(data) = files_table.get(id.value())? {
                let file: FileMeta = rmp_serde::from_slice(data.value())?;
                files.push(file);
            }
        }

        Ok(files)
    }

    /// Delete a file and its content. Returns the removed metadata.
    pub fn delete_file(&self, id: &str) -> Result<FileMeta, StoreError> {
        let write_txn = self.begin_write()?;
        let meta = {
            let mut files = write_txn.open_table(FILES)?;
            let meta: FileMeta = match files.remove(id)? {
                Some(data) => rmp_serde::from_slice(data.value())?,
                None => return Err(StoreError::NotFound(id.to_string())),
            };

            let mut contents = write_txn.open_table(FILE_CONTENTS)?;
            contents.remove(id)?;

            let mut order = write_txn.open_table(FILE_ORDER)?;
            order.remove(meta.sequence)?;

            meta
        };
        write_txn.commit()?;
        Ok(meta)
    }

    /// Remove every file. Returns the number of files removed.
    pub fn clear_files(&self) -> Result<u64, DatabaseError> {
        let write_txn = self.begin_write()?;
        let mut removed = 0;

        {
            let table = write_txn.open_table(FILES)?;
            let keys: Vec<String> = table
                .iter()?
                .map(|r| r.map(|(k, _)| k.value().to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            drop(table);

            let mut table = write_txn.open_table(FILES)?;
            let mut contents = write_txn.open_table(FILE_CONTENTS)?;
            for key in keys {
                table.remove(key.as_str())?;
                contents.remove(key.as_str())?;
                removed += 1;
            }
        }

        // Clear upload order index
        {
            let table = write_txn.open_table(FILE_ORDER)?;
            let keys: Vec<u64> = table
                .iter()?
                .map(|r| r.map(|(k, _)| k.value()))
                .collect::<Result<Vec<_>, _>>()?;
            drop(table);

            let mut table = write_txn.open_table(FILE_ORDER)?;
            for key in keys {
                table.remove(key)?;
            }
        }

        write_txn.commit()?;
        Ok(removed)
    }
}

/// Current time, clamped so it never precedes the previous upload.
fn monotonic_timestamp(last_micros: u64) -> DateTime<Utc> {
    let now = Utc::now();
    if now.timestamp_micros() >= last_micros as i64 {
        return now;
    }
    DateTime::from_timestamp_micros(last_micros as i64).unwrap_or(now)
}

fn sha256_hex(content: &[u8]) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, content);
    digest.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}
