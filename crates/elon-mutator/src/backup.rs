//! Pre-mutation backups (§4.2): every `applyChange` and every file in an
//! `applyBatch` is backed up before being touched, so a failure anywhere
//! in a batch can restore exactly what was there before.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;

/// What a single backup recorded, so a rollback knows whether to
/// restore content or delete a file that didn't exist before.
#[derive(Debug, Clone)]
pub enum BackupEntry {
    /// The file existed before the mutation; its prior content is saved.
    Existing { path: Utf8PathBuf, content: String },
    /// The file did not exist before the mutation (this mutation created
    /// it); rollback means deleting it.
    Created { path: Utf8PathBuf },
}

impl BackupEntry {
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Existing { path, .. } | Self::Created { path } => path,
        }
    }

    /// Undo this entry's mutation: restore prior content, or remove the
    /// file this mutation created.
    pub fn restore(&self) -> anyhow::Result<()> {
        match self {
            Self::Existing { path, content } => {
                elon_utils::atomic_write::write_file_atomic(path, content)?;
            }
            Self::Created { path } => {
                elon_utils::atomic_write::remove_file_if_exists(path)?;
            }
        }
        Ok(())
    }
}

/// Snapshot `path` before mutating it. A missing file is recorded as
/// [`BackupEntry::Created`] so that if this mutation is the one that
/// creates it, rollback deletes it rather than trying to restore
/// nonexistent content.
pub fn snapshot(path: &Utf8Path) -> anyhow::Result<BackupEntry> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(BackupEntry::Existing {
            path: path.to_owned(),
            content,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BackupEntry::Created {
            path: path.to_owned(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Write a timestamped sibling backup file (for audit trail, distinct
/// from the in-memory [`BackupEntry`] used for rollback).
pub fn write_backup_file(path: &Utf8Path, content: &str) -> anyhow::Result<Utf8PathBuf> {
    let timestamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let backup_path = path.with_extension(format!(
        "{}.bak.{timestamp}",
        path.extension().unwrap_or("")
    ));
    elon_utils::atomic_write::write_file_atomic(&backup_path, content)?;
    Ok(backup_path)
}
