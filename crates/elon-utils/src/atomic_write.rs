//! Atomic file writes with cross-platform rename semantics.
//!
//! The Atomic Mutator and the Work Queue both need "write, then make
//! visible in one step" semantics so a crash never leaves a half-written
//! file behind. This is the single primitive both build on: write to a
//! temp sibling, fsync, rename into place.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

#[cfg(target_os = "windows")]
use std::{thread, time::Duration};

/// Outcome of an atomic write, surfaced so callers can log retries.
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    pub rename_retry_count: u32,
    pub used_cross_filesystem_fallback: bool,
}

/// Atomically write `content` to `path` via temp file + fsync + rename.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult::default();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent directory: {parent}"))?;
    }

    let temp_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut temp_file = NamedTempFile::new_in(temp_dir)
        .with_context(|| format!("failed to create temp file in: {temp_dir}"))?;

    temp_file
        .write_all(content.as_bytes())
        .context("failed to write temp file content")?;
    temp_file
        .as_file()
        .sync_all()
        .context("failed to fsync temp file")?;

    let temp_path = temp_file.path().to_path_buf();
    match atomic_rename(temp_file, path.as_std_path()) {
        Ok(retries) => result.rename_retry_count = retries,
        Err(e) if is_cross_filesystem_error(&e) => {
            result.used_cross_filesystem_fallback = true;
            cross_filesystem_copy(&temp_path, path)?;
        }
        Err(e) => return Err(e).with_context(|| format!("failed to atomically write: {path}")),
    }

    Ok(result)
}

/// Delete `path` if it exists; used to undo a `createFile` rollback.
pub fn remove_file_if_exists(path: &Utf8Path) -> Result<()> {
    match fs::remove_file(path.as_std_path()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove file: {path}")),
    }
}

#[cfg(target_os = "windows")]
fn atomic_rename(mut temp_file: NamedTempFile, target: &std::path::Path) -> Result<u32> {
    use std::io::ErrorKind;

    const MAX_RETRIES: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 10;
    const MAX_TOTAL_DELAY_MS: u64 = 250;

    let mut retry_count = 0;
    let mut total_delay_ms = 0;

    loop {
        match temp_file.persist(target) {
            Ok(_) => return Ok(retry_count),
            Err(persist_error) => {
                if retry_count >= MAX_RETRIES {
                    return Err(anyhow::anyhow!(persist_error.error));
                }
                let retryable = matches!(
                    persist_error.error.kind(),
                    ErrorKind::PermissionDenied | ErrorKind::Other
                );
                if !retryable {
                    return Err(anyhow::anyhow!(persist_error.error));
                }
                let delay_ms = INITIAL_DELAY_MS * 2_u64.pow(retry_count);
                if total_delay_ms + delay_ms > MAX_TOTAL_DELAY_MS {
                    let remaining = MAX_TOTAL_DELAY_MS.saturating_sub(total_delay_ms);
                    if remaining > 0 {
                        thread::sleep(Duration::from_millis(remaining));
                    }
                    return persist_error
                        .file
                        .persist(target)
                        .map(|_| retry_count + 1)
                        .map_err(|e| anyhow::anyhow!(e.error));
                }
                thread::sleep(Duration::from_millis(delay_ms));
                total_delay_ms += delay_ms;
                retry_count += 1;
                temp_file = persist_error.file;
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn atomic_rename(temp_file: NamedTempFile, target: &std::path::Path) -> Result<u32> {
    temp_file
        .persist(target)
        .map(|_| 0)
        .map_err(|e| anyhow::anyhow!(e.error))
}

#[cfg(unix)]
fn is_cross_filesystem_error(err: &anyhow::Error) -> bool {
    use std::io::ErrorKind;
    if let Some(io_error) = err.downcast_ref::<std::io::Error>() {
        if io_error.kind() != ErrorKind::Other {
            return false;
        }
        matches!(io_error.raw_os_error(), Some(18)) // EXDEV
    } else {
        false
    }
}

#[cfg(windows)]
fn is_cross_filesystem_error(_err: &anyhow::Error) -> bool {
    false
}

fn cross_filesystem_copy(temp_path: &std::path::Path, target: &Utf8Path) -> Result<()> {
    let content = fs::read(temp_path).context("failed to read temp file for cross-fs copy")?;
    let target_dir = target.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut target_temp = NamedTempFile::new_in(target_dir)
        .with_context(|| format!("failed to create temp file in target dir: {target_dir}"))?;
    target_temp
        .write_all(&content)
        .context("failed to write during cross-fs copy")?;
    target_temp
        .as_file()
        .sync_all()
        .context("failed to fsync during cross-fs copy")?;
    target_temp
        .persist(target.as_std_path())
        .map_err(|e| anyhow::anyhow!(e.error))
        .context("failed to persist during cross-fs copy")?;
    let _ = fs::remove_file(temp_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path_buf = dir.path().join("f.txt");
        let path = Utf8Path::from_path(&path_buf).unwrap();

        write_file_atomic(path, "one").unwrap();
        assert_eq!(fs::read_to_string(&path_buf).unwrap(), "one");

        write_file_atomic(path, "two").unwrap();
        assert_eq!(fs::read_to_string(&path_buf).unwrap(), "two");
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path_buf = dir.path().join("a").join("b").join("f.txt");
        let path = Utf8Path::from_path(&path_buf).unwrap();

        write_file_atomic(path, "nested").unwrap();
        assert_eq!(fs::read_to_string(&path_buf).unwrap(), "nested");
    }

    #[test]
    fn remove_if_exists_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path_buf = dir.path().join("gone.txt");
        let path = Utf8Path::from_path(&path_buf).unwrap();
        remove_file_if_exists(path).unwrap();
        fs::write(&path_buf, "x").unwrap();
        remove_file_if_exists(path).unwrap();
        assert!(!path_buf.exists());
    }
}
