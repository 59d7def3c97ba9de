//! Engine Log persistence: rewritten atomically, guarded by a strict
//! (non-fail-open) resource lock — unlike the identity checksum file and
//! `known-errors.json`, a lost engine-log write would silently drop a
//! constraint's history, so contention here blocks rather than races.

use camino::{Utf8Path, Utf8PathBuf};
use elon_lock::ResourceLock;

use crate::constraint::EngineLog;

const ENGINE_LOG_RESOURCE: &str = "engine-log";
const ENGINE_LOG_FILE_NAME: &str = "engine-log.json";

pub fn load(data_dir: &Utf8Path) -> anyhow::Result<EngineLog> {
    let path = data_dir.join(ENGINE_LOG_FILE_NAME);
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EngineLog::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn save(data_dir: &Utf8Path, log: &EngineLog) -> anyhow::Result<()> {
    let locks_dir = data_dir.join("locks").into_std_path_buf();
    let lock = ResourceLock::acquire(&locks_dir, ENGINE_LOG_RESOURCE, None)?;

    let path: Utf8PathBuf = data_dir.join(ENGINE_LOG_FILE_NAME);
    let json = serde_json::to_string_pretty(log)?;
    elon_utils::atomic_write::write_file_atomic(&path, &json)?;

    lock.release()?;
    Ok(())
}
