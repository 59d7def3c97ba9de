//! Identity integrity: checksum-pinning the governance documents (§4.1
//! "Identity integrity", §3 "Identity Checksum Map").
//!
//! Every mutating operation is gated on `verify()` returning valid. A
//! mismatch is a critical event: it halts the Scheduler until an
//! operator explicitly re-pins via `acknowledge()`.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::path_policy::IDENTITY_FILES;

const CHECKSUM_RESOURCE: &str = "identity-checksums";
const CHECKSUM_FILE_NAME: &str = "identity-checksums.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentityChecksumMap {
    /// filename -> hex-encoded SHA-256 digest
    pub checksums: BTreeMap<String, String>,
}

/// A single detected mismatch between the pinned and current checksum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecksumChange {
    pub file: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    pub changes: Vec<ChecksumChange>,
}

pub struct IdentityGuard {
    repo_root: PathBuf,
    map: IdentityChecksumMap,
}

impl IdentityGuard {
    /// Compute and pin the checksum for every identity file present in
    /// `repo_root`. Files that don't exist are simply absent from the
    /// map (a later `verify()` correctly flags their appearance as a
    /// mismatch, since "not present" hashes to nothing).
    #[must_use]
    pub fn initialize(repo_root: &Path) -> Self {
        let mut checksums = BTreeMap::new();
        for file in IDENTITY_FILES {
            if let Ok(content) = std::fs::read(repo_root.join(file)) {
                checksums.insert((*file).to_string(), hex_sha256(&content));
            }
        }
        Self {
            repo_root: repo_root.to_path_buf(),
            map: IdentityChecksumMap { checksums },
        }
    }

    /// Load a previously pinned map, or initialize a fresh one if none
    /// exists on disk yet — mirrors "produced at first run" in §3.
    pub fn load_or_initialize(repo_root: &Path, pinned: Option<IdentityChecksumMap>) -> Self {
        match pinned {
            Some(map) => Self {
                repo_root: repo_root.to_path_buf(),
                map,
            },
            None => Self::initialize(repo_root),
        }
    }

    #[must_use]
    pub fn checksum_map(&self) -> &IdentityChecksumMap {
        &self.map
    }

    /// Re-hash every identity file and compare with the pinned map.
    #[must_use]
    pub fn verify(&self) -> VerifyResult {
        let mut changes = Vec::new();
        for file in IDENTITY_FILES {
            let expected = self.map.checksums.get(*file).cloned();
            let actual = std::fs::read(self.repo_root.join(file))
                .ok()
                .map(|bytes| hex_sha256(&bytes));

            match (expected, actual) {
                (Some(e), Some(a)) if e != a => changes.push(ChecksumChange {
                    file: (*file).to_string(),
                    expected: e,
                    actual: a,
                }),
                (Some(e), None) => changes.push(ChecksumChange {
                    file: (*file).to_string(),
                    expected: e,
                    actual: "<missing>".to_string(),
                }),
                (None, Some(a)) => changes.push(ChecksumChange {
                    file: (*file).to_string(),
                    expected: "<unpinned>".to_string(),
                    actual: a,
                }),
                _ => {}
            }
        }
        VerifyResult {
            valid: changes.is_empty(),
            changes,
        }
    }

    /// Explicitly re-pin the checksum map to the current on-disk state.
    /// Only ever called by an operator action, never automatically.
    pub fn acknowledge(&mut self) {
        *self = Self::initialize(&self.repo_root);
    }

    /// Persist the checksum map under `data_dir`, guarded by the
    /// identity-checksum resource lock. Fails open: a lock held by a
    /// dead or slow process must never block the whole loop on writing
    /// a file that's rewritten wholesale, not appended to (§5, §9).
    pub fn persist(&self, data_dir: &Path) -> anyhow::Result<()> {
        let locks_dir = data_dir.join("locks");
        let target = data_dir.join(CHECKSUM_FILE_NAME);
        let json = serde_json::to_string_pretty(&self.map)?;
        let target_utf8 = Utf8Path::from_path(&target)
            .ok_or_else(|| anyhow::anyhow!("checksum path is not valid UTF-8"))?
            .to_owned();

        elon_lock::with_fail_open_lock(&locks_dir, CHECKSUM_RESOURCE, || {
            elon_utils::atomic_write::write_file_atomic(&target_utf8, &json)
        })?;
        Ok(())
    }

    /// Load a previously persisted checksum map from `data_dir`, if any.
    pub fn load_persisted(data_dir: &Path) -> Option<IdentityChecksumMap> {
        let content = std::fs::read_to_string(data_dir.join(CHECKSUM_FILE_NAME)).ok()?;
        serde_json::from_str(&content).ok()
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn verify_passes_immediately_after_initialize() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("AGENTS.md"), "safePaths: []").unwrap();
        let guard = IdentityGuard::initialize(dir.path());
        assert!(guard.verify().valid);
    }

    #[test]
    fn tamper_is_detected_and_halts_until_acknowledged() {
        let dir = TempDir::new().unwrap();
        let agents_path = dir.path().join("AGENTS.md");
        std::fs::write(&agents_path, "original").unwrap();
        let mut guard = IdentityGuard::initialize(dir.path());
        assert!(guard.verify().valid);

        std::fs::write(&agents_path, "tampered byte").unwrap();
        let result = guard.verify();
        assert!(!result.valid);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].file, "AGENTS.md");

        // Still invalid until acknowledge() re-pins.
        assert!(!guard.verify().valid);
        guard.acknowledge();
        assert!(guard.verify().valid);
    }

    #[test]
    fn missing_identity_file_after_pin_is_a_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("GOALS.md");
        std::fs::write(&path, "goals").unwrap();
        let guard = IdentityGuard::initialize(dir.path());
        std::fs::remove_file(&path).unwrap();
        let result = guard.verify();
        assert!(!result.valid);
    }
}
