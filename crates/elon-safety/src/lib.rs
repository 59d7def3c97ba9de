//! Safety Kernel (§4.1): the sole authority over whether a proposed
//! mutation or command may proceed. Every other component consults this
//! crate before touching the filesystem or spawning a process.
//!
//! Three responsibilities, kept as separate modules but exposed through
//! one [`SafetyKernel`] so callers never have to remember to check all
//! three independently:
//! (a) path safety decisions — [`path_policy`]
//! (b) identity integrity — [`identity`]
//! (c) command safety — [`command_policy`]

pub mod agents_md;
pub mod command_policy;
pub mod identity;
pub mod path_policy;

use std::path::{Path, PathBuf};

pub use command_policy::{check_command, CommandDecision};
pub use identity::{ChecksumChange, IdentityChecksumMap, IdentityGuard, VerifyResult};
pub use path_policy::{PathDecision, PathPolicy, PathPolicyRules, IDENTITY_FILES};

/// The Safety Kernel ties path policy, identity integrity, and command
/// safety to one repository root and data directory. Constructed once
/// per cycle; `identity` is re-verified at the start of every mutating
/// operation per §4.1.
pub struct SafetyKernel {
    repo_root: PathBuf,
    data_dir: PathBuf,
    path_policy: PathPolicy,
    identity: IdentityGuard,
}

impl SafetyKernel {
    pub fn new(repo_root: &Path, data_dir: &Path, rules: PathPolicyRules) -> anyhow::Result<Self> {
        let path_policy = PathPolicy::compile(rules)?;
        let pinned = IdentityGuard::load_persisted(data_dir);
        let identity = IdentityGuard::load_or_initialize(repo_root, pinned);
        Ok(Self {
            repo_root: repo_root.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
            path_policy,
            identity,
        })
    }

    #[must_use]
    pub fn check_path(&self, path: &str) -> PathDecision {
        self.path_policy.check(path)
    }

    #[must_use]
    pub fn check_command(&self, command: &str) -> CommandDecision {
        check_command(command)
    }

    #[must_use]
    pub fn verify_identity(&self) -> VerifyResult {
        self.identity.verify()
    }

    /// Re-pin the identity checksum map and persist it to `data_dir`.
    /// Only ever invoked by an explicit operator action.
    pub fn acknowledge_identity(&mut self) -> anyhow::Result<()> {
        self.identity.acknowledge();
        self.identity.persist(&self.data_dir)
    }

    /// Persist the current (initial, if never acknowledged) checksum map
    /// so subsequent runs verify against it rather than re-pinning.
    pub fn persist_identity(&self) -> anyhow::Result<()> {
        self.identity.persist(&self.data_dir)
    }

    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    #[must_use]
    pub fn path_policy(&self) -> &PathPolicy {
        &self.path_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fresh_kernel_verifies_clean_and_enforces_path_policy() {
        let repo = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        std::fs::write(repo.path().join("AGENTS.md"), "safePaths: [src/**]").unwrap();
        std::fs::create_dir_all(repo.path().join("src")).unwrap();
        std::fs::write(repo.path().join("src/lib.rs"), "").unwrap();

        let kernel = SafetyKernel::new(
            repo.path(),
            data.path(),
            PathPolicyRules {
                safe_paths: vec!["src/**".to_string()],
                never_touch: vec![],
            },
        )
        .unwrap();

        assert!(kernel.verify_identity().valid);
        assert!(kernel.check_path("src/lib.rs").safe);
        assert!(!kernel.check_path("AGENTS.md").safe);
        assert!(kernel.check_command("cargo test").allowed);
        assert!(!kernel.check_command("rm -rf /").allowed);
    }

    #[test]
    fn identity_tamper_survives_reload_until_acknowledged() {
        let repo = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        std::fs::write(repo.path().join("AGENTS.md"), "v1").unwrap();

        let kernel = SafetyKernel::new(repo.path(), data.path(), PathPolicyRules::default()).unwrap();
        kernel.persist_identity().unwrap();

        std::fs::write(repo.path().join("AGENTS.md"), "v2-tampered").unwrap();

        let reloaded = SafetyKernel::new(repo.path(), data.path(), PathPolicyRules::default()).unwrap();
        assert!(!reloaded.verify_identity().valid);
    }
}
