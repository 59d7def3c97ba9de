//! Atomic Mutator (§4.2): single- and multi-file create/change
//! operations with pre-mutation backup, post-mutation syntactic
//! validation, and guaranteed rollback on any batch failure.

pub mod backup;
pub mod change;
pub mod syntax;
pub mod validation;

use backup::BackupEntry;
use camino::{Utf8Path, Utf8PathBuf};
use elon_safety::PathPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("path '{0}' is not permitted by safety policy: {1}")]
    PathNotSafe(String, String),
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("file already exists: {0}")]
    FileAlreadyExists(String),
    #[error("{0}")]
    NoUniqueMatch(#[from] change::MatchError),
    #[error("syntax validation failed for '{path}': {reason}")]
    SyntaxInvalid { path: String, reason: String },
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// A single requested mutation, as named in a Specification's plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Mutation {
    Change {
        file: Utf8PathBuf,
        old_text: String,
        new_text: String,
    },
    Create {
        file: Utf8PathBuf,
        content: String,
    },
}

impl Mutation {
    fn file(&self) -> &Utf8Path {
        match self {
            Self::Change { file, .. } | Self::Create { file, .. } => file,
        }
    }
}

/// Outcome of `applyBatch`: either every mutation in order applied
/// cleanly, or the batch was fully rolled back and the failing entry
/// (by index) is reported.
///
/// `Applied` carries the pre-mutation backups so a caller that runs
/// test/runtime validation *after* the batch lands (§4.2, §4.4) can
/// still roll the whole thing back via [`Mutator::rollback_batch`] if
/// that validation fails.
#[derive(Debug)]
pub enum BatchOutcome {
    Applied { backups: Vec<BackupEntry> },
    RolledBack {
        failing_index: usize,
        reason: String,
        atomic_rollback: bool,
    },
}

pub struct Mutator<'a> {
    repo_root: Utf8PathBuf,
    path_policy: &'a PathPolicy,
}

impl<'a> Mutator<'a> {
    pub fn new(repo_root: Utf8PathBuf, path_policy: &'a PathPolicy) -> Self {
        Self {
            repo_root,
            path_policy,
        }
    }

    fn check_path(&self, file: &Utf8Path) -> Result<(), MutationError> {
        let decision = self.path_policy.check(file.as_str());
        if !decision.safe {
            return Err(MutationError::PathNotSafe(file.to_string(), decision.reason));
        }
        Ok(())
    }

    fn absolute(&self, file: &Utf8Path) -> Utf8PathBuf {
        self.repo_root.join(file)
    }

    fn extension(file: &Utf8Path) -> &str {
        file.extension().unwrap_or("")
    }

    /// Exact-substring or unique line-trimmed fuzzy replace, with a
    /// timestamped backup written before the mutation.
    pub fn apply_change(
        &self,
        file: &Utf8Path,
        old_text: &str,
        new_text: &str,
    ) -> Result<(), MutationError> {
        self.check_path(file)?;
        let absolute = self.absolute(file);

        let content = std::fs::read_to_string(&absolute)
            .map_err(|_| MutationError::FileNotFound(file.to_string()))?;
        let updated = change::apply(&content, old_text, new_text)?;

        backup::write_backup_file(&absolute, &content)?;
        elon_utils::atomic_write::write_file_atomic(&absolute, &updated)?;

        if let Err(e) = syntax::validate(Self::extension(file), &updated) {
            elon_utils::atomic_write::write_file_atomic(&absolute, &content)?;
            return Err(MutationError::SyntaxInvalid {
                path: file.to_string(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Refuses if the file exists; writes content; validates; on
    /// validation failure, deletes the file and reports.
    pub fn create_file(&self, file: &Utf8Path, content: &str) -> Result<(), MutationError> {
        self.check_path(file)?;
        let absolute = self.absolute(file);

        if absolute.exists() {
            return Err(MutationError::FileAlreadyExists(file.to_string()));
        }

        elon_utils::atomic_write::write_file_atomic(&absolute, content)?;

        if let Err(e) = syntax::validate(Self::extension(file), content) {
            elon_utils::atomic_write::remove_file_if_exists(&absolute)?;
            return Err(MutationError::SyntaxInvalid {
                path: file.to_string(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Backs up every target first, then applies in order. On the first
    /// failure, rolls back every previously applied mutation in this
    /// batch (including deleting files the batch created).
    pub fn apply_batch(&self, mutations: &[Mutation]) -> Result<BatchOutcome, MutationError> {
        for mutation in mutations {
            self.check_path(mutation.file())?;
        }

        let mut backups: Vec<BackupEntry> = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            let absolute = self.absolute(mutation.file());
            backups.push(backup::snapshot(&absolute)?);
        }

        for (index, mutation) in mutations.iter().enumerate() {
            let result = self.apply_one(mutation);
            if let Err(e) = result {
                self.rollback(&backups[..=index]);
                return Ok(BatchOutcome::RolledBack {
                    failing_index: index,
                    reason: e.to_string(),
                    atomic_rollback: true,
                });
            }
        }

        Ok(BatchOutcome::Applied { backups })
    }

    /// Undo an already-applied batch, given the backups [`apply_batch`]
    /// returned for it. Used when validation that only runs after the
    /// batch lands (test command, runtime health check) fails.
    pub fn rollback_batch(&self, backups: &[BackupEntry]) {
        self.rollback(backups);
    }

    fn apply_one(&self, mutation: &Mutation) -> Result<(), MutationError> {
        match mutation {
            Mutation::Change {
                file,
                old_text,
                new_text,
            } => self.apply_change_no_backup_file(file, old_text, new_text),
            Mutation::Create { file, content } => self.create_file(file, content),
        }
    }

    /// Batch changes already hold a [`BackupEntry`] snapshot; skip the
    /// audit-trail sibling `.bak` file `apply_change` would otherwise
    /// write, to avoid littering the tree with one per batch member.
    fn apply_change_no_backup_file(
        &self,
        file: &Utf8Path,
        old_text: &str,
        new_text: &str,
    ) -> Result<(), MutationError> {
        let absolute = self.absolute(file);
        let content = std::fs::read_to_string(&absolute)
            .map_err(|_| MutationError::FileNotFound(file.to_string()))?;
        let updated = change::apply(&content, old_text, new_text)?;
        elon_utils::atomic_write::write_file_atomic(&absolute, &updated)?;

        if let Err(e) = syntax::validate(Self::extension(file), &updated) {
            elon_utils::atomic_write::write_file_atomic(&absolute, &content)?;
            return Err(MutationError::SyntaxInvalid {
                path: file.to_string(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    fn rollback(&self, applied: &[BackupEntry]) {
        for entry in applied.iter().rev() {
            let _ = entry.restore();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elon_safety::PathPolicyRules;
    use tempfile::TempDir;

    fn policy() -> PathPolicy {
        PathPolicy::compile(PathPolicyRules {
            safe_paths: vec!["**".to_string()],
            never_touch: vec![],
        })
        .unwrap()
    }

    #[test]
    fn create_file_refuses_existing() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("a.ts"), "x").unwrap();

        let policy = policy();
        let mutator = Mutator::new(root, &policy);
        let err = mutator.create_file(Utf8Path::new("a.ts"), "y").unwrap_err();
        assert!(matches!(err, MutationError::FileAlreadyExists(_)));
    }

    #[test]
    fn create_file_with_bad_syntax_is_deleted() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let policy = policy();
        let mutator = Mutator::new(root, &policy);

        let err = mutator
            .create_file(Utf8Path::new("bad.ts"), "function f() { return 1; {")
            .unwrap_err();
        assert!(matches!(err, MutationError::SyntaxInvalid { .. }));
        assert!(!dir.path().join("bad.ts").exists());
    }

    #[test]
    fn apply_change_reverts_on_syntax_failure() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("f.ts"), "function f() { return 1; }").unwrap();
        let policy = policy();
        let mutator = Mutator::new(root, &policy);

        let err = mutator
            .apply_change(Utf8Path::new("f.ts"), "return 1;", "return 1; {")
            .unwrap_err();
        assert!(matches!(err, MutationError::SyntaxInvalid { .. }));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.ts")).unwrap(),
            "function f() { return 1; }"
        );
    }

    #[test]
    fn apply_change_to_unsafe_path_is_refused() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("AGENTS.md"), "x").unwrap();
        let policy = policy();
        let mutator = Mutator::new(root, &policy);

        let err = mutator
            .apply_change(Utf8Path::new("AGENTS.md"), "x", "y")
            .unwrap_err();
        assert!(matches!(err, MutationError::PathNotSafe(..)));
    }

    #[test]
    fn batch_rolls_back_all_prior_mutations_on_failure() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("a.ts"), "const a = 1;").unwrap();
        let policy = policy();
        let mutator = Mutator::new(root, &policy);

        let mutations = vec![
            Mutation::Change {
                file: Utf8PathBuf::from("a.ts"),
                old_text: "const a = 1;".to_string(),
                new_text: "const a = 2;".to_string(),
            },
            Mutation::Create {
                file: Utf8PathBuf::from("b.ts"),
                content: "const b = 1;".to_string(),
            },
            Mutation::Create {
                file: Utf8PathBuf::from("c.ts"),
                content: "const c = 1; {".to_string(), // invalid, fails
            },
        ];

        let outcome = mutator.apply_batch(&mutations).unwrap();
        match outcome {
            BatchOutcome::RolledBack {
                failing_index,
                atomic_rollback,
                ..
            } => {
                assert_eq!(failing_index, 2);
                assert!(atomic_rollback);
            }
            BatchOutcome::Applied { .. } => panic!("expected rollback"),
        }

        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.ts")).unwrap(),
            "const a = 1;"
        );
        assert!(!dir.path().join("b.ts").exists());
        assert!(!dir.path().join("c.ts").exists());
    }

    #[test]
    fn batch_applies_cleanly_when_every_mutation_succeeds() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("a.ts"), "const a = 1;").unwrap();
        let policy = policy();
        let mutator = Mutator::new(root, &policy);

        let mutations = vec![
            Mutation::Change {
                file: Utf8PathBuf::from("a.ts"),
                old_text: "const a = 1;".to_string(),
                new_text: "const a = 2;".to_string(),
            },
            Mutation::Create {
                file: Utf8PathBuf::from("b.ts"),
                content: "const b = 1;".to_string(),
            },
        ];

        let outcome = mutator.apply_batch(&mutations).unwrap();
        assert!(matches!(outcome, BatchOutcome::Applied { .. }));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.ts")).unwrap(),
            "const a = 2;"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("b.ts")).unwrap(),
            "const b = 1;"
        );
    }
}
