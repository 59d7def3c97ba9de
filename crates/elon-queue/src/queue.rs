//! The Work Queue (§4.3): buckets are directories, entities are
//! `<id>.json` files, transitions are renames.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

use crate::spec::{Priority, Specification};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Pending,
    Approved,
    Completed,
    Failed,
    Rejected,
}

impl Bucket {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("specification '{0}' not found in bucket")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

pub struct WorkQueue {
    root: Utf8PathBuf,
}

impl WorkQueue {
    pub fn new(data_dir: Utf8PathBuf) -> anyhow::Result<Self> {
        let root = data_dir.join("queue");
        for bucket in [
            Bucket::Pending,
            Bucket::Approved,
            Bucket::Completed,
            Bucket::Failed,
            Bucket::Rejected,
        ] {
            fs::create_dir_all(root.join(bucket.dir_name()))?;
        }
        Ok(Self { root })
    }

    fn bucket_dir(&self, bucket: Bucket) -> Utf8PathBuf {
        self.root.join(bucket.dir_name())
    }

    /// File an entirely new specification directly into `pending` or
    /// `approved`, staged via temp-sibling + rename so concurrent
    /// listers never observe a partial file.
    pub fn file_new(&self, spec: &Specification, bucket: Bucket) -> anyhow::Result<Utf8PathBuf> {
        debug_assert!(matches!(bucket, Bucket::Pending | Bucket::Approved));
        let target = self.bucket_dir(bucket).join(spec.file_name());
        let json = serde_json::to_string_pretty(spec)?;
        elon_utils::atomic_write::write_file_atomic(&target, &json)?;
        Ok(target)
    }

    /// Find a spec's current file path by id within a bucket.
    fn locate(&self, bucket: Bucket, id: &str) -> Result<Utf8PathBuf, QueueError> {
        let dir = self.bucket_dir(bucket);
        for entry in fs::read_dir(&dir).map_err(anyhow::Error::from)? {
            let entry = entry.map_err(anyhow::Error::from)?;
            let path = Utf8PathBuf::from_path_buf(entry.path())
                .map_err(|p| anyhow::anyhow!("non-utf8 path: {}", p.display()))?;
            if path.file_stem().map(|s| s.ends_with(id)).unwrap_or(false) {
                return Ok(path);
            }
        }
        Err(QueueError::NotFound(id.to_string()))
    }

    /// `pending` → `approved` or `pending` → `rejected`: a plain rename.
    pub fn transition(&self, id: &str, from: Bucket, to: Bucket) -> Result<(), QueueError> {
        let source = self.locate(from, id)?;
        let file_name = source.file_name().expect("queue entries always have a name");
        let target = self.bucket_dir(to).join(file_name);
        fs::rename(&source, &target).map_err(|e| QueueError::Io(e.into()))?;
        Ok(())
    }

    /// `approved` → `completed` / `failed`: copy then delete, tolerant
    /// of crashing between the two (re-running this is a no-op if the
    /// destination already has the file and the source is gone).
    pub fn finish(&self, id: &str, outcome: Bucket) -> Result<(), QueueError> {
        debug_assert!(matches!(outcome, Bucket::Completed | Bucket::Failed));
        let source = match self.locate(Bucket::Approved, id) {
            Ok(path) => path,
            Err(QueueError::NotFound(_)) => {
                // Already moved in a prior crashed attempt; idempotent no-op
                // as long as the destination already has it.
                return self
                    .locate(outcome, id)
                    .map(|_| ())
                    .map_err(|_| QueueError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e),
        };
        let file_name = source.file_name().expect("queue entries always have a name");
        let target = self.bucket_dir(outcome).join(file_name);

        if !target.exists() {
            let content = fs::read_to_string(&source).map_err(|e| QueueError::Io(e.into()))?;
            elon_utils::atomic_write::write_file_atomic(&target, &content)
                .map_err(QueueError::Io)?;
        }
        // Removing an already-gone source file is fine: the crash-recovery
        // case this guards against is exactly "copy happened, delete didn't".
        let _ = fs::remove_file(&source);
        Ok(())
    }

    /// Read every specification currently in `bucket`, sorted by
    /// filename (timestamp-prefixed, giving FIFO order), with a
    /// secondary sort by priority (highest first) applied by the caller
    /// for the `approved` execution queue.
    pub fn list(&self, bucket: Bucket) -> anyhow::Result<Vec<Specification>> {
        let dir = self.bucket_dir(bucket);
        let mut names: Vec<Utf8PathBuf> = fs::read_dir(&dir)?
            .filter_map(Result::ok)
            .filter_map(|e| Utf8PathBuf::from_path_buf(e.path()).ok())
            .filter(|p| p.extension() == Some("json"))
            .collect();
        names.sort();

        let mut specs = Vec::with_capacity(names.len());
        for path in names {
            let content = fs::read_to_string(&path)?;
            specs.push(serde_json::from_str(&content)?);
        }
        Ok(specs)
    }

    /// `approved` bucket execution order: FIFO by filename timestamp,
    /// then highest priority first (§4.3).
    pub fn approved_execution_order(&self) -> anyhow::Result<Vec<Specification>> {
        let mut specs = self.list(Bucket::Approved)?;
        specs.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.file_name().cmp(&b.file_name())));
        Ok(specs)
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

/// Auto-approval decision for a freshly-materialised spec, per the
/// `(new) → pending` / `(new) → approved` row of §4.3's transition
/// table: auto-approve only if the category is in the auto-approve set
/// *and* the target path is safe; any `blockedCategory` forces pending.
#[must_use]
pub fn initial_bucket(
    category: &str,
    blocked_category: &Option<String>,
    auto_approve_categories: &[String],
    path_is_safe: bool,
) -> Bucket {
    if blocked_category.is_some() {
        return Bucket::Pending;
    }
    if auto_approve_categories.iter().any(|c| c == category) && path_is_safe {
        Bucket::Approved
    } else {
        Bucket::Pending
    }
}
