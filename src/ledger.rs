//! Durable cost ledger (§10.1 Supplemented Features: `InMemoryCostLedger`
//! is explicitly per-process only). A thin file-backed wrapper around it
//! so `elon loop`/`elon fix-all` spending survives a restart, the way
//! the identity checksum map survives one via `elon-safety::identity`.

use camino::Utf8Path;
use elon_llm::{CostLedger, InMemoryCostLedger};
use serde::{Deserialize, Serialize};

const LEDGER_FILE_NAME: &str = "cost-ledger.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    spent_micros: u64,
}

/// Wraps an [`InMemoryCostLedger`] seeded from `data_dir/cost-ledger.json`
/// and rewrites that file on every charge. Not guarded by a resource
/// lock: only one `elon` invocation charges the ledger at a time by
/// construction (the CLI never runs two cycles concurrently).
pub struct PersistedCostLedger {
    inner: InMemoryCostLedger,
    data_dir: camino::Utf8PathBuf,
}

impl PersistedCostLedger {
    pub fn load(data_dir: &Utf8Path) -> anyhow::Result<Self> {
        let path = data_dir.join(LEDGER_FILE_NAME);
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerState::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            inner: InMemoryCostLedger::starting_at(state.spent_micros),
            data_dir: data_dir.to_owned(),
        })
    }

    fn persist(&self) -> anyhow::Result<()> {
        let path = self.data_dir.join(LEDGER_FILE_NAME);
        let state = LedgerState {
            spent_micros: self.inner.spent(),
        };
        let json = serde_json::to_string_pretty(&state)?;
        elon_utils::atomic_write::write_file_atomic(&path, &json)?;
        Ok(())
    }
}

impl CostLedger for PersistedCostLedger {
    fn charge(&self, micros: u64) {
        self.inner.charge(micros);
        let _ = self.persist();
    }

    fn spent(&self) -> u64 {
        self.inner.spent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elon_llm::dollars_to_micros;
    use tempfile::TempDir;

    fn data_dir(dir: &TempDir) -> camino::Utf8PathBuf {
        camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn charge_persists_across_reload() {
        let dir = TempDir::new().unwrap();
        let dd = data_dir(&dir);

        let ledger = PersistedCostLedger::load(&dd).unwrap();
        ledger.charge(dollars_to_micros(1.5));
        assert_eq!(ledger.spent(), dollars_to_micros(1.5));

        let reloaded = PersistedCostLedger::load(&dd).unwrap();
        assert_eq!(reloaded.spent(), dollars_to_micros(1.5));
    }

    #[test]
    fn missing_file_starts_at_zero() {
        let dir = TempDir::new().unwrap();
        let dd = data_dir(&dir);
        let ledger = PersistedCostLedger::load(&dd).unwrap();
        assert_eq!(ledger.spent(), 0);
    }
}
