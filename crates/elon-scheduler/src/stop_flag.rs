//! External stop marker (§5 "Cancellation & timeout"): a file in
//! `dataDir` that every phase checks before starting a new oracle call
//! or spec execution.

use camino::Utf8Path;

pub const STOP_FLAG_FILE_NAME: &str = "elon-stop-requested";

#[must_use]
pub fn stop_requested(data_dir: &Utf8Path) -> bool {
    data_dir.join(STOP_FLAG_FILE_NAME).exists()
}

pub fn clear(data_dir: &Utf8Path) -> std::io::Result<()> {
    let path = data_dir.join(STOP_FLAG_FILE_NAME);
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn absent_marker_means_no_stop() {
        let dir = TempDir::new().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        assert!(!stop_requested(&data_dir));
    }

    #[test]
    fn marker_file_signals_stop_and_clear_removes_it() {
        let dir = TempDir::new().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(data_dir.join(STOP_FLAG_FILE_NAME), "").unwrap();
        assert!(stop_requested(&data_dir));
        clear(&data_dir).unwrap();
        assert!(!stop_requested(&data_dir));
    }
}
