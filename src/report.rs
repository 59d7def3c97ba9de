//! Cumulative progress report (§6 "Data directory layout", §11
//! "Structured progress event stream for fix-all"): every
//! [`ProgressEvent`] the Scheduler reports is appended to
//! `dataDir/elon-report-data.json`, on top of forwarding to `tracing`
//! the way [`TracingProgressSink`] already does.

use camino::Utf8Path;
use elon_scheduler::{ProgressEvent, ProgressSink, TracingProgressSink};
use std::sync::Mutex;

const REPORT_FILE_NAME: &str = "elon-report-data.json";

pub struct ReportSink {
    inner: TracingProgressSink,
    data_dir: camino::Utf8PathBuf,
    buffered: Mutex<Vec<ProgressEvent>>,
}

impl ReportSink {
    pub fn new(data_dir: &Utf8Path) -> Self {
        let buffered = load(data_dir).unwrap_or_default();
        Self {
            inner: TracingProgressSink,
            data_dir: data_dir.to_owned(),
            buffered: Mutex::new(buffered),
        }
    }

    fn persist(&self) {
        let path = self.data_dir.join(REPORT_FILE_NAME);
        let events = self.buffered.lock().unwrap();
        if let Ok(json) = serde_json::to_string_pretty(&*events) {
            let _ = elon_utils::atomic_write::write_file_atomic(&path, &json);
        }
    }
}

impl ProgressSink for ReportSink {
    fn report(&self, event: ProgressEvent) {
        self.inner.report(event.clone());
        self.buffered.lock().unwrap().push(event);
        self.persist();
    }
}

fn load(data_dir: &Utf8Path) -> Option<Vec<ProgressEvent>> {
    let content = std::fs::read_to_string(data_dir.join(REPORT_FILE_NAME)).ok()?;
    serde_json::from_str(&content).ok()
}
