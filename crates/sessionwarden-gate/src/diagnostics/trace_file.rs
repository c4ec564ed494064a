use super::{DiagnosticEvent, DiagnosticSink};
use chrono::{SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Append-only text trace, one line per event.
///
/// The file is opened per record so that nothing is held open between host
/// callbacks. No rotation, no size bound. A symlink at the path is never
/// followed.
pub struct TraceFileSink {
    path: PathBuf,
}

impl TraceFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, event: &DiagnosticEvent) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .custom_flags(libc::O_NOFOLLOW)
            .open(&self.path)?;
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        writeln!(file, "{ts} {} {event}", event.severity.as_str())
    }
}

impl DiagnosticSink for TraceFileSink {
    fn record(&self, event: &DiagnosticEvent) {
        let _ = self.append(event);
    }
}
