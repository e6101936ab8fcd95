//! File audit sink adapter
//!
//! Appends one timestamped line per recorded message to a plain text log
//! in the data directory. Append-only, best-effort: write failures are
//! discarded so bookkeeping can never mask an operation's outcome.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

use crate::ports::AuditSink;

/// Append-only text log of ledger events
pub struct FileAuditSink {
    path: PathBuf,
    // Serializes writers within this process so lines never interleave
    write_lock: Mutex<()>,
}

impl FileAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path to the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, message: &str) {
        let Ok(_guard) = self.write_lock.lock() else {
            return;
        };
        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.path) else {
            return;
        };
        let _ = writeln!(file, "[{}] {}", Utc::now().to_rfc3339(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_records_are_appended_in_order() {
        let dir = tempdir().unwrap();
        let sink = FileAuditSink::new(dir.path().join("transaction.log"));

        sink.record("Withdraw SUCCESS user_id=1 amount=5.00");
        sink.record("Withdraw FAILED user_id=1 amount=500.00");

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Withdraw SUCCESS"));
        assert!(lines[1].contains("Withdraw FAILED"));
        assert!(lines[0].starts_with('['));
    }

    #[test]
    fn test_unwritable_path_is_swallowed() {
        let sink = FileAuditSink::new("/nonexistent-dir/transaction.log");
        // Must not panic or surface the failure
        sink.record("message");
    }
}
