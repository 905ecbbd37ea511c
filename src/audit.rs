//! Append-only audit log for airdrop runs.
//!
//! The log is the system of record for which chunks were submitted and
//! confirmed. Creation refuses an existing file: a leftover log means a
//! previous run touched (or may have touched) the chain with the same
//! instruction set, and must be inspected by the operator before anything is
//! resubmitted.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: File,
}

impl AuditLog {
    /// Create the log file, failing if it already exists.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| {
                format!(
                    "{} already exists or cannot be created; check and move it before rerunning",
                    path.display()
                )
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Append one timestamped record and sync it to disk.
    ///
    /// Records look like:
    /// `2023-12-06T09:42:05.963Z - Sending 500 to batch 1 (180 addresses): 0x326c, 0x445e, ...`
    pub fn append(&mut self, text: &str) -> Result<()> {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.file
            .write_all(format!("{} - {}\n", stamp, text).as_bytes())
            .with_context(|| format!("write to {}", self.path.display()))?;
        // Sync every record so a crash right after a confirmation still
        // leaves a durable trace of it.
        self.file
            .sync_data()
            .with_context(|| format!("sync {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
