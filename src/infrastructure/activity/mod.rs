//! Activity recording.
//!
//! The surrounding application keeps a human-readable activity feed. From the
//! issuance core's side this is strictly fire-and-forget: recorders never
//! return errors, and any internal failure is logged and swallowed. Issuance
//! has already committed by the time a recorder runs.

use crate::foundation::now_nanos;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityCategory {
    #[serde(rename = "Certificate Issued")]
    CertificateIssued,
}

impl ActivityCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CertificateIssued => "Certificate Issued",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub description: String,
    pub category: ActivityCategory,
    pub timestamp_nanos: u64,
}

impl ActivityEntry {
    pub fn new(description: impl Into<String>, category: ActivityCategory) -> Self {
        Self { description: description.into(), category, timestamp_nanos: now_nanos() }
    }
}

pub trait ActivityRecorder: Send + Sync {
    fn record(&self, description: &str, category: ActivityCategory);
}

/// Emits activity entries as JSON lines on the `activity` log target.
pub struct LogActivityRecorder;

impl ActivityRecorder for LogActivityRecorder {
    fn record(&self, description: &str, category: ActivityCategory) {
        let entry = ActivityEntry::new(description, category);
        let json = serde_json::to_string(&entry).unwrap_or_else(|_| "{\"type\":\"serialize_failed\"}".to_string());
        info!(target: "activity", "{}", json);
    }
}

/// Appends activity entries as JSON lines to a file.
pub struct FileActivityRecorder {
    file: Mutex<std::fs::File>,
}

impl FileActivityRecorder {
    pub fn new(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Mutex::new(file) })
    }
}

impl ActivityRecorder for FileActivityRecorder {
    fn record(&self, description: &str, category: ActivityCategory) {
        let entry = ActivityEntry::new(description, category);
        let json = serde_json::to_string(&entry).unwrap_or_else(|_| "{\"type\":\"serialize_failed\"}".to_string());
        match self.file.lock() {
            Ok(mut file) => {
                if let Err(err) = writeln!(file, "{}", json).and_then(|_| file.flush()) {
                    warn!("activity file write failed: {err}");
                }
            }
            Err(_) => warn!("activity file lock poisoned; dropping entry"),
        }
    }
}

/// Fans entries out to several recorders.
pub struct MultiActivityRecorder {
    recorders: Vec<Box<dyn ActivityRecorder>>,
}

impl MultiActivityRecorder {
    pub fn new() -> Self {
        Self { recorders: Vec::new() }
    }

    pub fn add_recorder(&mut self, recorder: Box<dyn ActivityRecorder>) {
        self.recorders.push(recorder);
    }
}

impl Default for MultiActivityRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityRecorder for MultiActivityRecorder {
    fn record(&self, description: &str, category: ActivityCategory) {
        for recorder in &self.recorders {
            recorder.record(description, category);
        }
    }
}

/// Discards every entry.
pub struct NoopActivityRecorder;

impl ActivityRecorder for NoopActivityRecorder {
    fn record(&self, _description: &str, _category: ActivityCategory) {}
}
