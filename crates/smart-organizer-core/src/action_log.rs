use crate::error::Error;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub const ACTIONS_LOG_FILE: &str = "actions_log.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Organize,
    Reanalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    CategoryChange,
    Rename,
}

/// One move, as written to `actions_log.jsonl`. Never rewritten once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub action: ActionKind,
    pub original_path: String,
    pub new_path: String,
    pub original_name: String,
    pub new_name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_category: Option<String>,
    pub mime_type: String,
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_type: Vec<ChangeKind>,
    pub timestamp: String,
}

impl LogEntry {
    pub fn now() -> String {
        Local::now().to_rfc3339()
    }
}

/// Append-only JSONL log. The file is opened and closed for every entry.
#[derive(Debug, Clone)]
pub struct ActionLog {
    path: PathBuf,
}

impl ActionLog {
    pub fn open(log_dir: &Path) -> Result<Self, Error> {
        fs::create_dir_all(log_dir)?;
        Ok(Self {
            path: log_dir.join(ACTIONS_LOG_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &LogEntry) -> Result<(), Error> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read back every entry, oldest first. A missing log is empty.
    pub fn entries(&self) -> Result<Vec<LogEntry>, Error> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }
}
