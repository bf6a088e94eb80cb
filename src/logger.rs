use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

use crate::diff::diff_json;

/// How polled status bodies are written to the message log.
pub enum MessageLogMode {
    Full,
    /// First body in full, then only the leaves that changed.
    Diffed,
}

/// NDJSON log of CLI traffic. Never receives the access token.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_status: Option<Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous_status: None,
        })
    }

    pub fn log_command(&mut self, id: Uuid, device_id: &str, command: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "id": id.to_string(),
            "dir": "cmd",
            "device": device_id,
            "command": command,
        });
        self.write_line(&entry);
    }

    pub fn log_error(&mut self, id: Uuid, subcommand: &str, error: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "id": id.to_string(),
            "dir": "error",
            "subcommand": subcommand,
            "error": error,
        });
        self.write_line(&entry);
    }

    pub fn log_status(&mut self, id: Uuid, body: &Value) {
        let ts = Utc::now().to_rfc3339();
        let entry = match (&self.mode, &self.previous_status) {
            (MessageLogMode::Full, _) => json!({
                "ts": ts,
                "id": id.to_string(),
                "dir": "status",
                "body": body,
            }),
            (MessageLogMode::Diffed, None) => json!({
                "ts": ts,
                "id": id.to_string(),
                "dir": "status",
                "full": true,
                "body": body,
            }),
            (MessageLogMode::Diffed, Some(prev)) => {
                let mut changes = Vec::new();
                diff_json(prev, body, "", &mut changes);
                let change_entries: Vec<Value> = changes
                    .iter()
                    .map(|(path, old, new)| json!({ "path": path, "old": old, "new": new }))
                    .collect();
                json!({
                    "ts": ts,
                    "id": id.to_string(),
                    "dir": "status",
                    "changes": change_entries,
                })
            }
        };
        self.write_line(&entry);
        if matches!(self.mode, MessageLogMode::Diffed) {
            self.previous_status = Some(body.clone());
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
