use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use crate::diff::property_changes;
use crate::types::PropertyUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLogMode {
    Full,
    Diffed,
}

/// NDJSON journal of remote activity, one object per line.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_state: Option<BTreeMap<String, Value>>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous_state: None,
        })
    }

    pub fn log_login(&mut self, app_key: &str, ok: bool) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "login",
            "app_key": app_key,
            "ok": ok,
        });
        self.write_line(&entry);
    }

    pub fn log_control(&mut self, device_id: &str, updates: &[PropertyUpdate], control_ids: &[String]) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "device_id": device_id,
            "updates": updates,
            "control_ids": control_ids,
        });
        self.write_line(&entry);
    }

    pub fn log_completion(&mut self, device_id: &str, control_ids: &[String], outcome: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "wait",
            "device_id": device_id,
            "control_ids": control_ids,
            "outcome": outcome,
        });
        self.write_line(&entry);
    }

    pub fn log_error(&mut self, operation: &str, error: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "error",
            "operation": operation,
            "error": error,
        });
        self.write_line(&entry);
    }

    pub fn log_query(&mut self, device_id: &str, properties: &BTreeMap<String, Value>) {
        match self.mode {
            MessageLogMode::Full => {
                let entry = json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "query",
                    "device_id": device_id,
                    "body": properties,
                });
                self.write_line(&entry);
            }
            MessageLogMode::Diffed => match self.previous_state.take() {
                None => {
                    let entry = json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "query",
                        "device_id": device_id,
                        "full": true,
                        "body": properties,
                    });
                    self.write_line(&entry);
                    self.previous_state = Some(properties.clone());
                }
                Some(prev) => {
                    let change_entries: Vec<Value> = property_changes(&prev, properties)
                        .into_iter()
                        .map(|(code, old, new)| json!({ "code": code, "old": old, "new": new }))
                        .collect();

                    let entry = json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "query",
                        "device_id": device_id,
                        "changes": change_entries,
                    });
                    self.write_line(&entry);
                    self.previous_state = Some(properties.clone());
                }
            },
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write journal entry: {e}");
        }
    }
}

/// Shared handle to an optional journal. Disabled journals ignore writes.
#[derive(Clone, Default)]
pub(crate) struct Journal(Option<Arc<Mutex<MessageLogger>>>);

impl Journal {
    pub fn open(mode: MessageLogMode, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let logger = MessageLogger::new(mode, path)?;
        Ok(Self(Some(Arc::new(Mutex::new(logger)))))
    }

    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn record(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(logger) = &self.0 {
            f(&mut logger.lock().unwrap_or_else(PoisonError::into_inner));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn props(body: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(body).unwrap()
    }

    fn read_lines(path: &Path) -> Vec<Value> {
        let mut contents = String::new();
        std::fs::File::open(path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn log_login_writes_ndjson() {
        let tmp = NamedTempFile::new().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, tmp.path()).unwrap();
        logger.log_login("my-key", true);

        let lines = read_lines(tmp.path());
        assert_eq!(lines[0]["dir"], "login");
        assert_eq!(lines[0]["app_key"], "my-key");
        assert_eq!(lines[0]["ok"], true);
        assert!(lines[0]["ts"].as_str().is_some());
    }

    #[test]
    fn diffed_mode_logs_full_first_then_changes() {
        let tmp = NamedTempFile::new().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, tmp.path()).unwrap();

        logger.log_query("42", &props(json!({"80": "30", "BB": 25.0})));
        logger.log_query("42", &props(json!({"80": "30", "BB": 25.5})));

        let lines = read_lines(tmp.path());
        assert_eq!(lines[0]["full"], true);
        assert!(lines[0]["body"].is_object());
        let changes = lines[1]["changes"].as_array().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["code"], "BB");
        assert_eq!(changes[0]["new"], 25.5);
    }

    #[test]
    fn full_mode_always_logs_body() {
        let tmp = NamedTempFile::new().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, tmp.path()).unwrap();
        let body = json!({"80": "31"});
        logger.log_query("42", &props(body.clone()));
        logger.log_query("42", &props(body.clone()));

        let lines = read_lines(tmp.path());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["body"], body);
        assert!(lines[1].get("changes").is_none());
    }

    #[test]
    fn log_control_captures_updates() {
        let tmp = NamedTempFile::new().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, tmp.path()).unwrap();
        let updates = vec![PropertyUpdate {
            code: "B3".into(),
            value: json!(22.0),
        }];
        logger.log_control("42", &updates, &["c1".to_string()]);

        let lines = read_lines(tmp.path());
        assert_eq!(lines[0]["dir"], "cmd");
        assert_eq!(lines[0]["updates"][0]["code"], "B3");
        assert_eq!(lines[0]["control_ids"][0], "c1");
    }

    #[test]
    fn disabled_journal_ignores_writes() {
        let journal = Journal::disabled();
        let mut called = false;
        journal.record(|_| called = true);
        assert!(!called);
    }

    #[test]
    fn journal_records_through_shared_handle() {
        let tmp = NamedTempFile::new().unwrap();
        let journal = Journal::open(MessageLogMode::Full, tmp.path()).unwrap();
        let clone = journal.clone();
        journal.record(|l| l.log_error("refresh", "boom"));
        clone.record(|l| l.log_completion("42", &["c1".to_string()], "timeout"));

        let lines = read_lines(tmp.path());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["dir"], "error");
        assert_eq!(lines[1]["outcome"], "timeout");
    }

    #[test]
    fn diffed_mode_no_changes_logs_empty_array() {
        let tmp = NamedTempFile::new().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, tmp.path()).unwrap();
        let body = props(json!({"80": "30"}));
        logger.log_query("42", &body);
        logger.log_query("42", &body);

        let lines = read_lines(tmp.path());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["changes"].as_array().unwrap().len(), 0);
    }
}
