use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::list::TaskList;
use crate::settings::Settings;
use crate::task::Task;

pub const FORMAT_VERSION: &str = "1.0.0";

/// The single-file backup bundle. `tasks`, `lists` and `settings` are
/// the required keys; the rest is provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub tasks: Vec<Task>,
    pub lists: Vec<TaskList>,
    pub settings: Settings,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl BackupDocument {
    pub fn to_pretty_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed serializing backup document")
    }
}

/// Structural validation happens before any typed deserialization so a
/// malformed file is rejected with a stable message and zero state
/// touched.
pub fn parse_backup(raw: &str) -> anyhow::Result<BackupDocument> {
    let value: Value = serde_json::from_str(raw).context("backup file is not valid JSON")?;

    for key in ["tasks", "lists", "settings"] {
        if value.get(key).is_none() {
            return Err(anyhow!("invalid backup file format: missing `{key}`"));
        }
    }

    serde_json::from_value(value).context("invalid backup file format")
}
