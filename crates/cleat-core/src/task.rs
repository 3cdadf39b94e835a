use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tags beyond this count are dropped, never an error.
pub const MAX_TAGS: usize = 5;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Self::Low),
            "medium" | "med" | "m" => Ok(Self::Medium),
            "high" | "h" => Ok(Self::High),
            other => Err(anyhow::anyhow!(
                "invalid priority: {other} (expected low, medium or high)"
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A single to-do item. Serialized field names match the historic
/// storage blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub priority: Priority,

    pub list: String,

    #[serde(default)]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub order: u64,
}

impl Task {
    pub fn new(title: String, list: String, now: DateTime<Utc>, order: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description: String::new(),
            completed: false,
            due_date: None,
            priority: Priority::default(),
            list,
            tags: vec![],
            created_at: now,
            updated_at: now,
            order,
        }
    }

    pub fn short_id(&self) -> String {
        let simple = self.id.simple().to_string();
        simple[..8].to_string()
    }
}

pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .take(MAX_TAGS)
        .collect()
}

pub fn clamp_tags(tags: &mut Vec<String>) {
    tags.retain(|tag| !tag.trim().is_empty());
    tags.truncate(MAX_TAGS);
}
