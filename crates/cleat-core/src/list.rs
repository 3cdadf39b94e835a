use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The one reserved list that is actually storage-backed. Tasks whose
/// list cannot be resolved are reassigned here.
pub const INBOX: &str = "inbox";

/// Reserved identifiers: `inbox` is real, the rest are computed views.
/// None of them can be deleted or recreated.
pub const RESERVED_LIST_IDS: [&str; 4] = ["inbox", "today", "important", "completed"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub order: u64,
    pub created_at: DateTime<Utc>,
}

pub fn is_reserved(id: &str) -> bool {
    RESERVED_LIST_IDS.contains(&id)
}

pub fn inbox_list(now: DateTime<Utc>) -> TaskList {
    TaskList {
        id: INBOX.to_string(),
        name: "Inbox".to_string(),
        color: "#3b82f6".to_string(),
        order: 0,
        created_at: now,
    }
}

pub fn default_lists(now: DateTime<Utc>) -> Vec<TaskList> {
    vec![
        inbox_list(now),
        TaskList {
            id: "work".to_string(),
            name: "Work".to_string(),
            color: "#ef4444".to_string(),
            order: 1,
            created_at: now,
        },
        TaskList {
            id: "personal".to_string(),
            name: "Personal".to_string(),
            color: "#10b981".to_string(),
            order: 2,
            created_at: now,
        },
    ]
}

// Loose check: #rgb or #rrggbb.
pub fn is_hex_color(raw: &str) -> bool {
    let Some(digits) = raw.strip_prefix('#') else {
        return false;
    };
    (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}
