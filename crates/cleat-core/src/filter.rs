use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::trace;

use crate::datetime::is_due_today;
use crate::task::{Priority, Task};

/// Which list a view selects. `today`, `important` and `completed` are
/// computed filters, not stored lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSelection {
    All,
    Today,
    Important,
    Completed,
    List(String),
}

impl Default for ListSelection {
    fn default() -> Self {
        Self::All
    }
}

impl ListSelection {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "all" => Self::All,
            "today" => Self::Today,
            "important" => Self::Important,
            "completed" => Self::Completed,
            other => Self::List(other.to_string()),
        }
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Today => is_due_today(task.due_date, today),
            Self::Important => task.priority == Priority::High,
            Self::Completed => task.completed,
            Self::List(id) => task.list == *id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(anyhow::anyhow!(
                "invalid status filter: {other} (expected all, active or completed)"
            )),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Priority,
    DueDate,
    Title,
}

impl SortKey {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "priority" => Ok(Self::Priority),
            "due" | "duedate" | "due-date" => Ok(Self::DueDate),
            "title" => Ok(Self::Title),
            other => Err(anyhow::anyhow!(
                "invalid sort key: {other} (expected newest, oldest, priority, due or title)"
            )),
        }
    }
}

/// One view over the task collection: search, list selection, status
/// filter and sort, applied in that order, always on a copy.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub search: Option<String>,
    pub list: ListSelection,
    pub status: StatusFilter,
    pub sort: SortKey,
}

impl TaskQuery {
    pub fn apply(&self, tasks: &[Task], today: NaiveDate) -> Vec<Task> {
        let needle = self
            .search
            .as_deref()
            .map(|raw| raw.trim().to_lowercase())
            .filter(|raw| !raw.is_empty());

        let mut rows: Vec<Task> = tasks
            .iter()
            .filter(|task| {
                needle
                    .as_deref()
                    .map(|needle| matches_search(task, needle))
                    .unwrap_or(true)
            })
            .filter(|task| self.list.matches(task, today))
            .filter(|task| self.status.matches(task))
            .cloned()
            .collect();

        sort_tasks(&mut rows, self.sort);
        trace!(total = tasks.len(), matched = rows.len(), "applied query");
        rows
    }
}

fn matches_search(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}

pub fn sort_tasks(tasks: &mut [Task], key: SortKey) {
    match key {
        SortKey::Newest => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Oldest => tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortKey::Priority => tasks.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
        SortKey::DueDate => tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => left.cmp(&right),
        }),
        SortKey::Title => {
            tasks.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        }
    }
}
