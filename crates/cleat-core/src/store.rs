use std::collections::HashSet;

use anyhow::anyhow;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::backup::{BackupDocument, FORMAT_VERSION};
use crate::filter::TaskQuery;
use crate::list::{self, INBOX, TaskList};
use crate::settings::{Settings, Theme};
use crate::storage::Storage;
use crate::task::{self, Priority, Task};

/// Input for task creation. Everything but the title is optional.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub list: Option<String>,
    pub tags: Vec<String>,
}

/// A partial update. `due_date` is doubly optional: `Some(None)` clears
/// the date, `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    pub list: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Sole owner of the in-memory task/list state. Every mutation persists
/// through the storage adapter before returning; a failed write keeps
/// the in-memory state and warns so the session stays usable.
#[derive(Debug)]
pub struct Store {
    storage: Storage,
    tasks: Vec<Task>,
    lists: Vec<TaskList>,
    settings: Settings,
    theme: Theme,
}

impl Store {
    /// Loading never fails: absent documents mean first run, unreadable
    /// ones degrade to the same defaults with a warning.
    #[instrument(skip(storage, now))]
    pub fn open(storage: Storage, now: DateTime<Utc>) -> Self {
        let (tasks, first_run) = match storage.load_tasks() {
            Ok(Some(tasks)) => (tasks, false),
            Ok(None) => (Vec::new(), true),
            Err(err) => {
                warn!(error = %err, "unreadable tasks document; starting fresh");
                (Vec::new(), true)
            }
        };

        let lists = match storage.load_lists() {
            Ok(Some(lists)) => lists,
            Ok(None) => list::default_lists(now),
            Err(err) => {
                warn!(error = %err, "unreadable lists document; using defaults");
                list::default_lists(now)
            }
        };

        let settings = match storage.load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(err) => {
                warn!(error = %err, "unreadable settings document; using defaults");
                Settings::default()
            }
        };

        let theme = match storage.load_theme() {
            Ok(Some(theme)) => theme,
            Ok(None) => Theme::default(),
            Err(err) => {
                warn!(error = %err, "unreadable theme; using light");
                Theme::default()
            }
        };

        let mut store = Self {
            storage,
            tasks,
            lists,
            settings,
            theme,
        };
        store.ensure_inbox(now);
        store.repair_list_references();

        if first_run {
            debug!("no tasks on disk; seeding sample data");
            store.tasks = sample_tasks(now);
            store.persist_tasks();
        }

        store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Accepts a full UUID or a unique prefix of the hyphen-free form.
    /// No match is `Ok(None)`, not an error.
    pub fn resolve_task_id(&self, raw: &str) -> anyhow::Result<Option<Uuid>> {
        if let Ok(id) = Uuid::parse_str(raw.trim()) {
            return Ok(Some(id));
        }

        let needle = raw.trim().to_lowercase().replace('-', "");
        if needle.is_empty() {
            return Ok(None);
        }

        let mut hits = self
            .tasks
            .iter()
            .map(|task| task.id)
            .filter(|id| id.simple().to_string().starts_with(&needle));
        let Some(first) = hits.next() else {
            return Ok(None);
        };
        if hits.next().is_some() {
            return Err(anyhow!("task id `{raw}` is ambiguous"));
        }
        Ok(Some(first))
    }

    // Exact id match first, then a unique case-insensitive name match.
    pub fn resolve_list_id(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if self.lists.iter().any(|l| l.id == trimmed) {
            return Some(trimmed.to_string());
        }

        let lower = trimmed.to_lowercase();
        let mut hits = self.lists.iter().filter(|l| l.name.to_lowercase() == lower);
        let first = hits.next()?;
        if hits.next().is_some() {
            return None;
        }
        Some(first.id.clone())
    }

    #[instrument(skip(self, draft, now))]
    pub fn create_task(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> anyhow::Result<Task> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(anyhow!("task title is required"));
        }

        let list = match draft.list {
            Some(raw) => self.resolve_list_target(&raw)?,
            None => INBOX.to_string(),
        };

        let mut tags = draft.tags;
        task::clamp_tags(&mut tags);

        let task = Task {
            id: Uuid::new_v4(),
            title,
            description: draft.description.trim().to_string(),
            completed: false,
            due_date: draft.due_date,
            priority: draft.priority,
            list,
            tags,
            created_at: now,
            updated_at: now,
            order: self.tasks.len() as u64,
        };

        // Most-recent-first: new tasks go to the front.
        self.tasks.insert(0, task.clone());
        self.persist_tasks();
        info!(id = %task.id, "created task");
        Ok(task)
    }

    /// Unknown id is a silent no-op (`Ok(None)`). Validation failures
    /// abort before anything is touched.
    #[instrument(skip(self, patch, now), fields(id = %id))]
    pub fn update_task(
        &mut self,
        id: Uuid,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Task>> {
        let Some(idx) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("no task matched update");
            return Ok(None);
        };

        let title = match patch.title {
            Some(raw) => {
                let trimmed = raw.trim().to_string();
                if trimmed.is_empty() {
                    return Err(anyhow!("task title is required"));
                }
                Some(trimmed)
            }
            None => None,
        };

        let list = match patch.list {
            Some(raw) => Some(self.resolve_list_target(&raw)?),
            None => None,
        };

        let mut tags = patch.tags;
        if let Some(tags) = tags.as_mut() {
            task::clamp_tags(tags);
        }

        let task = &mut self.tasks[idx];
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description.trim().to_string();
        }
        if let Some(due) = patch.due_date {
            task.due_date = due;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(list) = list {
            task.list = list;
        }
        if let Some(tags) = tags {
            task.tags = tags;
        }
        task.updated_at = now;

        let updated = task.clone();
        self.persist_tasks();
        info!("updated task");
        Ok(Some(updated))
    }

    #[instrument(skip(self), fields(id = %id))]
    pub fn delete_task(&mut self, id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            debug!("no task matched delete");
            return false;
        }
        self.persist_tasks();
        info!("deleted task");
        true
    }

    #[instrument(skip(self, now), fields(id = %id))]
    pub fn toggle_completion(&mut self, id: Uuid, now: DateTime<Utc>) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.completed = !task.completed;
        task.updated_at = now;
        let toggled = task.clone();
        self.persist_tasks();
        info!(completed = toggled.completed, "toggled task");
        Some(toggled)
    }

    #[instrument(skip(self, now))]
    pub fn create_list(
        &mut self,
        name: &str,
        color: Option<String>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<TaskList> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(anyhow!("list name is required"));
        }

        let color = color.unwrap_or_else(|| "#3b82f6".to_string());
        if !list::is_hex_color(&color) {
            return Err(anyhow!("invalid list color: {color} (expected #rrggbb)"));
        }

        let created = TaskList {
            id: Uuid::new_v4().simple().to_string(),
            name,
            color,
            order: self.lists.len() as u64,
            created_at: now,
        };

        self.lists.push(created.clone());
        self.persist_lists();
        info!(id = %created.id, "created list");
        Ok(created)
    }

    /// Reserved ids always fail; an unknown id is a no-op. Member tasks
    /// move to the inbox before the list goes away.
    #[instrument(skip(self))]
    pub fn delete_list(&mut self, id: &str) -> anyhow::Result<bool> {
        if list::is_reserved(id) {
            return Err(anyhow!("cannot delete built-in list `{id}`"));
        }

        let Some(idx) = self.lists.iter().position(|l| l.id == id) else {
            debug!("no list matched delete");
            return Ok(false);
        };

        let mut moved = 0usize;
        for task in &mut self.tasks {
            if task.list == id {
                task.list = INBOX.to_string();
                moved += 1;
            }
        }

        self.lists.remove(idx);
        self.persist_lists();
        self.persist_tasks();
        info!(moved, "deleted list");
        Ok(true)
    }

    pub fn query(&self, query: &TaskQuery, today: NaiveDate) -> Vec<Task> {
        query.apply(&self.tasks, today)
    }

    pub fn set_setting(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.settings.set_key(key, value)?;
        self.persist_settings();
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        if let Err(err) = self.storage.save_theme(theme) {
            warn!(error = %err, "failed to persist theme; continuing with in-memory state");
        }
    }

    /// Back to the first-run state: documents removed, samples reseeded,
    /// defaults restored.
    #[instrument(skip(self, now))]
    pub fn clear_all(&mut self, now: DateTime<Utc>) {
        if let Err(err) = self.storage.clear() {
            warn!(error = %err, "failed to clear persisted documents");
        }
        self.tasks = sample_tasks(now);
        self.lists = list::default_lists(now);
        self.settings = Settings::default();
        self.persist_tasks();
        info!("cleared all data");
    }

    pub fn export(&self, now: DateTime<Utc>) -> BackupDocument {
        BackupDocument {
            tasks: self.tasks.clone(),
            lists: self.lists.clone(),
            settings: self.settings.clone(),
            export_date: Some(now),
            version: FORMAT_VERSION.to_string(),
        }
    }

    /// All-or-nothing replacement; the document was validated before we
    /// get here. Dangling list references are repaired to the inbox.
    #[instrument(skip(self, doc, now))]
    pub fn import(&mut self, doc: BackupDocument, now: DateTime<Utc>) {
        self.tasks = doc.tasks;
        self.lists = doc.lists;
        self.settings = doc.settings;
        self.ensure_inbox(now);
        self.repair_list_references();
        self.persist_tasks();
        self.persist_lists();
        self.persist_settings();
        info!(
            tasks = self.tasks.len(),
            lists = self.lists.len(),
            "imported backup"
        );
    }

    /// A task may only target the inbox or a stored list; the virtual
    /// views are not assignable.
    fn resolve_list_target(&self, raw: &str) -> anyhow::Result<String> {
        let id = raw.trim();
        if id == INBOX {
            return Ok(id.to_string());
        }
        if list::is_reserved(id) {
            return Err(anyhow!("cannot assign tasks to the virtual list `{id}`"));
        }
        if self.lists.iter().any(|l| l.id == id) {
            return Ok(id.to_string());
        }
        Err(anyhow!("unknown list: {id}"))
    }

    fn ensure_inbox(&mut self, now: DateTime<Utc>) {
        if !self.lists.iter().any(|l| l.id == INBOX) {
            warn!("inbox list missing; restoring it");
            self.lists.insert(0, list::inbox_list(now));
        }
    }

    fn repair_list_references(&mut self) {
        let known: HashSet<&str> = self.lists.iter().map(|l| l.id.as_str()).collect();
        let mut repaired = 0usize;
        for task in &mut self.tasks {
            if !known.contains(task.list.as_str()) {
                task.list = INBOX.to_string();
                repaired += 1;
            }
        }

        if repaired > 0 {
            warn!(repaired, "reassigned tasks with dangling list references to inbox");
            self.persist_tasks();
        }
    }

    fn persist_tasks(&self) {
        if let Err(err) = self.storage.save_tasks(&self.tasks) {
            warn!(error = %err, "failed to persist tasks; continuing with in-memory state");
        }
    }

    fn persist_lists(&self) {
        if let Err(err) = self.storage.save_lists(&self.lists) {
            warn!(error = %err, "failed to persist lists; continuing with in-memory state");
        }
    }

    fn persist_settings(&self) {
        if let Err(err) = self.storage.save_settings(&self.settings) {
            warn!(error = %err, "failed to persist settings; continuing with in-memory state");
        }
    }
}

fn sample_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let mut welcome = Task::new("Welcome to Cleat".to_string(), INBOX.to_string(), now, 0);
    welcome.description = "This is your first task. Edit it or mark it as complete.".to_string();
    welcome.tags = vec!["welcome".to_string(), "getting-started".to_string()];

    let mut lists = Task::new(
        "Create your first custom list".to_string(),
        INBOX.to_string(),
        now,
        1,
    );
    lists.description =
        "Group tasks into lists for different projects or areas of your life.".to_string();
    lists.due_date = Some(now + Duration::days(1));
    lists.priority = Priority::High;
    lists.tags = vec!["tutorial".to_string(), "organization".to_string()];

    let mut features = Task::new(
        "Explore task features".to_string(),
        INBOX.to_string(),
        now,
        2,
    );
    features.description = "Try due dates, priorities and tags on your tasks.".to_string();
    features.completed = true;
    features.priority = Priority::Low;
    features.tags = vec!["tutorial".to_string(), "features".to_string()];

    vec![welcome, lists, features]
}
