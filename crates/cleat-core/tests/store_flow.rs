use std::path::Path;

use chrono::{Duration, Utc};
use cleat_core::list::RESERVED_LIST_IDS;
use cleat_core::settings::Theme;
use cleat_core::storage::Storage;
use cleat_core::store::{Store, TaskDraft, TaskPatch};
use cleat_core::task::Priority;
use tempfile::tempdir;

fn open_store(dir: &Path) -> Store {
    let storage = Storage::open(dir).expect("open storage");
    Store::open(storage, Utc::now())
}

/// First-run seeding gets in the way of most tests; persisting an empty
/// tasks document first gives a store with no tasks.
fn open_empty_store(dir: &Path) -> Store {
    let storage = Storage::open(dir).expect("open storage");
    storage.save_tasks(&[]).expect("persist empty tasks");
    open_store(dir)
}

#[test]
fn first_run_seeds_sample_data() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());

    assert_eq!(store.tasks().len(), 3);
    assert_eq!(store.tasks().iter().filter(|t| t.completed).count(), 1);

    let list_ids: Vec<&str> = store.lists().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(list_ids, vec!["inbox", "work", "personal"]);

    // The seed is persisted, not recreated on every launch.
    let reopened = open_store(temp.path());
    assert_eq!(reopened.tasks(), store.tasks());
}

#[test]
fn created_task_lands_first_with_fresh_fields() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();

    let created = store
        .create_task(
            TaskDraft {
                title: "Buy milk".to_string(),
                priority: Priority::Low,
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task");

    assert_eq!(store.tasks().len(), 1);
    assert!(!created.completed);
    assert_eq!(created.list, "inbox");
    assert_eq!(created.order, 0);
    assert_eq!(created.created_at, created.updated_at);

    let later = store
        .create_task(
            TaskDraft {
                title: "Walk the dog".to_string(),
                ..TaskDraft::default()
            },
            now + Duration::seconds(1),
        )
        .expect("create second task");

    // Most-recent-first, both in memory and after reload.
    assert_eq!(store.tasks()[0].id, later.id);
    let reopened = open_store(temp.path());
    assert_eq!(reopened.tasks()[0].id, later.id);
}

#[test]
fn empty_title_is_rejected_without_state_change() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());

    let result = store.create_task(
        TaskDraft {
            title: "   ".to_string(),
            ..TaskDraft::default()
        },
        Utc::now(),
    );

    assert!(result.is_err());
    assert!(store.tasks().is_empty());
}

#[test]
fn tags_are_clamped_to_five() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();

    let many: Vec<String> = (0..7).map(|n| format!("tag{n}")).collect();
    let created = store
        .create_task(
            TaskDraft {
                title: "Tagged".to_string(),
                tags: many.clone(),
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task");
    assert_eq!(created.tags.len(), 5);

    let updated = store
        .update_task(
            created.id,
            TaskPatch {
                tags: Some(many),
                ..TaskPatch::default()
            },
            now + Duration::seconds(1),
        )
        .expect("update task")
        .expect("task exists");
    assert_eq!(updated.tags.len(), 5);
}

#[test]
fn tasks_cannot_target_unknown_or_virtual_lists() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());

    for target in ["nope", "today", "important", "completed"] {
        let result = store.create_task(
            TaskDraft {
                title: "Misfiled".to_string(),
                list: Some(target.to_string()),
                ..TaskDraft::default()
            },
            Utc::now(),
        );
        assert!(result.is_err(), "list `{target}` should be rejected");
    }
    assert!(store.tasks().is_empty());
}

#[test]
fn update_patches_fields_and_refreshes_updated_at() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();

    let created = store
        .create_task(
            TaskDraft {
                title: "Draft".to_string(),
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task");

    let later = now + Duration::seconds(5);
    let updated = store
        .update_task(
            created.id,
            TaskPatch {
                title: Some("Final".to_string()),
                priority: Some(Priority::High),
                ..TaskPatch::default()
            },
            later,
        )
        .expect("update task")
        .expect("task exists");

    assert_eq!(updated.title, "Final");
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.updated_at, later);
    assert_eq!(updated.created_at, now);
}

#[test]
fn update_and_delete_on_unknown_id_are_noops() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());

    let ghost = uuid::Uuid::new_v4();
    let updated = store
        .update_task(
            ghost,
            TaskPatch {
                title: Some("Ghost".to_string()),
                ..TaskPatch::default()
            },
            Utc::now(),
        )
        .expect("update should not error");
    assert!(updated.is_none());
    assert!(!store.delete_task(ghost));
    assert!(store.tasks().is_empty());
}

#[test]
fn toggle_flips_completion_both_ways() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();

    let created = store
        .create_task(
            TaskDraft {
                title: "Flip me".to_string(),
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task");

    let toggled = store
        .toggle_completion(created.id, now + Duration::seconds(1))
        .expect("task exists");
    assert!(toggled.completed);

    let toggled = store
        .toggle_completion(created.id, now + Duration::seconds(2))
        .expect("task exists");
    assert!(!toggled.completed);
}

#[test]
fn deleted_task_stays_gone_after_reload() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());

    let created = store
        .create_task(
            TaskDraft {
                title: "Short-lived".to_string(),
                ..TaskDraft::default()
            },
            Utc::now(),
        )
        .expect("create task");

    assert!(store.delete_task(created.id));
    assert!(store.tasks().is_empty());

    let reopened = open_store(temp.path());
    assert!(reopened.tasks().is_empty());
}

#[test]
fn reserved_lists_cannot_be_deleted() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_store(temp.path());
    let before = store.lists().len();

    for id in RESERVED_LIST_IDS {
        assert!(store.delete_list(id).is_err(), "`{id}` should be rejected");
    }
    assert_eq!(store.lists().len(), before);
}

#[test]
fn deleting_a_list_moves_its_tasks_to_inbox() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();

    let errands = store
        .create_list("Errands", None, now)
        .expect("create list");

    for title in ["Post office", "Bank"] {
        store
            .create_task(
                TaskDraft {
                    title: title.to_string(),
                    list: Some(errands.id.clone()),
                    ..TaskDraft::default()
                },
                now,
            )
            .expect("create task");
    }
    store
        .create_task(
            TaskDraft {
                title: "Already home".to_string(),
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task");

    assert!(store.delete_list(&errands.id).expect("delete list"));

    assert!(store.tasks().iter().all(|t| t.list != errands.id));
    assert_eq!(store.tasks().iter().filter(|t| t.list == "inbox").count(), 3);
    assert!(store.lists().iter().all(|l| l.id != errands.id));

    // An id that never existed is a quiet no-op.
    assert!(!store.delete_list("missing").expect("delete unknown list"));
}

#[test]
fn create_list_requires_a_name_and_valid_color() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();

    assert!(store.create_list("  ", None, now).is_err());
    assert!(
        store
            .create_list("Loud", Some("red".to_string()), now)
            .is_err()
    );
    assert_eq!(store.lists().len(), 3);

    let created = store
        .create_list("Quiet", Some("#10b981".to_string()), now)
        .expect("create list");
    assert_eq!(created.order, 3);
}

#[test]
fn partial_settings_document_merges_under_defaults() {
    let temp = tempdir().expect("tempdir");
    std::fs::write(temp.path().join("settings.json"), r#"{"theme":"dark"}"#)
        .expect("write settings");

    let store = open_store(temp.path());
    assert_eq!(store.settings().theme, Theme::Dark);
    assert!(store.settings().notifications);
    assert_eq!(store.settings().language, "en");
    assert_eq!(store.settings().start_of_week, 0);
}

#[test]
fn corrupt_documents_degrade_to_defaults() {
    let temp = tempdir().expect("tempdir");
    std::fs::write(temp.path().join("tasks.json"), "{definitely not json")
        .expect("write garbage");
    std::fs::write(temp.path().join("lists.json"), "[{]").expect("write garbage");

    let store = open_store(temp.path());
    // Unreadable tasks mean first-run seeding; lists fall back to the
    // built-in three.
    assert_eq!(store.tasks().len(), 3);
    assert_eq!(store.lists().len(), 3);
}

#[test]
fn theme_round_trips_through_storage() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_store(temp.path());
    assert_eq!(store.theme(), Theme::Light);

    store.set_theme(Theme::Dark);
    let reopened = open_store(temp.path());
    assert_eq!(reopened.theme(), Theme::Dark);
}

#[test]
fn set_setting_validates_and_persists() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_store(temp.path());

    store.set_setting("theme", "dark").expect("set theme");
    store.set_setting("startOfWeek", "1").expect("set start of week");
    assert!(store.set_setting("startOfWeek", "9").is_err());
    assert!(store.set_setting("bogus", "1").is_err());

    let reopened = open_store(temp.path());
    assert_eq!(reopened.settings().theme, Theme::Dark);
    assert_eq!(reopened.settings().start_of_week, 1);
}

#[test]
fn clear_all_returns_to_first_run_state() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();

    store
        .create_list("Scratch", None, now)
        .expect("create list");
    store
        .create_task(
            TaskDraft {
                title: "Doomed".to_string(),
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task");
    store.set_setting("theme", "dark").expect("set theme");

    store.clear_all(now);

    assert_eq!(store.tasks().len(), 3);
    assert_eq!(store.lists().len(), 3);
    assert_eq!(store.settings().theme, Theme::Light);
}
