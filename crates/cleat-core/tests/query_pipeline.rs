use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use cleat_core::datetime;
use cleat_core::filter::{ListSelection, SortKey, StatusFilter, TaskQuery};
use cleat_core::storage::Storage;
use cleat_core::store::{Store, TaskDraft};
use cleat_core::task::Priority;
use tempfile::tempdir;

fn open_empty_store(dir: &Path) -> Store {
    let storage = Storage::open(dir).expect("open storage");
    storage.save_tasks(&[]).expect("persist empty tasks");
    let storage = Storage::open(dir).expect("reopen storage");
    Store::open(storage, Utc::now())
}

fn add(
    store: &mut Store,
    title: &str,
    priority: Priority,
    due: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> uuid::Uuid {
    store
        .create_task(
            TaskDraft {
                title: title.to_string(),
                priority,
                due_date: due,
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task")
        .id
}

#[test]
fn search_covers_title_description_and_tags() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();
    let today = datetime::to_project_date(now);

    store
        .create_task(
            TaskDraft {
                title: "Water the plants".to_string(),
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task");
    store
        .create_task(
            TaskDraft {
                title: "Chores".to_string(),
                description: "Vacuum the hallway".to_string(),
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task");
    store
        .create_task(
            TaskDraft {
                title: "Misc".to_string(),
                tags: vec!["garden".to_string()],
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create task");

    let query = TaskQuery {
        search: Some("VACUUM".to_string()),
        ..TaskQuery::default()
    };
    let rows = store.query(&query, today);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Chores");

    let query = TaskQuery {
        search: Some("garden".to_string()),
        ..TaskQuery::default()
    };
    assert_eq!(store.query(&query, today).len(), 1);

    let query = TaskQuery {
        search: Some("plants".to_string()),
        ..TaskQuery::default()
    };
    assert_eq!(store.query(&query, today).len(), 1);
}

#[test]
fn today_selection_returns_only_tasks_due_today() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();
    let today = datetime::to_project_date(now);

    let dated = add(&mut store, "Dated", Priority::Medium, Some(now), now);
    add(&mut store, "Undated", Priority::Medium, None, now);

    let query = TaskQuery {
        list: ListSelection::Today,
        ..TaskQuery::default()
    };
    let rows = store.query(&query, today);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, dated);
}

#[test]
fn important_and_completed_selections() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();
    let today = datetime::to_project_date(now);

    let urgent = add(&mut store, "Urgent", Priority::High, None, now);
    let casual = add(&mut store, "Casual", Priority::Low, None, now);
    store.toggle_completion(casual, now).expect("toggle");

    let query = TaskQuery {
        list: ListSelection::Important,
        ..TaskQuery::default()
    };
    let rows = store.query(&query, today);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, urgent);

    let query = TaskQuery {
        list: ListSelection::Completed,
        ..TaskQuery::default()
    };
    let rows = store.query(&query, today);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, casual);
}

#[test]
fn status_filter_splits_active_and_completed() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();
    let today = datetime::to_project_date(now);

    add(&mut store, "Open", Priority::Medium, None, now);
    let done = add(&mut store, "Done", Priority::Medium, None, now);
    store.toggle_completion(done, now).expect("toggle");

    let query = TaskQuery {
        status: StatusFilter::Active,
        ..TaskQuery::default()
    };
    let rows = store.query(&query, today);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Open");

    let query = TaskQuery {
        status: StatusFilter::Completed,
        ..TaskQuery::default()
    };
    let rows = store.query(&query, today);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Done");

    let query = TaskQuery {
        status: StatusFilter::All,
        ..TaskQuery::default()
    };
    assert_eq!(store.query(&query, today).len(), 2);
}

#[test]
fn due_date_sort_places_undated_tasks_last() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();
    let today = datetime::to_project_date(now);

    // Insert undated first and last so position cannot be an accident
    // of input order.
    add(&mut store, "Undated A", Priority::Medium, None, now);
    add(
        &mut store,
        "Next week",
        Priority::Medium,
        Some(now + Duration::days(7)),
        now,
    );
    add(&mut store, "Soon", Priority::Medium, Some(now), now);
    add(&mut store, "Undated B", Priority::Medium, None, now);

    let query = TaskQuery {
        sort: SortKey::DueDate,
        ..TaskQuery::default()
    };
    let rows = store.query(&query, today);

    assert_eq!(rows[0].title, "Soon");
    assert_eq!(rows[1].title, "Next week");
    assert!(rows[2].due_date.is_none());
    assert!(rows[3].due_date.is_none());
}

#[test]
fn priority_sort_breaks_ties_by_newest() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let base = Utc::now();
    let today = datetime::to_project_date(base);

    add(&mut store, "Low old", Priority::Low, None, base);
    add(
        &mut store,
        "High old",
        Priority::High,
        None,
        base + Duration::seconds(1),
    );
    add(
        &mut store,
        "Medium",
        Priority::Medium,
        None,
        base + Duration::seconds(2),
    );
    add(
        &mut store,
        "High new",
        Priority::High,
        None,
        base + Duration::seconds(3),
    );

    let query = TaskQuery {
        sort: SortKey::Priority,
        ..TaskQuery::default()
    };
    let titles: Vec<String> = store
        .query(&query, today)
        .into_iter()
        .map(|t| t.title)
        .collect();

    assert_eq!(titles, vec!["High new", "High old", "Medium", "Low old"]);
}

#[test]
fn title_sort_is_case_insensitive() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();
    let today = datetime::to_project_date(now);

    add(&mut store, "banana", Priority::Medium, None, now);
    add(&mut store, "Apple", Priority::Medium, None, now);
    add(&mut store, "cherry", Priority::Medium, None, now);

    let query = TaskQuery {
        sort: SortKey::Title,
        ..TaskQuery::default()
    };
    let titles: Vec<String> = store
        .query(&query, today)
        .into_iter()
        .map(|t| t.title)
        .collect();

    assert_eq!(titles, vec!["Apple", "banana", "cherry"]);
}

#[test]
fn overdue_is_a_strict_calendar_boundary() {
    let now = Utc::now();
    let today = datetime::to_project_date(now);

    assert!(datetime::is_overdue(Some(now - Duration::days(1)), today));
    assert!(!datetime::is_overdue(Some(now), today));
    assert!(!datetime::is_overdue(Some(now + Duration::days(1)), today));
    assert!(!datetime::is_overdue(None, today));

    assert!(datetime::is_due_today(Some(now), today));
    assert!(!datetime::is_due_today(None, today));
}

#[test]
fn query_never_mutates_the_stored_order() {
    let temp = tempdir().expect("tempdir");
    let mut store = open_empty_store(temp.path());
    let now = Utc::now();
    let today = datetime::to_project_date(now);

    add(&mut store, "apple", Priority::Medium, None, now);
    add(
        &mut store,
        "zebra",
        Priority::Medium,
        None,
        now + Duration::seconds(1),
    );

    let query = TaskQuery {
        sort: SortKey::Title,
        ..TaskQuery::default()
    };
    let rows = store.query(&query, today);
    assert_eq!(rows[0].title, "apple");

    // The collection itself still holds most-recent-first.
    assert_eq!(store.tasks()[0].title, "zebra");
    assert_eq!(store.tasks()[1].title, "apple");
}
