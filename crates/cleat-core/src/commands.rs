use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument};

use crate::backup;
use crate::cli::{AddArgs, Command, ConfigCommand, ListArgs, ListsCommand, ModifyArgs};
use crate::datetime;
use crate::filter::{ListSelection, SortKey, StatusFilter, TaskQuery};
use crate::list;
use crate::render::Renderer;
use crate::settings::Theme;
use crate::store::{Store, TaskDraft, TaskPatch};
use crate::task::{self, Priority};

#[instrument(skip(store, renderer, command))]
pub fn dispatch(store: &mut Store, renderer: &mut Renderer, command: Command) -> anyhow::Result<()> {
    let now = Utc::now();
    let today = datetime::to_project_date(now);
    debug!(?command, "dispatching command");

    match command {
        Command::Add(args) => cmd_add(store, args, now, today),
        Command::Modify(args) => cmd_modify(store, args, now, today),
        Command::Done { id } => cmd_done(store, &id, now),
        Command::Delete { id, yes } => cmd_delete(store, &id, yes),
        Command::List(args) => cmd_list(store, renderer, args, today),
        Command::Info { id } => cmd_info(store, renderer, &id, today),
        Command::Lists { command } => cmd_lists(store, renderer, command, now),
        Command::Config { command } => cmd_config(store, renderer, command),
        Command::Theme { theme } => cmd_theme(store, theme),
        Command::Export { path } => cmd_export(store, path.as_deref(), now),
        Command::Import { path } => cmd_import(store, &path, now),
        Command::Clear { yes } => cmd_clear(store, yes, now),
    }
}

#[instrument(skip(store, args, now, today))]
fn cmd_add(
    store: &mut Store,
    args: AddArgs,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command add");

    let due_date = args
        .due
        .as_deref()
        .map(|raw| datetime::parse_due(raw, today))
        .transpose()?;
    let priority = args
        .priority
        .as_deref()
        .map(Priority::parse)
        .transpose()?
        .unwrap_or_default();
    let list = args
        .list
        .map(|raw| store.resolve_list_id(&raw).unwrap_or(raw));

    let draft = TaskDraft {
        title: args.title.join(" "),
        description: args.description.unwrap_or_default(),
        due_date,
        priority,
        list,
        tags: collect_tags(&args.tags),
    };

    let created = store.create_task(draft, now)?;
    println!("Created task {}.", created.short_id());
    Ok(())
}

#[instrument(skip(store, args, now, today))]
fn cmd_modify(
    store: &mut Store,
    args: ModifyArgs,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command modify");

    let due_date = if args.clear_due {
        Some(None)
    } else {
        args.due
            .as_deref()
            .map(|raw| datetime::parse_due(raw, today))
            .transpose()?
            .map(Some)
    };
    let priority = args.priority.as_deref().map(Priority::parse).transpose()?;
    let list = args
        .list
        .map(|raw| store.resolve_list_id(&raw).unwrap_or(raw));
    let tags = if args.clear_tags {
        Some(vec![])
    } else if args.tags.is_empty() {
        None
    } else {
        Some(collect_tags(&args.tags))
    };

    let patch = TaskPatch {
        title: args.title,
        description: args.description,
        due_date,
        priority,
        list,
        tags,
    };

    if patch.title.is_none()
        && patch.description.is_none()
        && patch.due_date.is_none()
        && patch.priority.is_none()
        && patch.list.is_none()
        && patch.tags.is_none()
    {
        return Err(anyhow!("modify requires at least one field to change"));
    }

    let Some(id) = store.resolve_task_id(&args.id)? else {
        println!("No matching task.");
        return Ok(());
    };

    match store.update_task(id, patch, now)? {
        Some(task) => println!("Modified task {}.", task.short_id()),
        None => println!("No matching task."),
    }
    Ok(())
}

#[instrument(skip(store, now))]
fn cmd_done(store: &mut Store, raw_id: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command done");

    let Some(id) = store.resolve_task_id(raw_id)? else {
        println!("No matching task.");
        return Ok(());
    };

    match store.toggle_completion(id, now) {
        Some(task) if task.completed => println!("Completed task {}.", task.short_id()),
        Some(task) => println!("Marked task {} active.", task.short_id()),
        None => println!("No matching task."),
    }
    Ok(())
}

#[instrument(skip(store))]
fn cmd_delete(store: &mut Store, raw_id: &str, yes: bool) -> anyhow::Result<()> {
    info!("command delete");

    let Some(id) = store.resolve_task_id(raw_id)? else {
        println!("No matching task.");
        return Ok(());
    };
    let Some(title) = store.task(id).map(|task| task.title.clone()) else {
        println!("No matching task.");
        return Ok(());
    };

    if !yes && !confirm(&format!("Delete task \"{title}\"? This cannot be undone."))? {
        println!("Cancelled; nothing deleted.");
        return Ok(());
    }

    if store.delete_task(id) {
        println!("Deleted task.");
    } else {
        println!("No matching task.");
    }
    Ok(())
}

#[instrument(skip(store, renderer, args, today))]
fn cmd_list(
    store: &mut Store,
    renderer: &mut Renderer,
    args: ListArgs,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command list");

    let list = match args.list {
        None => ListSelection::All,
        Some(raw) => match ListSelection::parse(&raw) {
            ListSelection::List(id) => {
                ListSelection::List(store.resolve_list_id(&id).unwrap_or(id))
            }
            selection => selection,
        },
    };
    let status = args
        .status
        .as_deref()
        .map(StatusFilter::parse)
        .transpose()?
        .unwrap_or_default();
    let sort = args
        .sort
        .as_deref()
        .map(SortKey::parse)
        .transpose()?
        .unwrap_or_default();

    let query = TaskQuery {
        search: args.search,
        list,
        status,
        sort,
    };

    let rows = store.query(&query, today);
    renderer.print_task_table(&rows, store.lists(), today)?;
    Ok(())
}

#[instrument(skip(store, renderer, today))]
fn cmd_info(
    store: &mut Store,
    renderer: &mut Renderer,
    raw_id: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command info");

    let Some(id) = store.resolve_task_id(raw_id)? else {
        println!("No matching task.");
        return Ok(());
    };
    let Some(task) = store.task(id) else {
        println!("No matching task.");
        return Ok(());
    };

    let task = task.clone();
    renderer.print_task_info(&task, store.lists(), today)?;
    Ok(())
}

#[instrument(skip(store, renderer, command, now))]
fn cmd_lists(
    store: &mut Store,
    renderer: &mut Renderer,
    command: Option<ListsCommand>,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command lists");

    match command {
        None => {
            renderer.print_list_table(store.lists(), store.tasks())?;
        }
        Some(ListsCommand::Add { name, color }) => {
            let created = store.create_list(&name.join(" "), color, now)?;
            println!("Created list {}.", created.name);
        }
        Some(ListsCommand::Delete { id, yes }) => {
            let target = if list::is_reserved(id.trim()) {
                // Passed through unresolved so the store rejects it.
                id.trim().to_string()
            } else {
                match store.resolve_list_id(&id) {
                    Some(target) => target,
                    None => {
                        println!("No matching list.");
                        return Ok(());
                    }
                }
            };

            if !list::is_reserved(&target)
                && !yes
                && !confirm("Delete this list? Its tasks move to the inbox.")?
            {
                println!("Cancelled; nothing deleted.");
                return Ok(());
            }

            if store.delete_list(&target)? {
                println!("Deleted list.");
            } else {
                println!("No matching list.");
            }
        }
    }
    Ok(())
}

#[instrument(skip(store, renderer, command))]
fn cmd_config(
    store: &mut Store,
    renderer: &mut Renderer,
    command: Option<ConfigCommand>,
) -> anyhow::Result<()> {
    info!("command config");

    match command {
        None => renderer.print_settings(store.settings(), store.theme())?,
        Some(ConfigCommand::Set { key, value }) => {
            store.set_setting(&key, &value)?;
            println!("Set {key}.");
        }
    }
    Ok(())
}

#[instrument(skip(store))]
fn cmd_theme(store: &mut Store, theme: Option<String>) -> anyhow::Result<()> {
    info!("command theme");

    match theme {
        None => println!("{}", store.theme().as_str()),
        Some(raw) => {
            let theme = Theme::parse(&raw)?;
            store.set_theme(theme);
            println!("Theme set to {}.", theme.as_str());
        }
    }
    Ok(())
}

#[instrument(skip(store, path, now))]
fn cmd_export(store: &mut Store, path: Option<&Path>, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command export");

    let document = store.export(now);
    let json = document.to_pretty_json()?;

    match path {
        None => println!("{json}"),
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed writing backup to {}", path.display()))?;
            println!("Exported backup to {}.", path.display());
        }
    }
    Ok(())
}

#[instrument(skip(store, path, now))]
fn cmd_import(store: &mut Store, path: &Path, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command import");

    let raw = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed reading stdin")?;
        buffer
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?
    };

    let document = backup::parse_backup(&raw)?;
    let (task_count, list_count) = (document.tasks.len(), document.lists.len());
    store.import(document, now);

    println!("Imported {task_count} task(s) and {list_count} list(s).");
    Ok(())
}

#[instrument(skip(store, now))]
fn cmd_clear(store: &mut Store, yes: bool, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command clear");

    if !yes && !confirm("Delete ALL tasks, lists and settings? This cannot be undone.")? {
        println!("Cancelled; nothing deleted.");
        return Ok(());
    }

    store.clear_all(now);
    println!("All data cleared.");
    Ok(())
}

fn collect_tags(raw: &[String]) -> Vec<String> {
    raw.iter().flat_map(|value| task::parse_tags(value)).collect()
}

/// Interactive yes/no gate for destructive operations. A non-terminal
/// stdin counts as "no" so scripts must pass --yes explicitly.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    let mut stdout = io::stdout();
    write!(stdout, "{prompt} [y/N]: ")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
