use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::{format_due_date, format_timestamp, is_due_today, is_overdue};
use crate::list::TaskList;
use crate::settings::{Settings, Theme};
use crate::task::Task;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, tasks, lists, today))]
    pub fn print_task_table(
        &mut self,
        tasks: &[Task],
        lists: &[TaskList],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if tasks.is_empty() {
            writeln!(out, "No matching tasks.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Done".to_string(),
            "Pri".to_string(),
            "Due".to_string(),
            "List".to_string(),
            "Title".to_string(),
            "Tags".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());

        for task in tasks {
            let id = self.paint(&task.short_id(), "33");
            let done = if task.completed { "x" } else { "" }.to_string();

            let due = match task.due_date {
                Some(date) => {
                    let text = format_due_date(date, today);
                    if is_overdue(task.due_date, today) && !task.completed {
                        self.paint(&text, "31")
                    } else if is_due_today(task.due_date, today) {
                        self.paint(&text, "33")
                    } else {
                        text
                    }
                }
                None => String::new(),
            };

            let list = list_name(lists, &task.list);
            let tags = task
                .tags
                .iter()
                .map(|tag| format!("+{tag}"))
                .collect::<Vec<_>>()
                .join(" ");

            rows.push(vec![
                id,
                done,
                task.priority.as_str().to_string(),
                due,
                list,
                task.title.clone(),
                tags,
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task, lists, today))]
    pub fn print_task_info(
        &mut self,
        task: &Task,
        lists: &[TaskList],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "title     {}", task.title)?;
        writeln!(
            out,
            "status    {}",
            if task.completed { "completed" } else { "active" }
        )?;
        writeln!(out, "priority  {}", task.priority.as_str())?;
        writeln!(out, "list      {}", list_name(lists, &task.list))?;
        if let Some(due) = task.due_date {
            writeln!(out, "due       {}", format_due_date(due, today))?;
        }
        if !task.tags.is_empty() {
            writeln!(out, "tags      {}", task.tags.join(", "))?;
        }
        writeln!(out, "created   {}", format_timestamp(task.created_at))?;
        writeln!(out, "updated   {}", format_timestamp(task.updated_at))?;
        if !task.description.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", task.description)?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, lists, tasks))]
    pub fn print_list_table(&mut self, lists: &[TaskList], tasks: &[Task]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Name".to_string(),
            "Color".to_string(),
            "Tasks".to_string(),
        ];

        let mut rows = Vec::with_capacity(lists.len());
        for list in lists {
            let count = tasks.iter().filter(|task| task.list == list.id).count();
            rows.push(vec![
                self.paint(&short_list_id(&list.id), "33"),
                list.name.clone(),
                list.color.clone(),
                count.to_string(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, settings, theme))]
    pub fn print_settings(&mut self, settings: &Settings, theme: Theme) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "theme          {}", settings.theme.as_str())?;
        writeln!(out, "notifications  {}", settings.notifications)?;
        writeln!(out, "sound          {}", settings.sound)?;
        writeln!(out, "autoBackup     {}", settings.auto_backup)?;
        writeln!(out, "language       {}", settings.language)?;
        writeln!(out, "dateFormat     {}", settings.date_format)?;
        writeln!(out, "startOfWeek    {}", settings.start_of_week)?;
        writeln!(out)?;
        writeln!(out, "active theme   {}", theme.as_str())?;

        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn list_name(lists: &[TaskList], id: &str) -> String {
    lists
        .iter()
        .find(|l| l.id == id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// User-created lists carry UUID ids; the built-ins keep their short
/// names.
fn short_list_id(id: &str) -> String {
    if id.len() > 8 && id.chars().all(|c| c.is_ascii_hexdigit()) {
        id[..8].to_string()
    } else {
        id.to_string()
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
