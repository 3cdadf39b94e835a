use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "cleat",
    version,
    about = "Cleat: a local-first personal task tracker",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Path to an alternate rc file.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory override.
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    Add(AddArgs),
    /// Change fields of an existing task
    Modify(ModifyArgs),
    /// Toggle a task between completed and active
    Done {
        /// Task id (full or short form)
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task id (full or short form)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// List tasks (the default command)
    List(ListArgs),
    /// Show one task in full
    Info {
        /// Task id (full or short form)
        id: String,
    },
    /// Show or manage lists
    Lists {
        #[command(subcommand)]
        command: Option<ListsCommand>,
    },
    /// Show settings, or change one with `config set`
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
    /// Show or switch the color theme
    Theme {
        /// `light` or `dark`; omit to print the current theme
        theme: Option<String>,
    },
    /// Write a backup document to a file, or stdout when omitted
    Export { path: Option<PathBuf> },
    /// Replace all state from a backup document (`-` reads stdin)
    Import { path: PathBuf },
    /// Erase everything and return to the first-run state
    Clear {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct AddArgs {
    /// Task title
    #[arg(required = true)]
    pub title: Vec<String>,

    #[arg(long = "desc")]
    pub description: Option<String>,

    /// YYYY-MM-DD, `today` or `tomorrow`
    #[arg(long)]
    pub due: Option<String>,

    /// low, medium or high
    #[arg(long)]
    pub priority: Option<String>,

    /// Target list (id or name); defaults to the inbox
    #[arg(long)]
    pub list: Option<String>,

    /// May be repeated or comma-separated; at most five are kept
    #[arg(long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct ModifyArgs {
    /// Task id (full or short form)
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long = "desc")]
    pub description: Option<String>,

    /// YYYY-MM-DD, `today` or `tomorrow`
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,

    /// Remove the due date
    #[arg(long = "clear-due")]
    pub clear_due: bool,

    /// low, medium or high
    #[arg(long)]
    pub priority: Option<String>,

    /// Target list (id or name)
    #[arg(long)]
    pub list: Option<String>,

    /// Replaces the existing tags
    #[arg(long = "tag", action = ArgAction::Append, conflicts_with = "clear_tags")]
    pub tags: Vec<String>,

    /// Remove all tags
    #[arg(long = "clear-tags")]
    pub clear_tags: bool,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// all, today, important, completed, or a list id/name
    #[arg(long)]
    pub list: Option<String>,

    /// all, active or completed
    #[arg(long)]
    pub status: Option<String>,

    /// newest, oldest, priority, due or title
    #[arg(long)]
    pub sort: Option<String>,

    /// Case-insensitive substring over title, description and tags
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ListsCommand {
    /// Create a new list
    Add {
        #[arg(required = true)]
        name: Vec<String>,
        /// Hex color like #3b82f6
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a list; its tasks move to the inbox
    Delete {
        /// List id or name
        id: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Change one setting, e.g. `config set theme dark`
    Set { key: String, value: String },
}

/// What runs when no subcommand is given, controlled by the
/// `default.command` rc key.
pub fn default_command(cfg: &Config) -> Command {
    match cfg.get("default.command").as_deref() {
        Some("lists") => Command::Lists { command: None },
        Some("list") | None => Command::List(ListArgs::default()),
        Some(other) => {
            debug!(command = %other, "unsupported default.command; falling back to list");
            Command::List(ListArgs::default())
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
