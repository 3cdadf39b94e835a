use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::list::TaskList;
use crate::settings::{Settings, Theme};
use crate::task::Task;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Four independently keyed documents under one data directory. Loads
/// distinguish "absent" from "unreadable"; the default-substitution
/// policy lives with the caller, not here.
#[derive(Debug)]
pub struct Storage {
    pub data_dir: PathBuf,
    tasks_path: PathBuf,
    lists_path: PathBuf,
    settings_path: PathBuf,
    theme_path: PathBuf,
}

impl Storage {
    #[instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|source| StorageError::Write {
            path: data_dir.clone(),
            source,
        })?;

        info!(data_dir = %data_dir.display(), "opened storage");

        Ok(Self {
            tasks_path: data_dir.join("tasks.json"),
            lists_path: data_dir.join("lists.json"),
            settings_path: data_dir.join("settings.json"),
            theme_path: data_dir.join("theme"),
            data_dir,
        })
    }

    #[instrument(skip(self))]
    pub fn load_tasks(&self) -> Result<Option<Vec<Task>>, StorageError> {
        load_json(&self.tasks_path)
    }

    #[instrument(skip(self, tasks))]
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<(), StorageError> {
        save_json_atomic(&self.tasks_path, &tasks)
    }

    #[instrument(skip(self))]
    pub fn load_lists(&self) -> Result<Option<Vec<TaskList>>, StorageError> {
        load_json(&self.lists_path)
    }

    #[instrument(skip(self, lists))]
    pub fn save_lists(&self, lists: &[TaskList]) -> Result<(), StorageError> {
        save_json_atomic(&self.lists_path, &lists)
    }

    #[instrument(skip(self))]
    pub fn load_settings(&self) -> Result<Option<Settings>, StorageError> {
        load_json(&self.settings_path)
    }

    #[instrument(skip(self, settings))]
    pub fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        save_json_atomic(&self.settings_path, settings)
    }

    /// The theme is a bare string file, not JSON. Unknown contents are
    /// treated as unset rather than corrupt.
    #[instrument(skip(self))]
    pub fn load_theme(&self) -> Result<Option<Theme>, StorageError> {
        if !self.theme_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.theme_path).map_err(|source| StorageError::Read {
            path: self.theme_path.clone(),
            source,
        })?;
        match Theme::parse(&raw) {
            Ok(theme) => Ok(Some(theme)),
            Err(_) => {
                debug!(value = %raw.trim(), "unrecognized theme value; treating as unset");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    pub fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        fs::write(&self.theme_path, theme.as_str()).map_err(|source| StorageError::Write {
            path: self.theme_path.clone(),
            source,
        })
    }

    /// Removes the task, list and settings documents. The theme blob is
    /// left alone, matching the historic clear-all behavior.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), StorageError> {
        for path in [&self.tasks_path, &self.lists_path, &self.settings_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StorageError::Write {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }
        info!("cleared persisted documents");
        Ok(())
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.exists() {
        debug!(file = %path.display(), "document absent");
        return Ok(None);
    }

    let raw = fs::read_to_string(path).map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let value = serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(file = %path.display(), "loaded document");
    Ok(Some(value))
}

fn save_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    debug!(file = %path.display(), "saving document atomically");

    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let serialized = serde_json::to_string(value).map_err(|source| StorageError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(serialized.as_bytes()).map_err(write_err)?;
    temp.flush().map_err(write_err)?;

    temp.persist(path).map_err(|err| StorageError::Write {
        path: path.to_path_buf(),
        source: err.error,
    })?;

    Ok(())
}
