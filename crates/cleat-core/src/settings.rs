use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(anyhow!("invalid theme: {other} (expected light or dark)")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Flat user settings record. The container-level `default` means a
/// partially persisted document merges under these defaults instead of
/// surfacing missing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub notifications: bool,
    pub sound: bool,
    pub auto_backup: bool,
    pub language: String,
    pub date_format: String,
    /// 0 = Sunday, 1 = Monday, ... 6 = Saturday.
    pub start_of_week: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            notifications: true,
            sound: true,
            auto_backup: false,
            language: "en".to_string(),
            date_format: "MM/DD/YYYY".to_string(),
            start_of_week: 0,
        }
    }
}

impl Settings {
    // Keys use the wire spelling, the same one `config` prints.
    pub fn set_key(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "theme" => self.theme = Theme::parse(value)?,
            "notifications" => self.notifications = parse_bool(value)?,
            "sound" => self.sound = parse_bool(value)?,
            "autoBackup" => self.auto_backup = parse_bool(value)?,
            "language" => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(anyhow!("language cannot be empty"));
                }
                self.language = trimmed.to_string();
            }
            "dateFormat" => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(anyhow!("dateFormat cannot be empty"));
                }
                self.date_format = trimmed.to_string();
            }
            "startOfWeek" => {
                let day: u8 = value
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("startOfWeek must be a number between 0 and 6"))?;
                if day > 6 {
                    return Err(anyhow!("startOfWeek must be between 0 and 6"));
                }
                self.start_of_week = day;
            }
            other => {
                return Err(anyhow!(
                    "unknown setting: {other} (expected one of theme, notifications, \
                     sound, autoBackup, language, dateFormat, startOfWeek)"
                ));
            }
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "on" | "true" => Ok(true),
        "0" | "n" | "no" | "off" | "false" => Ok(false),
        other => Err(anyhow!("expected a boolean, got: {other}")),
    }
}
