use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::anyhow;
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

const TIMEZONE_ENV_VAR: &str = "CLEAT_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str = "CLEAT_TIME_CONFIG";
const TIMEZONE_CONFIG_FILE: &str = "cleat-time.toml";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
    timezone: Option<String>,
    time: Option<TimezoneSection>,
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
    timezone: Option<String>,
}

/// The timezone all calendar math ("today", "overdue") is anchored to.
/// Resolved once per process: env var, then config file, then UTC.
pub fn project_timezone() -> &'static Tz {
    static PROJECT_TZ: OnceLock<Tz> = OnceLock::new();
    PROJECT_TZ.get_or_init(resolve_project_timezone)
}

#[must_use]
pub fn to_project_date(dt: DateTime<Utc>) -> NaiveDate {
    dt.with_timezone(project_timezone()).date_naive()
}

/// Midnight of `date` in the project timezone, expressed in UTC.
#[must_use]
pub fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match project_timezone().from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

/// Undated is never today.
#[must_use]
pub fn is_due_today(due: Option<DateTime<Utc>>, today: NaiveDate) -> bool {
    due.map(|dt| to_project_date(dt) == today).unwrap_or(false)
}

/// Strictly before the start of the current calendar day. Undated is
/// never overdue; whether the task is completed is the caller's concern.
#[must_use]
pub fn is_overdue(due: Option<DateTime<Utc>>, today: NaiveDate) -> bool {
    due.map(|dt| to_project_date(dt) < today).unwrap_or(false)
}

/// Accepts `today`, `tomorrow` or a plain `YYYY-MM-DD` date and returns
/// the corresponding start-of-day instant.
pub fn parse_due(raw: &str, today: NaiveDate) -> anyhow::Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "today" => Ok(start_of_day_utc(today)),
        "tomorrow" => Ok(start_of_day_utc(today + Duration::days(1))),
        _ => {
            let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
                anyhow!("invalid due date: {trimmed} (expected YYYY-MM-DD, today or tomorrow)")
            })?;
            Ok(start_of_day_utc(date))
        }
    }
}

#[must_use]
pub fn format_due_date(due: DateTime<Utc>, today: NaiveDate) -> String {
    let date = to_project_date(due);
    if date == today {
        return "Today".to_string();
    }
    if date == today + Duration::days(1) {
        return "Tomorrow".to_string();
    }
    if date > today && date <= today + Duration::days(7) {
        return date.format("%A").to_string();
    }
    if date.year() == today.year() {
        date.format("%b %-d").to_string()
    } else {
        date.format("%b %-d, %Y").to_string()
    }
}

#[must_use]
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.with_timezone(project_timezone())
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn resolve_project_timezone() -> Tz {
    if let Ok(raw) = std::env::var(TIMEZONE_ENV_VAR)
        && let Some(tz) = parse_timezone(&raw, TIMEZONE_ENV_VAR)
    {
        return tz;
    }

    if let Some(path) = timezone_config_path()
        && let Some(tz) = load_timezone_from_file(&path)
    {
        return tz;
    }

    chrono_tz::UTC
}

fn timezone_config_path() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var(TIMEZONE_CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(TIMEZONE_CONFIG_FILE))
}

fn load_timezone_from_file(path: &PathBuf) -> Option<Tz> {
    if !path.exists() {
        return None;
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(
                file = %path.display(),
                error = %err,
                "failed reading timezone config file"
            );
            return None;
        }
    };

    let parsed = match toml::from_str::<TimezoneConfig>(&raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(
                file = %path.display(),
                error = %err,
                "failed parsing timezone config file"
            );
            return None;
        }
    };

    let name = parsed
        .timezone
        .or(parsed.time.and_then(|section| section.timezone))?;
    parse_timezone(&name, TIMEZONE_CONFIG_FILE)
}

fn parse_timezone(raw: &str, origin: &str) -> Option<Tz> {
    match raw.trim().parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(err) => {
            tracing::warn!(origin, timezone = %raw, error = %err, "ignoring invalid timezone");
            None
        }
    }
}
