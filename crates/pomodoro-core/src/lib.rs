//! Pomodoro Core Library
//!
//! Provides the session state machine, daily totals storage, snapshot
//! recovery, and reporting for the Pomodoro timer.

pub mod controller;
pub mod export;
pub mod format;
pub mod history;
pub mod recovery;
pub mod report;
pub mod session;

pub use controller::{Controller, Notice};
pub use export::{ExportFormat, Exporter};
pub use history::DailyTotals;
pub use recovery::{RecoveryOutcome, SavedSession};
pub use report::{DailyComparison, Effort};
pub use session::{SessionEvent, SessionState, TransitionError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default work interval length in seconds
pub const WORK_SECONDS: u32 = 25 * 60;
/// Default break interval length in seconds
pub const BREAK_SECONDS: u32 = 10 * 60;

pub const HISTORY_FILE_NAME: &str = "pomodoro_history.json";
pub const STATE_FILE_NAME: &str = "pomodoro_state.json";

/// Errors from reading or writing the two JSON files
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to replace file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Timer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Working,
    OnBreak,
    IdleBreak,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Working => "Working",
            Mode::OnBreak => "On break",
            Mode::IdleBreak => "Idle break",
        }
    }

    /// The mode that follows when an interval runs out
    pub fn flipped(&self) -> Self {
        match self {
            Mode::Working => Mode::OnBreak,
            Mode::OnBreak | Mode::IdleBreak => Mode::Working,
        }
    }

    /// Daily totals bucket that time spent in this mode counts towards
    pub fn category(&self) -> Category {
        match self {
            Mode::Working => Category::Work,
            Mode::OnBreak => Category::Break,
            Mode::IdleBreak => Category::Idle,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Daily totals bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Work,
    Break,
    Idle,
}

/// Seconds spent per category on one calendar date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    #[serde(rename = "work_time", default)]
    pub work_seconds: u64,
    #[serde(rename = "break_time", default)]
    pub break_seconds: u64,
    #[serde(rename = "idle_time", default)]
    pub idle_seconds: u64,
}

impl DailyRecord {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Work => self.work_seconds,
            Category::Break => self.break_seconds,
            Category::Idle => self.idle_seconds,
        }
    }

    pub fn add(&mut self, category: Category, seconds: u64) {
        let slot = match category {
            Category::Work => &mut self.work_seconds,
            Category::Break => &mut self.break_seconds,
            Category::Idle => &mut self.idle_seconds,
        };
        *slot = slot.saturating_add(seconds);
    }

    pub fn total_seconds(&self) -> u64 {
        self.work_seconds + self.break_seconds + self.idle_seconds
    }
}

/// Fixed timing parameters of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub work_seconds: u32,
    pub break_seconds: u32,
    /// An idle break older than this at startup is closed automatically
    pub idle_auto_end_minutes: i64,
    /// Seconds between crash-safety flushes
    pub autosave_every_ticks: u32,
    /// Days shown by the history view
    pub recent_days: usize,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_seconds: WORK_SECONDS,
            break_seconds: BREAK_SECONDS,
            idle_auto_end_minutes: 30,
            autosave_every_ticks: 60,
            recent_days: 7,
        }
    }
}

impl TimerConfig {
    /// Full interval length for a mode (idle breaks have none)
    pub fn duration_of(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Working => self.work_seconds,
            Mode::OnBreak => self.break_seconds,
            Mode::IdleBreak => 0,
        }
    }
}

/// Locations of the history and state files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub history_file: PathBuf,
    pub state_file: PathBuf,
}

impl DataPaths {
    /// Place both files inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            history_file: dir.join(HISTORY_FILE_NAME),
            state_file: dir.join(STATE_FILE_NAME),
        }
    }

    /// Files live next to the running executable
    pub fn resolve() -> Self {
        Self::in_dir(app_dir())
    }
}

/// Directory of the running executable, or the platform data directory
pub fn app_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(data_dir)
}

/// Get the platform data directory for the Pomodoro timer
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "pomodoro", "pomodoro")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".pomodoro"))
}

/// Write `value` as JSON to `path` via a temp file in the same directory
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    use std::io::Write;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    serde_json::to_writer(&mut tmp, value)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flip() {
        assert_eq!(Mode::Working.flipped(), Mode::OnBreak);
        assert_eq!(Mode::OnBreak.flipped(), Mode::Working);
        assert_eq!(Mode::IdleBreak.flipped(), Mode::Working);
    }

    #[test]
    fn test_daily_record_wire_names() {
        let record = DailyRecord {
            work_seconds: 1500,
            break_seconds: 600,
            idle_seconds: 42,
        };
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["work_time"], 1500);
        assert_eq!(json["break_time"], 600);
        assert_eq!(json["idle_time"], 42);

        let partial: DailyRecord = serde_json::from_str(r#"{"work_time": 7}"#).unwrap();
        assert_eq!(partial.work_seconds, 7);
        assert_eq!(partial.idle_seconds, 0);
    }

    #[test]
    fn test_paths_in_dir() {
        let paths = DataPaths::in_dir("/tmp/pomo");
        assert_eq!(paths.history_file, PathBuf::from("/tmp/pomo/pomodoro_history.json"));
        assert_eq!(paths.state_file, PathBuf::from("/tmp/pomo/pomodoro_state.json"));
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.json");
        write_json_atomic(&path, &serde_json::json!({"a": 1})).unwrap();
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["a"], 1);
    }
}
