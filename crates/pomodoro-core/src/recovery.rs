//! Snapshot persistence and startup reconciliation
//!
//! # File Format
//!
//! ```json
//! {
//!   "is_working": true,
//!   "is_running": true,
//!   "is_idle_break": false,
//!   "time_left": 1320,
//!   "timestamp": 1710234000.25,
//!   "idle_break_timestamp": null
//! }
//! ```
//!
//! Timestamps are seconds since the Unix epoch. A missing or null
//! `timestamp` means there is no prior state to resume.
//!
//! On startup the saved state is replayed against the wall-clock time that
//! passed while the process was down. At most one interval boundary is
//! crossed during that replay; anything beyond it is dropped.

use crate::session::{elapsed_seconds, SessionState};
use crate::{history::DailyTotals, write_json_atomic, Category, Mode, PersistError, TimerConfig};
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// On-disk layout of the state file
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default = "default_true")]
    is_working: bool,
    #[serde(default)]
    is_running: bool,
    #[serde(default)]
    is_idle_break: bool,
    #[serde(default)]
    time_left: Option<u32>,
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    idle_break_timestamp: Option<f64>,
}

fn default_true() -> bool {
    true
}

/// A parsed snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSession {
    pub mode: Mode,
    pub running: bool,
    pub time_left: u32,
    pub saved_at: DateTime<Local>,
    pub idle_entered_at: Option<DateTime<Local>>,
}

/// What startup recovery did with the saved state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// No usable snapshot
    Fresh,
    /// Still inside an idle break
    IdleResumed { idle_minutes: i64 },
    /// The idle break ran past the auto-end limit and was closed
    IdleExpired { idle_minutes: i64, committed_seconds: u64 },
    /// A running interval continues with less time left
    Resumed { mode: Mode, elapsed_seconds: u64 },
    /// A running interval ran out while the process was down
    IntervalElapsed { ended: Mode, began: Mode },
    /// A stopped interval, restored as saved
    Restored { mode: Mode },
}

impl RecoveryOutcome {
    /// Whether recovery changed totals or mode, so both files need rewriting
    pub fn needs_persist(&self) -> bool {
        matches!(
            self,
            RecoveryOutcome::IdleExpired { .. } | RecoveryOutcome::IntervalElapsed { .. }
        )
    }

    pub fn describe(&self) -> Option<String> {
        match self {
            RecoveryOutcome::Fresh => None,
            RecoveryOutcome::IdleResumed { idle_minutes } => Some(format!(
                "Resumed idle break, {} minutes so far.",
                idle_minutes
            )),
            RecoveryOutcome::IdleExpired { idle_minutes, .. } => Some(format!(
                "Last idle break ran {} minutes; reset to work.",
                idle_minutes
            )),
            RecoveryOutcome::Resumed {
                mode,
                elapsed_seconds,
            } => Some(format!(
                "Resumed {} timer, {} minutes passed while closed.",
                mode.label().to_lowercase(),
                elapsed_seconds / 60
            )),
            RecoveryOutcome::IntervalElapsed { ended, began } => Some(format!(
                "{} interval finished while closed; switched to {}.",
                ended,
                began.label().to_lowercase()
            )),
            RecoveryOutcome::Restored { .. } => None,
        }
    }
}

fn to_epoch(ts: DateTime<Local>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_millis()) / 1000.0
}

fn from_epoch(secs: f64) -> Option<DateTime<Local>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    Local.timestamp_opt(whole as i64, nanos).single()
}

/// Write the current session to the state file
pub fn save_snapshot(path: &Path, state: &SessionState, now: DateTime<Local>) -> Result<(), PersistError> {
    let file = SnapshotFile {
        is_working: state.mode() != Mode::OnBreak,
        is_running: state.is_running(),
        is_idle_break: state.is_idle(),
        time_left: Some(state.time_left()),
        timestamp: Some(to_epoch(now)),
        idle_break_timestamp: state.is_idle().then(|| to_epoch(state.mode_entered_at())),
    };
    write_json_atomic(path, &file)
}

/// Read the state file without side effects
pub fn read_snapshot(path: &Path, config: &TimerConfig) -> Result<Option<SavedSession>, PersistError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let file: SnapshotFile = serde_json::from_str(&content)?;

    let Some(saved_at) = file.timestamp.and_then(from_epoch) else {
        return Ok(None);
    };

    let mode = if file.is_idle_break {
        Mode::IdleBreak
    } else if file.is_working {
        Mode::Working
    } else {
        Mode::OnBreak
    };

    let interval_mode = if file.is_working { Mode::Working } else { Mode::OnBreak };
    let time_left = file
        .time_left
        .unwrap_or_else(|| config.duration_of(interval_mode));

    Ok(Some(SavedSession {
        mode,
        running: file.is_running,
        time_left,
        saved_at,
        idle_entered_at: file.idle_break_timestamp.and_then(from_epoch),
    }))
}

/// Read the state file, deleting it if it cannot be parsed
pub fn load_snapshot(path: &Path, config: &TimerConfig) -> Option<SavedSession> {
    match read_snapshot(path, config) {
        Ok(saved) => saved,
        Err(e) => {
            warn!("Discarding unreadable state file {:?}: {}", path, e);
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Failed to remove state file {:?}: {}", path, e);
            }
            None
        }
    }
}

/// Rebuild the live session from a snapshot, replaying the time since it was saved.
///
/// Idle time is only committed to `totals` when the break is closed here;
/// a resumed idle break keeps its original entry time and is credited on exit.
pub fn reconcile(
    saved: Option<SavedSession>,
    config: TimerConfig,
    totals: &mut DailyTotals,
    now: DateTime<Local>,
) -> (SessionState, RecoveryOutcome) {
    let Some(saved) = saved else {
        return (SessionState::new(config, now), RecoveryOutcome::Fresh);
    };

    if saved.mode == Mode::IdleBreak {
        let Some(entered_at) = saved.idle_entered_at else {
            warn!("Saved idle break has no start time, resetting to work");
            return (SessionState::new(config, now), RecoveryOutcome::Fresh);
        };

        let idle_seconds = elapsed_seconds(entered_at, now);
        let idle_minutes = (idle_seconds / 60) as i64;

        if idle_minutes > config.idle_auto_end_minutes {
            totals.increment(now.date_naive(), Category::Idle, idle_seconds);
            info!("Closed stale idle break of {} minutes", idle_minutes);
            return (
                SessionState::new(config, now),
                RecoveryOutcome::IdleExpired {
                    idle_minutes,
                    committed_seconds: idle_seconds,
                },
            );
        }

        info!("Resuming idle break started {} minutes ago", idle_minutes);
        return (
            SessionState::resume_idle(config, entered_at),
            RecoveryOutcome::IdleResumed { idle_minutes },
        );
    }

    // A countdown longer than the mode's interval is capped to a full interval
    let saved_left = saved.time_left.min(config.duration_of(saved.mode));

    let elapsed = if saved.running {
        elapsed_seconds(saved.saved_at, now)
    } else {
        0
    };
    let time_left = u64::from(saved_left).saturating_sub(elapsed) as u32;

    if time_left == 0 {
        // Also covers a stopped snapshot saved with nothing left on the clock
        let mut state = SessionState::resume_interval(config, saved.mode, 0, false, now);
        state.flip(now);
        info!("{} interval ran out while closed, now {}", saved.mode, state.mode());
        return (
            state,
            RecoveryOutcome::IntervalElapsed {
                ended: saved.mode,
                began: saved.mode.flipped(),
            },
        );
    }

    if saved.running {
        info!("Resuming {} with {}s left", saved.mode, time_left);
        return (
            SessionState::resume_interval(config, saved.mode, time_left, true, now),
            RecoveryOutcome::Resumed {
                mode: saved.mode,
                elapsed_seconds: elapsed,
            },
        );
    }

    (
        SessionState::resume_interval(config, saved.mode, time_left, false, now),
        RecoveryOutcome::Restored { mode: saved.mode },
    )
}
