//! The single owner of the live session and the daily totals.
//!
//! Applies the persistence policy: both files are written after every
//! significant transition, on a fixed tick interval, and at shutdown. Write
//! failures are reported as [`Notice::SaveFailed`] and never abort the
//! transition; the in-memory state stays authoritative.

use crate::recovery::{self, RecoveryOutcome};
use crate::report::{self, DailyComparison};
use crate::session::{self, SessionEvent, SessionState};
use crate::{DailyRecord, DailyTotals, DataPaths, TimerConfig};
use chrono::{DateTime, Local, NaiveDate};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Something the display collaborator should react to
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Session(SessionEvent),
    SaveFailed { file: PathBuf, reason: String },
}

pub struct Controller {
    session: SessionState,
    totals: DailyTotals,
    paths: DataPaths,
}

impl Controller {
    /// Load history and the saved session, reconciling it against `now`
    pub fn open(paths: DataPaths, config: TimerConfig, now: DateTime<Local>) -> (Self, RecoveryOutcome, Vec<Notice>) {
        let mut totals = DailyTotals::load(&paths.history_file);
        let saved = recovery::load_snapshot(&paths.state_file, &config);
        let (session, outcome) = recovery::reconcile(saved, config, &mut totals, now);
        info!("Session restored: {:?}", outcome);

        let mut controller = Self {
            session,
            totals,
            paths,
        };

        let mut notices = Vec::new();
        if outcome.needs_persist() {
            controller.save_all(now, &mut notices);
        }
        (controller, outcome, notices)
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn totals(&self) -> &DailyTotals {
        &self.totals
    }

    /// Committed totals for the day containing `now`
    pub fn today(&self, now: DateTime<Local>) -> DailyRecord {
        self.totals.get(now.date_naive())
    }

    /// Today's idle total including the idle break in progress. Display only.
    pub fn idle_preview(&self, now: DateTime<Local>) -> u64 {
        self.today(now).idle_seconds + self.session.idle_elapsed(now)
    }

    pub fn recent_days(&self, n: usize) -> Vec<(NaiveDate, DailyRecord)> {
        self.totals.recent_days(n)
    }

    pub fn compare_days(&self, now: DateTime<Local>) -> DailyComparison {
        report::compare_days(&self.totals, now.date_naive())
    }

    pub fn start(&mut self, now: DateTime<Local>) -> session::Result<Vec<Notice>> {
        match self.session.start()? {
            Some(event) => Ok(self.commit(event, now)),
            None => Ok(Vec::new()),
        }
    }

    pub fn pause(&mut self, now: DateTime<Local>) -> session::Result<Vec<Notice>> {
        let event = self.session.pause()?;
        Ok(self.commit(event, now))
    }

    pub fn toggle_running(&mut self, now: DateTime<Local>) -> session::Result<Vec<Notice>> {
        if self.session.is_running() {
            self.pause(now)
        } else {
            self.start(now)
        }
    }

    /// One second of wall-clock time while the timer runs
    pub fn tick(&mut self, now: DateTime<Local>) -> Vec<Notice> {
        match self.session.tick(&mut self.totals, now) {
            Some(event) if event.is_significant() => self.commit(event, now),
            Some(event) => vec![Notice::Session(event)],
            None => Vec::new(),
        }
    }

    pub fn enter_idle(&mut self, now: DateTime<Local>) -> session::Result<Vec<Notice>> {
        let event = self.session.enter_idle(now)?;
        Ok(self.commit(event, now))
    }

    pub fn exit_idle(&mut self, now: DateTime<Local>) -> session::Result<Vec<Notice>> {
        let event = self.session.exit_idle(&mut self.totals, now)?;
        Ok(self.commit(event, now))
    }

    pub fn toggle_idle(&mut self, now: DateTime<Local>) -> session::Result<Vec<Notice>> {
        if self.session.is_idle() {
            self.exit_idle(now)
        } else {
            self.enter_idle(now)
        }
    }

    pub fn reset(&mut self, now: DateTime<Local>) -> Vec<Notice> {
        let event = self.session.reset(now);
        self.commit(event, now)
    }

    /// Crash-safety flush, driven by a periodic source every
    /// `autosave_every_ticks` seconds
    pub fn autosave(&mut self, now: DateTime<Local>) -> Vec<Notice> {
        debug!("Periodic flush");
        let mut notices = Vec::new();
        self.save_all(now, &mut notices);
        notices
    }

    /// Final flush before the process exits
    pub fn shutdown(&mut self, now: DateTime<Local>) -> Vec<Notice> {
        let mut notices = Vec::new();
        self.save_all(now, &mut notices);
        info!("Session saved on shutdown");
        notices
    }

    fn commit(&mut self, event: SessionEvent, now: DateTime<Local>) -> Vec<Notice> {
        let mut notices = vec![Notice::Session(event)];
        self.save_all(now, &mut notices);
        notices
    }

    fn save_all(&mut self, now: DateTime<Local>, notices: &mut Vec<Notice>) {
        // Today always has a record once anything has been saved
        self.totals.touch(now.date_naive());

        if let Err(e) = self.totals.persist() {
            warn!("Failed to save history: {}", e);
            notices.push(Notice::SaveFailed {
                file: self.paths.history_file.clone(),
                reason: e.to_string(),
            });
        }

        if let Err(e) = recovery::save_snapshot(&self.paths.state_file, &self.session, now) {
            warn!("Failed to save session state: {}", e);
            notices.push(Notice::SaveFailed {
                file: self.paths.state_file.clone(),
                reason: e.to_string(),
            });
        }
    }
}
