//! Session state machine
//!
//! Tracks whether the user is working, on break, or on an idle break, and
//! how much of the current interval is left. Transitions mutate the state in
//! place and return a [`SessionEvent`] describing what changed; deciding when
//! to write files is left to the caller.

use crate::{history::DailyTotals, Category, Mode, TimerConfig};
use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("An idle break is in progress")]
    IdleBreakActive,
    #[error("The timer is not running")]
    NotRunning,
    #[error("No idle break is in progress")]
    NotInIdleBreak,
}

pub type Result<T> = std::result::Result<T, TransitionError>;

/// What a transition did, for display collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Started { mode: Mode },
    Paused { mode: Mode },
    Ticked { mode: Mode, time_left: u32 },
    IntervalCompleted { ended: Mode, began: Mode },
    IdleStarted { was_running: bool },
    IdleEnded { idle_seconds: u64 },
    Reset,
}

impl SessionEvent {
    /// Every event except a plain countdown tick changes persisted state
    pub fn is_significant(&self) -> bool {
        !matches!(self, SessionEvent::Ticked { .. })
    }
}

/// The live timer
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    mode: Mode,
    running: bool,
    time_left: u32,
    /// When the current mode was entered; only meaningful for idle breaks
    mode_entered_at: DateTime<Local>,
    config: TimerConfig,
}

impl SessionState {
    /// Fresh state: working, full interval, not running
    pub fn new(config: TimerConfig, now: DateTime<Local>) -> Self {
        Self {
            mode: Mode::Working,
            running: false,
            time_left: config.work_seconds,
            mode_entered_at: now,
            config,
        }
    }

    /// A stopped or running Working/OnBreak interval with `time_left` remaining
    pub(crate) fn resume_interval(
        config: TimerConfig,
        mode: Mode,
        time_left: u32,
        running: bool,
        now: DateTime<Local>,
    ) -> Self {
        debug_assert!(mode != Mode::IdleBreak);
        Self {
            mode,
            running: running && time_left > 0,
            time_left,
            mode_entered_at: now,
            config,
        }
    }

    /// Re-enter an idle break that began at `entered_at`.
    ///
    /// Nothing is committed here; the whole break is credited once on exit.
    pub(crate) fn resume_idle(config: TimerConfig, entered_at: DateTime<Local>) -> Self {
        Self {
            mode: Mode::IdleBreak,
            running: false,
            time_left: config.work_seconds,
            mode_entered_at: entered_at,
            config,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether ticks are being consumed. Always false during an idle break.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_idle(&self) -> bool {
        self.mode == Mode::IdleBreak
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn mode_entered_at(&self) -> DateTime<Local> {
        self.mode_entered_at
    }

    /// Whole seconds spent in the current idle break, 0 outside one
    pub fn idle_elapsed(&self, now: DateTime<Local>) -> u64 {
        if self.is_idle() {
            elapsed_seconds(self.mode_entered_at, now)
        } else {
            0
        }
    }

    /// Begin consuming ticks. Returns `None` if already running.
    pub fn start(&mut self) -> Result<Option<SessionEvent>> {
        if self.is_idle() {
            return Err(TransitionError::IdleBreakActive);
        }
        if self.running {
            return Ok(None);
        }
        self.running = true;
        Ok(Some(SessionEvent::Started { mode: self.mode }))
    }

    pub fn pause(&mut self) -> Result<SessionEvent> {
        if !self.running {
            return Err(TransitionError::NotRunning);
        }
        self.running = false;
        Ok(SessionEvent::Paused { mode: self.mode })
    }

    /// Consume one second of the current interval.
    ///
    /// Credits the second to today's total for the current mode. When the
    /// interval runs out the mode flips and the timer stops. Returns `None`
    /// when the timer is not running.
    pub fn tick(&mut self, totals: &mut DailyTotals, now: DateTime<Local>) -> Option<SessionEvent> {
        if !self.running || self.is_idle() {
            return None;
        }

        self.time_left = self.time_left.saturating_sub(1);
        totals.increment(now.date_naive(), self.mode.category(), 1);

        if self.time_left > 0 {
            return Some(SessionEvent::Ticked {
                mode: self.mode,
                time_left: self.time_left,
            });
        }

        let ended = self.mode;
        self.flip(now);
        debug!("{} interval finished, now {}", ended, self.mode);
        Some(SessionEvent::IntervalCompleted {
            ended,
            began: self.mode,
        })
    }

    /// Switch Working <-> OnBreak with a full, stopped interval
    pub(crate) fn flip(&mut self, now: DateTime<Local>) {
        self.mode = self.mode.flipped();
        self.time_left = self.config.duration_of(self.mode);
        self.running = false;
        self.mode_entered_at = now;
    }

    /// Start an idle break, pausing the countdown if it was running
    pub fn enter_idle(&mut self, now: DateTime<Local>) -> Result<SessionEvent> {
        if self.is_idle() {
            return Err(TransitionError::IdleBreakActive);
        }
        let was_running = self.running;
        self.running = false;
        self.mode = Mode::IdleBreak;
        self.mode_entered_at = now;
        Ok(SessionEvent::IdleStarted { was_running })
    }

    /// End the idle break, crediting its whole seconds to today's idle total.
    ///
    /// Always lands in a stopped, full work interval.
    pub fn exit_idle(&mut self, totals: &mut DailyTotals, now: DateTime<Local>) -> Result<SessionEvent> {
        if !self.is_idle() {
            return Err(TransitionError::NotInIdleBreak);
        }
        let idle_seconds = elapsed_seconds(self.mode_entered_at, now);
        totals.increment(now.date_naive(), Category::Idle, idle_seconds);

        self.mode = Mode::Working;
        self.time_left = self.config.work_seconds;
        self.running = false;
        self.mode_entered_at = now;
        Ok(SessionEvent::IdleEnded { idle_seconds })
    }

    /// Back to a stopped, full work interval from anywhere.
    ///
    /// An unfinished idle break is dropped without being credited.
    pub fn reset(&mut self, now: DateTime<Local>) -> SessionEvent {
        self.mode = Mode::Working;
        self.time_left = self.config.work_seconds;
        self.running = false;
        self.mode_entered_at = now;
        SessionEvent::Reset
    }
}

/// Whole seconds from `from` to `to`, 0 if the clock went backwards
pub(crate) fn elapsed_seconds(from: DateTime<Local>, to: DateTime<Local>) -> u64 {
    (to - from).num_seconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 12, h, m, s).unwrap()
    }

    fn fresh() -> SessionState {
        SessionState::new(TimerConfig::default(), at(9, 0, 0))
    }

    #[test]
    fn test_fresh_state() {
        let state = fresh();
        assert_eq!(state.mode(), Mode::Working);
        assert!(!state.is_running());
        assert_eq!(state.time_left(), 1500);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut state = fresh();
        assert_eq!(
            state.start().unwrap(),
            Some(SessionEvent::Started { mode: Mode::Working })
        );
        assert_eq!(state.start().unwrap(), None);
        assert!(state.is_running());
    }

    #[test]
    fn test_pause_requires_running() {
        let mut state = fresh();
        assert_eq!(state.pause(), Err(TransitionError::NotRunning));
        state.start().unwrap();
        assert_eq!(state.pause(), Ok(SessionEvent::Paused { mode: Mode::Working }));
        assert!(!state.is_running());
    }

    #[test]
    fn test_tick_ignored_when_stopped() {
        let mut state = fresh();
        let mut totals = DailyTotals::new_in_memory();
        assert_eq!(state.tick(&mut totals, at(9, 0, 1)), None);
        assert_eq!(state.time_left(), 1500);
        assert!(totals.snapshot().is_empty());
    }

    #[test]
    fn test_full_work_interval_flips_once() {
        let mut state = fresh();
        let mut totals = DailyTotals::new_in_memory();
        state.start().unwrap();

        let mut flips = Vec::new();
        for _ in 0..1500 {
            if let Some(event @ SessionEvent::IntervalCompleted { .. }) =
                state.tick(&mut totals, at(9, 30, 0))
            {
                flips.push(event);
            }
        }

        assert_eq!(
            flips,
            vec![SessionEvent::IntervalCompleted {
                ended: Mode::Working,
                began: Mode::OnBreak
            }]
        );
        assert_eq!(state.mode(), Mode::OnBreak);
        assert_eq!(state.time_left(), 600);
        assert!(!state.is_running());
        assert_eq!(totals.get(at(9, 30, 0).date_naive()).work_seconds, 1500);

        // Stopped after the flip: further ticks do nothing
        assert_eq!(state.tick(&mut totals, at(9, 30, 1)), None);
    }

    #[test]
    fn test_break_ticks_count_as_break() {
        let mut state = fresh();
        let mut totals = DailyTotals::new_in_memory();
        state.flip(at(9, 0, 0));
        state.start().unwrap();
        for _ in 0..600 {
            state.tick(&mut totals, at(9, 5, 0));
        }
        let record = totals.get(at(9, 5, 0).date_naive());
        assert_eq!(record.break_seconds, 600);
        assert_eq!(record.work_seconds, 0);
        assert_eq!(state.mode(), Mode::Working);
        assert_eq!(state.time_left(), 1500);
    }

    #[test]
    fn test_enter_idle_pauses_running_timer() {
        let mut state = fresh();
        state.start().unwrap();
        let event = state.enter_idle(at(10, 0, 0)).unwrap();
        assert_eq!(event, SessionEvent::IdleStarted { was_running: true });
        assert!(state.is_idle());
        assert!(!state.is_running());
        assert_eq!(state.start(), Err(TransitionError::IdleBreakActive));
        assert_eq!(state.enter_idle(at(10, 0, 1)), Err(TransitionError::IdleBreakActive));
    }

    #[test]
    fn test_exit_idle_always_returns_to_work() {
        let mut totals = DailyTotals::new_in_memory();
        let mut state = fresh();
        state.flip(at(9, 0, 0));
        state.start().unwrap();
        for _ in 0..100 {
            state.tick(&mut totals, at(9, 1, 0));
        }
        assert_eq!(state.mode(), Mode::OnBreak);

        let entered = at(10, 0, 0);
        state.enter_idle(entered).unwrap();
        let exit = entered + Duration::milliseconds(125_900);
        let event = state.exit_idle(&mut totals, exit).unwrap();

        assert_eq!(event, SessionEvent::IdleEnded { idle_seconds: 125 });
        assert_eq!(state.mode(), Mode::Working);
        assert_eq!(state.time_left(), 1500);
        assert!(!state.is_running());
        assert_eq!(totals.get(exit.date_naive()).idle_seconds, 125);
    }

    #[test]
    fn test_exit_idle_outside_idle_fails() {
        let mut totals = DailyTotals::new_in_memory();
        let mut state = fresh();
        assert_eq!(
            state.exit_idle(&mut totals, at(9, 0, 0)),
            Err(TransitionError::NotInIdleBreak)
        );
    }

    #[test]
    fn test_idle_elapsed_display() {
        let mut state = fresh();
        assert_eq!(state.idle_elapsed(at(9, 10, 0)), 0);
        state.enter_idle(at(9, 0, 0)).unwrap();
        assert_eq!(state.idle_elapsed(at(9, 10, 0)), 600);
        assert_eq!(state.idle_elapsed(at(8, 59, 0)), 0);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut totals = DailyTotals::new_in_memory();
        let mut state = fresh();
        state.start().unwrap();
        state.tick(&mut totals, at(9, 0, 1));
        state.enter_idle(at(9, 0, 2)).unwrap();

        assert_eq!(state.reset(at(9, 5, 0)), SessionEvent::Reset);
        assert_eq!(state.mode(), Mode::Working);
        assert_eq!(state.time_left(), 1500);
        assert!(!state.is_running());
        assert_eq!(totals.get(at(9, 5, 0).date_naive()).idle_seconds, 0);
    }
}
