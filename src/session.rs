use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::whole_seconds_between;
use crate::metrics;
use crate::stats::FinalStats;

pub const SPRINT_LINE_GOAL: u32 = 10;
pub const CHALLENGE_TIME_LIMIT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum GameMode {
    /// Endless practice; pausing is the only save point.
    Free,
    Sprint { line_goal: u32 },
    Challenge { time_limit_secs: u64 },
    /// Read-only catalogue of the corpus; never timed.
    Browse,
}

impl GameMode {
    pub fn sprint() -> Self {
        Self::Sprint {
            line_goal: SPRINT_LINE_GOAL,
        }
    }

    pub fn challenge() -> Self {
        Self::Challenge {
            time_limit_secs: CHALLENGE_TIME_LIMIT_SECS,
        }
    }

    pub fn is_timed(&self) -> bool {
        !matches!(self, Self::Browse)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Free => "Practice at your own pace",
            Self::Sprint { .. } => "Complete 10 lines as fast as possible",
            Self::Challenge { .. } => "How many lines in 60 seconds?",
            Self::Browse => "Browse all code snippets",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Phase {
    #[default]
    Waiting,
    Playing,
    Paused,
    Finished,
}

/// Correctness counters for the current input buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeystrokeTally {
    /// One per buffer update, not per character.
    pub total_keystrokes: u32,
    pub correct_characters: u32,
    pub mistyped_characters: u32,
    /// Length of the buffer at the last observation.
    pub total_characters: u32,
}

impl KeystrokeTally {
    /// Re-derive the counters from a full positional diff of `input` against `target`.
    pub fn observe(&mut self, input: &str, target: &str) {
        self.total_keystrokes += 1;

        let mut expected = target.chars();
        let mut correct = 0;
        let mut mistyped = 0;
        for typed in input.chars() {
            if expected.next() == Some(typed) {
                correct += 1;
            } else {
                mistyped += 1;
            }
        }

        self.correct_characters = correct;
        self.mistyped_characters = mistyped;
        self.total_characters = input.chars().count() as u32;
    }

    pub fn accuracy(&self) -> u32 {
        metrics::accuracy(self.correct_characters, self.total_keystrokes)
    }
}

/// Phase machine, timer and counters for one typing session.
#[derive(Debug, Clone)]
pub struct Session {
    mode: GameMode,
    phase: Phase,
    started_at: Option<DateTime<Utc>>,
    elapsed_secs: u64,
    timer_armed: bool,
    tally: KeystrokeTally,
    lines_completed: u32,
}

impl Session {
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            phase: Phase::Waiting,
            started_at: None,
            elapsed_secs: 0,
            timer_armed: false,
            tally: KeystrokeTally::default(),
            lines_completed: 0,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn tally(&self) -> &KeystrokeTally {
        &self.tally
    }

    pub fn lines_completed(&self) -> u32 {
        self.lines_completed
    }

    /// True while a tick should be delivered. Every transition out of
    /// `Playing` disarms the timer.
    pub fn is_ticking(&self) -> bool {
        self.timer_armed
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Back to `Waiting` with every counter zeroed.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if !self.mode.is_timed() {
            return false;
        }
        match self.phase {
            Phase::Waiting => {
                self.phase = Phase::Playing;
                self.started_at = Some(now);
                self.elapsed_secs = 0;
                self.timer_armed = true;
                tracing::debug!(mode = %self.mode, "session started");
                true
            }
            Phase::Paused => self.resume(now),
            _ => {
                tracing::trace!(phase = %self.phase, "start ignored");
                false
            }
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != Phase::Playing {
            tracing::trace!(phase = %self.phase, "pause ignored");
            return false;
        }
        self.refresh_elapsed(now);
        self.phase = Phase::Paused;
        self.timer_armed = false;
        tracing::debug!(elapsed_secs = self.elapsed_secs, "session paused");
        true
    }

    /// Continue from a pause, re-anchoring the start so elapsed time carries over.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != Phase::Paused {
            tracing::trace!(phase = %self.phase, "resume ignored");
            return false;
        }
        let elapsed = i64::try_from(self.elapsed_secs).unwrap_or(i64::MAX);
        self.started_at = Some(now - Duration::seconds(elapsed));
        self.phase = Phase::Playing;
        self.timer_armed = true;
        tracing::debug!(elapsed_secs = self.elapsed_secs, "session resumed");
        true
    }

    pub fn finish(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.refresh_elapsed(now);
        self.phase = Phase::Finished;
        self.timer_armed = false;
        tracing::debug!(
            mode = %self.mode,
            elapsed_secs = self.elapsed_secs,
            lines = self.lines_completed,
            "session finished"
        );
        true
    }

    /// Periodic timer callback. Returns true when the tick ended the session.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> bool {
        if !self.timer_armed || self.phase != Phase::Playing {
            return false;
        }
        self.refresh_elapsed(now);
        match self.mode {
            GameMode::Challenge { time_limit_secs } if self.elapsed_secs >= time_limit_secs => {
                self.finish(now)
            }
            _ => false,
        }
    }

    /// Account for one buffer update against the active line.
    pub fn record_edit(&mut self, input: &str, target: &str) {
        if self.phase == Phase::Playing {
            self.tally.observe(input, target);
        }
    }

    /// A line was typed to completion. Returns true when that reached the sprint goal.
    pub fn record_line_completed(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.lines_completed += 1;
        match self.mode {
            GameMode::Sprint { line_goal } if self.lines_completed >= line_goal => self.finish(now),
            _ => false,
        }
    }

    /// Summary of the session so far.
    pub fn final_stats(&self) -> FinalStats {
        let elapsed = self.elapsed_secs;
        let lines = self.lines_completed;
        FinalStats {
            wpm: metrics::wpm(elapsed, lines),
            accuracy: self.tally.accuracy(),
            lines_completed: lines,
            time_elapsed_secs: elapsed,
            loc_per_minute: metrics::loc_per_minute(elapsed, lines),
            characters_per_second: metrics::characters_per_second(
                elapsed,
                self.tally.correct_characters,
            ),
            total_characters: self.tally.total_characters,
            correct_characters: self.tally.correct_characters,
            mistyped_characters: self.tally.mistyped_characters,
        }
    }

    fn refresh_elapsed(&mut self, now: DateTime<Utc>) {
        if let Some(started_at) = self.started_at {
            self.elapsed_secs = whole_seconds_between(started_at, now);
        }
    }
}
