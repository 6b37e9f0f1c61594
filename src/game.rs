use std::rc::Rc;

use crate::clock::Clock;
use crate::config::{Preferences, Setting};
use crate::corpus::{browse_listing, LanguageSelector, SnippetSource, ALL_LANGUAGES};
use crate::line_feed::{DisplayLine, FeedDiscipline, LineFeed};
use crate::random::RandomSource;
use crate::session::{GameMode, KeystrokeTally, Phase, Session};
use crate::stats::{FinalStats, HistoryStore, StatsStore};
use crate::storage::KeyValueStore;

/// Window length for treadmill modes.
pub const SHIFT_WINDOW: usize = 60;

/// Window length for sprints; comfortably above the line goal so blank
/// lines in the material do not exhaust the feed first.
pub const SPRINT_WINDOW: usize = 40;

/// The typing game: one line feed, one session and the persisted stats.
///
/// This is the only mutation surface the host needs; everything it renders is
/// available through read-only accessors.
pub struct Game {
    corpus: Rc<dyn SnippetSource>,
    feed: LineFeed,
    session: Session,
    stats: StatsStore,
    preferences: Preferences,
    store: Rc<dyn KeyValueStore>,
    clock: Clock,
    input_buffer: String,
    browse_lines: Vec<String>,
    last_result: Option<FinalStats>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("feed", &self.feed)
            .field("session", &self.session)
            .field("preferences", &self.preferences)
            .field("input_buffer", &self.input_buffer)
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Load preferences and history from `store` and set up `mode`.
    pub fn new(
        corpus: Rc<dyn SnippetSource>,
        rng: Box<dyn RandomSource>,
        clock: Clock,
        store: Rc<dyn KeyValueStore>,
        mode: GameMode,
    ) -> Self {
        let preferences = Preferences::load(store.as_ref());
        let stats = StatsStore::load(Rc::clone(&store));
        let feed = LineFeed::new(Rc::clone(&corpus), rng);

        let mut game = Self {
            corpus,
            feed,
            session: Session::new(mode),
            stats,
            preferences,
            store,
            clock,
            input_buffer: String::new(),
            browse_lines: Vec::new(),
            last_result: None,
        };
        game.rebuild();
        game
    }

    /// Back to `Waiting` with zeroed counters and a freshly populated feed.
    pub fn reset(&mut self) {
        self.session.reset();
        self.rebuild();
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        tracing::debug!(%mode, "mode selected");
        self.session = Session::new(mode);
        self.rebuild();
    }

    /// Explicit start; typing starts the session on its own.
    pub fn start(&mut self) -> bool {
        self.session.start(self.clock.now())
    }

    /// Pause a running session. In Free mode this is the save point.
    pub fn pause(&mut self) -> bool {
        let now = self.clock.now();
        if !self.session.pause(now) {
            return false;
        }
        if self.session.mode() == GameMode::Free && self.session.lines_completed() > 0 {
            self.save_current();
        }
        true
    }

    pub fn resume(&mut self) -> bool {
        self.session.resume(self.clock.now())
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.session.phase() {
            Phase::Playing => self.pause(),
            Phase::Paused => self.resume(),
            _ => false,
        }
    }

    /// Periodic timer callback.
    pub fn on_tick(&mut self) {
        if self.session.on_tick(self.clock.now()) {
            self.save_current();
        }
    }

    /// Replace what the user has typed for the active line.
    pub fn update_input_buffer(&mut self, text: &str) {
        if self.session.mode() == GameMode::Browse {
            return;
        }
        let now = self.clock.now();
        match self.session.phase() {
            Phase::Paused | Phase::Finished => return,
            Phase::Waiting if text.is_empty() => return,
            Phase::Waiting => {
                self.session.start(now);
            }
            Phase::Playing => {}
        }

        self.input_buffer.clear();
        self.input_buffer.push_str(text);

        let Some(target) = self.feed.active_target() else {
            if self.session.finish(now) {
                self.save_current();
            }
            return;
        };
        self.session.record_edit(&self.input_buffer, target);

        if self.feed.submit_candidate(&self.input_buffer) {
            self.input_buffer.clear();
            let mut finished = self.session.record_line_completed(now);
            if !finished && self.feed.is_exhausted() {
                finished = self.session.finish(now);
            }
            if finished {
                self.save_current();
            }
        }
    }

    /// Switch the corpus language (`all` for any) and start over.
    pub fn set_language_preference(&mut self, language: &str) {
        if self.preferences.language_preference == language {
            return;
        }
        self.preferences.language_preference = language.to_string();
        self.persist_preferences();
        self.reset();
    }

    /// Step to the next language after the current preference, wrapping through `all`.
    pub fn cycle_language(&mut self) {
        let mut options = vec![ALL_LANGUAGES.to_string()];
        options.extend(self.corpus.languages().into_iter().map(str::to_string));
        let current = options
            .iter()
            .position(|lang| *lang == self.preferences.language_preference)
            .unwrap_or(0);
        let next = options[(current + 1) % options.len()].clone();
        self.set_language_preference(&next);
    }

    pub fn toggle_mixed_language(&mut self) {
        self.toggle_setting(Setting::MixedLanguage);
    }

    pub fn set_mixed_language(&mut self, mixed: bool) {
        if self.preferences.mixed_language_mode != mixed {
            self.toggle_mixed_language();
        }
    }

    /// Flip a preference and persist it. Changing mixed mode rebuilds the feed.
    pub fn toggle_setting(&mut self, setting: Setting) {
        self.preferences.toggle(setting);
        self.persist_preferences();
        if setting == Setting::MixedLanguage {
            self.reset();
        }
    }

    pub fn display_lines(&self) -> Vec<DisplayLine> {
        if self.session.mode() == GameMode::Browse {
            return self
                .browse_lines
                .iter()
                .enumerate()
                .map(|(index, line)| {
                    let trimmed = line.trim_start();
                    DisplayLine {
                        text: line.clone(),
                        trimmed: trimmed.to_string(),
                        leading_whitespace: line[..line.len() - trimmed.len()].to_string(),
                        index,
                        language: ALL_LANGUAGES.to_string(),
                    }
                })
                .collect();
        }
        self.feed.display_lines()
    }

    /// Window index of the line being typed.
    pub fn active_index(&self) -> Option<usize> {
        match self.session.mode() {
            GameMode::Browse => None,
            _ => self.feed.active_index(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn mode(&self) -> GameMode {
        self.session.mode()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.session.elapsed_secs()
    }

    pub fn is_ticking(&self) -> bool {
        self.session.is_ticking()
    }

    /// Lines the user typed to completion this session.
    pub fn completed_lines(&self) -> u32 {
        self.session.lines_completed()
    }

    pub fn total_lines(&self) -> usize {
        match self.session.mode() {
            GameMode::Sprint { line_goal } => line_goal as usize,
            GameMode::Browse => self.browse_lines.len(),
            _ => self.feed.len(),
        }
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn tally(&self) -> &KeystrokeTally {
        self.session.tally()
    }

    /// Metrics for the session as it stands.
    pub fn live_stats(&self) -> FinalStats {
        self.session.final_stats()
    }

    /// Stats of the last session that ended or was pause-saved since the last reset.
    pub fn last_result(&self) -> Option<FinalStats> {
        self.last_result
    }

    /// Rolling history and all-time aggregates.
    pub fn stats(&self) -> &HistoryStore {
        self.stats.history()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Language label for the header: the active line's language or `mixed`.
    pub fn language_label(&self) -> &str {
        if self.feed.is_mixed() {
            return self.feed.current_language();
        }
        self.feed
            .active_language()
            .unwrap_or_else(|| self.feed.current_language())
    }

    pub fn feed(&self) -> &LineFeed {
        &self.feed
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    fn rebuild(&mut self) {
        self.input_buffer.clear();
        self.last_result = None;
        let selector = LanguageSelector::from_preference(&self.preferences.language_preference);
        let mixed = self.preferences.mixed_language_mode;
        match self.session.mode() {
            GameMode::Browse => {
                self.browse_lines = browse_listing(self.corpus.as_ref());
            }
            GameMode::Sprint { .. } => {
                self.feed
                    .initialize(SPRINT_WINDOW, FeedDiscipline::Scroll, selector, mixed);
            }
            GameMode::Free | GameMode::Challenge { .. } => {
                self.feed
                    .initialize(SHIFT_WINDOW, FeedDiscipline::Shift, selector, mixed);
            }
        }
    }

    fn save_current(&mut self) {
        let stats = self.session.final_stats();
        self.last_result = Some(stats);
        self.stats.save_session(stats.into_record(self.clock.now()));
    }

    fn persist_preferences(&self) {
        if let Err(e) = self.preferences.save(self.store.as_ref()) {
            tracing::warn!(error = %e, "failed to persist preferences");
        }
    }
}
