use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::Game;
use crate::runtime::GameEvent;
use crate::session::{GameMode, Phase};

/// Rows moved by PageUp/PageDown in the snippet browser.
const BROWSE_PAGE: usize = 10;

/// Terminal front end state: the game plus what only the host cares about.
#[derive(Debug)]
pub struct App {
    pub game: Game,
    pub browse_offset: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            browse_offset: 0,
            should_quit: false,
        }
    }

    /// Apply one runtime event. Returns true when the screen needs a redraw.
    pub fn handle_event(&mut self, event: GameEvent) -> bool {
        match event {
            GameEvent::Tick => {
                if !self.game.is_ticking() {
                    return false;
                }
                self.game.on_tick();
                true
            }
            GameEvent::Resize => true,
            GameEvent::Key(key) => {
                self.handle_key(key);
                true
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('p') if ctrl => {
                self.game.toggle_pause();
            }
            KeyCode::Char('r') if ctrl => self.game.reset(),
            KeyCode::Char('l') if ctrl => self.game.cycle_language(),
            KeyCode::Char('x') if ctrl => self.game.toggle_mixed_language(),
            KeyCode::F(n) => self.switch_mode(n),
            KeyCode::Enter if self.game.phase() == Phase::Finished => self.game.reset(),
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown | KeyCode::Home
                if self.game.mode() == GameMode::Browse =>
            {
                self.scroll_browser(key.code)
            }
            KeyCode::Backspace => {
                let mut text = self.game.input_buffer().to_string();
                if text.pop().is_some() {
                    self.game.update_input_buffer(&text);
                }
            }
            KeyCode::Char(c) if !ctrl => {
                let mut text = self.game.input_buffer().to_string();
                text.push(c);
                self.game.update_input_buffer(&text);
            }
            _ => {}
        }
    }

    fn switch_mode(&mut self, key: u8) {
        let mode = match key {
            1 => GameMode::Free,
            2 => GameMode::sprint(),
            3 => GameMode::challenge(),
            4 => GameMode::Browse,
            _ => return,
        };
        self.browse_offset = 0;
        self.game.set_mode(mode);
    }

    fn scroll_browser(&mut self, code: KeyCode) {
        let last = self.game.total_lines().saturating_sub(1);
        self.browse_offset = match code {
            KeyCode::Up => self.browse_offset.saturating_sub(1),
            KeyCode::Down => self.browse_offset + 1,
            KeyCode::PageUp => self.browse_offset.saturating_sub(BROWSE_PAGE),
            KeyCode::PageDown => self.browse_offset + BROWSE_PAGE,
            _ => 0,
        }
        .min(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{fixed_test_time, Clock};
    use crate::corpus::{Corpus, SnippetSource};
    use crate::random::ScriptedRandom;
    use crate::storage::MemoryStore;
    use std::rc::Rc;

    fn app(mode: GameMode) -> App {
        let corpus: Rc<dyn SnippetSource> = Rc::new(Corpus::from_blocks([
            ("javascript", vec!["let a = 1;\n  a += 1;"]),
            ("rust", vec!["let b = 2;"]),
        ]));
        App::new(Game::new(
            corpus,
            Box::new(ScriptedRandom::zeros()),
            Clock::fixed(fixed_test_time()),
            Rc::new(MemoryStore::new()),
            mode,
        ))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn typing_builds_the_buffer() {
        let mut app = app(GameMode::Free);
        type_str(&mut app, "lex");
        assert_eq!(app.game.input_buffer(), "lex");

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.game.input_buffer(), "le");
        assert_eq!(app.game.phase(), Phase::Playing);
    }

    #[test]
    fn completing_a_line_clears_the_buffer() {
        let mut app = app(GameMode::Free);
        let target = app.game.feed().active_target().unwrap().to_string();
        type_str(&mut app, &target);

        assert_eq!(app.game.input_buffer(), "");
        assert_eq!(app.game.completed_lines(), 1);
    }

    #[test]
    fn control_keys_do_not_type() {
        let mut app = app(GameMode::Free);
        type_str(&mut app, "l");

        app.handle_key(ctrl('p'));
        assert_eq!(app.game.phase(), Phase::Paused);
        assert_eq!(app.game.input_buffer(), "l");

        app.handle_key(ctrl('p'));
        assert_eq!(app.game.phase(), Phase::Playing);

        app.handle_key(ctrl('r'));
        assert_eq!(app.game.phase(), Phase::Waiting);
        assert_eq!(app.game.input_buffer(), "");
    }

    #[test]
    fn function_keys_switch_mode() {
        let mut app = app(GameMode::Free);
        app.handle_key(key(KeyCode::F(2)));
        assert_eq!(app.game.mode(), GameMode::sprint());
        app.handle_key(key(KeyCode::F(3)));
        assert_eq!(app.game.mode(), GameMode::challenge());
        app.handle_key(key(KeyCode::F(4)));
        assert_eq!(app.game.mode(), GameMode::Browse);
        app.handle_key(key(KeyCode::F(9)));
        assert_eq!(app.game.mode(), GameMode::Browse);
        app.handle_key(key(KeyCode::F(1)));
        assert_eq!(app.game.mode(), GameMode::Free);
    }

    #[test]
    fn language_keys_update_preferences() {
        let mut app = app(GameMode::Free);
        app.handle_key(ctrl('l'));
        assert_eq!(app.game.preferences().language_preference, "javascript");
        app.handle_key(ctrl('l'));
        assert_eq!(app.game.preferences().language_preference, "rust");
        assert_eq!(app.game.feed().active_target(), Some("let b = 2;"));

        app.handle_key(ctrl('x'));
        assert!(app.game.preferences().mixed_language_mode);
    }

    #[test]
    fn browser_scrolls_within_bounds() {
        let mut app = app(GameMode::Browse);
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.browse_offset, 0);

        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.browse_offset, 1);

        for _ in 0..20 {
            app.handle_key(key(KeyCode::PageDown));
        }
        assert_eq!(app.browse_offset, app.game.total_lines() - 1);

        app.handle_key(key(KeyCode::Home));
        assert_eq!(app.browse_offset, 0);

        // typing in the browser is ignored
        type_str(&mut app, "let");
        assert_eq!(app.game.input_buffer(), "");
    }

    #[test]
    fn quit_keys() {
        let mut app = app(GameMode::Free);
        app.handle_key(key(KeyCode::Esc));
        assert!(app.should_quit);

        let mut app = self::app(GameMode::Free);
        app.handle_key(ctrl('c'));
        assert!(app.should_quit);
    }

    #[test]
    fn ticks_only_redraw_while_running() {
        let mut app = app(GameMode::challenge());
        assert!(!app.handle_event(GameEvent::Tick));

        type_str(&mut app, "l");
        app.game.clock_mut().advance_secs(60);
        assert!(app.handle_event(GameEvent::Tick));
        assert_eq!(app.game.phase(), Phase::Finished);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.game.phase(), Phase::Waiting);
    }
}
