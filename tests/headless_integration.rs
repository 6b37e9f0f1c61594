use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use coderacer::app::App;
use coderacer::clock::{fixed_test_time, Clock};
use coderacer::corpus::{Corpus, SnippetSource};
use coderacer::game::Game;
use coderacer::random::ScriptedRandom;
use coderacer::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use coderacer::session::{GameMode, Phase};
use coderacer::storage::MemoryStore;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn app(mode: GameMode) -> App {
    let corpus: Rc<dyn SnippetSource> = Rc::new(Corpus::from_blocks([(
        "python",
        vec!["def add(a, b):\n    return a + b\n\nprint(add(1, 2))"],
    )]));
    App::new(Game::new(
        corpus,
        Box::new(ScriptedRandom::zeros()),
        Clock::fixed(fixed_test_time()),
        Rc::new(MemoryStore::new()),
        mode,
    ))
}

fn send_text(tx: &mpsc::Sender<GameEvent>, text: &str) {
    for c in text.chars() {
        tx.send(GameEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)))
            .unwrap();
    }
}

// Headless run of the runtime + app without a TTY: a sprint typed through
// the event channel finishes after ten lines.
#[test]
fn headless_sprint_flow_completes() {
    let mut app = app(GameMode::sprint());
    let (tx, rx) = mpsc::channel();

    let lines = ["def add(a, b):", "return a + b", "print(add(1, 2))"];
    for i in 0..10 {
        send_text(&tx, lines[i % lines.len()]);
    }

    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    for _ in 0..1000u32 {
        app.handle_event(runner.step());
        if app.game.phase() == Phase::Finished {
            break;
        }
    }

    assert_eq!(app.game.phase(), Phase::Finished);
    assert_eq!(app.game.completed_lines(), 10);
    assert_eq!(app.game.stats().total_sessions_played, 1);
    assert_eq!(app.game.last_result().unwrap().lines_completed, 10);

    // further typing is ignored once finished
    app.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE));
    assert_eq!(app.game.input_buffer(), "");
}

// Ticks from the runner drive the challenge timer; the game clock is
// advanced by hand so the run stays deterministic.
#[test]
fn headless_challenge_finishes_by_time() {
    let mut app = app(GameMode::challenge());
    let (tx, rx) = mpsc::channel();
    send_text(&tx, "def");

    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let mut ticks = 0;
    for _ in 0..1000u32 {
        let event = runner.step();
        if matches!(event, GameEvent::Tick) && app.game.is_ticking() {
            app.game.clock_mut().advance_secs(10);
            ticks += 1;
        }
        app.handle_event(event);
        if app.game.phase() == Phase::Finished {
            break;
        }
    }

    assert_eq!(app.game.phase(), Phase::Finished);
    assert_eq!(ticks, 6);
    assert_eq!(app.game.elapsed_secs(), 60);
    assert_eq!(app.game.completed_lines(), 0);
    assert_eq!(app.game.stats().session_history.len(), 1);
}

#[test]
fn headless_escape_quits() {
    let mut app = app(GameMode::Free);
    let (tx, rx) = mpsc::channel();
    tx.send(GameEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
        .unwrap();

    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_secs(10)),
    );
    while !app.should_quit {
        app.handle_event(runner.step());
    }

    assert_eq!(app.game.phase(), Phase::Waiting);
}
