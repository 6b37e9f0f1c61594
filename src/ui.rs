pub mod charting;

use std::borrow::Cow;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::corpus::language_name;
use crate::game::Game;
use crate::line_feed::DisplayLine;
use crate::session::{GameMode, Phase};
use crate::ui::charting::{compute_chart_params, format_clock, format_label, wpm_points};

const HORIZONTAL_MARGIN: u16 = 2;

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_style() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let game = &self.game;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1), // padding
                Constraint::Min(1),    // code or results
                Constraint::Length(1), // stats bar
                Constraint::Length(1), // legend
            ])
            .split(area);

        header(game).render(chunks[0], buf);

        if game.phase() == Phase::Finished {
            render_results(game, chunks[2], buf);
        } else {
            code_window(game, self.browse_offset, chunks[2].height).render(chunks[2], buf);
        }

        stats_bar(game).render(chunks[3], buf);
        legend(game).render(chunks[4], buf);
    }
}

fn header(game: &Game) -> Paragraph<'static> {
    let separator = || Span::styled(" │ ", dim_style());
    let phase_style = match game.phase() {
        Phase::Waiting => dim_style(),
        Phase::Playing => bold_style().fg(Color::Green),
        Phase::Paused => bold_style().fg(Color::Yellow),
        Phase::Finished => bold_style().fg(Color::Magenta),
    };

    let mut spans = vec![
        Span::styled("coderacer", bold_style().fg(Color::Cyan)),
        separator(),
        Span::styled(game.mode().to_string(), bold_style()),
    ];
    if game.mode() != GameMode::Browse {
        let timer = match game.mode() {
            GameMode::Challenge { time_limit_secs } => {
                format_clock(time_limit_secs.saturating_sub(game.elapsed_secs()))
            }
            _ => format_clock(game.elapsed_secs()),
        };
        spans.extend([
            separator(),
            Span::styled(game.phase().to_string(), phase_style),
            separator(),
            Span::raw(language_name(game.language_label()).to_string()),
            separator(),
            Span::styled(timer, bold_style()),
        ]);
    }

    Paragraph::new(Line::from(spans))
}

fn code_window(game: &Game, browse_offset: usize, height: u16) -> Paragraph<'static> {
    let lines = game.display_lines();
    let active = game.active_index();
    let browsing = game.mode() == GameMode::Browse;
    let show_numbers = game.preferences().show_line_numbers;
    let tag_languages = game.feed().is_mixed() && !browsing;
    let height = usize::from(height);

    // keep the active line in the upper third of the window
    let offset = match active {
        Some(idx) => idx.saturating_sub(height / 3),
        None if browsing => browse_offset,
        None => lines.len().saturating_sub(height),
    };

    let rendered: Vec<Line> = lines
        .iter()
        .skip(offset)
        .take(height)
        .map(|line| {
            let mut spans = Vec::new();
            if show_numbers {
                spans.push(Span::styled(format!("{:>3} ", line.index + 1), dim_style()));
            }
            match active {
                Some(idx) if idx == line.index => {
                    spans.extend(active_line_spans(line, game.input_buffer()));
                }
                Some(idx) if line.index < idx => {
                    spans.push(Span::styled(
                        line.text.clone(),
                        Style::default().fg(Color::Green).add_modifier(Modifier::DIM),
                    ));
                }
                _ if browsing && line.trimmed.starts_with('#') => {
                    spans.push(Span::styled(line.text.clone(), bold_style().fg(Color::Magenta)));
                }
                _ => {
                    spans.push(Span::styled(line.leading_whitespace.clone(), dim_style()));
                    spans.push(Span::raw(line.trimmed.clone()));
                }
            }
            if tag_languages {
                spans.push(Span::styled(format!("  // {}", line.language), dim_style()));
            }
            Line::from(spans)
        })
        .collect();

    Paragraph::new(rendered)
}

/// The typed prefix coloured per position, the cursor, then the rest of the line.
fn active_line_spans(line: &DisplayLine, input: &str) -> Vec<Span<'static>> {
    let green_bold_style = bold_style().fg(Color::Green);
    let red_bold_style = bold_style().fg(Color::Red);
    let cursor_style = bold_style().add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);

    let expected: Vec<char> = line.trimmed.chars().collect();
    let typed: Vec<char> = input.chars().collect();

    let mut spans = vec![Span::styled(line.leading_whitespace.clone(), dim_style())];
    for (idx, c) in typed.iter().enumerate() {
        match expected.get(idx) {
            Some(e) if e == c => spans.push(Span::styled(e.to_string(), green_bold_style)),
            _ => spans.push(Span::styled(
                match c {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            )),
        }
    }

    match expected.get(typed.len()) {
        Some(c) => spans.push(Span::styled(c.to_string(), cursor_style)),
        None => spans.push(Span::styled(" ", cursor_style)),
    }
    let rest: String = expected.iter().skip(typed.len() + 1).collect();
    if !rest.is_empty() {
        spans.push(Span::styled(rest, bold_style()));
    }
    spans
}

fn stats_bar(game: &Game) -> Paragraph<'static> {
    if game.mode() == GameMode::Browse {
        return Paragraph::new(Span::styled(
            format!("{} lines in the library", game.total_lines()),
            dim_style(),
        ));
    }

    let stats = game.live_stats();
    let lines = match game.mode() {
        GameMode::Sprint { line_goal } => format!("{}/{}", game.completed_lines(), line_goal),
        _ => game.completed_lines().to_string(),
    };
    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {} loc/min   {} lines",
            stats.wpm, stats.accuracy, stats.loc_per_minute, lines
        ),
        bold_style(),
    ))
    .alignment(Alignment::Center)
}

fn legend(game: &Game) -> Paragraph<'static> {
    let text: Cow<'static, str> = match (game.mode(), game.phase()) {
        (GameMode::Browse, _) => "(↑/↓) scroll / (f1-f3) play / (esc)ape".into(),
        (mode, Phase::Waiting) => format!(
            "{} / start typing / (f1-f4) mode / (ctrl+l) language / (ctrl+x) mixed",
            mode.description()
        )
        .into(),
        (_, Phase::Playing) => "(ctrl+p) pause / (ctrl+r) restart / (esc)ape".into(),
        (_, Phase::Paused) => "PAUSED - (ctrl+p) resume / (ctrl+r) restart".into(),
        (_, Phase::Finished) => "(enter) new session / (f1-f4) mode / (esc)ape".into(),
    };
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
}

fn render_results(game: &Game, area: Rect, buf: &mut Buffer) {
    let result = game.last_result().unwrap_or_else(|| game.live_stats());
    let history = game.stats();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(1)])
        .split(area);

    let summary = vec![
        Line::from(Span::styled(
            format!(
                "{} wpm   {}% acc   {} loc/min   {} lines in {}",
                result.wpm,
                result.accuracy,
                result.loc_per_minute,
                result.lines_completed,
                format_clock(result.time_elapsed_secs)
            ),
            bold_style(),
        )),
        Line::from(Span::styled(
            format!(
                "{} correct / {} mistyped of {} characters, {} chars/sec",
                result.correct_characters,
                result.mistyped_characters,
                result.total_characters,
                result.characters_per_second
            ),
            dim_style(),
        )),
        Line::from(""),
        Line::from(format!(
            "best: {} wpm   {}% acc   {} loc/min",
            history.best_wpm, history.best_accuracy, history.best_loc_per_minute
        )),
        Line::from(format!(
            "last {}: {} wpm   {}% acc   {} loc/min   {}% consistency",
            history.session_history.len(),
            history.average_wpm(),
            history.average_accuracy(),
            history.average_loc_per_minute(),
            history.consistency_score()
        )),
        Line::from(Span::styled(
            format!(
                "lifetime: {} sessions   {} lines   {}% acc   {} loc/min",
                history.total_sessions_played,
                history.lifetime_lines_completed,
                history.lifetime_accuracy(),
                history.lifetime_average_loc_per_minute()
            ),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        )),
    ];

    Paragraph::new(summary)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);

    let points = wpm_points(&history.session_history);
    let (sessions, highest_wpm) = compute_chart_params(&points);
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .block(Block::default().borders(Borders::TOP).title("recent sessions"))
        .x_axis(
            Axis::default()
                .title("session")
                .bounds([1.0, sessions])
                .labels(vec![
                    Span::styled("1", bold_style()),
                    Span::styled(format_label(sessions), bold_style()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style()),
                    Span::styled(format_label(highest_wpm), bold_style()),
                ]),
        )
        .render(chunks[1], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{fixed_test_time, Clock};
    use crate::config::Setting;
    use crate::corpus::{Corpus, SnippetSource};
    use crate::random::ScriptedRandom;
    use crate::storage::MemoryStore;
    use std::rc::Rc;

    fn create_test_app(mode: GameMode) -> App {
        let corpus: Rc<dyn SnippetSource> = Rc::new(Corpus::from_blocks([(
            "rust",
            vec!["fn main() {\n    println!(\"hi\");\n}"],
        )]));
        App::new(Game::new(
            corpus,
            Box::new(ScriptedRandom::zeros()),
            Clock::fixed(fixed_test_time()),
            Rc::new(MemoryStore::new()),
            mode,
        ))
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_waiting_screen_shows_code() {
        let app = create_test_app(GameMode::Free);
        let rendered = render(&app, 80, 24);

        assert!(rendered.contains("coderacer"));
        assert!(rendered.contains("Free"));
        assert!(rendered.contains("Rust"));
        assert!(rendered.contains("fn main() {"));
        assert!(rendered.contains("  1 "));
    }

    #[test]
    fn test_active_line_colours() {
        let mut app = create_test_app(GameMode::Free);
        app.game.update_input_buffer("fx");
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);

        // row 2 is the first code row, after the number gutter and margin
        let first_char = &buffer[(HORIZONTAL_MARGIN + 4, 2)];
        assert_eq!(first_char.symbol(), "f");
        assert_eq!(first_char.fg, Color::Green);
        let wrong = &buffer[(HORIZONTAL_MARGIN + 5, 2)];
        assert_eq!(wrong.symbol(), "x");
        assert_eq!(wrong.fg, Color::Red);
    }

    #[test]
    fn test_line_numbers_can_be_hidden() {
        let mut app = create_test_app(GameMode::Free);
        app.game.toggle_setting(Setting::LineNumbers);
        let rendered = render(&app, 80, 24);

        assert!(!rendered.contains("  1 fn"));
        assert!(rendered.contains("fn main() {"));
    }

    #[test]
    fn test_sprint_progress_in_stats_bar() {
        let app = create_test_app(GameMode::sprint());
        let rendered = render(&app, 80, 24);

        assert!(rendered.contains("0/10 lines"));
        assert!(rendered.contains("Complete 10 lines as fast as possible"));
    }

    #[test]
    fn test_finished_shows_results() {
        let mut app = create_test_app(GameMode::challenge());
        app.game.update_input_buffer("f");
        app.game.clock_mut().advance_secs(60);
        app.game.on_tick();
        assert_eq!(app.game.phase(), Phase::Finished);

        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("lifetime: 1 sessions"));
        assert!(rendered.contains("recent sessions"));
    }

    #[test]
    fn test_browse_lists_library() {
        let app = create_test_app(GameMode::Browse);
        let rendered = render(&app, 80, 24);

        assert!(rendered.contains("snippet library"));
        assert!(rendered.contains("## Rust (1 blocks)"));
        assert!(rendered.contains("lines in the library"));
    }

    #[test]
    fn test_mixed_mode_tags_lines() {
        let mut app = create_test_app(GameMode::Free);
        app.game.toggle_mixed_language();
        let rendered = render(&app, 80, 24);

        assert!(rendered.contains("// rust"));
        assert!(rendered.contains("mixed"));
    }

    #[test]
    fn test_small_area_does_not_panic() {
        let mut app = create_test_app(GameMode::Free);
        app.game.update_input_buffer("fn");
        for (w, h) in [(1, 1), (5, 3), (10, 5), (200, 60)] {
            render(&app, w, h);
        }
        app.game.pause();
        render(&app, 40, 10);
    }
}
