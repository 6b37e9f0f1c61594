use std::collections::VecDeque;
use std::rc::Rc;

use crate::corpus::{
    resolve_language, LanguageSelector, SnippetSource, DEFAULT_LANGUAGE, MIXED_LANGUAGE,
    PLACEHOLDER_LINE,
};
use crate::random::RandomSource;

/// Shift windows never hold fewer lines than this, so there is always lookahead to render.
pub const MIN_SHIFT_WINDOW: usize = 60;

/// Random draws allowed while looking for non-blank material.
pub const MAX_DRAW_ATTEMPTS: usize = 50;

/// How the window moves when a line is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum FeedDiscipline {
    /// Treadmill: the active line is always index 0; completed lines are
    /// dropped from the front and fresh ones appended at the back.
    Shift,
    /// A cursor walks a fixed window; nothing is removed.
    Scroll,
}

/// One row of the window as the host should render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub text: String,
    /// The part the user has to type.
    pub trimmed: String,
    pub leading_whitespace: String,
    pub index: usize,
    pub language: String,
}

/// Lines of a fetched block not yet admitted into the window.
#[derive(Debug, Default)]
struct Lookahead {
    lines: VecDeque<String>,
    language: String,
}

/// Bounded, self-replenishing window of code lines.
pub struct LineFeed {
    source: Rc<dyn SnippetSource>,
    rng: Box<dyn RandomSource>,
    lines: VecDeque<String>,
    line_languages: VecDeque<String>,
    lookahead: Lookahead,
    discipline: FeedDiscipline,
    selector: LanguageSelector,
    mixed: bool,
    target: usize,
    completed_count: usize,
    current_language: String,
}

impl std::fmt::Debug for LineFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineFeed")
            .field("discipline", &self.discipline)
            .field("selector", &self.selector)
            .field("mixed", &self.mixed)
            .field("target", &self.target)
            .field("len", &self.lines.len())
            .field("completed_count", &self.completed_count)
            .finish()
    }
}

impl LineFeed {
    /// An empty feed; call [`LineFeed::initialize`] before use.
    pub fn new(source: Rc<dyn SnippetSource>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            source,
            rng,
            lines: VecDeque::new(),
            line_languages: VecDeque::new(),
            lookahead: Lookahead::default(),
            discipline: FeedDiscipline::Shift,
            selector: LanguageSelector::Any,
            mixed: false,
            target: 0,
            completed_count: 0,
            current_language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Repopulate the window from scratch.
    pub fn initialize(
        &mut self,
        target_count: usize,
        discipline: FeedDiscipline,
        selector: LanguageSelector,
        mixed: bool,
    ) {
        self.discipline = discipline;
        self.selector = selector;
        self.mixed = mixed;
        self.target = match discipline {
            FeedDiscipline::Shift => target_count.max(MIN_SHIFT_WINDOW),
            FeedDiscipline::Scroll => target_count,
        };
        self.lines.clear();
        self.line_languages.clear();
        self.lookahead = Lookahead::default();
        self.completed_count = 0;

        if mixed {
            self.current_language = MIXED_LANGUAGE.to_string();
        }
        while self.lines.len() < self.target {
            let (line, language) = self.next_line();
            self.lines.push_back(line);
            self.line_languages.push_back(language);
        }

        tracing::debug!(
            target_len = self.target,
            %discipline,
            mixed,
            language = %self.current_language,
            "line feed initialized"
        );
        self.skip_blank_lines();
    }

    /// Every line in the window, ready for rendering.
    pub fn display_lines(&self) -> Vec<DisplayLine> {
        self.lines
            .iter()
            .zip(self.line_languages.iter())
            .enumerate()
            .map(|(index, (line, language))| {
                let trimmed = line.trim_start();
                let (text, leading) = if self.mixed {
                    (trimmed, "")
                } else {
                    (line.as_str(), &line[..line.len() - trimmed.len()])
                };
                DisplayLine {
                    text: text.to_string(),
                    trimmed: trimmed.to_string(),
                    leading_whitespace: leading.to_string(),
                    index,
                    language: language.clone(),
                }
            })
            .collect()
    }

    /// Offer the user's input for the active line.
    ///
    /// Only an exact match against the trimmed active line advances the feed.
    pub fn submit_candidate(&mut self, input: &str) -> bool {
        match self.active_line() {
            Some(line) if line.trim_start() == input => {}
            _ => return false,
        }
        self.advance();
        self.skip_blank_lines();
        true
    }

    /// Window index of the line being typed, None once a scroll feed is exhausted.
    pub fn active_index(&self) -> Option<usize> {
        let idx = match self.discipline {
            FeedDiscipline::Shift => 0,
            FeedDiscipline::Scroll => self.completed_count,
        };
        (idx < self.lines.len()).then_some(idx)
    }

    pub fn active_line(&self) -> Option<&str> {
        self.active_index().map(|idx| self.lines[idx].as_str())
    }

    /// The text the user has to type for the active line.
    pub fn active_target(&self) -> Option<&str> {
        self.active_line().map(str::trim_start)
    }

    pub fn active_language(&self) -> Option<&str> {
        self.active_index().map(|idx| self.line_languages[idx].as_str())
    }

    pub fn is_exhausted(&self) -> bool {
        self.active_index().is_none()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn target_len(&self) -> usize {
        self.target
    }

    pub fn discipline(&self) -> FeedDiscipline {
        self.discipline
    }

    pub fn is_mixed(&self) -> bool {
        self.mixed
    }

    /// Language of the most recently fetched block, or `mixed`.
    pub fn current_language(&self) -> &str {
        &self.current_language
    }

    fn advance(&mut self) {
        if self.discipline == FeedDiscipline::Shift {
            self.lines.pop_front();
            self.line_languages.pop_front();
            while self.lines.len() < self.target {
                let (line, language) = self.next_line();
                self.lines.push_back(line);
                self.line_languages.push_back(language);
            }
            self.lines.truncate(self.target);
            self.line_languages.truncate(self.target);
        }
        self.completed_count += 1;
    }

    fn skip_blank_lines(&mut self) {
        while let Some(line) = self.active_line() {
            if !line.trim_start().is_empty() {
                break;
            }
            self.advance();
        }
    }

    /// Next line to admit into the window, with its language tag.
    fn next_line(&mut self) -> (String, String) {
        if self.mixed {
            return self.random_line_any_language();
        }
        if self.lookahead.lines.is_empty() {
            let (language, lines) = self.fetch_block();
            self.current_language.clone_from(&language);
            self.lookahead = Lookahead {
                lines: lines.into(),
                language,
            };
        }
        match self.lookahead.lines.pop_front() {
            Some(line) => (line, self.lookahead.language.clone()),
            None => placeholder(),
        }
    }

    /// A whole block from the selected language that contains something to type.
    fn fetch_block(&mut self) -> (String, Vec<String>) {
        for _ in 0..MAX_DRAW_ATTEMPTS {
            let requested = match &self.selector {
                LanguageSelector::Fixed(lang) => lang.clone(),
                LanguageSelector::Any => {
                    let languages = self.source.languages();
                    if languages.is_empty() {
                        break;
                    }
                    languages[self.rng.next_int(languages.len())].to_string()
                }
            };
            let Some((language, blocks)) = resolve_language(self.source.as_ref(), &requested)
            else {
                break;
            };
            let Some(block) = blocks.get(self.rng.next_int(blocks.len())) else {
                break;
            };
            if block.split('\n').any(|l| !l.trim_start().is_empty()) {
                return (language, block.split('\n').map(str::to_string).collect());
            }
        }
        tracing::warn!(selector = ?self.selector, "no usable block found, using placeholder");
        let (line, language) = placeholder();
        (language, vec![line])
    }

    /// One random non-blank line from a random block of a random language,
    /// with its indentation stripped.
    fn random_line_any_language(&mut self) -> (String, String) {
        let languages = self.source.languages();
        if !languages.is_empty() {
            for _ in 0..MAX_DRAW_ATTEMPTS {
                let language = languages[self.rng.next_int(languages.len())];
                let Some(block) = self
                    .source
                    .blocks(language)
                    .and_then(|blocks| blocks.get(self.rng.next_int(blocks.len())))
                else {
                    continue;
                };
                let block_lines: Vec<&str> = block.split('\n').collect();
                let line = block_lines[self.rng.next_int(block_lines.len())].trim_start();
                if !line.is_empty() {
                    return (line.to_string(), language.to_string());
                }
            }
        }
        tracing::warn!("no non-blank line found across languages, using placeholder");
        placeholder()
    }
}

fn placeholder() -> (String, String) {
    (PLACEHOLDER_LINE.to_string(), DEFAULT_LANGUAGE.to_string())
}
