use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeMap;

static SNIPPET_DIR: Dir = include_dir!("src/snippets");

/// Language used whenever a requested corpus is missing.
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// Tag reported by the feed while it mixes lines from every language.
pub const MIXED_LANGUAGE: &str = "mixed";

/// Preference value meaning "any language".
pub const ALL_LANGUAGES: &str = "all";

/// Line served when no non-blank material can be found.
pub const PLACEHOLDER_LINE: &str = "console.log(\"Hello World\");";

/// Read-only provider of language-tagged snippet blocks.
pub trait SnippetSource {
    /// All blocks for `language`, or None when the language is unknown.
    fn blocks(&self, language: &str) -> Option<&[String]>;
    /// Every language key with at least one block, sorted.
    fn languages(&self) -> Vec<&str>;
}

#[derive(Deserialize, Clone, Debug)]
struct SnippetFile {
    language: String,
    blocks: Vec<String>,
}

/// In-memory snippet corpus keyed by language.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    by_language: BTreeMap<String, Vec<String>>,
}

impl Corpus {
    /// Corpus bundled into the binary.
    pub fn embedded() -> Self {
        let mut by_language = BTreeMap::new();
        for file in SNIPPET_DIR.files() {
            let Some(contents) = file.contents_utf8() else {
                tracing::warn!(path = %file.path().display(), "snippet file is not utf-8");
                continue;
            };
            match serde_json::from_str::<SnippetFile>(contents) {
                Ok(snippets) => {
                    by_language.insert(snippets.language, snippets.blocks);
                }
                Err(e) => {
                    tracing::warn!(path = %file.path().display(), error = %e, "skipping snippet file");
                }
            }
        }
        Self::from_map(by_language)
    }

    /// Build a corpus from literal `(language, blocks)` pairs.
    pub fn from_blocks<L, B, S>(entries: impl IntoIterator<Item = (L, B)>) -> Self
    where
        L: Into<String>,
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let by_language = entries
            .into_iter()
            .map(|(lang, blocks)| (lang.into(), blocks.into_iter().map(Into::into).collect()))
            .collect();
        Self::from_map(by_language)
    }

    fn from_map(mut by_language: BTreeMap<String, Vec<String>>) -> Self {
        by_language.retain(|_, blocks| !blocks.is_empty());
        Self { by_language }
    }

    pub fn is_empty(&self) -> bool {
        self.by_language.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.by_language.values().map(Vec::len).sum()
    }
}

impl SnippetSource for Corpus {
    fn blocks(&self, language: &str) -> Option<&[String]> {
        self.by_language.get(language).map(Vec::as_slice)
    }

    fn languages(&self) -> Vec<&str> {
        self.by_language.keys().map(String::as_str).collect()
    }
}

/// Which corpus a feed draws its blocks from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSelector {
    Fixed(String),
    /// A uniformly random language for every block fetched.
    Any,
}

impl LanguageSelector {
    pub fn from_preference(pref: &str) -> Self {
        if pref.is_empty() || pref == ALL_LANGUAGES {
            Self::Any
        } else {
            Self::Fixed(pref.to_string())
        }
    }

    pub fn as_preference(&self) -> &str {
        match self {
            Self::Fixed(lang) => lang,
            Self::Any => ALL_LANGUAGES,
        }
    }
}

/// Resolve `requested` to a language the corpus actually has.
///
/// Languages without blocks count as missing. Falls back to
/// [`DEFAULT_LANGUAGE`], then to the first language with blocks.
/// Returns None only when no language has any.
pub fn resolve_language<'a, S: SnippetSource + ?Sized>(
    source: &'a S,
    requested: &str,
) -> Option<(String, &'a [String])> {
    let usable = |lang: &str| source.blocks(lang).filter(|blocks| !blocks.is_empty());
    if let Some(blocks) = usable(requested) {
        return Some((requested.to_string(), blocks));
    }
    tracing::debug!(requested, "language missing from corpus, falling back");
    if let Some(blocks) = usable(DEFAULT_LANGUAGE) {
        return Some((DEFAULT_LANGUAGE.to_string(), blocks));
    }
    source
        .languages()
        .into_iter()
        .find_map(|lang| usable(lang).map(|blocks| (lang.to_string(), blocks)))
}

/// Display metadata for a language key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub extension: &'static str,
}

const KNOWN_LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo { key: "all", name: "All Languages", extension: "txt" },
    LanguageInfo { key: "css", name: "CSS", extension: "css" },
    LanguageInfo { key: "go", name: "Go", extension: "go" },
    LanguageInfo { key: "java", name: "Java", extension: "java" },
    LanguageInfo { key: "javascript", name: "JavaScript", extension: "js" },
    LanguageInfo { key: "nodejs", name: "Node.js/Express", extension: "js" },
    LanguageInfo { key: "python", name: "Python", extension: "py" },
    LanguageInfo { key: "react", name: "React", extension: "jsx" },
    LanguageInfo { key: "regex", name: "Regex", extension: "regex" },
    LanguageInfo { key: "rust", name: "Rust", extension: "rs" },
    LanguageInfo { key: "shell", name: "Shell/Git/Docker", extension: "sh" },
    LanguageInfo { key: "sql", name: "SQL", extension: "sql" },
    LanguageInfo { key: "typescript", name: "TypeScript", extension: "ts" },
    LanguageInfo { key: "vue", name: "Vue", extension: "vue" },
];

pub fn language_info(key: &str) -> Option<&'static LanguageInfo> {
    KNOWN_LANGUAGES.iter().find(|info| info.key == key)
}

/// Human-readable name, or the key itself for unknown languages.
pub fn language_name(key: &str) -> &str {
    language_info(key).map_or(key, |info| info.name)
}

pub fn language_extension(key: &str) -> &str {
    language_info(key).map_or("txt", |info| info.extension)
}

/// Read-only catalogue of every block, grouped by language.
pub fn browse_listing<S: SnippetSource + ?Sized>(source: &S) -> Vec<String> {
    let mut out = vec![
        "# coderacer snippet library".to_string(),
        String::new(),
        "// Browse every block in the corpus; switch mode to start typing.".to_string(),
        String::new(),
    ];

    let languages = source.languages();
    for lang in &languages {
        let Some(blocks) = source.blocks(lang) else {
            continue;
        };
        out.push(format!("## {} ({} blocks)", language_name(lang), blocks.len()));
        out.push(String::new());
        for (i, block) in blocks.iter().enumerate() {
            out.push(format!("### {} #{}", language_extension(lang), i + 1));
            out.extend(block.lines().map(str::to_string));
            out.push(String::new());
        }
    }

    let counts = languages
        .iter()
        .map(|lang| format!("{}: {}", lang, source.blocks(lang).map_or(0, <[String]>::len)))
        .join(", ");
    out.push(format!("Library: {counts}"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Corpus {
        Corpus::from_blocks([
            ("rust", vec!["fn a() {}\n\nfn b() {}"]),
            ("go", vec!["func a() {}", "func b() {}"]),
            ("empty", vec![]),
        ])
    }

    #[test]
    fn test_embedded_corpus_loads() {
        let corpus = Corpus::embedded();

        assert!(!corpus.is_empty());
        assert!(corpus.blocks(DEFAULT_LANGUAGE).is_some());
        assert!(corpus.languages().contains(&"rust"));
    }

    #[test]
    fn test_languages_sorted_and_skip_empty() {
        let corpus = small();

        assert_eq!(corpus.languages(), vec!["go", "rust"]);
        assert_eq!(corpus.block_count(), 3);
    }

    #[test]
    fn test_resolve_language_falls_back_to_default() {
        let corpus = Corpus::from_blocks([
            ("javascript", vec!["let a = 1;"]),
            ("go", vec!["x := 1"]),
        ]);

        let (lang, blocks) = resolve_language(&corpus, "cobol").unwrap();
        assert_eq!(lang, "javascript");
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_resolve_language_falls_back_to_first_available() {
        let (lang, _) = resolve_language(&small(), "cobol").unwrap();
        assert_eq!(lang, "go");
    }

    /// Reports languages whose block lists are empty.
    struct Hollow {
        go: Vec<String>,
        none: Vec<String>,
    }

    impl SnippetSource for Hollow {
        fn blocks(&self, language: &str) -> Option<&[String]> {
            match language {
                "go" => Some(self.go.as_slice()),
                "javascript" | "rust" => Some(self.none.as_slice()),
                _ => None,
            }
        }

        fn languages(&self) -> Vec<&str> {
            vec!["go", "javascript", "rust"]
        }
    }

    #[test]
    fn test_resolve_language_skips_empty_block_lists() {
        let source = Hollow {
            go: vec!["x := 1".into()],
            none: Vec::new(),
        };

        let (lang, blocks) = resolve_language(&source, "rust").unwrap();
        assert_eq!(lang, "go");
        assert_eq!(blocks.len(), 1);

        let hollow = Hollow {
            go: Vec::new(),
            none: Vec::new(),
        };
        assert!(resolve_language(&hollow, "javascript").is_none());
    }

    #[test]
    fn test_resolve_language_empty_corpus() {
        assert!(resolve_language(&Corpus::default(), "rust").is_none());
    }

    #[test]
    fn test_selector_from_preference() {
        assert_eq!(LanguageSelector::from_preference("all"), LanguageSelector::Any);
        assert_eq!(LanguageSelector::from_preference(""), LanguageSelector::Any);
        assert_eq!(
            LanguageSelector::from_preference("rust"),
            LanguageSelector::Fixed("rust".into())
        );
        assert_eq!(LanguageSelector::Any.as_preference(), "all");
    }

    #[test]
    fn test_language_metadata() {
        assert_eq!(language_name("shell"), "Shell/Git/Docker");
        assert_eq!(language_extension("rust"), "rs");
        assert_eq!(language_name("cobol"), "cobol");
        assert_eq!(language_extension("cobol"), "txt");
    }

    #[test]
    fn test_browse_listing_contains_every_block() {
        let listing = browse_listing(&small());

        assert!(listing.iter().any(|l| l == "## Go (2 blocks)"));
        assert!(listing.iter().any(|l| l == "func b() {}"));
        assert!(listing.iter().any(|l| l == "fn b() {}"));
        assert_eq!(listing.last().unwrap(), "Library: go: 2, rust: 1");
    }
}
