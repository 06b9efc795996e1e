// JobRadar - core/lemma.rs
//
// Tokenisation and lemma extraction for keyword matching.
// Core layer: pure logic. The morphological analyzer is a pluggable strategy
// injected into `Lemmatizer`; the default is the identity analyzer so matching
// always degrades to literal, case-insensitive token comparison.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"[\w-]+").expect("lemma: invalid word regex"))
}

// =============================================================================
// Analyzer strategy
// =============================================================================

/// Reduces one lowercased token to its dictionary/normal form.
///
/// Returning `None` (or an empty string) means "no candidate"; the token is
/// then used unchanged as its own lemma.
pub trait MorphAnalyzer: Send + Sync {
    fn normal_form(&self, token: &str) -> Option<String>;

    /// Short identifier for logging.
    fn name(&self) -> &'static str;
}

/// Analyzer that never produces a candidate: every token is its own lemma.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityAnalyzer;

impl MorphAnalyzer for IdentityAnalyzer {
    fn normal_form(&self, _token: &str) -> Option<String> {
        None
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Snowball stemmer: Russian for Cyrillic tokens, English otherwise.
///
/// Stems are not true dictionary forms, but keyword and text go through the
/// same reduction, so inflected forms of one word meet on the same stem.
pub struct SnowballAnalyzer {
    russian: Stemmer,
    english: Stemmer,
}

impl SnowballAnalyzer {
    pub fn new() -> Self {
        Self {
            russian: Stemmer::create(Algorithm::Russian),
            english: Stemmer::create(Algorithm::English),
        }
    }
}

impl Default for SnowballAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SnowballAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SnowballAnalyzer")
    }
}

impl MorphAnalyzer for SnowballAnalyzer {
    fn normal_form(&self, token: &str) -> Option<String> {
        let is_cyrillic = token
            .chars()
            .any(|c| matches!(c, '\u{0400}'..='\u{04FF}'));
        let stemmer = if is_cyrillic {
            &self.russian
        } else {
            &self.english
        };
        Some(stemmer.stem(token).into_owned())
    }

    fn name(&self) -> &'static str {
        "snowball"
    }
}

/// Analyzer selection as stored in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyzerKind {
    Identity,
    #[default]
    Snowball,
}

impl AnalyzerKind {
    /// Parse a config value (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "identity" | "none" => Some(Self::Identity),
            "snowball" | "stemmer" => Some(Self::Snowball),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Snowball => "snowball",
        }
    }

    /// Build the analyzer this kind names.
    pub fn build(&self) -> Box<dyn MorphAnalyzer> {
        match self {
            Self::Identity => Box::new(IdentityAnalyzer),
            Self::Snowball => Box::new(SnowballAnalyzer::new()),
        }
    }
}

// =============================================================================
// Lemmatizer
// =============================================================================

/// Turns free text into lemma sequences using an injected analyzer.
pub struct Lemmatizer {
    analyzer: Box<dyn MorphAnalyzer>,
}

impl Lemmatizer {
    pub fn new(analyzer: Box<dyn MorphAnalyzer>) -> Self {
        Self { analyzer }
    }

    pub fn analyzer_name(&self) -> &'static str {
        self.analyzer.name()
    }

    /// Lemmas of every token in `text`, in occurrence order, not deduplicated.
    ///
    /// Tokens are runs of word characters and hyphens, lowercased before
    /// analysis. Never fails: without an analyzer candidate the token itself
    /// is its lemma.
    pub fn extract_lemmas(&self, text: &str) -> Vec<String> {
        word_pattern()
            .find_iter(text)
            .map(|m| self.lemma_of(m.as_str()))
            .collect()
    }

    /// Lemmas of `text` as a set, for presence checks.
    pub fn lemma_set(&self, text: &str) -> HashSet<String> {
        self.extract_lemmas(text).into_iter().collect()
    }

    fn lemma_of(&self, token: &str) -> String {
        let lowered = token.to_lowercase();
        match self.analyzer.normal_form(&lowered) {
            Some(lemma) if !lemma.is_empty() => lemma,
            _ => lowered,
        }
    }

    /// Wrap every token of `text` whose lemma is in `highlight` with the
    /// given markers. Everything between tokens is copied unchanged.
    pub fn highlight(&self, text: &str, highlight: &HashSet<String>, open: &str, close: &str) -> String {
        if highlight.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for m in word_pattern().find_iter(text) {
            out.push_str(&text[cursor..m.start()]);
            if highlight.contains(&self.lemma_of(m.as_str())) {
                out.push_str(open);
                out.push_str(m.as_str());
                out.push_str(close);
            } else {
                out.push_str(m.as_str());
            }
            cursor = m.end();
        }
        out.push_str(&text[cursor..]);
        out
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new(Box::new(IdentityAnalyzer))
    }
}

impl fmt::Debug for Lemmatizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lemmatizer")
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

/// True when every lemma of a phrase occurs somewhere in `text_lemmas`.
///
/// Co-occurrence, not adjacency: word order and distance are ignored. An
/// empty phrase is never present.
pub fn phrase_present(phrase_lemmas: &[String], text_lemmas: &HashSet<String>) -> bool {
    !phrase_lemmas.is_empty() && phrase_lemmas.iter().all(|l| text_lemmas.contains(l))
}
