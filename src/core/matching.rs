// JobRadar - core/matching.rs
//
// Scores a message against a job profile and the exclusion phrases.
// Core layer: pure functions of their inputs, no I/O.
//
// A keyword matches when every one of its lemmas occurs in the message. A
// category (title/profile/industry) counts once toward the score when any of
// its keywords matches. Exclusion is evaluated independently of scoring and
// always wins.

use crate::core::lemma::{phrase_present, Lemmatizer, MorphAnalyzer};
use crate::core::model::{JobProfile, MatchResult};
use crate::util::constants;
use std::collections::HashSet;

/// Clamp the nominal threshold into `[1, max(1, active_criteria_count)]`.
pub fn effective_threshold(configured: u8, active_criteria_count: u8) -> u8 {
    if active_criteria_count == 0 {
        return 1;
    }
    configured.min(active_criteria_count).max(1)
}

/// One keyword or phrase with its pre-computed lemmas.
#[derive(Debug, Clone)]
struct Term {
    literal: String,
    lemmas: Vec<String>,
}

impl Term {
    fn compile(lemmatizer: &Lemmatizer, literal: &str) -> Self {
        Self {
            literal: literal.to_string(),
            lemmas: lemmatizer.extract_lemmas(literal),
        }
    }
}

fn compile_terms<S: AsRef<str>>(lemmatizer: &Lemmatizer, literals: &[S]) -> Vec<Term> {
    literals
        .iter()
        .map(|l| Term::compile(lemmatizer, l.as_ref()))
        .collect()
}

fn matched_literals(terms: &[Term], text_lemmas: &HashSet<String>) -> Vec<String> {
    terms
        .iter()
        .filter(|t| phrase_present(&t.lemmas, text_lemmas))
        .map(|t| t.literal.clone())
        .collect()
}

/// Deduplicate case-insensitively (after trimming), keeping first occurrence.
fn dedupe_terms(terms: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    terms
        .into_iter()
        .filter(|term| {
            let key = term.trim().to_lowercase();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

// =============================================================================
// Matcher
// =============================================================================

/// Message scorer owning the lemmatizer and the built-in noise phrases.
#[derive(Debug, Default)]
pub struct Matcher {
    lemmatizer: Lemmatizer,
}

impl Matcher {
    pub fn new(lemmatizer: Lemmatizer) -> Self {
        Self { lemmatizer }
    }

    pub fn with_analyzer(analyzer: Box<dyn MorphAnalyzer>) -> Self {
        Self::new(Lemmatizer::new(analyzer))
    }

    pub fn lemmatizer(&self) -> &Lemmatizer {
        &self.lemmatizer
    }

    /// Pre-compute keyword lemmas for repeated evaluation within one scan.
    pub fn compile<'m>(&'m self, profile: &JobProfile) -> CompiledProfile<'m> {
        CompiledProfile {
            lemmatizer: &self.lemmatizer,
            title: compile_terms(&self.lemmatizer, &profile.title_keywords),
            profile: compile_terms(&self.lemmatizer, &profile.profile_keywords),
            industry: compile_terms(&self.lemmatizer, &profile.industry_keywords),
            user_exclusions: compile_terms(&self.lemmatizer, &profile.exclusion_phrases),
            system_exclusions: compile_terms(
                &self.lemmatizer,
                constants::SYSTEM_EXCLUSION_PHRASES,
            ),
        }
    }

    /// Score `text` against `profile` in one shot.
    pub fn evaluate(&self, text: &str, profile: &JobProfile) -> MatchResult {
        self.compile(profile).evaluate(text)
    }

    /// Lemmas of every matched keyword, for highlighting them in the text.
    pub fn highlight_lemmas(&self, result: &MatchResult) -> HashSet<String> {
        result
            .matched_terms()
            .into_iter()
            .flat_map(|term| self.lemmatizer.extract_lemmas(term))
            .collect()
    }
}

/// A job profile with keyword lemmas computed once.
#[derive(Debug)]
pub struct CompiledProfile<'m> {
    lemmatizer: &'m Lemmatizer,
    title: Vec<Term>,
    profile: Vec<Term>,
    industry: Vec<Term>,
    user_exclusions: Vec<Term>,
    system_exclusions: Vec<Term>,
}

impl CompiledProfile<'_> {
    /// Number of non-empty keyword categories.
    pub fn active_criteria_count(&self) -> u8 {
        [&self.title, &self.profile, &self.industry]
            .iter()
            .filter(|terms| !terms.is_empty())
            .count() as u8
    }

    pub fn evaluate(&self, text: &str) -> MatchResult {
        let text_lemmas = self.lemmatizer.lemma_set(text);

        let matched_title_terms = matched_literals(&self.title, &text_lemmas);
        let matched_profile_terms = matched_literals(&self.profile, &text_lemmas);
        let matched_industry_terms = matched_literals(&self.industry, &text_lemmas);

        let mut exclusions = matched_literals(&self.user_exclusions, &text_lemmas);
        exclusions.extend(matched_literals(&self.system_exclusions, &text_lemmas));
        let matched_exclusion_terms = dedupe_terms(exclusions);

        let matched_title = !self.title.is_empty() && !matched_title_terms.is_empty();
        let matched_profile = !self.profile.is_empty() && !matched_profile_terms.is_empty();
        let matched_industry = !self.industry.is_empty() && !matched_industry_terms.is_empty();

        let score = [matched_title, matched_profile, matched_industry]
            .iter()
            .filter(|m| **m)
            .count() as u8;

        MatchResult {
            score,
            active_criteria_count: self.active_criteria_count(),
            excluded: !matched_exclusion_terms.is_empty(),
            matched_title,
            matched_profile,
            matched_industry,
            matched_title_terms,
            matched_profile_terms,
            matched_industry_terms,
            matched_exclusion_terms,
        }
    }
}
