// JobRadar - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// =============================================================================
// Job profile
// =============================================================================

/// Keyword profile a message is scored against.
///
/// Keyword order is irrelevant to scoring. Owned by configuration and
/// read-only to the scan pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProfile {
    /// Job title keywords (e.g. "директор", "developer").
    pub title_keywords: Vec<String>,

    /// Functional profile keywords (e.g. "развитие", "fastapi").
    pub profile_keywords: Vec<String>,

    /// Industry keywords (e.g. "финтех").
    pub industry_keywords: Vec<String>,

    /// User-defined phrases that disqualify a message.
    pub exclusion_phrases: Vec<String>,

    /// Stored "categories required" setting, always within 1-3.
    pub min_match_score: u8,
}

impl Default for JobProfile {
    fn default() -> Self {
        Self {
            title_keywords: Vec::new(),
            profile_keywords: Vec::new(),
            industry_keywords: Vec::new(),
            exclusion_phrases: Vec::new(),
            min_match_score: crate::util::constants::DEFAULT_MIN_MATCH_SCORE,
        }
    }
}

impl JobProfile {
    /// Number of non-empty keyword categories (0-3).
    pub fn active_criteria_count(&self) -> u8 {
        [
            &self.title_keywords,
            &self.profile_keywords,
            &self.industry_keywords,
        ]
        .iter()
        .filter(|keywords| !keywords.is_empty())
        .count() as u8
    }
}

/// Transport account fields as entered by the user. All three filled means a
/// live scan; all three empty means a demo scan.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramSettings {
    pub api_id: String,
    pub api_hash: String,
    pub phone_number: String,
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &str| if v.trim().is_empty() { "" } else { "<set>" };
        f.debug_struct("TelegramSettings")
            .field("api_id", &mask(&self.api_id))
            .field("api_hash", &mask(&self.api_hash))
            .field("phone_number", &mask(&self.phone_number))
            .finish()
    }
}

// =============================================================================
// Sources
// =============================================================================

/// Reference used to resolve a chat through the message source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChatRef {
    /// Username, handle, or URL path tail.
    Name(String),
    /// Numeric chat id, including `-100`-prefixed private channel ids.
    Id(i64),
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Resolved addressing for one normalised source entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    /// The source exactly as it appears in the normalised list.
    pub raw_source: String,

    /// What to hand to the message source for entity resolution.
    pub chat_ref: ChatRef,

    /// Set when the source points at one specific message.
    pub message_id: Option<i64>,
}

// =============================================================================
// Messages and matches
// =============================================================================

/// Read-only snapshot of one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub channel: String,
    pub published_at: DateTime<Utc>,
    pub text: String,
    pub link: String,
}

/// Outcome of scoring one message against a [`JobProfile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Number of matched keyword categories (0-3).
    pub score: u8,

    /// Number of non-empty keyword categories (0-3).
    pub active_criteria_count: u8,

    /// True when any user or built-in exclusion phrase matched.
    pub excluded: bool,

    pub matched_title: bool,
    pub matched_profile: bool,
    pub matched_industry: bool,

    /// Literal keywords that matched, per category, in profile order.
    pub matched_title_terms: Vec<String>,
    pub matched_profile_terms: Vec<String>,
    pub matched_industry_terms: Vec<String>,

    /// Exclusion phrases that matched (user first, then built-in), deduplicated
    /// case-insensitively.
    pub matched_exclusion_terms: Vec<String>,
}

impl MatchResult {
    /// All matched keywords across the three categories, first occurrence kept.
    pub fn matched_terms(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for term in self
            .matched_title_terms
            .iter()
            .chain(&self.matched_profile_terms)
            .chain(&self.matched_industry_terms)
        {
            if !seen.contains(&term.as_str()) {
                seen.push(term.as_str());
            }
        }
        seen
    }
}

/// A message that passed the exclusion and threshold checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub channel: String,
    pub published_at: DateTime<Utc>,
    pub text: String,
    pub link: String,
    pub match_result: MatchResult,
}

// =============================================================================
// Scan progress and report
// =============================================================================

/// Stage of the scan a progress snapshot was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// About to resolve the next source.
    ChatStart,
    /// Source resolved to a chat; messages are about to load.
    ChatResolved,
    /// A message passed all checks (`latest_match` is set).
    MatchFound,
    /// Periodic heartbeat while scanning messages.
    MessageProgress,
    /// All messages of the current source were processed.
    ChatDone,
}

impl ScanPhase {
    /// Stable wire name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatStart => "chat_start",
            Self::ChatResolved => "chat_resolved",
            Self::MatchFound => "match_found",
            Self::MessageProgress => "message_progress",
            Self::ChatDone => "chat_done",
        }
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral progress snapshot handed to the scan observer. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    pub phase: ScanPhase,

    /// Raw source before resolution, chat display name afterwards.
    pub current_chat: String,

    /// 1-based position of the current source in the source list.
    pub current_chat_index: usize,

    pub completed_chats: usize,
    pub total_chats: usize,
    pub scanned_messages: usize,
    pub matched_count: usize,

    /// The record that triggered a `MatchFound` snapshot.
    pub latest_match: Option<MatchRecord>,
}

impl ScanProgress {
    /// Estimate the remaining scan time from the time spent so far.
    ///
    /// Returns `None` until at least one chat has completed, and zero once
    /// every chat has completed.
    pub fn eta(&self, elapsed: Duration) -> Option<Duration> {
        if self.total_chats > 0 && self.completed_chats >= self.total_chats {
            return Some(Duration::ZERO);
        }
        if self.completed_chats == 0 {
            return None;
        }
        let per_chat = elapsed.as_secs_f64() / self.completed_chats as f64;
        let remaining = (self.total_chats - self.completed_chats) as f64;
        Some(Duration::from_secs_f64(per_chat * remaining))
    }
}

/// Final output of one scan run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Sources that resolved and were scanned.
    pub scanned_chats: usize,

    /// Non-empty messages inside the lookback window that were evaluated.
    pub scanned_messages: usize,

    /// Matches, deduplicated by identity key, in first-seen order.
    pub matched_records: Vec<MatchRecord>,

    /// True when the run ended because cancellation was requested.
    pub canceled: bool,
}
