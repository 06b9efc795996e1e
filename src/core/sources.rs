// JobRadar - core/sources.rs
//
// Parsing of user-entered lists: chat sources, search terms, ban lists.
// Core layer: pure string processing, no I/O.
//
// Source normalisation is order-preserving and deduplicates by semantic
// identity: `@name`, `name` and `https://t.me/name` collapse to one source,
// while a link to one specific message in that channel stays separate.

use crate::core::model::{ChatRef, ParsedSource};
use crate::util::constants;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

struct SourcePatterns {
    separator: Regex,
    search_separator: Regex,
    private_message: Regex,
    public_message: Regex,
    public_chat: Regex,
}

fn patterns() -> &'static SourcePatterns {
    static PATTERNS: OnceLock<SourcePatterns> = OnceLock::new();

    PATTERNS.get_or_init(|| {
        // Patterns are exercised by the unit tests below.
        fn re(pat: &str) -> Regex {
            Regex::new(pat).expect("sources: invalid regex")
        }

        SourcePatterns {
            separator: re(r"[\n,;]+"),
            search_separator: re(r"[\n,;/]+"),
            private_message: re(
                r"(?i)^(?:https?://)?t\.me/c/(?P<chat_id>\d+)/(?P<msg_id>\d+)/?$",
            ),
            public_message: re(r"(?i)^(?:https?://)?t\.me/(?P<chat>[^/]+)/(?P<msg_id>\d+)/?$"),
            public_chat: re(&format!(
                r"^[A-Za-z0-9_]{{{},}}$",
                constants::MIN_PUBLIC_CHAT_NAME_LEN
            )),
        }
    })
}

// =============================================================================
// Plain lists
// =============================================================================

/// Split a free-text blob on newlines, commas and semicolons.
///
/// Chunks are trimmed; empty chunks are dropped. With `lowercase` every chunk
/// is lowercased (keyword lists); without it the original casing is kept
/// (chat references, links).
pub fn parse_user_list_input(raw: &str, lowercase: bool) -> Vec<String> {
    split_trimmed(&patterns().separator, raw, lowercase)
}

/// Split search terms, additionally treating `/` as a separator between
/// variants (e.g. `ceo/исполнительный директор`). Always lowercases.
pub fn parse_search_terms_text(raw: &str) -> Vec<String> {
    split_trimmed(&patterns().search_separator, raw, true)
}

fn split_trimmed(separator: &Regex, raw: &str, lowercase: bool) -> Vec<String> {
    separator
        .split(raw)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            if lowercase {
                chunk.to_lowercase()
            } else {
                chunk.to_string()
            }
        })
        .collect()
}

// =============================================================================
// Chat sources
// =============================================================================

/// Parse a free-text blob of chat references into a normalised source list.
pub fn parse_chat_sources_text(raw: &str) -> Vec<String> {
    let base = parse_user_list_input(raw, false);
    parse_chat_sources_list(&base)
}

/// Normalise a list of chat references.
///
/// Space-joined legacy entries whose every token looks like a source are
/// exploded. Entries are then deduplicated by [`source_identity_key`]; the
/// first occurrence wins and keeps its original formatting.
pub fn parse_chat_sources_list<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for value in values {
        let chunk = value.as_ref().trim();
        if chunk.is_empty() {
            continue;
        }
        for source in split_chat_chunk(chunk) {
            let key = source_identity_key(source);
            if seen.insert(key) {
                normalized.push(source.to_string());
            }
        }
    }

    normalized
}

fn split_chat_chunk(chunk: &str) -> Vec<&str> {
    let parts: Vec<&str> = chunk.split_whitespace().collect();
    if parts.len() > 1 && parts.iter().all(|part| looks_like_source(part)) {
        parts
    } else {
        vec![chunk]
    }
}

/// True for tokens that are unambiguously chat references on their own.
fn looks_like_source(value: &str) -> bool {
    value.starts_with('@')
        || value.starts_with("http://")
        || value.starts_with("https://")
        || value.starts_with("t.me/")
        || value.starts_with(constants::PRIVATE_CHAT_ID_PREFIX)
        || (!value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
}

/// Strip a `https://t.me/`, `http://t.me/` or bare `t.me/` prefix
/// (case-insensitive) and return the remaining path.
fn strip_link_prefix(value: &str) -> Option<&str> {
    ["https://t.me/", "http://t.me/", "t.me/"]
        .iter()
        .find_map(|prefix| {
            let head = value.get(..prefix.len())?;
            head.eq_ignore_ascii_case(prefix)
                .then(|| &value[prefix.len()..])
        })
}

/// Identity key used to deduplicate sources. Never used for display.
///
/// - `https://t.me/c/<id>/<msg>` -> `msg:c/<id>/<msg>`
/// - `https://t.me/<chat>/<msg>` -> `msg:<chat>/<msg>`
/// - other t.me links, `@chat`, `chat` -> `chat:<chat>` when the chat name is
///   a valid public username
/// - anything else -> `raw:<value>`
///
/// All keys are lowercased.
pub fn source_identity_key(value: &str) -> String {
    let source = value.trim();
    if source.is_empty() {
        return String::new();
    }
    let p = patterns();

    if let Some(caps) = p.private_message.captures(source) {
        return format!("msg:c/{}/{}", &caps["chat_id"], &caps["msg_id"]);
    }

    if let Some(caps) = p.public_message.captures(source) {
        return format!("msg:{}/{}", caps["chat"].to_lowercase(), &caps["msg_id"]);
    }

    let lowered = source.to_lowercase();

    if let Some(path) = strip_link_prefix(source) {
        let path = path.trim_matches('/');
        let chat_ref = path.split('/').next().unwrap_or("").trim_start_matches('@');
        if p.public_chat.is_match(chat_ref) {
            return format!("chat:{}", chat_ref.to_lowercase());
        }
        return format!("raw:{lowered}");
    }

    if let Some(handle) = source.strip_prefix('@') {
        let handle = handle.trim();
        if p.public_chat.is_match(handle) {
            return format!("chat:{}", handle.to_lowercase());
        }
    }

    if p.public_chat.is_match(source) {
        return format!("chat:{lowered}");
    }

    format!("raw:{lowered}")
}

/// Derive the addressing for one normalised source entry.
///
/// Private message links become the full `-100<internal_id>` chat id; public
/// message links keep the chat name and pin the message id; other t.me links
/// resolve by their path tail; numeric references resolve by id.
pub fn parse_source(source: &str) -> ParsedSource {
    let value = source.trim();
    let p = patterns();

    if let Some(caps) = p.private_message.captures(value) {
        let full_id = format!("{}{}", constants::PRIVATE_CHAT_ID_PREFIX, &caps["chat_id"]);
        return ParsedSource {
            raw_source: value.to_string(),
            chat_ref: numeric_or_name(&full_id),
            message_id: caps["msg_id"].parse().ok(),
        };
    }

    if let Some(caps) = p.public_message.captures(value) {
        return ParsedSource {
            raw_source: value.to_string(),
            chat_ref: ChatRef::Name(caps["chat"].to_string()),
            message_id: caps["msg_id"].parse().ok(),
        };
    }

    if let Some(path) = strip_link_prefix(value) {
        return ParsedSource {
            raw_source: value.to_string(),
            chat_ref: ChatRef::Name(path.trim_matches('/').to_string()),
            message_id: None,
        };
    }

    ParsedSource {
        raw_source: value.to_string(),
        chat_ref: numeric_or_name(value),
        message_id: None,
    }
}

fn numeric_or_name(value: &str) -> ChatRef {
    match value.parse::<i64>() {
        Ok(id) => ChatRef::Id(id),
        Err(_) => ChatRef::Name(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_supports_newline_and_comma() {
        let values = parse_user_list_input("chat1, chat2\nchat3; chat4", false);
        assert_eq!(values, vec!["chat1", "chat2", "chat3", "chat4"]);
    }

    #[test]
    fn test_parser_lowercase_mode() {
        let values = parse_user_list_input("Director, Директор", true);
        assert_eq!(values, vec!["director", "директор"]);
    }

    #[test]
    fn test_search_terms_support_slash_separator() {
        let values = parse_search_terms_text("CEO/исполнительный директор/операционный директор");
        assert_eq!(
            values,
            vec!["ceo", "исполнительный директор", "операционный директор"]
        );
    }

    #[test]
    fn test_space_separated_handles_are_split() {
        assert_eq!(parse_chat_sources_text("@a @b @c"), vec!["@a", "@b", "@c"]);
    }

    #[test]
    fn test_legacy_single_item_value_is_split() {
        let values =
            parse_chat_sources_list(&["@topmanager_exclusive @workfortop @careerfedoroff"]);
        assert_eq!(
            values,
            vec!["@topmanager_exclusive", "@workfortop", "@careerfedoroff"]
        );
    }

    #[test]
    fn test_chunk_with_plain_words_is_kept_intact() {
        let values = parse_chat_sources_list(&["@jobs remote only"]);
        assert_eq!(values, vec!["@jobs remote only"]);
    }

    #[test]
    fn test_same_chat_is_deduplicated() {
        let values =
            parse_chat_sources_list(&["@rudakovahr", "@rudakovahr", "https://t.me/rudakovahr"]);
        assert_eq!(values, vec!["@rudakovahr"]);
    }

    #[test]
    fn test_chat_and_specific_message_are_kept() {
        let values = parse_chat_sources_list(&["@rudakovahr", "https://t.me/rudakovahr/7378"]);
        assert_eq!(values, vec!["@rudakovahr", "https://t.me/rudakovahr/7378"]);
    }

    #[test]
    fn test_first_occurrence_keeps_its_formatting() {
        let values = parse_chat_sources_list(&["https://t.me/RudakovaHR/", "@rudakovahr"]);
        assert_eq!(values, vec!["https://t.me/RudakovaHR/"]);
    }

    #[test]
    fn test_identity_keys() {
        assert_eq!(
            source_identity_key("https://t.me/c/123456/42"),
            "msg:c/123456/42"
        );
        assert_eq!(
            source_identity_key("https://t.me/Jobs_Channel/7/"),
            "msg:jobs_channel/7"
        );
        assert_eq!(source_identity_key("http://t.me/@Jobs_Channel"), "chat:jobs_channel");
        assert_eq!(source_identity_key("@Jobs_Channel"), "chat:jobs_channel");
        assert_eq!(source_identity_key("Jobs_Channel"), "chat:jobs_channel");
        assert_eq!(source_identity_key("https://t.me/+AbCd"), "raw:https://t.me/+abcd");
        assert_eq!(source_identity_key("-1001234567"), "raw:-1001234567");
        assert_eq!(source_identity_key("@ab"), "raw:@ab");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = parse_chat_sources_text("@a @b\nhttps://t.me/a, https://t.me/b/5; -1001");
        let twice = parse_chat_sources_list(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_private_message_link() {
        let parsed = parse_source("https://t.me/c/1234567/89");
        assert_eq!(parsed.chat_ref, ChatRef::Id(-1001234567));
        assert_eq!(parsed.message_id, Some(89));
    }

    #[test]
    fn test_parse_public_message_link() {
        let parsed = parse_source("https://t.me/rudakovahr/7378");
        assert_eq!(parsed.chat_ref, ChatRef::Name("rudakovahr".to_string()));
        assert_eq!(parsed.message_id, Some(7378));
    }

    #[test]
    fn test_parse_chat_link_handle_and_id() {
        let link = parse_source("https://t.me/jobs/");
        assert_eq!(link.chat_ref, ChatRef::Name("jobs".to_string()));
        assert_eq!(link.message_id, None);

        let handle = parse_source("@jobs");
        assert_eq!(handle.chat_ref, ChatRef::Name("@jobs".to_string()));

        let id = parse_source("-1001234567");
        assert_eq!(id.chat_ref, ChatRef::Id(-1001234567));
        assert_eq!(id.raw_source, "-1001234567");
    }
}
