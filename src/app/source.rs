// JobRadar - app/source.rs
//
// The message-source collaborator: the transport the scan pulls chats and
// messages from. Implementations block on network I/O; the scan drives them
// sequentially from a single thread of control.

use crate::core::model::ChatRef;
use crate::util::constants;
use crate::util::error::SourceError;
use chrono::{DateTime, Utc};

/// Account credentials for a live transport session.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_id: i32,
    pub api_hash: String,
    pub phone_number: String,
}

// Secrets never reach log output, not even through `{:?}`.
impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("phone_number", &"<redacted>")
            .finish()
    }
}

/// A chat entity the transport resolved a [`ChatRef`] to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChat {
    pub id: i64,
    pub username: Option<String>,
    pub title: Option<String>,
}

impl ResolvedChat {
    /// Title, else username, else the reference the chat was resolved from.
    pub fn display_name(&self, fallback: &str) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.username.as_deref().filter(|u| !u.trim().is_empty()))
            .unwrap_or(fallback)
            .to_string()
    }
}

/// One message as delivered by the transport. Service messages may carry
/// no text or no date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMessage {
    pub id: i64,
    pub date: Option<DateTime<Utc>>,
    pub text: Option<String>,
}

/// Iterator over a chat's history.
pub type MessageIter<'a> = Box<dyn Iterator<Item = Result<RemoteMessage, SourceError>> + 'a>;

/// Abstract chat transport.
///
/// `iter_messages` must yield strictly newest-first: the scan stops at the
/// first message older than its cutoff.
pub trait MessageSource {
    /// Open the transport session.
    fn connect(&mut self, credentials: &ApiCredentials) -> Result<(), SourceError>;

    /// Close the session. Called once per scan, also after failures.
    fn disconnect(&mut self) -> Result<(), SourceError>;

    fn is_authorized(&mut self) -> Result<bool, SourceError>;

    /// Ask the backend to deliver a one-time login code.
    fn send_code_request(&mut self, phone_number: &str) -> Result<(), SourceError>;

    /// Sign in with a login code. Returns [`SourceError::PasswordRequired`]
    /// when the account also needs its two-factor password.
    fn sign_in_with_code(&mut self, phone_number: &str, code: &str) -> Result<(), SourceError>;

    fn sign_in_with_password(&mut self, password: &str) -> Result<(), SourceError>;

    /// Resolve a username, numeric id or `-100`-prefixed private id.
    fn resolve(&mut self, chat_ref: &ChatRef) -> Result<ResolvedChat, SourceError>;

    /// Fetch one message by id. `Ok(None)` when it does not exist.
    fn get_message(
        &mut self,
        chat: &ResolvedChat,
        message_id: i64,
    ) -> Result<Option<RemoteMessage>, SourceError>;

    /// Newest-first history, at most `limit` messages.
    fn iter_messages<'a>(
        &'a mut self,
        chat: &ResolvedChat,
        limit: usize,
    ) -> Result<MessageIter<'a>, SourceError>;

    /// Public link to a message, empty when none can be built.
    fn message_link(&self, chat: &ResolvedChat, message_id: i64) -> String {
        default_message_link(chat, message_id)
    }
}

/// `https://t.me/<username>/<id>` for public chats, `https://t.me/c/<chat>/<id>`
/// otherwise.
pub fn default_message_link(chat: &ResolvedChat, message_id: i64) -> String {
    match chat.username.as_deref().map(str::trim) {
        Some(username) if !username.is_empty() => {
            format!("{}/{username}/{message_id}", constants::TELEGRAM_LINK_BASE)
        }
        _ if chat.id != 0 => {
            let internal = internal_chat_id(chat.id);
            format!("{}/c/{internal}/{message_id}", constants::TELEGRAM_LINK_BASE)
        }
        _ => String::new(),
    }
}

/// Strip the `-100` supergroup prefix so the id fits `t.me/c/` links.
fn internal_chat_id(id: i64) -> String {
    let full = id.to_string();
    full.strip_prefix(constants::PRIVATE_CHAT_ID_PREFIX)
        .map(str::to_string)
        .unwrap_or_else(|| id.abs().to_string())
}
