// JobRadar - app/demo.rs
//
// In-memory message source used when no transport credentials are configured.
// Every resolved chat carries the same three sample vacancies, published a few
// minutes before the scan started, so the whole pipeline can be exercised
// without a network connection.

use crate::app::source::{ApiCredentials, MessageIter, MessageSource, RemoteMessage, ResolvedChat};
use crate::core::model::ChatRef;
use crate::util::error::SourceError;
use chrono::{DateTime, Duration, Utc};

/// Sample postings as `(message id, text, minutes-before-now multiplier)`.
const DEMO_MESSAGES: [(i64, &str, i64); 3] = [
    (
        101,
        "Ищем директора по развитию в финтех проект. Нужен опыт B2B продаж.",
        3,
    ),
    (
        102,
        "В команду нужен senior backend разработчик на Python и FastAPI.",
        2,
    ),
    (103, "Ищем менеджера аккаунтов в e-commerce. Офис Москва.", 1),
];

/// Offline message source with fixed sample vacancies.
#[derive(Debug)]
pub struct DemoSource {
    now: DateTime<Utc>,
    resolved: Vec<ResolvedChat>,
}

impl DemoSource {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            resolved: Vec::new(),
        }
    }

    /// 1-based order in which `chat` was resolved; spaces the sample
    /// timestamps of successive chats apart.
    fn chat_position(&self, chat: &ResolvedChat) -> i64 {
        self.resolved
            .iter()
            .position(|c| c == chat)
            .map_or(1, |i| i as i64 + 1)
    }

    fn sample(&self, position: i64, id: i64, text: &str, minutes: i64) -> RemoteMessage {
        RemoteMessage {
            id,
            date: Some(self.now - Duration::minutes(minutes * position)),
            text: Some(text.to_string()),
        }
    }
}

impl MessageSource for DemoSource {
    fn connect(&mut self, _credentials: &ApiCredentials) -> Result<(), SourceError> {
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    fn is_authorized(&mut self) -> Result<bool, SourceError> {
        Ok(true)
    }

    fn send_code_request(&mut self, _phone_number: &str) -> Result<(), SourceError> {
        Ok(())
    }

    fn sign_in_with_code(&mut self, _phone_number: &str, _code: &str) -> Result<(), SourceError> {
        Ok(())
    }

    fn sign_in_with_password(&mut self, _password: &str) -> Result<(), SourceError> {
        Ok(())
    }

    fn resolve(&mut self, chat_ref: &ChatRef) -> Result<ResolvedChat, SourceError> {
        let label = chat_ref.to_string();
        if let Some(known) = self
            .resolved
            .iter()
            .find(|c| c.title.as_deref() == Some(label.as_str()))
        {
            return Ok(known.clone());
        }

        let chat = match chat_ref {
            ChatRef::Name(name) => {
                let username = name.trim_start_matches('@').trim_end_matches('/');
                ResolvedChat {
                    id: self.resolved.len() as i64 + 1,
                    username: (!username.is_empty()).then(|| username.to_string()),
                    title: Some(name.clone()),
                }
            }
            ChatRef::Id(id) => ResolvedChat {
                id: *id,
                username: None,
                title: Some(id.to_string()),
            },
        };
        self.resolved.push(chat.clone());
        Ok(chat)
    }

    /// Any pinned id resolves to the first sample vacancy under that id.
    fn get_message(
        &mut self,
        chat: &ResolvedChat,
        message_id: i64,
    ) -> Result<Option<RemoteMessage>, SourceError> {
        let position = self.chat_position(chat);
        let (_, text, minutes) = DEMO_MESSAGES[0];
        Ok(Some(self.sample(position, message_id, text, minutes)))
    }

    fn iter_messages<'a>(
        &'a mut self,
        chat: &ResolvedChat,
        limit: usize,
    ) -> Result<MessageIter<'a>, SourceError> {
        let position = self.chat_position(chat);
        let newest_first: Vec<RemoteMessage> = DEMO_MESSAGES
            .iter()
            .rev()
            .map(|(id, text, minutes)| self.sample(position, *id, text, *minutes))
            .take(limit)
            .collect();
        Ok(Box::new(newest_first.into_iter().map(Ok)))
    }
}
