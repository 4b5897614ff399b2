//! Session and message storage contracts with an in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use ccommon::{BoxFuture, SessionId};
use chrono::{DateTime, Utc};

use crate::{ChatError, ChatMessage, ChatSession};

pub type ChatFuture<'a, T> = BoxFuture<'a, T>;

pub trait SessionStore: Send + Sync {
    fn find_session<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> ChatFuture<'a, Result<Option<ChatSession>, ChatError>>;

    fn save_session<'a>(&'a self, session: ChatSession) -> ChatFuture<'a, Result<(), ChatError>>;

    /// Moves `updated_at` forward to `at`, leaving every other field as stored.
    fn touch_session<'a>(
        &'a self,
        session_id: &'a SessionId,
        at: DateTime<Utc>,
    ) -> ChatFuture<'a, Result<(), ChatError>>;

    fn save_message<'a>(&'a self, message: ChatMessage) -> ChatFuture<'a, Result<(), ChatError>>;

    /// Saves all of `messages` or none of them.
    fn save_messages<'a>(
        &'a self,
        messages: Vec<ChatMessage>,
    ) -> ChatFuture<'a, Result<(), ChatError>>;

    /// Messages of a session ordered by timestamp.
    fn find_messages<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> ChatFuture<'a, Result<Vec<ChatMessage>, ChatError>>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, ChatSession>>,
    messages: Mutex<HashMap<SessionId, Vec<ChatMessage>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn find_session<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> ChatFuture<'a, Result<Option<ChatSession>, ChatError>> {
        Box::pin(async move {
            let sessions = self
                .sessions
                .lock()
                .map_err(|_| ChatError::store("session store lock poisoned"))?;

            Ok(sessions.get(session_id).cloned())
        })
    }

    fn save_session<'a>(&'a self, session: ChatSession) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let mut sessions = self
                .sessions
                .lock()
                .map_err(|_| ChatError::store("session store lock poisoned"))?;

            sessions.insert(session.id.clone(), session);
            Ok(())
        })
    }

    fn touch_session<'a>(
        &'a self,
        session_id: &'a SessionId,
        at: DateTime<Utc>,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let mut sessions = self
                .sessions
                .lock()
                .map_err(|_| ChatError::store("session store lock poisoned"))?;

            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| ChatError::session_not_found(session_id))?;
            session.updated_at = session.updated_at.max(at);
            Ok(())
        })
    }

    fn save_message<'a>(&'a self, message: ChatMessage) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            message.validate()?;

            let mut messages = self
                .messages
                .lock()
                .map_err(|_| ChatError::store("message store lock poisoned"))?;

            messages
                .entry(message.session_id.clone())
                .or_default()
                .push(message);

            Ok(())
        })
    }

    fn save_messages<'a>(
        &'a self,
        messages: Vec<ChatMessage>,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            for message in &messages {
                message.validate()?;
            }

            let mut stored = self
                .messages
                .lock()
                .map_err(|_| ChatError::store("message store lock poisoned"))?;

            for message in messages {
                stored
                    .entry(message.session_id.clone())
                    .or_default()
                    .push(message);
            }

            Ok(())
        })
    }

    fn find_messages<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> ChatFuture<'a, Result<Vec<ChatMessage>, ChatError>> {
        Box::pin(async move {
            let messages = self
                .messages
                .lock()
                .map_err(|_| ChatError::store("message store lock poisoned"))?;

            let mut found = messages.get(session_id).cloned().unwrap_or_default();
            found.sort_by_key(|message| message.timestamp);
            Ok(found)
        })
    }
}
