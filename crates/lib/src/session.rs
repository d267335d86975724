//! Chat sessions: one parameterized controller for the draft chat and the email search chat.
//!
//! A [`Feature`] names the storage key, the seed, how a turn is sent to the service
//! (whole history or a single question), and the message shown when a turn fails.
//! [`Session`] owns the in-memory log, persists it after every mutation, and moves
//! between `Idle` and `Sending` around the single in-flight request.

use crate::backend::{Backend, BackendError};
use crate::message_log::{self, Message, MessageLog, Role};
use crate::storage::{KeyValueStore, StorageError};
use std::sync::Arc;

pub const DRAFT_CHAT_KEY: &str = "chat_draft_messages";
pub const SEARCH_CHAT_KEY: &str = "email_search_messages";

/// Substituted when the service answers without a reply/answer or with a blank one.
pub const NO_ANSWER: &str = "No answer found.";

pub const DEFAULT_DRAFT_SYSTEM_PROMPT: &str = "You are an email assistant. Help the user write a clear, friendly email. When asked for a draft, reply with the email text only.";

const DRAFT_CHAT_FAILURE: &str = "⚠️ Could not reach the email assistant. Please try again.";
const SEARCH_CHAT_FAILURE: &str = "Failed to fetch answer.";

/// How a turn is sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// POST the whole log to the chat endpoint; the reply is in `reply`.
    History,
    /// POST only the new user text to the Q&A endpoint; the reply is in `answer`.
    Question,
}

/// Per-feature session parameters.
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: &'static str,
    pub storage_key: String,
    pub exchange: Exchange,
    /// Loaded when nothing valid is stored, and restored by `clear`.
    pub seed: Vec<Message>,
    /// Appended as the assistant message when a turn fails.
    pub failure_message: String,
    pub clearable: bool,
}

impl Feature {
    /// Chat-to-draft: seeded with a system prompt, sends full history, can be cleared.
    pub fn draft_chat(system_prompt: Option<String>) -> Self {
        let prompt = system_prompt.unwrap_or_else(|| DEFAULT_DRAFT_SYSTEM_PROMPT.to_string());
        Self {
            name: "draft chat",
            storage_key: DRAFT_CHAT_KEY.to_string(),
            exchange: Exchange::History,
            seed: vec![Message::system(prompt)],
            failure_message: DRAFT_CHAT_FAILURE.to_string(),
            clearable: true,
        }
    }

    /// Ask-about-emails: starts empty, sends one question per turn, never cleared.
    pub fn email_search() -> Self {
        Self {
            name: "email search",
            storage_key: SEARCH_CHAT_KEY.to_string(),
            exchange: Exchange::Question,
            seed: Vec::new(),
            failure_message: SEARCH_CHAT_FAILURE.to_string(),
            clearable: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} has no clear action")]
    NotClearable(&'static str),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
}

/// The request a turn issues, built when the turn starts.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    History(Vec<Message>),
    Question(String),
}

/// What a submit did to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Empty input or a turn already in flight; nothing changed.
    Ignored,
    /// The service replied; holds the appended assistant text.
    Answered(String),
    /// The request failed; holds the appended failure message.
    Failed(String),
}

/// One feature's conversation: log, input buffer, and send state.
pub struct Session {
    feature: Feature,
    log: MessageLog,
    messages: Vec<Message>,
    input: String,
    state: SessionState,
}

impl Session {
    /// Load the feature's log from `store` (or its seed).
    pub fn open(feature: Feature, store: Arc<dyn KeyValueStore>) -> Self {
        let log = MessageLog::new(store, feature.storage_key.clone(), feature.seed.clone());
        let messages = log.load();
        log::debug!(
            "session {}: loaded {} messages from {}",
            feature.name,
            messages.len(),
            log.key()
        );
        Self {
            feature,
            log,
            messages,
            input: String::new(),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Full log, including the system seed.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages shown to the user.
    pub fn visible(&self) -> Vec<&Message> {
        message_log::visible(&self.messages).collect()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Content of the most recent assistant message.
    pub fn latest_assistant(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    fn persist(&self) {
        if let Err(e) = self.log.save(&self.messages) {
            log::warn!("session {}: persisting log failed: {}", self.feature.name, e);
        }
    }

    /// Start a turn from the input buffer: append and persist the user message, clear the
    /// input, and return the request to issue. `None` when the input is blank or a turn is
    /// already in flight.
    pub fn begin(&mut self) -> Option<Outbound> {
        if self.state == SessionState::Sending {
            log::debug!("session {}: submit ignored while sending", self.feature.name);
            return None;
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.messages.push(Message::user(text.clone()));
        self.persist();
        self.input.clear();
        self.state = SessionState::Sending;
        Some(match self.feature.exchange {
            Exchange::History => Outbound::History(self.messages.clone()),
            Exchange::Question => Outbound::Question(text),
        })
    }

    /// Complete the in-flight turn with the service's result and persist.
    pub fn finish(&mut self, result: Result<Option<String>, BackendError>) -> TurnOutcome {
        if self.state != SessionState::Sending {
            log::debug!("session {}: no turn in flight", self.feature.name);
            return TurnOutcome::Ignored;
        }
        let (content, failed) = match result {
            Ok(reply) => (
                reply
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| NO_ANSWER.to_string()),
                false,
            ),
            Err(e) => {
                log::warn!("session {}: request failed: {}", self.feature.name, e);
                (self.feature.failure_message.clone(), true)
            }
        };
        self.messages.push(Message::assistant(content.clone()));
        self.persist();
        self.state = SessionState::Idle;
        if failed {
            TurnOutcome::Failed(content)
        } else {
            TurnOutcome::Answered(content)
        }
    }

    /// Run one full turn from the input buffer.
    pub async fn submit(&mut self, backend: &dyn Backend) -> TurnOutcome {
        let Some(outbound) = self.begin() else {
            return TurnOutcome::Ignored;
        };
        let result = match &outbound {
            Outbound::History(messages) => backend.chat(messages).await,
            Outbound::Question(question) => backend.ask(question).await,
        };
        self.finish(result)
    }

    /// Set the input to `text` and run one turn.
    pub async fn send(&mut self, backend: &dyn Backend, text: &str) -> TurnOutcome {
        self.set_input(text);
        self.submit(backend).await
    }

    /// Reset the log to the seed (draft chat only).
    pub fn clear(&mut self) -> Result<(), SessionError> {
        if !self.feature.clearable {
            return Err(SessionError::NotClearable(self.feature.name));
        }
        self.messages = self.log.clear()?;
        self.input.clear();
        Ok(())
    }
}
