//! Email-assistant service: the `Backend` seam and its HTTP client.
//!
//! Sessions, draft dispatch, and list fetchers talk to the service only through the
//! [`Backend`] trait so tests can substitute a scripted implementation.

mod client;

pub use client::{Endpoints, HttpBackend};

use crate::lists::{ReplyDraft, Todo};
use crate::message_log::Message;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend api error: {0}")]
    Api(String),
    /// The service answered 2xx with `{"error": ...}` in the body.
    #[error("backend service error: {0}")]
    Service(String),
}

/// Operations offered by the email-assistant service.
#[async_trait]
pub trait Backend: Send + Sync {
    /// POST the whole history to the chat endpoint; `Ok(None)` when the reply field is absent.
    async fn chat(&self, messages: &[Message]) -> Result<Option<String>, BackendError>;

    /// POST a single question to the Q&A endpoint; `Ok(None)` when the answer field is absent.
    async fn ask(&self, question: &str) -> Result<Option<String>, BackendError>;

    /// POST a draft to the send endpoint. Only the status matters.
    async fn send_email(&self, draft: &str) -> Result<(), BackendError>;

    async fn todos(&self) -> Result<Vec<Todo>, BackendError>;

    async fn reply_drafts(&self) -> Result<Vec<ReplyDraft>, BackendError>;
}
