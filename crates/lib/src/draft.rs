//! Sending drafts as email.
//!
//! Two ways in: the latest assistant message of the draft chat, or the composer buffer
//! (type text, generate a preview, send it). Blank content never reaches the service.

use crate::backend::{Backend, BackendError};
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("draft is empty")]
    Empty,
    #[error("failed to send email: {0}")]
    Send(#[from] BackendError),
}

/// POST `content` to the send endpoint once. Blank content fails without a request.
pub async fn send_draft(backend: &dyn Backend, content: &str) -> Result<(), DispatchError> {
    if content.trim().is_empty() {
        return Err(DispatchError::Empty);
    }
    backend.send_email(content).await?;
    log::info!("draft sent ({} chars)", content.len());
    Ok(())
}

/// Send the chat's most recent assistant message. The chat itself is left unchanged.
pub async fn send_latest_reply(backend: &dyn Backend, session: &Session) -> Result<(), DispatchError> {
    let content = session.latest_assistant().unwrap_or("");
    send_draft(backend, content).await
}

/// Text input plus the draft preview generated from it.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    input: String,
    draft: String,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Copy the input into the draft preview.
    pub fn generate(&mut self) {
        self.draft = self.input.clone();
    }

    pub fn has_draft(&self) -> bool {
        !self.draft.is_empty()
    }

    /// Send the draft; on success both the draft and the input are cleared, on failure nothing changes.
    pub async fn send(&mut self, backend: &dyn Backend) -> Result<(), DispatchError> {
        send_draft(backend, &self.draft).await?;
        self.draft.clear();
        self.input.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Feature;
    use crate::storage::MemoryStore;
    use crate::testing::ScriptedBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn blank_draft_is_rejected_without_request() {
        let backend = ScriptedBackend::new();
        let err = send_draft(&backend, "  \n ").await.unwrap_err();
        assert!(matches!(err, DispatchError::Empty));
        assert!(backend.sent().is_empty());
    }

    #[tokio::test]
    async fn sends_latest_assistant_message() {
        let backend = ScriptedBackend::new();
        backend.push_chat_reply(Some("first draft"));
        backend.push_chat_reply(Some("second draft"));
        let mut session = Session::open(Feature::draft_chat(None), Arc::new(MemoryStore::new()));
        session.send(&backend, "draft it").await;
        session.send(&backend, "again").await;

        send_latest_reply(&backend, &session).await.unwrap();
        assert_eq!(backend.sent(), vec!["second draft".to_string()]);
        assert_eq!(session.messages().len(), 5);
    }

    #[tokio::test]
    async fn chat_without_assistant_reply_has_nothing_to_send() {
        let backend = ScriptedBackend::new();
        let session = Session::open(Feature::draft_chat(None), Arc::new(MemoryStore::new()));
        let err = send_latest_reply(&backend, &session).await.unwrap_err();
        assert!(matches!(err, DispatchError::Empty));
    }

    #[tokio::test]
    async fn composer_clears_after_successful_send() {
        let backend = ScriptedBackend::new();
        let mut composer = Composer::new();
        composer.set_input("Hi team, the release is Friday.");
        assert!(!composer.has_draft());
        composer.generate();
        assert_eq!(composer.draft(), "Hi team, the release is Friday.");

        composer.send(&backend).await.unwrap();
        assert_eq!(composer.draft(), "");
        assert_eq!(composer.input(), "");
        assert_eq!(backend.sent(), vec!["Hi team, the release is Friday.".to_string()]);
    }

    #[tokio::test]
    async fn composer_keeps_state_when_send_fails() {
        let backend = ScriptedBackend::new();
        backend.fail_send("502 Bad Gateway");
        let mut composer = Composer::new();
        composer.set_input("Hello");
        composer.generate();

        let err = composer.send(&backend).await.unwrap_err();
        assert!(matches!(err, DispatchError::Send(_)));
        assert_eq!(composer.draft(), "Hello");
        assert_eq!(composer.input(), "Hello");
    }
}
