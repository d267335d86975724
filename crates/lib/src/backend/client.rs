//! HTTP client for the email-assistant service (http://127.0.0.1:8000 by default).

use super::{Backend, BackendError};
use crate::config::{self, Config, EndpointVariant};
use crate::lists::{ReplyDraft, Todo};
use crate::message_log::Message;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Paths and field names for one endpoint variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub chat: &'static str,
    pub email_qa: &'static str,
    /// Body field carrying the question on the Q&A endpoint.
    pub qa_field: &'static str,
    pub send_email: &'static str,
    pub reply_drafts: &'static str,
    pub todos: &'static str,
}

impl Endpoints {
    pub fn for_variant(variant: EndpointVariant) -> Self {
        let (chat, email_qa, qa_field) = match variant {
            EndpointVariant::Gmail => ("/gmail/chat", "/gmail/email-qa", "question"),
            EndpointVariant::Api => ("/api/chat", "/api/email-qa", "query"),
        };
        Self {
            chat,
            email_qa,
            qa_field,
            send_email: "/api/send-email",
            reply_drafts: "/gmail/reply_drafts",
            todos: "/gmail/todos",
        }
    }
}

/// Client for the service's JSON endpoints.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        variant: EndpointVariant,
        timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints: Endpoints::for_variant(variant),
            client: builder.build()?,
        })
    }

    /// Build from config: base URL (env override applied), variant, and timeout.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(
            &config::resolve_base_url(config),
            config.backend.variant,
            config.backend.timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, BackendError> {
        let url = self.url(path);
        log::debug!("backend: POST {}", url);
        let res = self.client.post(&url).json(body).send().await?;
        read_json(res).await
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, BackendError> {
        let url = self.url(path);
        log::debug!("backend: GET {}", url);
        let res = self.client.get(&url).send().await?;
        read_json(res).await
    }
}

async fn read_json<R: DeserializeOwned>(res: reqwest::Response) -> Result<R, BackendError> {
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(BackendError::Api(format!("{} {}", status, body)));
    }
    Ok(res.json().await?)
}

fn service_error(error: Option<String>) -> Result<(), BackendError> {
    match error {
        Some(e) => Err(BackendError::Service(e)),
        None => Ok(()),
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    draft: &'a str,
}

#[derive(Debug, Deserialize)]
struct TodosResponse {
    #[serde(default)]
    todos: Option<Vec<Todo>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyDraftsResponse {
    #[serde(default)]
    reply_drafts: Option<Vec<ReplyDraft>>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl Backend for HttpBackend {
    /// POST {chat}: `{messages}` in, `reply` out.
    async fn chat(&self, messages: &[Message]) -> Result<Option<String>, BackendError> {
        let data: ChatResponse = self
            .post_json(self.endpoints.chat, &ChatRequest { messages })
            .await?;
        service_error(data.error)?;
        Ok(data.reply)
    }

    /// POST {email_qa}: `{question}` or `{query}` in, `answer` out.
    async fn ask(&self, question: &str) -> Result<Option<String>, BackendError> {
        let mut body = serde_json::Map::new();
        body.insert(
            self.endpoints.qa_field.to_string(),
            serde_json::Value::String(question.to_string()),
        );
        let data: AnswerResponse = self.post_json(self.endpoints.email_qa, &body).await?;
        service_error(data.error)?;
        Ok(data.answer)
    }

    /// POST /api/send-email: `{draft}` in; any 2xx is success, the body is ignored.
    async fn send_email(&self, draft: &str) -> Result<(), BackendError> {
        let url = self.url(self.endpoints.send_email);
        log::debug!("backend: POST {}", url);
        let res = self
            .client
            .post(&url)
            .json(&SendEmailRequest { draft })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(BackendError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }

    /// GET /gmail/todos: `{todos: [...]}`.
    async fn todos(&self) -> Result<Vec<Todo>, BackendError> {
        let data: TodosResponse = self.get_json(self.endpoints.todos).await?;
        service_error(data.error)?;
        data.todos
            .ok_or_else(|| BackendError::Api("response missing `todos`".to_string()))
    }

    /// GET /gmail/reply_drafts: `{reply_drafts: [...]}`.
    async fn reply_drafts(&self) -> Result<Vec<ReplyDraft>, BackendError> {
        let data: ReplyDraftsResponse = self.get_json(self.endpoints.reply_drafts).await?;
        service_error(data.error)?;
        data.reply_drafts
            .ok_or_else(|| BackendError::Api("response missing `reply_drafts`".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gmail_variant_uses_question_field() {
        let e = Endpoints::for_variant(EndpointVariant::Gmail);
        assert_eq!(e.chat, "/gmail/chat");
        assert_eq!(e.email_qa, "/gmail/email-qa");
        assert_eq!(e.qa_field, "question");
        assert_eq!(e.send_email, "/api/send-email");
    }

    #[test]
    fn api_variant_uses_query_field() {
        let e = Endpoints::for_variant(EndpointVariant::Api);
        assert_eq!(e.chat, "/api/chat");
        assert_eq!(e.email_qa, "/api/email-qa");
        assert_eq!(e.qa_field, "query");
        assert_eq!(e.todos, "/gmail/todos");
        assert_eq!(e.reply_drafts, "/gmail/reply_drafts");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let b = HttpBackend::new("http://localhost:8000/", EndpointVariant::Gmail, None).unwrap();
        assert_eq!(b.base_url(), "http://localhost:8000");
        assert_eq!(b.url("/gmail/todos"), "http://localhost:8000/gmail/todos");
    }

    #[test]
    fn chat_request_serializes_history() {
        let messages = vec![Message::system("seed"), Message::user("hi")];
        let body = serde_json::to_value(ChatRequest { messages: &messages }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "messages": [
                    { "role": "system", "content": "seed" },
                    { "role": "user", "content": "hi" }
                ]
            })
        );
    }

    #[test]
    fn answer_response_tolerates_missing_and_null_answer() {
        let a: AnswerResponse = serde_json::from_str("{}").unwrap();
        assert!(a.answer.is_none());
        let a: AnswerResponse = serde_json::from_str(r#"{"answer": null}"#).unwrap();
        assert!(a.answer.is_none());
    }

    #[test]
    fn error_body_becomes_service_error() {
        let err = service_error(Some("User not authenticated".to_string())).unwrap_err();
        assert!(matches!(err, BackendError::Service(ref m) if m == "User not authenticated"));
        assert!(service_error(None).is_ok());
    }
}
