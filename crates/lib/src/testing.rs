//! Scripted in-process backend for unit tests.

use crate::backend::{Backend, BackendError};
use crate::lists::{ReplyDraft, Todo};
use crate::message_log::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type Scripted = Result<Option<String>, String>;

#[derive(Default)]
struct Script {
    chat_replies: VecDeque<Scripted>,
    answers: VecDeque<Scripted>,
    send_error: Option<String>,
    list_error: Option<String>,
    todos: Vec<Todo>,
    chat_requests: Vec<Vec<Message>>,
    questions: Vec<String>,
    sent: Vec<String>,
    list_requests: usize,
}

/// Replies come from queues filled by the test; every request is recorded.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chat_reply(&self, reply: Option<&str>) {
        self.script
            .lock()
            .unwrap()
            .chat_replies
            .push_back(Ok(reply.map(str::to_string)));
    }

    pub fn push_chat_failure(&self, error: &str) {
        self.script
            .lock()
            .unwrap()
            .chat_replies
            .push_back(Err(error.to_string()));
    }

    pub fn push_answer(&self, answer: Option<&str>) {
        self.script
            .lock()
            .unwrap()
            .answers
            .push_back(Ok(answer.map(str::to_string)));
    }

    pub fn push_answer_failure(&self, error: &str) {
        self.script
            .lock()
            .unwrap()
            .answers
            .push_back(Err(error.to_string()));
    }

    pub fn fail_send(&self, error: &str) {
        self.script.lock().unwrap().send_error = Some(error.to_string());
    }

    pub fn fail_lists(&self, error: &str) {
        self.script.lock().unwrap().list_error = Some(error.to_string());
    }

    pub fn set_todos(&self, todos: Vec<Todo>) {
        self.script.lock().unwrap().todos = todos;
    }

    pub fn chat_requests(&self) -> Vec<Vec<Message>> {
        self.script.lock().unwrap().chat_requests.clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.script.lock().unwrap().questions.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.script.lock().unwrap().sent.clone()
    }

    pub fn list_requests(&self) -> usize {
        self.script.lock().unwrap().list_requests
    }
}

fn next(queue: &mut VecDeque<Scripted>) -> Result<Option<String>, BackendError> {
    match queue.pop_front() {
        Some(Ok(v)) => Ok(v),
        Some(Err(e)) => Err(BackendError::Api(e)),
        None => Err(BackendError::Api("no scripted response".to_string())),
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn chat(&self, messages: &[Message]) -> Result<Option<String>, BackendError> {
        let mut s = self.script.lock().unwrap();
        s.chat_requests.push(messages.to_vec());
        next(&mut s.chat_replies)
    }

    async fn ask(&self, question: &str) -> Result<Option<String>, BackendError> {
        let mut s = self.script.lock().unwrap();
        s.questions.push(question.to_string());
        next(&mut s.answers)
    }

    async fn send_email(&self, draft: &str) -> Result<(), BackendError> {
        let mut s = self.script.lock().unwrap();
        if let Some(e) = s.send_error.clone() {
            return Err(BackendError::Api(e));
        }
        s.sent.push(draft.to_string());
        Ok(())
    }

    async fn todos(&self) -> Result<Vec<Todo>, BackendError> {
        let mut s = self.script.lock().unwrap();
        s.list_requests += 1;
        match &s.list_error {
            Some(e) => Err(BackendError::Api(e.clone())),
            None => Ok(s.todos.clone()),
        }
    }

    async fn reply_drafts(&self) -> Result<Vec<ReplyDraft>, BackendError> {
        let mut s = self.script.lock().unwrap();
        s.list_requests += 1;
        match &s.list_error {
            Some(e) => Err(BackendError::Api(e.clone())),
            None => Ok(Vec::new()),
        }
    }
}
