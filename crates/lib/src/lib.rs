//! Inbox Companion core library: chat sessions, storage, the email-assistant client,
//! list fetchers, and terminal rendering used by the CLI.

pub mod backend;
pub mod config;
pub mod draft;
pub mod init;
pub mod lists;
pub mod message_log;
pub mod render;
pub mod session;
pub mod storage;

#[cfg(test)]
mod testing;
