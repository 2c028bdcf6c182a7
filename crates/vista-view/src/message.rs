//! Status messages
//!
//! A message set during a request is shown on the current response. When a
//! session is attached it is also flashed there, so it survives one redirect.
//! Displaying a message consumes it.

use std::collections::HashMap;

/// Session key the flash message is stored under
pub const FLASH_KEY: &str = "message";

const SEPARATOR: &str = "::";

/// Session storage for flash data
pub trait SessionStore: Send {
    /// Store a flash value for the next read
    fn set_flash(&mut self, key: &str, value: String);

    /// Read and remove a flash value
    fn take_flash(&mut self, key: &str) -> Option<String>;
}

/// In-memory session, useful for tests and single-process setups
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    flash: HashMap<String, String>,
}

impl MemorySession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Peek at a flash value without consuming it
    pub fn peek(&self, key: &str) -> Option<&str> {
        self.flash.get(key).map(String::as_str)
    }
}

impl SessionStore for MemorySession {
    fn set_flash(&mut self, key: &str, value: String) {
        self.flash.insert(key.to_string(), value);
    }

    fn take_flash(&mut self, key: &str) -> Option<String> {
        self.flash.remove(key)
    }
}

/// A status message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message type, used as a CSS class (`info`, `success`, `error`, ...)
    pub kind: String,
    /// Message text
    pub text: String,
}

impl Message {
    /// Create a message
    pub fn new(text: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
        }
    }

    /// `kind::text`, the flash encoding
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.kind, SEPARATOR, self.text)
    }

    /// Parse the flash encoding; a value without a type is an `info` message
    pub fn decode(raw: &str) -> Self {
        match raw.split_once(SEPARATOR) {
            Some((kind, text)) => Self::new(text, kind),
            None => Self::new(raw, "info"),
        }
    }

    /// Fill `{type}` and `{message}` in a template
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{type}", &self.kind)
            .replace("{message}", &self.text)
    }
}

/// Message state of one request
#[derive(Default)]
pub struct Messages {
    session: Option<Box<dyn SessionStore>>,
    current: Option<Message>,
}

impl std::fmt::Debug for Messages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messages")
            .field("session", &self.session.is_some())
            .field("current", &self.current)
            .finish()
    }
}

impl Messages {
    /// Messages without a session
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a session for flash storage
    pub fn with_session(session: Box<dyn SessionStore>) -> Self {
        Self {
            session: Some(session),
            current: None,
        }
    }

    /// Detach and return the session
    pub fn take_session(&mut self) -> Option<Box<dyn SessionStore>> {
        self.session.take()
    }

    /// Set a message; empty text is ignored
    pub fn set(&mut self, text: impl Into<String>, kind: impl Into<String>) {
        let message = Message::new(text, kind);
        if message.text.is_empty() {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.set_flash(FLASH_KEY, message.encode());
        }
        self.current = Some(message);
    }

    /// The pending message, if any, without consuming it
    pub fn current(&self) -> Option<&Message> {
        self.current.as_ref()
    }

    /// Consume the pending message. Session flash wins over the in-memory one.
    pub fn take(&mut self) -> Option<Message> {
        let flashed = self
            .session
            .as_mut()
            .and_then(|session| session.take_flash(FLASH_KEY))
            .filter(|raw| !raw.is_empty())
            .map(|raw| Message::decode(&raw));

        let current = self.current.take();
        flashed.or(current).filter(|m| !m.text.is_empty())
    }

    /// Render and consume the pending message; `""` when there is none
    pub fn render(&mut self, template: &str) -> String {
        self.take()
            .map(|message| message.render(template))
            .unwrap_or_default()
    }
}
