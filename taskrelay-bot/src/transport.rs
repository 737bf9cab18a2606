/// Chat transport abstraction
///
/// The bot core never talks to a messaging platform directly. Inbound
/// traffic arrives as [`Event`] values on a channel; outbound traffic goes
/// through the [`ChatTransport`] trait. Swapping platforms (or testing the
/// flows) means swapping the transport implementation.
use async_trait::async_trait;
use thiserror::Error;

/// Failure to deliver one outbound message
#[derive(Debug, Error)]
#[error("delivery to chat {chat_id} failed: {reason}")]
pub struct DeliveryError {
    /// Recipient chat id
    pub chat_id: i64,

    /// Transport-specific failure description
    pub reason: String,
}

/// One button on an inline keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label
    pub label: String,

    /// Opaque callback payload echoed back when pressed
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Inline keyboard attached to an outbound message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    /// Button rows, rendered top to bottom
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row of buttons
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Appends a single-button row
    pub fn button(self, label: impl Into<String>, payload: impl Into<String>) -> Self {
        self.row(vec![Button::new(label, payload)])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Slash command recognized by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Register and show the main menu
    Start,

    /// Begin admin login (or open the admin panel)
    Admin,

    /// Abandon the current flow
    Cancel,
}

impl Command {
    /// Parses a leading slash command, ignoring any trailing arguments
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?;
        match word {
            "/start" => Some(Command::Start),
            "/admin" => Some(Command::Admin),
            "/cancel" => Some(Command::Cancel),
            _ => None,
        }
    }
}

/// Payload of one inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Recognized slash command
    Command(Command),

    /// Button press carrying its callback payload
    Callback(String),

    /// Free-form text message
    Text(String),

    /// Photo with an optional caption
    Photo {
        /// Platform file reference
        file_id: String,

        /// Caption text, if any
        caption: Option<String>,
    },
}

/// One inbound event from the chat platform
#[derive(Debug, Clone)]
pub struct Event {
    /// Originating chat id (also the user's stable platform id)
    pub chat_id: i64,

    /// Sender's handle, without the leading `@`
    pub handle: Option<String>,

    /// Sender's display name
    pub display_name: String,

    /// What happened
    pub kind: EventKind,
}

/// Outbound message sink
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends one message, optionally with an inline keyboard
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), DeliveryError>;
}

/// Transport that logs outbound messages instead of sending them
///
/// Useful for local development without platform credentials.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl ChatTransport for LogTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), DeliveryError> {
        let buttons: usize = keyboard.map(|k| k.rows.iter().map(Vec::len).sum()).unwrap_or(0);
        tracing::info!(chat_id, buttons, "outbound: {}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /admin  "), Some(Command::Admin));
        assert_eq!(Command::parse("/cancel now"), Some(Command::Cancel));
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_keyboard_builder() {
        let kb = Keyboard::new()
            .button("One", "a")
            .row(vec![Button::new("Two", "b"), Button::new("Three", "c")]);
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.rows[1].len(), 2);
        assert!(!kb.is_empty());
    }
}
