use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use openears_core::{Storage, Timing};

use crate::{SupportContext, SupportEvent};

/// The persona every simulated chat connects to
pub const LISTENER_ALIAS: &str = "Captain Listener";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatSender {
    System,
    Volunteer,
    Me,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// A locally simulated message exchange.
///
/// Volunteer and system messages come from a fixed script on fixed delays;
/// user messages append immediately. The log lives and dies with the
/// booking it belongs to.
pub struct LiveChat<S, T> {
    context: SupportContext<S, T>,
    booking_id: String,
    messages: Mutex<Vec<ChatMessage>>,
}

impl<S, T> LiveChat<S, T>
where
    S: Storage,
    T: Timing,
{
    pub fn new(context: &SupportContext<S, T>, booking_id: &str) -> Self {
        Self {
            context: context.clone(),
            booking_id: booking_id.to_string(),
            messages: Default::default(),
        }
    }

    /// Plays the scripted opening of a chat: the secure connection notice,
    /// the volunteer joining, and their greeting.
    pub async fn run_script(&self) {
        let config = &self.context.config;

        self.context.timing.wait(config.chat_connect_delay).await;
        self.append(ChatSender::System, "Secure connection established.");

        self.context.timing.wait(config.chat_join_delay).await;
        self.append(
            ChatSender::System,
            &format!("{LISTENER_ALIAS} joined the chat."),
        );

        self.context.timing.wait(config.chat_greeting_delay).await;
        self.append(
            ChatSender::Volunteer,
            "Hi there! I am here to listen. How are you feeling today?",
        );
    }

    /// Appends a message from the user. Blank input is dropped.
    pub fn send(&self, text: &str) -> Option<ChatMessage> {
        let text = text.trim();

        if text.is_empty() {
            return None;
        }

        Some(self.append(ChatSender::Me, text))
    }

    /// The full log so far, oldest first
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().clone()
    }

    fn append(&self, sender: ChatSender, text: &str) -> ChatMessage {
        let message = ChatMessage {
            sender,
            text: text.to_string(),
            at: self.context.timing.now(),
        };

        self.messages.lock().push(message.clone());

        self.context.emit(SupportEvent::ChatMessage {
            booking_id: self.booking_id.clone(),
            message: message.clone(),
        });

        message
    }
}
