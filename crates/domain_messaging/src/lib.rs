//! Messaging Domain
//!
//! Conversations between users and the shopping assistant. The assistant has
//! two sides: a guided option tree ([`ChatSession`]) and free-text replies
//! produced by a pluggable [`BotResponder`].

pub mod conversation;
pub mod chatbot;
pub mod context;
pub mod responder;
pub mod error;
pub mod ports;
pub mod services;

pub use conversation::{Conversation, Message};
pub use chatbot::{default_tree, ChatNode, ChatSession, NOT_INITIALIZED_RESPONSE};
pub use context::UserContext;
pub use responder::{BotResponder, KeywordResponder, UNAVAILABLE_RESPONSE};
pub use error::MessagingError;
pub use ports::MessagingPort;
pub use services::{ChatbotService, ConversationService, UserContextService, ERROR_RESPONSE, WELCOME_RESPONSE};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockMessagingPort;
