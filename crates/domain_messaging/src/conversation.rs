//! Conversations between a user and the assistant

use chrono::{DateTime, Utc};
use core_kernel::{ensure_id, ConversationId, MessageId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::MessagingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(user_id: UserId) -> Result<Self, MessagingError> {
        ensure_id(user_id.is_nil(), "user")?;
        Ok(Self {
            id: ConversationId::new_v7(),
            user_id,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        conversation_id: ConversationId,
        user_id: UserId,
        content: impl Into<String>,
    ) -> Result<Self, MessagingError> {
        ensure_id(conversation_id.is_nil(), "conversation")?;
        ensure_id(user_id.is_nil(), "user")?;
        let content = content.into();
        if content.trim().is_empty() {
            return Err(MessagingError::EmptyContent);
        }
        Ok(Self {
            id: MessageId::new_v7(),
            conversation_id,
            user_id,
            content,
            sent_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_user_is_rejected() {
        assert_eq!(
            Conversation::new(UserId::nil()).unwrap_err().to_string(),
            "Invalid user ID"
        );
    }

    #[test]
    fn test_message_needs_content() {
        let conversation = Conversation::new(UserId::new()).unwrap();
        assert!(matches!(
            Message::new(conversation.id, conversation.user_id, " \n"),
            Err(MessagingError::EmptyContent)
        ));
        let message = Message::new(conversation.id, conversation.user_id, "Where is my order?").unwrap();
        assert_eq!(message.conversation_id, conversation.id);
    }
}
