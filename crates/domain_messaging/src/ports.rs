//! Messaging Domain Ports

use async_trait::async_trait;

use core_kernel::{ConversationId, DomainPort, HealthCheckable, OperationMetadata, PortError, UserId};

use crate::conversation::{Conversation, Message};

#[async_trait]
pub trait MessagingPort: DomainPort + HealthCheckable {
    async fn create_conversation(
        &self,
        conversation: Conversation,
        metadata: Option<OperationMetadata>,
    ) -> Result<Conversation, PortError>;

    async fn get_conversation(
        &self,
        id: ConversationId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Conversation, PortError>;

    async fn conversations_of_user(
        &self,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Conversation>, PortError>;

    /// Stores a message; the conversation must exist
    async fn add_message(&self, message: Message, metadata: Option<OperationMetadata>) -> Result<Message, PortError>;

    /// Messages of a conversation in the order they were sent
    async fn messages_of_conversation(
        &self,
        id: ConversationId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Message>, PortError>;

    async fn messages_of_user(
        &self,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Message>, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default, Clone)]
    pub struct MockMessagingPort {
        conversations: Arc<RwLock<HashMap<ConversationId, Conversation>>>,
        messages: Arc<RwLock<Vec<Message>>>,
    }

    impl MockMessagingPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockMessagingPort {}

    #[async_trait]
    impl HealthCheckable for MockMessagingPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-messaging-port")
        }
    }

    #[async_trait]
    impl MessagingPort for MockMessagingPort {
        async fn create_conversation(
            &self,
            conversation: Conversation,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Conversation, PortError> {
            self.conversations
                .write()
                .await
                .insert(conversation.id, conversation.clone());
            Ok(conversation)
        }

        async fn get_conversation(
            &self,
            id: ConversationId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Conversation, PortError> {
            self.conversations
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Conversation", id))
        }

        async fn conversations_of_user(
            &self,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Conversation>, PortError> {
            let mut conversations: Vec<Conversation> = self
                .conversations
                .read()
                .await
                .values()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            conversations.sort_by_key(|c| c.id);
            Ok(conversations)
        }

        async fn add_message(&self, message: Message, _metadata: Option<OperationMetadata>) -> Result<Message, PortError> {
            if !self.conversations.read().await.contains_key(&message.conversation_id) {
                return Err(PortError::not_found("Conversation", message.conversation_id));
            }
            self.messages.write().await.push(message.clone());
            Ok(message)
        }

        async fn messages_of_conversation(
            &self,
            id: ConversationId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Message>, PortError> {
            Ok(self
                .messages
                .read()
                .await
                .iter()
                .filter(|m| m.conversation_id == id)
                .cloned()
                .collect())
        }

        async fn messages_of_user(
            &self,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Message>, PortError> {
            Ok(self
                .messages
                .read()
                .await
                .iter()
                .filter(|m| m.user_id == user_id)
                .cloned()
                .collect())
        }
    }
}
