//! Messaging services: conversations, user context and the assistant

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use core_kernel::{ensure_id, ConversationId, UserId};
use domain_account::AccountService;
use domain_basket::BasketService;
use domain_order::{OrderHistoryQuery, OrderService};
use domain_review::ReviewService;

use crate::context::UserContext;
use crate::conversation::{Conversation, Message};
use crate::error::MessagingError;
use crate::ports::MessagingPort;
use crate::responder::BotResponder;

pub const WELCOME_RESPONSE: &str = "Hello! I'm your shopping assistant. How can I help you today?";
pub const ERROR_RESPONSE: &str =
    "I'm sorry, an error occurred while processing your request. Please try again later.";

#[derive(Clone)]
pub struct ConversationService {
    port: Arc<dyn MessagingPort>,
}

impl ConversationService {
    pub fn new(port: Arc<dyn MessagingPort>) -> Self {
        Self { port }
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn create_conversation(&self, user_id: UserId) -> Result<Conversation, MessagingError> {
        let conversation = Conversation::new(user_id)?;
        let conversation = self.port.create_conversation(conversation, None).await?;
        info!(conversation_id = %conversation.id, "Conversation started");
        Ok(conversation)
    }

    pub async fn get_conversation(&self, id: ConversationId) -> Result<Conversation, MessagingError> {
        ensure_id(id.is_nil(), "conversation")?;
        Ok(self.port.get_conversation(id, None).await?)
    }

    pub async fn user_conversations(&self, user_id: UserId) -> Result<Vec<Conversation>, MessagingError> {
        ensure_id(user_id.is_nil(), "user")?;
        Ok(self.port.conversations_of_user(user_id, None).await?)
    }

    pub async fn send_message(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        content: &str,
    ) -> Result<Message, MessagingError> {
        let message = Message::new(conversation_id, user_id, content)?;
        Ok(self.port.add_message(message, None).await?)
    }

    pub async fn messages_of_conversation(&self, id: ConversationId) -> Result<Vec<Message>, MessagingError> {
        ensure_id(id.is_nil(), "conversation")?;
        Ok(self.port.messages_of_conversation(id, None).await?)
    }

    pub async fn messages_of_user(&self, user_id: UserId) -> Result<Vec<Message>, MessagingError> {
        ensure_id(user_id.is_nil(), "user")?;
        Ok(self.port.messages_of_user(user_id, None).await?)
    }

    /// Stores the user's message and returns it with the assistant's reply
    ///
    /// The first message of a conversation is answered with the welcome text.
    pub async fn send_and_reply(
        &self,
        assistant: &ChatbotService,
        conversation_id: ConversationId,
        user_id: UserId,
        content: &str,
    ) -> Result<(Message, String), MessagingError> {
        let is_first = match self.port.messages_of_conversation(conversation_id, None).await {
            Ok(messages) => messages.is_empty(),
            Err(e) => {
                debug!(error = %e, "Could not tell whether this is the first message");
                false
            }
        };
        let message = self.send_message(conversation_id, user_id, content).await?;
        let reply = assistant.get_bot_response(Some(user_id), content, is_first).await;
        Ok((message, reply))
    }
}

/// Gathers a [`UserContext`] from the other domains
#[derive(Clone)]
pub struct UserContextService {
    accounts: AccountService,
    baskets: BasketService,
    orders: OrderService,
    reviews: ReviewService,
}

impl UserContextService {
    pub fn new(accounts: AccountService, baskets: BasketService, orders: OrderService, reviews: ReviewService) -> Self {
        Self {
            accounts,
            baskets,
            orders,
            reviews,
        }
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_context(&self, user_id: UserId) -> Result<UserContext, MessagingError> {
        let user = self.accounts.get_user(user_id).await?;
        let basket = match self.baskets.get_basket(user_id).await {
            Ok(basket) => Some(basket),
            Err(e) => {
                warn!(error = %e, "Basket unavailable for context");
                None
            }
        };
        let purchases = self
            .orders
            .buyer_orders(user_id, &OrderHistoryQuery::default())
            .await?
            .orders;
        Ok(UserContext {
            user,
            basket,
            reviews_given: self.reviews.reviews_by_buyer(user_id).await?,
            reviews_received: self.reviews.reviews_of_seller(user_id).await?,
            purchases,
            sales: self.orders.orders_of_seller(user_id).await?,
        })
    }
}

/// Free-text side of the assistant
#[derive(Clone)]
pub struct ChatbotService {
    responder: Arc<dyn BotResponder>,
    context: Option<UserContextService>,
}

impl ChatbotService {
    pub fn new(responder: Arc<dyn BotResponder>) -> Self {
        Self {
            responder,
            context: None,
        }
    }

    /// Gives the responder the user's marketplace activity
    pub fn with_context(mut self, context: UserContextService) -> Self {
        self.context = Some(context);
        self
    }

    /// Always produces a reply; failures become a fixed apology
    #[instrument(skip(self, message))]
    pub async fn get_bot_response(&self, user_id: Option<UserId>, message: &str, is_welcome: bool) -> String {
        if is_welcome {
            return WELCOME_RESPONSE.to_string();
        }

        let context = match (user_id.filter(|id| !id.is_nil()), &self.context) {
            (Some(user_id), Some(service)) => match service.user_context(user_id).await {
                Ok(context) => Some(context),
                Err(e) => {
                    warn!(error = %e, "User context unavailable, answering without it");
                    None
                }
            },
            _ => None,
        };

        match self.responder.respond(message, context.as_ref()).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Responder failed");
                ERROR_RESPONSE.to_string()
            }
        }
    }
}
