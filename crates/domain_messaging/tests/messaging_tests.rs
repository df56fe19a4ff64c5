//! Service-level tests for domain_messaging

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal_macros::dec;

use core_kernel::{ConversationId, Money, UserId};
use domain_account::{AccountService, MockAccountPort, RegistrationRequest, UserRole};
use domain_basket::{BasketService, MockBasketPort};
use domain_catalog::{BuyProduct, CatalogService, ListingCore, MockCatalogPort};
use domain_messaging::{
    BotResponder, ChatbotService, ConversationService, KeywordResponder, MessagingError, MockMessagingPort,
    UserContext, UserContextService, ERROR_RESPONSE, UNAVAILABLE_RESPONSE, WELCOME_RESPONSE,
};
use domain_order::{MockOrderPort, OrderService};
use domain_review::{MockReviewPort, ReviewService};

struct Fixture {
    accounts: AccountService,
    catalog: CatalogService,
    baskets: BasketService,
    reviews: ReviewService,
    conversations: ConversationService,
    context: UserContextService,
}

fn fixture() -> Fixture {
    let accounts = AccountService::new(Arc::new(MockAccountPort::new()));
    let catalog = CatalogService::new(Arc::new(MockCatalogPort::new()));
    let baskets = BasketService::new(Arc::new(MockBasketPort::new()), catalog.clone());
    let orders = OrderService::new(Arc::new(MockOrderPort::new()));
    let reviews = ReviewService::new(Arc::new(MockReviewPort::new()), accounts.clone());
    Fixture {
        context: UserContextService::new(accounts.clone(), baskets.clone(), orders, reviews.clone()),
        conversations: ConversationService::new(Arc::new(MockMessagingPort::new())),
        accounts,
        catalog,
        baskets,
        reviews,
    }
}

async fn user(f: &Fixture, name: &str, role: UserRole) -> UserId {
    f.accounts
        .register(RegistrationRequest {
            username: name.to_string(),
            email: format!("{}@market.ro", name),
            password: "Passw0rd!".to_string(),
            phone: "+40712345678".to_string(),
            role,
        })
        .await
        .unwrap()
        .id
}

/// Echoes the context summary so tests can see what the responder received
struct ContextEcho;

#[async_trait]
impl BotResponder for ContextEcho {
    async fn respond(&self, _message: &str, context: Option<&UserContext>) -> Result<String, MessagingError> {
        Ok(context.map(UserContext::summary).unwrap_or_default())
    }
}

struct Broken;

#[async_trait]
impl BotResponder for Broken {
    async fn respond(&self, _message: &str, _context: Option<&UserContext>) -> Result<String, MessagingError> {
        Err(MessagingError::Responder("backend offline".to_string()))
    }
}

// ============================================================================
// Conversations
// ============================================================================

mod conversation_tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_by_conversation_and_user() {
        let f = fixture();
        let alice = UserId::new();
        let bob = UserId::new();
        let first = f.conversations.create_conversation(alice).await.unwrap();
        let second = f.conversations.create_conversation(alice).await.unwrap();
        f.conversations.create_conversation(bob).await.unwrap();

        f.conversations.send_message(first.id, alice, "Hi").await.unwrap();
        f.conversations.send_message(first.id, alice, "Is the tent available?").await.unwrap();
        f.conversations.send_message(second.id, alice, "Another question").await.unwrap();

        let in_first = f.conversations.messages_of_conversation(first.id).await.unwrap();
        let contents: Vec<&str> = in_first.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Hi", "Is the tent available?"]);
        assert_eq!(f.conversations.messages_of_user(alice).await.unwrap().len(), 3);
        assert_eq!(f.conversations.user_conversations(alice).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let f = fixture();
        assert!(f.conversations.create_conversation(UserId::nil()).await.is_err());

        let conversation = f.conversations.create_conversation(UserId::new()).await.unwrap();
        let blank = f.conversations.send_message(conversation.id, conversation.user_id, "  ").await;
        assert_eq!(blank.unwrap_err().to_string(), "Content cannot be null or empty.");

        let unknown = f.conversations.send_message(ConversationId::new(), UserId::new(), "Hello").await;
        assert!(matches!(unknown, Err(MessagingError::Port(e)) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_first_message_gets_welcome() {
        let f = fixture();
        let assistant = ChatbotService::new(Arc::new(KeywordResponder::default()));
        let conversation = f.conversations.create_conversation(UserId::new()).await.unwrap();

        let (_, reply) = f
            .conversations
            .send_and_reply(&assistant, conversation.id, conversation.user_id, "hello")
            .await
            .unwrap();
        assert_eq!(reply, WELCOME_RESPONSE);

        let (_, reply) = f
            .conversations
            .send_and_reply(&assistant, conversation.id, conversation.user_id, "how do I track my order?")
            .await
            .unwrap();
        assert!(reply.contains("order history"));
    }
}

// ============================================================================
// Assistant
// ============================================================================

mod assistant_tests {
    use super::*;

    #[tokio::test]
    async fn test_welcome_and_fallback() {
        let assistant = ChatbotService::new(Arc::new(KeywordResponder::default()));
        assert_eq!(assistant.get_bot_response(None, "anything", true).await, WELCOME_RESPONSE);
        assert_eq!(assistant.get_bot_response(None, "zzz", false).await, UNAVAILABLE_RESPONSE);
    }

    #[tokio::test]
    async fn test_responder_failure_becomes_apology() {
        let assistant = ChatbotService::new(Arc::new(Broken));
        assert_eq!(assistant.get_bot_response(Some(UserId::new()), "help", false).await, ERROR_RESPONSE);
    }

    #[tokio::test]
    async fn test_context_reaches_responder() {
        let f = fixture();
        let buyer = user(&f, "ioana_m", UserRole::Buyer).await;
        let seller = user(&f, "outdoor_shop", UserRole::Seller).await;
        let product = f
            .catalog
            .create_buy_listing(BuyProduct::new(
                ListingCore::new("Camping tent", "Two person tent", seller),
                Money::usd(dec!(120)),
            ))
            .await
            .unwrap();
        f.baskets.add_product(buyer, product.core.id, 2).await.unwrap();
        f.reviews
            .add_review(seller, buyer, "Quick delivery", vec![], dec!(5))
            .await
            .unwrap();

        let assistant = ChatbotService::new(Arc::new(ContextEcho)).with_context(f.context.clone());
        let summary = assistant.get_bot_response(Some(buyer), "what's in my basket?", false).await;

        assert!(summary.contains("Username: ioana_m"));
        assert!(summary.contains("- Camping tent (Quantity: 2"));
        assert!(summary.contains("Total Basket Value: $240.00"));
        assert!(summary.contains("- Review for outdoor_shop: Rating: 5/5, Comment: \"Quick delivery\""));
    }

    #[tokio::test]
    async fn test_unknown_user_answers_without_context() {
        let f = fixture();
        let assistant = ChatbotService::new(Arc::new(ContextEcho)).with_context(f.context.clone());
        assert_eq!(assistant.get_bot_response(Some(UserId::new()), "hi", false).await, "");
    }

    #[tokio::test]
    async fn test_empty_basket_summary() {
        let f = fixture();
        let buyer = user(&f, "new_buyer", UserRole::Buyer).await;
        let context = f.context.user_context(buyer).await.unwrap();
        assert!(context.summary().contains("CURRENT BASKET: Your basket is currently empty"));
    }
}
