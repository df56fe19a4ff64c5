//! Free-text answers from the assistant
//!
//! [`BotResponder`] is the seam where a language-model backed responder can
//! be plugged in. [`KeywordResponder`] answers from a fixed keyword table and
//! is used when nothing else is configured.

use async_trait::async_trait;

use crate::context::UserContext;
use crate::error::MessagingError;

pub const UNAVAILABLE_RESPONSE: &str = "I'm sorry, I couldn't process your request at this time.";

#[async_trait]
pub trait BotResponder: Send + Sync {
    /// Answers `message`, using the user's context when one is available
    async fn respond(&self, message: &str, context: Option<&UserContext>) -> Result<String, MessagingError>;
}

/// Matches lowercase keywords against the message, first match wins
#[derive(Debug, Clone)]
pub struct KeywordResponder {
    rules: Vec<(Vec<&'static str>, &'static str)>,
}

impl Default for KeywordResponder {
    fn default() -> Self {
        Self {
            rules: vec![
                (
                    vec!["track", "delivery", "shipping", "where is"],
                    "You can follow every order from your order history. Each order shows its tracking checkpoints and estimated delivery date.",
                ),
                (
                    vec!["promo", "discount", "coupon"],
                    "Promo codes are applied on the basket page before checkout.",
                ),
                (
                    vec!["bid", "auction"],
                    "A bid must be higher than the current price. Bids placed in the last minutes extend the auction.",
                ),
                (
                    vec!["borrow", "rent"],
                    "Borrowed products are charged per month of the chosen period and come with a contract you can renew once.",
                ),
                (
                    vec!["contract", "renew"],
                    "Your contracts are listed in your account. An active contract can be renewed once.",
                ),
                (
                    vec!["pay", "wallet", "card"],
                    "You can pay by card, with your wallet balance or in cash.",
                ),
                (vec!["hello", "hi", "hey"], "Hello! What are you looking for today?"),
            ],
        }
    }
}

impl KeywordResponder {
    fn matching_rule(&self, message: &str) -> Option<&'static str> {
        let message = message.to_lowercase();
        let words: Vec<&str> = message
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        self.rules.iter().find_map(|(keywords, answer)| {
            keywords
                .iter()
                .any(|keyword| {
                    if keyword.contains(' ') {
                        message.contains(keyword)
                    } else {
                        words.iter().any(|word| word.starts_with(keyword))
                    }
                })
                .then_some(*answer)
        })
    }
}

#[async_trait]
impl BotResponder for KeywordResponder {
    async fn respond(&self, message: &str, context: Option<&UserContext>) -> Result<String, MessagingError> {
        let answer = match self.matching_rule(message) {
            Some(answer) => answer.to_string(),
            None => return Ok(UNAVAILABLE_RESPONSE.to_string()),
        };
        Ok(match context.and_then(|c| c.basket.as_ref()) {
            Some(basket) if !basket.is_empty() && message.to_lowercase().contains("basket") => {
                format!("{} You have {} item(s) in your basket.", answer, basket.items.len())
            }
            _ => answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keywords_pick_an_answer() {
        let responder = KeywordResponder::default();
        let answer = responder.respond("Where is my package?", None).await.unwrap();
        assert!(answer.contains("tracking"));

        let answer = responder.respond("Any DISCOUNTS today?", None).await.unwrap();
        assert!(answer.contains("Promo codes"));
    }

    #[tokio::test]
    async fn test_unknown_message_gets_fallback() {
        let responder = KeywordResponder::default();
        let answer = responder.respond("qwerty", None).await.unwrap();
        assert_eq!(answer, UNAVAILABLE_RESPONSE);
    }

    #[test]
    fn test_keywords_match_word_starts() {
        let responder = KeywordResponder::default();
        // "this" must not match "hi"
        assert!(responder.matching_rule("this").is_none());
        assert!(responder.matching_rule("bidding war").is_some());
    }
}
