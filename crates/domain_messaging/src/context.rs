//! What the assistant knows about the user it is talking to

use std::fmt::Write;

use core_kernel::{Currency, Money};
use domain_account::User;
use domain_basket::Basket;
use domain_order::Order;
use domain_review::ReviewView;

/// Snapshot of a user's marketplace activity
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user: User,
    pub basket: Option<Basket>,
    pub reviews_given: Vec<ReviewView>,
    pub reviews_received: Vec<ReviewView>,
    pub purchases: Vec<Order>,
    pub sales: Vec<Order>,
}

impl UserContext {
    /// Plain-text summary handed to responders
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "USER INFORMATION:");
        let _ = writeln!(out, "Username: {}", self.user.username);
        let _ = writeln!(out, "Email: {}", self.user.email);
        let _ = writeln!(out, "User Type: {}", self.user.role);
        let _ = writeln!(out, "Account Balance: {}", self.user.balance);
        out.push('\n');

        match &self.basket {
            Some(basket) if !basket.is_empty() => {
                let _ = writeln!(out, "CURRENT BASKET ITEMS:");
                for item in &basket.items {
                    let line_total = item.line_total();
                    let _ = writeln!(
                        out,
                        "- {} (Quantity: {}, Price: {}, Total: {})",
                        item.title, item.quantity, item.unit_price, line_total
                    );
                }
                let total = basket.subtotal().unwrap_or_else(|_| Money::zero(Currency::USD));
                let _ = writeln!(out, "Total Basket Value: {}", total);
            }
            Some(_) => {
                let _ = writeln!(out, "CURRENT BASKET: Your basket is currently empty");
            }
            None => {
                let _ = writeln!(out, "CURRENT BASKET: You don't have a basket yet");
            }
        }
        out.push('\n');

        if !self.reviews_given.is_empty() {
            let _ = writeln!(out, "REVIEWS YOU'VE GIVEN:");
            for view in &self.reviews_given {
                let _ = writeln!(
                    out,
                    "- Review for {}: Rating: {}/5, Comment: \"{}\"",
                    view.seller_username, view.review.rating, view.review.description
                );
            }
            out.push('\n');
        }

        if !self.reviews_received.is_empty() {
            let _ = writeln!(out, "REVIEWS YOU'VE RECEIVED:");
            for view in &self.reviews_received {
                let _ = writeln!(
                    out,
                    "- Review from {}: Rating: {}/5, Comment: \"{}\"",
                    view.buyer_username, view.review.rating, view.review.description
                );
            }
            out.push('\n');
        }

        if !self.purchases.is_empty() {
            let _ = writeln!(out, "YOUR PURCHASE HISTORY:");
            for order in &self.purchases {
                let _ = writeln!(
                    out,
                    "- Order {}: {} x{} ({}) on {}",
                    order.id,
                    order.product_title,
                    order.quantity,
                    order.product_type,
                    order.order_date.format("%d/%m/%Y")
                );
            }
            out.push('\n');
        }

        if !self.sales.is_empty() {
            let _ = writeln!(out, "YOUR SALES HISTORY:");
            for order in &self.sales {
                let _ = writeln!(out, "- Order {}: {} x{}", order.id, order.product_title, order.quantity);
            }
            out.push('\n');
        }

        out.trim_end().to_string()
    }
}
