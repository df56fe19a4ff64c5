//! Order Domain
//!
//! Turning a basket into orders and following them to the door:
//!
//! - **Checkout** pricing (delivery fee, borrow months, warranty tax) and
//!   order placement with wallet payment
//! - **Summaries** of what was paid and where it ships
//! - **History** per buyer with period and name filters
//! - **Tracking** of delivery status through checkpoints

pub mod order;
pub mod summary;
pub mod history;
pub mod checkout;
pub mod tracking;
pub mod error;
pub mod ports;
pub mod services;

pub use order::{Order, PaymentMethod};
pub use summary::{ContactDetails, OrderSummary};
pub use history::{filter_orders, OrderHistory, OrderHistoryQuery, OrderPage, TimePeriodFilter};
pub use checkout::{
    line_cost, price_checkout, CheckoutRequest, CheckoutService, CheckoutTotals, DELIVERY_FEE,
    FREE_DELIVERY_THRESHOLD, WARRANTY_TAX_PERCENT,
};
pub use tracking::{OrderCheckpoint, OrderStatus, TrackedOrder, TrackingService};
pub use error::OrderError;
pub use ports::{OrderPort, TrackingPort};
pub use services::OrderService;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockOrderPort, MockTrackingPort};
