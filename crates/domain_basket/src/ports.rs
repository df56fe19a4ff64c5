//! Basket Domain Ports

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, OperationMetadata, PortError, UserId};

use crate::basket::Basket;

/// Storage for per-buyer baskets
#[async_trait]
pub trait BasketPort: DomainPort + HealthCheckable {
    /// Finds the basket of a buyer, if one was ever saved
    async fn find_basket(
        &self,
        buyer_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<Basket>, PortError>;

    /// Inserts or replaces a buyer's basket with all its items
    async fn save_basket(&self, basket: Basket, metadata: Option<OperationMetadata>) -> Result<Basket, PortError>;
}

#[async_trait]
pub trait BasketPortExt: BasketPort {
    /// Returns the stored basket or a fresh empty one
    async fn basket_of(&self, buyer_id: UserId) -> Result<Basket, PortError> {
        Ok(self
            .find_basket(buyer_id, None)
            .await?
            .unwrap_or_else(|| Basket::new(buyer_id)))
    }
}

impl<T: BasketPort + ?Sized> BasketPortExt for T {}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default, Clone)]
    pub struct MockBasketPort {
        baskets: Arc<RwLock<HashMap<UserId, Basket>>>,
    }

    impl MockBasketPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockBasketPort {}

    #[async_trait]
    impl HealthCheckable for MockBasketPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-basket-port")
        }
    }

    #[async_trait]
    impl BasketPort for MockBasketPort {
        async fn find_basket(
            &self,
            buyer_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<Basket>, PortError> {
            Ok(self.baskets.read().await.get(&buyer_id).cloned())
        }

        async fn save_basket(&self, basket: Basket, _metadata: Option<OperationMetadata>) -> Result<Basket, PortError> {
            self.baskets.write().await.insert(basket.buyer_id, basket.clone());
            Ok(basket)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockBasketPort;
    use super::*;

    #[tokio::test]
    async fn test_basket_of_creates_empty_basket() {
        let port = MockBasketPort::new();
        let buyer = UserId::new();
        let basket = port.basket_of(buyer).await.unwrap();
        assert!(basket.is_empty());
        assert!(port.find_basket(buyer, None).await.unwrap().is_none());

        port.save_basket(basket.clone(), None).await.unwrap();
        assert_eq!(port.basket_of(buyer).await.unwrap().id, basket.id);
    }
}
