//! Service-level tests for domain_contract

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{ContractId, Money, OrderId, PredefinedContractId, UserId};
use domain_account::{AccountService, MockAccountPort, NotificationKind};
use domain_contract::{
    is_pdf, Contract, ContractError, ContractPlaceholders, ContractService, ContractStatus, MockContractPort,
    PredefinedContract, PredefinedContractType,
};

struct Fixture {
    accounts: AccountService,
    contracts: ContractService,
}

fn fixture_with(port: MockContractPort) -> Fixture {
    let accounts = AccountService::new(Arc::new(MockAccountPort::new()));
    Fixture {
        contracts: ContractService::new(Arc::new(port), accounts.clone()),
        accounts,
    }
}

fn fixture() -> Fixture {
    fixture_with(MockContractPort::new())
}

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn contract(buyer_id: UserId) -> Contract {
    Contract::new(
        OrderId::new(),
        buyer_id,
        UserId::new(),
        PredefinedContractType::Borrowing,
        "Borrowing agreement for a camping tent",
        date(2025, 1, 1),
        date(2025, 3, 1),
    )
}

fn placeholders() -> ContractPlaceholders {
    ContractPlaceholders {
        product_description: "Camping tent".to_string(),
        start_date: date(2025, 5, 1),
        end_date: date(2025, 5, 15),
        price: Money::usd(dec!(56)),
        buyer_name: "Ana Pop".to_string(),
        seller_name: "Outdoor Shop".to_string(),
    }
}

// ============================================================================
// Templates
// ============================================================================

mod template_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_template_falls_back_to_default() {
        let f = fixture();
        let content = f
            .contracts
            .generate_content(PredefinedContractType::Buying, &placeholders())
            .await
            .unwrap();
        assert!(content.starts_with("DEFAULT BUYING AGREEMENT"));
        assert!(content.contains("Outdoor Shop"));
        assert!(content.contains("$56.00"));
    }

    #[tokio::test]
    async fn test_stored_template_is_used() {
        let port = MockContractPort::new()
            .with_template(PredefinedContract {
                id: PredefinedContractId::new(),
                contract_type: PredefinedContractType::Borrowing,
                content: "{BuyerName} borrows {ProductDescription} from {StartDate} to {EndDate}".to_string(),
            })
            .await;
        let f = fixture_with(port);
        let content = f
            .contracts
            .generate_content(PredefinedContractType::Borrowing, &placeholders())
            .await
            .unwrap();
        assert_eq!(content, "Ana Pop borrows Camping tent from 01/05/2025 to 15/05/2025");
    }

    #[tokio::test]
    async fn test_create_from_template_stores_filled_content() {
        let f = fixture();
        let stored = f
            .contracts
            .create_from_template(contract(UserId::new()), PredefinedContractType::Selling, &placeholders())
            .await
            .unwrap();
        assert_eq!(stored.template, PredefinedContractType::Selling);
        assert!(stored.content.contains("Ana Pop"));
        assert!(stored.pdf_id.is_some());
    }
}

// ============================================================================
// Storage and documents
// ============================================================================

mod document_tests {
    use super::*;

    #[tokio::test]
    async fn test_add_contract_generates_pdf() {
        let f = fixture();
        let stored = f.contracts.add_contract(contract(UserId::new()), None).await.unwrap();

        let pdf = f.contracts.get_pdf(stored.id).await.unwrap();
        assert!(is_pdf(&pdf));
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("(Contract Agreement) Tj"));
        assert!(text.contains(&format!("Order ID: {}", stored.order_id)));
    }

    #[tokio::test]
    async fn test_add_contract_keeps_given_pdf() {
        let f = fixture();
        let bytes = b"%PDF-1.4\nuploaded".to_vec();
        let stored = f
            .contracts
            .add_contract(contract(UserId::new()), Some(bytes.clone()))
            .await
            .unwrap();
        assert_eq!(f.contracts.get_pdf(stored.id).await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_non_pdf_bytes_are_rejected() {
        let f = fixture();
        let result = f
            .contracts
            .add_contract(contract(UserId::new()), Some(b"not a pdf".to_vec()))
            .await;
        assert!(matches!(result, Err(ContractError::InvalidDocument)));
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected() {
        let f = fixture();
        let blank = Contract {
            content: "  ".to_string(),
            ..contract(UserId::new())
        };
        assert!(f.contracts.add_contract(blank, None).await.is_err());
    }

    #[tokio::test]
    async fn test_lookups() {
        let f = fixture();
        let buyer = UserId::new();
        f.contracts.add_contract(contract(buyer), None).await.unwrap();
        f.contracts.add_contract(contract(buyer), None).await.unwrap();
        f.contracts.add_contract(contract(UserId::new()), None).await.unwrap();

        assert_eq!(f.contracts.all_contracts().await.unwrap().len(), 3);
        assert_eq!(f.contracts.contracts_of_buyer(buyer).await.unwrap().len(), 2);
        assert!(f.contracts.get_contract(ContractId::nil()).await.is_err());
        assert!(f.contracts.get_contract(ContractId::new()).await.unwrap_err().is_not_found());
    }
}

// ============================================================================
// Renewal
// ============================================================================

mod renewal_tests {
    use super::*;

    #[tokio::test]
    async fn test_renewal_creates_linked_contract_and_notifies_buyer() {
        let f = fixture();
        let buyer = UserId::new();
        let original = f.contracts.add_contract(contract(buyer), None).await.unwrap();

        let renewed = f.contracts.renew_contract(original.id, None).await.unwrap();
        assert_eq!(renewed.status, ContractStatus::Renewed);
        assert_eq!(renewed.renewed_from, Some(original.id));
        assert_eq!(renewed.end_date, date(2026, 3, 1));
        assert!(renewed.pdf_id.is_some());
        assert_ne!(renewed.pdf_id, original.pdf_id);

        // the original stays as it was
        let reloaded = f.contracts.get_contract(original.id).await.unwrap();
        assert_eq!(reloaded.status, ContractStatus::Active);
        assert!(f.contracts.has_contract_been_renewed(original.id).await.unwrap());

        let notifications = f.accounts.get_notifications(buyer, 0).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].kind,
            NotificationKind::ContractRenewalAnswer {
                contract_id: renewed.id,
                accepted: true
            }
        );
    }

    #[tokio::test]
    async fn test_second_renewal_is_refused() {
        let f = fixture();
        let original = f.contracts.add_contract(contract(UserId::new()), None).await.unwrap();
        f.contracts.renew_contract(original.id, None).await.unwrap();

        let again = f.contracts.renew_contract(original.id, None).await;
        assert_eq!(again.unwrap_err().to_string(), "This contract has already been renewed.");
    }

    #[tokio::test]
    async fn test_end_date_must_move_forward() {
        let f = fixture();
        let original = f.contracts.add_contract(contract(UserId::new()), None).await.unwrap();
        let result = f
            .contracts
            .renew_contract(original.id, Some(original.end_date - Duration::days(1)))
            .await;
        assert!(matches!(result, Err(ContractError::EndDateNotAfter)));
        assert!(!f.contracts.has_contract_been_renewed(original.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_history_walks_back_to_original() {
        let f = fixture();
        let original = f.contracts.add_contract(contract(UserId::new()), None).await.unwrap();
        let renewed = f.contracts.renew_contract(original.id, None).await.unwrap();

        let history = f.contracts.contract_history(renewed.id).await.unwrap();
        let ids: Vec<ContractId> = history.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![renewed.id, original.id]);

        let renewed_only = f.contracts.renewed_contracts().await.unwrap();
        assert_eq!(renewed_only.len(), 1);
        assert_eq!(renewed_only[0].id, renewed.id);
    }

    #[tokio::test]
    async fn test_nil_contract_id_is_rejected() {
        let f = fixture();
        assert!(f.contracts.has_contract_been_renewed(ContractId::nil()).await.is_err());
    }
}

// ============================================================================
// Expiry
// ============================================================================

mod expiry_tests {
    use super::*;

    #[tokio::test]
    async fn test_expire_marks_only_ended_active_contracts() {
        let f = fixture();
        let ended = f.contracts.add_contract(contract(UserId::new()), None).await.unwrap();
        let running = Contract {
            end_date: date(2025, 12, 31),
            ..contract(UserId::new())
        };
        let running = f.contracts.add_contract(running, None).await.unwrap();

        let expired = f.contracts.expire_contracts_at(date(2025, 4, 1)).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, ended.id);
        assert_eq!(
            f.contracts.get_contract(running.id).await.unwrap().status,
            ContractStatus::Active
        );
    }

    #[tokio::test]
    async fn test_buyers_are_warned_before_expiry() {
        let f = fixture();
        let buyer = UserId::new();
        let stored = f.contracts.add_contract(contract(buyer), None).await.unwrap();

        let sent = f.contracts.notify_expiring_at(date(2025, 2, 26)).await.unwrap();
        assert_eq!(sent, 1);
        let notifications = f.accounts.get_notifications(buyer, 0).await.unwrap();
        assert_eq!(
            notifications[0].kind,
            NotificationKind::ContractExpiration { contract_id: stored.id }
        );

        assert_eq!(f.contracts.notify_expiring_at(date(2025, 1, 2)).await.unwrap(), 0);
    }
}
