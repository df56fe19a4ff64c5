//! Contract DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_contract::Contract;

/// Without a new end date the renewal runs twelve months past the current end
#[derive(Debug, Default, Deserialize)]
pub struct RenewContractRequest {
    pub new_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContractResponse {
    pub id: Uuid,
    pub renewed_from: Option<Uuid>,
    pub status: String,
    pub renewal_count: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub additional_terms: Option<String>,
}

impl From<&Contract> for ContractResponse {
    fn from(contract: &Contract) -> Self {
        Self {
            id: *contract.id.as_uuid(),
            renewed_from: contract.renewed_from.map(|id| *id.as_uuid()),
            status: contract.status.as_str().to_string(),
            renewal_count: contract.renewal_count,
            start_date: contract.start_date,
            end_date: contract.end_date,
            additional_terms: contract.additional_terms.clone(),
        }
    }
}
