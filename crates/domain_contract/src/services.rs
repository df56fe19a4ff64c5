//! Contract services: creation from templates, documents and renewals

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use core_kernel::{ensure_id, ContractId, UserId};
use domain_account::{AccountService, NotificationKind};

use crate::contract::{Contract, ContractStatus};
use crate::document::{is_pdf, render_pdf, ContractDocument};
use crate::error::ContractError;
use crate::ports::ContractPort;
use crate::template::{ContractPlaceholders, PredefinedContract, PredefinedContractType};

pub const CONTRACT_DOCUMENT_TITLE: &str = "Contract Agreement";
pub const EXPIRY_WARNING_DAYS: i64 = 7;

#[derive(Clone)]
pub struct ContractService {
    port: Arc<dyn ContractPort>,
    accounts: AccountService,
}

impl ContractService {
    pub fn new(port: Arc<dyn ContractPort>, accounts: AccountService) -> Self {
        Self { port, accounts }
    }

    /// Stored template for a type, or the built-in fallback
    pub async fn predefined_contract(
        &self,
        contract_type: PredefinedContractType,
    ) -> Result<PredefinedContract, ContractError> {
        match self.port.predefined_contract(contract_type, None).await {
            Ok(Some(template)) => Ok(template),
            Ok(None) => Ok(PredefinedContract::fallback(contract_type)),
            Err(e) => {
                warn!(error = %e, contract_type = %contract_type, "Template lookup failed, using fallback");
                Ok(PredefinedContract::fallback(contract_type))
            }
        }
    }

    pub async fn generate_content(
        &self,
        contract_type: PredefinedContractType,
        placeholders: &ContractPlaceholders,
    ) -> Result<String, ContractError> {
        let template = self.predefined_contract(contract_type).await?;
        Ok(placeholders.fill(&template.content))
    }

    /// Stores a contract with its PDF, generating one when none is given
    #[instrument(skip(self, contract, pdf), fields(order_id = %contract.order_id))]
    pub async fn add_contract(&self, mut contract: Contract, pdf: Option<Vec<u8>>) -> Result<Contract, ContractError> {
        contract.validate()?;
        let bytes = match pdf.filter(|b| !b.is_empty()) {
            Some(bytes) if is_pdf(&bytes) => bytes,
            Some(_) => return Err(ContractError::InvalidDocument),
            None => render_pdf(CONTRACT_DOCUMENT_TITLE, &document_body(&contract)),
        };

        let document = self.port.save_document(ContractDocument::new(bytes), None).await?;
        contract.pdf_id = Some(document.id);
        let contract = self.port.save_contract(contract, None).await?;
        info!(contract_id = %contract.id, status = %contract.status, "Contract stored");
        Ok(contract)
    }

    /// Fills the template for `contract_type` and stores the resulting contract
    pub async fn create_from_template(
        &self,
        contract: Contract,
        contract_type: PredefinedContractType,
        placeholders: &ContractPlaceholders,
    ) -> Result<Contract, ContractError> {
        let content = self.generate_content(contract_type, placeholders).await?;
        let contract = Contract {
            content,
            template: contract_type,
            ..contract
        };
        self.add_contract(contract, None).await
    }

    pub async fn get_contract(&self, id: ContractId) -> Result<Contract, ContractError> {
        ensure_id(id.is_nil(), "contract")?;
        Ok(self.port.get_contract(id, None).await?)
    }

    pub async fn all_contracts(&self) -> Result<Vec<Contract>, ContractError> {
        Ok(self.port.list_contracts(None).await?)
    }

    pub async fn contracts_of_buyer(&self, buyer_id: UserId) -> Result<Vec<Contract>, ContractError> {
        ensure_id(buyer_id.is_nil(), "buyer")?;
        Ok(self.port.contracts_of_buyer(buyer_id, None).await?)
    }

    /// PDF bytes of a contract
    pub async fn get_pdf(&self, id: ContractId) -> Result<Vec<u8>, ContractError> {
        let contract = self.get_contract(id).await?;
        let pdf_id = contract
            .pdf_id
            .ok_or_else(|| ContractError::invalid_field("pdf_id", "Contract has no document"))?;
        Ok(self.port.get_document(pdf_id, None).await?.bytes)
    }

    /// The contract and every contract it was renewed from, newest first
    pub async fn contract_history(&self, id: ContractId) -> Result<Vec<Contract>, ContractError> {
        let mut history = vec![self.get_contract(id).await?];
        while let Some(previous) = history.last().and_then(|c| c.renewed_from) {
            if history.iter().any(|c| c.id == previous) {
                break;
            }
            history.push(self.port.get_contract(previous, None).await?);
        }
        Ok(history)
    }

    pub async fn renewed_contracts(&self) -> Result<Vec<Contract>, ContractError> {
        Ok(self
            .all_contracts()
            .await?
            .into_iter()
            .filter(|c| c.status == ContractStatus::Renewed)
            .collect())
    }

    pub async fn has_contract_been_renewed(&self, id: ContractId) -> Result<bool, ContractError> {
        ensure_id(id.is_nil(), "contract")?;
        Ok(!self.port.renewals_of(id, None).await?.is_empty())
    }

    /// Renews a contract, storing the renewal with its own PDF
    ///
    /// The buyer is told the renewal went through.
    #[instrument(skip(self, new_end), fields(contract_id = %id))]
    pub async fn renew_contract(
        &self,
        id: ContractId,
        new_end: Option<DateTime<Utc>>,
    ) -> Result<Contract, ContractError> {
        let original = self.get_contract(id).await?;
        let already_renewed = self.has_contract_been_renewed(id).await?;
        let renewal = original.renewal(already_renewed, new_end)?;
        let renewal = self.add_contract(renewal, None).await?;

        let answer = NotificationKind::ContractRenewalAnswer {
            contract_id: renewal.id,
            accepted: true,
        };
        if let Err(e) = self.accounts.notify(renewal.buyer_id, answer).await {
            warn!(error = %e, "Renewal answer not delivered");
        }
        info!(renewal_id = %renewal.id, end_date = %renewal.end_date, "Contract renewed");
        Ok(renewal)
    }

    /// Marks active contracts past their end date as expired
    pub async fn expire_contracts_at(&self, now: DateTime<Utc>) -> Result<Vec<Contract>, ContractError> {
        let mut expired = Vec::new();
        for mut contract in self.all_contracts().await? {
            if contract.status == ContractStatus::Active && contract.is_expired_at(now) {
                contract.status = ContractStatus::Expired;
                expired.push(self.port.save_contract(contract, None).await?);
            }
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Contracts expired");
        }
        Ok(expired)
    }

    /// Warns buyers whose active contracts end within a week
    pub async fn notify_expiring_at(&self, now: DateTime<Utc>) -> Result<usize, ContractError> {
        let mut sent = 0;
        for contract in self.all_contracts().await? {
            if contract.status != ContractStatus::Expired && contract.expires_within(EXPIRY_WARNING_DAYS, now) {
                self.accounts
                    .notify(contract.buyer_id, NotificationKind::ContractExpiration { contract_id: contract.id })
                    .await?;
                sent += 1;
            }
        }
        Ok(sent)
    }
}

fn document_body(contract: &Contract) -> String {
    format!(
        "Contract ID: {}\nOrder ID: {}\nStatus: {}\nContent: {}\nAdditional Terms: {}",
        contract.id,
        contract.order_id,
        contract.status,
        contract.content,
        contract.additional_terms.as_deref().unwrap_or("")
    )
}
