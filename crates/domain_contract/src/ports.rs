//! Contract Domain Ports

use async_trait::async_trait;

use core_kernel::{ContractId, DomainPort, HealthCheckable, OperationMetadata, PdfId, PortError, UserId};

use crate::contract::Contract;
use crate::document::ContractDocument;
use crate::template::{PredefinedContract, PredefinedContractType};

#[async_trait]
pub trait ContractPort: DomainPort + HealthCheckable {
    /// Inserts or replaces a contract
    async fn save_contract(&self, contract: Contract, metadata: Option<OperationMetadata>) -> Result<Contract, PortError>;

    async fn get_contract(&self, id: ContractId, metadata: Option<OperationMetadata>) -> Result<Contract, PortError>;

    async fn list_contracts(&self, metadata: Option<OperationMetadata>) -> Result<Vec<Contract>, PortError>;

    async fn contracts_of_buyer(
        &self,
        buyer_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Contract>, PortError>;

    /// Contracts whose `renewed_from` is the given contract
    async fn renewals_of(
        &self,
        id: ContractId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Contract>, PortError>;

    /// The stored template for a type, if any
    async fn predefined_contract(
        &self,
        contract_type: PredefinedContractType,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<PredefinedContract>, PortError>;

    async fn save_document(
        &self,
        document: ContractDocument,
        metadata: Option<OperationMetadata>,
    ) -> Result<ContractDocument, PortError>;

    async fn get_document(&self, id: PdfId, metadata: Option<OperationMetadata>) -> Result<ContractDocument, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default, Clone)]
    pub struct MockContractPort {
        contracts: Arc<RwLock<HashMap<ContractId, Contract>>>,
        templates: Arc<RwLock<HashMap<PredefinedContractType, PredefinedContract>>>,
        documents: Arc<RwLock<HashMap<PdfId, ContractDocument>>>,
    }

    impl MockContractPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Stores a template for tests that need a non-default one
        pub async fn with_template(self, template: PredefinedContract) -> Self {
            self.templates.write().await.insert(template.contract_type, template);
            self
        }
    }

    impl DomainPort for MockContractPort {}

    #[async_trait]
    impl HealthCheckable for MockContractPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-contract-port")
        }
    }

    #[async_trait]
    impl ContractPort for MockContractPort {
        async fn save_contract(
            &self,
            contract: Contract,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Contract, PortError> {
            self.contracts.write().await.insert(contract.id, contract.clone());
            Ok(contract)
        }

        async fn get_contract(&self, id: ContractId, _metadata: Option<OperationMetadata>) -> Result<Contract, PortError> {
            self.contracts
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Contract", id))
        }

        async fn list_contracts(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Contract>, PortError> {
            let mut contracts: Vec<Contract> = self.contracts.read().await.values().cloned().collect();
            contracts.sort_by_key(|c| c.id);
            Ok(contracts)
        }

        async fn contracts_of_buyer(
            &self,
            buyer_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Contract>, PortError> {
            Ok(self
                .contracts
                .read()
                .await
                .values()
                .filter(|c| c.buyer_id == buyer_id)
                .cloned()
                .collect())
        }

        async fn renewals_of(
            &self,
            id: ContractId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Contract>, PortError> {
            Ok(self
                .contracts
                .read()
                .await
                .values()
                .filter(|c| c.renewed_from == Some(id))
                .cloned()
                .collect())
        }

        async fn predefined_contract(
            &self,
            contract_type: PredefinedContractType,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<PredefinedContract>, PortError> {
            Ok(self.templates.read().await.get(&contract_type).cloned())
        }

        async fn save_document(
            &self,
            document: ContractDocument,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ContractDocument, PortError> {
            self.documents.write().await.insert(document.id, document.clone());
            Ok(document)
        }

        async fn get_document(&self, id: PdfId, _metadata: Option<OperationMetadata>) -> Result<ContractDocument, PortError> {
            self.documents
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Pdf", id))
        }
    }
}
