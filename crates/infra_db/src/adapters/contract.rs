//! PostgreSQL contract adapter
//!
//! ```sql
//! CREATE TABLE contracts (
//!     id               UUID PRIMARY KEY,
//!     order_id         UUID        NOT NULL,
//!     buyer_id         UUID        NOT NULL,
//!     seller_id        UUID        NOT NULL,
//!     status           TEXT        NOT NULL,
//!     content          TEXT        NOT NULL,
//!     renewal_count    INT4        NOT NULL DEFAULT 0,
//!     template         TEXT        NOT NULL,
//!     pdf_id           UUID,
//!     renewed_from     UUID REFERENCES contracts (id),
//!     additional_terms TEXT,
//!     start_date       TIMESTAMPTZ NOT NULL,
//!     end_date         TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE contract_documents (
//!     id    UUID PRIMARY KEY,
//!     bytes BYTEA NOT NULL
//! );
//! ```
//!
//! Predefined templates are documents keyed by their id and looked up by
//! `contract_type`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    ContractId, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, OrderId, PdfId, PortError, UserId,
};
use domain_contract::{
    Contract, ContractDocument, ContractPort, ContractStatus, PredefinedContract, PredefinedContractType,
};

use super::{parse_label, port_err};
use crate::documents::{Collection, DocumentStore};
use crate::error::DatabaseError;
use crate::pool::check_pool;

const CONTRACT_COLUMNS: &str = "id, order_id, buyer_id, seller_id, status, content, renewal_count, template, \
                                pdf_id, renewed_from, additional_terms, start_date, end_date";

#[derive(Debug, FromRow)]
struct ContractRow {
    id: Uuid,
    order_id: Uuid,
    buyer_id: Uuid,
    seller_id: Uuid,
    status: String,
    content: String,
    renewal_count: i32,
    template: String,
    pdf_id: Option<Uuid>,
    renewed_from: Option<Uuid>,
    additional_terms: Option<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

impl ContractRow {
    fn into_contract(self) -> Result<Contract, DatabaseError> {
        Ok(Contract {
            id: ContractId::from(self.id),
            order_id: OrderId::from(self.order_id),
            buyer_id: UserId::from(self.buyer_id),
            seller_id: UserId::from(self.seller_id),
            status: parse_label::<ContractStatus>(&self.status)?,
            content: self.content,
            renewal_count: u32::try_from(self.renewal_count).unwrap_or(0),
            template: template_type(&self.template)?,
            pdf_id: self.pdf_id.map(PdfId::from),
            renewed_from: self.renewed_from.map(ContractId::from),
            additional_terms: self.additional_terms,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// Template types are stored under their serde names
fn template_type(label: &str) -> Result<PredefinedContractType, DatabaseError> {
    Ok(serde_json::from_value(serde_json::Value::String(label.to_string()))?)
}

/// PostgreSQL-backed [`ContractPort`]
#[derive(Debug, Clone)]
pub struct PostgresContractAdapter {
    pool: PgPool,
    documents: DocumentStore,
}

impl PostgresContractAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            documents: DocumentStore::new(pool.clone()),
            pool,
        }
    }

    /// Stores a template so [`ContractPort::predefined_contract`] can find it
    pub async fn save_template(&self, template: &PredefinedContract) -> Result<(), PortError> {
        self.documents
            .put(Collection::ContractTemplates, *template.id.as_uuid(), None, template)
            .await
            .map_err(port_err)
    }

    async fn contracts_where(&self, column: &str, id: Uuid) -> Result<Vec<Contract>, PortError> {
        let rows: Vec<ContractRow> = sqlx::query_as(&format!(
            "SELECT {} FROM contracts WHERE {} = $1 ORDER BY start_date, id",
            CONTRACT_COLUMNS, column
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(port_err)?;
        rows.into_iter()
            .map(|row| row.into_contract().map_err(port_err))
            .collect()
    }
}

impl DomainPort for PostgresContractAdapter {}

#[async_trait]
impl HealthCheckable for PostgresContractAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-contract-adapter").await
    }
}

#[async_trait]
impl ContractPort for PostgresContractAdapter {
    #[instrument(skip(self, contract, _metadata), fields(contract_id = %contract.id, status = %contract.status.as_str()))]
    async fn save_contract(&self, contract: Contract, _metadata: Option<OperationMetadata>) -> Result<Contract, PortError> {
        sqlx::query(&format!(
            "INSERT INTO contracts ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, content = EXCLUDED.content, \
             renewal_count = EXCLUDED.renewal_count, pdf_id = EXCLUDED.pdf_id, \
             additional_terms = EXCLUDED.additional_terms, end_date = EXCLUDED.end_date",
            CONTRACT_COLUMNS
        ))
        .bind(*contract.id.as_uuid())
        .bind(*contract.order_id.as_uuid())
        .bind(*contract.buyer_id.as_uuid())
        .bind(*contract.seller_id.as_uuid())
        .bind(contract.status.as_str())
        .bind(&contract.content)
        .bind(i32::try_from(contract.renewal_count).unwrap_or(i32::MAX))
        .bind(contract.template.as_str())
        .bind(contract.pdf_id.map(|id| *id.as_uuid()))
        .bind(contract.renewed_from.map(|id| *id.as_uuid()))
        .bind(&contract.additional_terms)
        .bind(contract.start_date)
        .bind(contract.end_date)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        debug!("Contract stored");
        Ok(contract)
    }

    async fn get_contract(&self, id: ContractId, _metadata: Option<OperationMetadata>) -> Result<Contract, PortError> {
        self.contracts_where("id", *id.as_uuid())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PortError::not_found("Contract", id))
    }

    async fn list_contracts(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Contract>, PortError> {
        let rows: Vec<ContractRow> = sqlx::query_as(&format!("SELECT {} FROM contracts ORDER BY id", CONTRACT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(port_err)?;
        rows.into_iter()
            .map(|row| row.into_contract().map_err(port_err))
            .collect()
    }

    async fn contracts_of_buyer(
        &self,
        buyer_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Contract>, PortError> {
        self.contracts_where("buyer_id", *buyer_id.as_uuid()).await
    }

    async fn renewals_of(
        &self,
        id: ContractId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Contract>, PortError> {
        self.contracts_where("renewed_from", *id.as_uuid()).await
    }

    async fn predefined_contract(
        &self,
        contract_type: PredefinedContractType,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<PredefinedContract>, PortError> {
        let templates: Vec<PredefinedContract> = self
            .documents
            .find_by_field(Collection::ContractTemplates, "contract_type", contract_type.as_str())
            .await
            .map_err(port_err)?;
        Ok(templates.into_iter().next())
    }

    #[instrument(skip(self, document, _metadata), fields(pdf_id = %document.id, size = document.bytes.len()))]
    async fn save_document(
        &self,
        document: ContractDocument,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ContractDocument, PortError> {
        sqlx::query(
            "INSERT INTO contract_documents (id, bytes) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET bytes = EXCLUDED.bytes",
        )
        .bind(*document.id.as_uuid())
        .bind(&document.bytes)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(document)
    }

    async fn get_document(&self, id: PdfId, _metadata: Option<OperationMetadata>) -> Result<ContractDocument, PortError> {
        let bytes: Option<Vec<u8>> = sqlx::query_scalar("SELECT bytes FROM contract_documents WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(port_err)?;
        let bytes = bytes.ok_or_else(|| PortError::not_found("Pdf", id))?;
        Ok(ContractDocument { id, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_labels() {
        for kind in [
            PredefinedContractType::Borrowing,
            PredefinedContractType::Buying,
            PredefinedContractType::Selling,
        ] {
            assert_eq!(template_type(kind.as_str()).unwrap(), kind);
        }
        assert!(template_type("LeasingContract").is_err());
    }
}
