//! JSONB document storage for nested aggregates
//!
//! Listings (with images, tags and bids), baskets and buyer profiles are
//! read and written whole, so they are kept as one JSONB document each in
//! the `documents` table:
//!
//! ```sql
//! CREATE TABLE documents (
//!     collection TEXT        NOT NULL,
//!     id         UUID        NOT NULL,
//!     owner_id   UUID,
//!     data       JSONB       NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
//!     PRIMARY KEY (collection, id)
//! );
//! ```
//!
//! `owner_id` is the user a document belongs to, which covers the
//! by-user lookups the ports need.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    BuyProducts,
    BorrowProducts,
    Auctions,
    Categories,
    Conditions,
    Tags,
    Waitlist,
    Baskets,
    Buyers,
    Sellers,
    Linkages,
    ContractTemplates,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::BuyProducts => "buy_products",
            Collection::BorrowProducts => "borrow_products",
            Collection::Auctions => "auctions",
            Collection::Categories => "categories",
            Collection::Conditions => "conditions",
            Collection::Tags => "tags",
            Collection::Waitlist => "waitlist",
            Collection::Baskets => "baskets",
            Collection::Buyers => "buyers",
            Collection::Sellers => "sellers",
            Collection::Linkages => "linkages",
            Collection::ContractTemplates => "contract_templates",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: PgPool,
}

impl DocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts or replaces a document
    pub async fn put<T: Serialize>(
        &self,
        collection: Collection,
        id: Uuid,
        owner_id: Option<Uuid>,
        value: &T,
    ) -> Result<(), DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::put_in(&mut conn, collection, id, owner_id, value).await
    }

    /// [`put`](Self::put) on a caller-held connection, for use inside a transaction
    pub async fn put_in<T: Serialize>(
        conn: &mut PgConnection,
        collection: Collection,
        id: Uuid,
        owner_id: Option<Uuid>,
        value: &T,
    ) -> Result<(), DatabaseError> {
        let data = serde_json::to_value(value)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, owner_id, data, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (collection, id)
            DO UPDATE SET owner_id = EXCLUDED.owner_id, data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(owner_id)
        .bind(data)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, collection: Collection, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let data: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        data.map(serde_json::from_value).transpose().map_err(DatabaseError::from)
    }

    /// Like [`get`](Self::get) but missing documents are an error
    pub async fn require<T: DeserializeOwned>(
        &self,
        collection: Collection,
        entity: &'static str,
        id: Uuid,
    ) -> Result<T, DatabaseError> {
        self.get(collection, id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(entity, id))
    }

    /// Every document of a collection, oldest first
    pub async fn list<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, DatabaseError> {
        let rows: Vec<serde_json::Value> =
            sqlx::query_scalar("SELECT data FROM documents WHERE collection = $1 ORDER BY updated_at, id")
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await?;
        decode_all(rows)
    }

    pub async fn list_by_owner<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner_id: Uuid,
    ) -> Result<Vec<T>, DatabaseError> {
        let rows: Vec<serde_json::Value> = sqlx::query_scalar(
            "SELECT data FROM documents WHERE collection = $1 AND owner_id = $2 ORDER BY updated_at, id",
        )
        .bind(collection.as_str())
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    /// Documents whose JSON `field` equals `value`
    pub async fn find_by_field<T: DeserializeOwned>(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, DatabaseError> {
        let rows: Vec<serde_json::Value> = sqlx::query_scalar(
            "SELECT data FROM documents WHERE collection = $1 AND data ->> $2 = $3 ORDER BY updated_at, id",
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    /// Documents whose JSON array `field` contains the string `value`
    pub async fn find_containing<T: DeserializeOwned>(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, DatabaseError> {
        let rows: Vec<serde_json::Value> = sqlx::query_scalar(
            "SELECT data FROM documents WHERE collection = $1 AND (data -> $2) ? $3 ORDER BY updated_at, id",
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    /// Deletes a document, returning whether one existed
    pub async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes a document, failing with `NotFound` when there was none
    pub async fn delete_existing(
        &self,
        collection: Collection,
        entity: &'static str,
        id: Uuid,
    ) -> Result<(), DatabaseError> {
        if self.delete(collection, id).await? {
            Ok(())
        } else {
            Err(DatabaseError::not_found(entity, id))
        }
    }
}

fn decode_all<T: DeserializeOwned>(rows: Vec<serde_json::Value>) -> Result<Vec<T>, DatabaseError> {
    rows.into_iter()
        .map(|value| serde_json::from_value(value).map_err(DatabaseError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names_are_distinct() {
        let all = [
            Collection::BuyProducts,
            Collection::BorrowProducts,
            Collection::Auctions,
            Collection::Categories,
            Collection::Conditions,
            Collection::Tags,
            Collection::Waitlist,
            Collection::Baskets,
            Collection::Buyers,
            Collection::Sellers,
            Collection::Linkages,
            Collection::ContractTemplates,
        ];
        let mut names: Vec<&str> = all.iter().map(Collection::as_str).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_decode_reports_bad_documents() {
        let rows = vec![serde_json::json!({"unexpected": true})];
        let decoded: Result<Vec<uuid::Uuid>, _> = decode_all(rows);
        assert!(matches!(decoded, Err(DatabaseError::SerializationError(_))));
    }
}
