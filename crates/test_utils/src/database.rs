//! Database Test Utilities
//!
//! Postgres containers loaded with the marketplace schema, for adapter
//! tests that need a real database. Docker must be available.

use std::sync::Arc;
use std::time::Duration;

use infra_db::{create_pool, DatabaseConfig, DatabasePool};
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "marketminds_test";

/// Marketplace schema applied to every fresh container
pub const SCHEMA_SQL: &str = include_str!("../../../migrations/20250101_000001_initial_schema.sql");

/// Every table, children before parents
pub const TABLES: [&str; 14] = [
    "messages",
    "conversations",
    "reviews",
    "contract_documents",
    "contracts",
    "order_checkpoints",
    "tracked_orders",
    "orders",
    "order_summaries",
    "order_histories",
    "bids",
    "notifications",
    "users",
    "documents",
];

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A running Postgres container and a pool connected to it
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: DatabasePool,
}

impl TestDatabase {
    /// Starts a container and applies [`SCHEMA_SQL`]
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or the schema fails to apply
    pub async fn new() -> Result<Self, BoxError> {
        let container = Postgres::default()
            .with_user(POSTGRES_USER)
            .with_password(POSTGRES_PASSWORD)
            .with_db_name(POSTGRES_DB)
            .with_tag(POSTGRES_TAG)
            .start()
            .await?;

        let port = container.get_host_port_ipv4(5432).await?;
        let host = container.get_host().await?.to_string();

        let config = TestDatabaseConfig {
            host,
            port,
            ..TestDatabaseConfig::default()
        };

        let pool = create_pool(
            DatabaseConfig::new(config.connection_url())
                .max_connections(5)
                .connect_timeout(Duration::from_secs(30)),
        )
        .await?;

        let test_db = Self {
            _container: container,
            config,
            pool,
        };
        test_db.init_schema().await?;

        Ok(test_db)
    }

    async fn init_schema(&self) -> Result<(), BoxError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Empties every table while keeping the schema
    pub async fn clear_data(&self) -> Result<(), BoxError> {
        for table in TABLES {
            sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", table))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Rows currently in a table
    pub async fn count_rows(&self, table: &str) -> Result<i64, BoxError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// Gets or creates a database shared by every test in the binary
///
/// # Panics
///
/// Panics if the database fails to initialize
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// Creates a database owned by a single test
pub async fn create_isolated_test_database() -> Result<TestDatabase, BoxError> {
    TestDatabase::new().await
}

/// Runs a test body against an isolated database
///
/// ```rust,ignore
/// db_test!(test_roundtrip, |pool| {
///     let adapter = PostgresCatalogAdapter::new(pool.clone());
/// });
/// ```
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$pool:ident| $body:block) => {
        #[tokio::test]
        #[ignore = "needs docker"]
        async fn $name() {
            let db = $crate::database::create_isolated_test_database()
                .await
                .expect("Failed to create test database");
            let $pool = db.pool();
            $body
        }
    };
}

/// Assertions on raw query results
pub trait DatabaseTestAssertions {
    fn assert_rows_affected(&self, expected: u64);
}

impl DatabaseTestAssertions for sqlx::postgres::PgQueryResult {
    fn assert_rows_affected(&self, expected: u64) {
        assert_eq!(
            self.rows_affected(),
            expected,
            "Expected {} rows affected, got {}",
            expected,
            self.rows_affected()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_connection_url() {
        let url = TestDatabaseConfig::default().connection_url();
        assert!(url.starts_with("postgres://"));
        assert!(url.contains(POSTGRES_USER));
        assert!(url.ends_with("/marketminds_test"));
    }

    #[test]
    fn test_schema_creates_every_table() {
        for table in TABLES {
            let create = format!("CREATE TABLE {} (", table);
            assert!(SCHEMA_SQL.contains(&create), "schema is missing {}", table);
        }
    }

    #[test]
    fn test_children_are_cleared_before_parents() {
        let position = |name: &str| TABLES.iter().position(|t| *t == name).unwrap();
        assert!(position("messages") < position("conversations"));
        assert!(position("order_checkpoints") < position("tracked_orders"));
        assert!(position("orders") < position("order_summaries"));
        assert!(position("notifications") < position("users"));
    }
}
