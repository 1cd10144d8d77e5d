use std::str::FromStr;

use async_trait::async_trait;
use log::info;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::exchange_rate::ExchangeRate;

#[async_trait]
pub trait ExchangeRateStore: Send + Sync {
    async fn create(&self, rate: &ExchangeRate) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens `url`, creating the database file when it does not exist yet.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        info!("Connecting to database at: {}", url);
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Ok(Self::new(pool))
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS exchange_rates (
                id TEXT PRIMARY KEY NOT NULL,
                code TEXT NOT NULL,
                codein TEXT NOT NULL,
                name TEXT NOT NULL,
                high TEXT NOT NULL,
                low TEXT NOT NULL,
                var_bid TEXT NOT NULL,
                pct_change TEXT NOT NULL,
                bid TEXT NOT NULL,
                ask TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                create_date TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ExchangeRateStore for SqliteStore {
    async fn create(&self, rate: &ExchangeRate) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO exchange_rates
                (id, code, codein, name, high, low, var_bid, pct_change, bid, ask, timestamp, create_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(rate.id.to_string())
        .bind(&rate.code)
        .bind(&rate.codein)
        .bind(&rate.name)
        .bind(&rate.high)
        .bind(&rate.low)
        .bind(&rate.var_bid)
        .bind(&rate.pct_change)
        .bind(&rate.bid)
        .bind(&rate.ask)
        .bind(&rate.timestamp)
        .bind(&rate.create_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> SqliteStore {
    // A single long-lived connection, otherwise every connection gets its own
    // empty in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteStore::new(pool);
    store.migrate().await.unwrap();
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange_rate::sample_quote;

    #[tokio::test]
    async fn create_persists_every_field() {
        let store = memory_store().await;
        let rate = ExchangeRate::new(sample_quote()).unwrap();

        store.create(&rate).await.unwrap();

        let (id, code, var_bid, bid, create_date): (String, String, String, String, String) =
            sqlx::query_as("SELECT id, code, var_bid, bid, create_date FROM exchange_rates")
                .fetch_one(&store.pool)
                .await
                .unwrap();
        assert_eq!(id, rate.id.to_string());
        assert_eq!(code, "USD");
        assert_eq!(var_bid, "0.50");
        assert_eq!(bid, "10.00");
        assert_eq!(create_date, "2022-01-01 00:00:00");
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let store = memory_store().await;
        store.migrate().await.unwrap();

        store.create(&ExchangeRate::new(sample_quote()).unwrap()).await.unwrap();
        store.create(&ExchangeRate::new(sample_quote()).unwrap()).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exchange_rates")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = memory_store().await;
        let rate = ExchangeRate::new(sample_quote()).unwrap();

        store.create(&rate).await.unwrap();

        assert!(store.create(&rate).await.is_err());
    }

    #[tokio::test]
    async fn connect_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cotacao.db");

        let store = SqliteStore::connect(path.to_str().unwrap()).await.unwrap();
        store.migrate().await.unwrap();

        assert!(path.exists());
    }
}
