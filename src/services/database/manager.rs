use anyhow::{Context, Result};
use async_lock::RwLock;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::sync::Arc;
use std::time::Duration;

use super::decode;
use crate::config::DatabaseSettings;

#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pub(crate) pool: Arc<RwLock<Option<MySqlPool>>>,
}

impl DatabaseManager {
    pub fn new() -> Self {
        Self {
            pool: Arc::new(RwLock::new(None)),
        }
    }

    /// Open the single connection used for the whole run.
    pub async fn connect(&self, settings: &DatabaseSettings) -> Result<()> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database);

        self.connect_with_options(options).await.with_context(|| {
            format!(
                "Failed to connect to MySQL at {}:{}/{}",
                settings.host, settings.port, settings.database
            )
        })
    }

    pub async fn connect_with_options(&self, options: MySqlConnectOptions) -> Result<()> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        tracing::debug!("Connected to MySQL");

        let mut pool_guard = self.pool.write().await;
        if let Some(previous) = pool_guard.replace(pool) {
            previous.close().await;
        }

        Ok(())
    }

    pub async fn disconnect(&self) -> Result<()> {
        let mut pool_guard = self.pool.write().await;
        if let Some(pool) = pool_guard.take() {
            pool.close().await;
            tracing::debug!("Disconnected from MySQL");
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "No active database connection to disconnect"
            ))
        }
    }

    /// Clone of the live pool handle; fails when not connected.
    pub(crate) async fn pool(&self) -> Result<MySqlPool> {
        let pool_guard = self.pool.read().await;
        pool_guard
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Database not connected"))
    }

    pub async fn server_version(&self) -> Result<String> {
        let pool = self.pool().await?;
        let row = sqlx::query("SELECT VERSION()").fetch_one(&pool).await?;
        decode::text_or_empty(&row, 0usize)
    }
}

impl Default for DatabaseManager {
    fn default() -> Self {
        Self::new()
    }
}
