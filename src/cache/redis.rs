use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use log::{debug, info};

use crate::service::ViewCache;

#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub fn new(url: &str) -> Result<Self, anyhow::Error> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .context("Error creating Redis pool")?;
        Ok(Self { pool })
    }

    /// Opens one pooled connection so a bad URL fails at start-up rather than
    /// on the first read.
    pub async fn check(&self) -> Result<(), anyhow::Error> {
        let _conn = self
            .pool
            .get()
            .await
            .context("Error connecting to Redis")?;
        info!("RedisCache: connected.");
        Ok(())
    }
}

#[async_trait]
impl ViewCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self
            .pool
            .get()
            .await
            .context("Error getting Redis connection")?;
        let value: Option<String> = conn
            .get(key)
            .await
            .with_context(|| format!("Redis GET {} failed", key))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), anyhow::Error> {
        let mut conn = self
            .pool
            .get()
            .await
            .context("Error getting Redis connection")?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .with_context(|| format!("Redis SET {} failed", key))?;
        debug!("RedisCache: set {} (ttl {}s)", key, ttl.as_secs());
        Ok(())
    }
}
