use std::time::Duration;

use axum::async_trait;

use crate::data::page_view::{PageView, PageViews};

/// Publishes a raw event payload to the view topic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, key: Option<String>, payload: Vec<u8>) -> Result<(), anyhow::Error>;
}

/// Wide-column storage of page views, partitioned by user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ViewStore: Send + Sync {
    async fn insert(&self, view: &PageView) -> Result<(), anyhow::Error>;
    /// Newest first.
    async fn views_for_user(&self, user_id: &str) -> Result<PageViews, anyhow::Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ViewCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), anyhow::Error>;
}

/// Produces a one-line natural-language summary of a user's history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, user_id: &str, views: &[PageView]) -> Result<String, anyhow::Error>;
}
