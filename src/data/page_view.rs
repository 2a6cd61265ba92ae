use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

pub type PageViews = Vec<PageView>;

/// The fields of a posted view event that the store needs. Anything else on
/// the topic message is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEvent {
    pub user_id: String,
    pub page_url: String,
}

/// One stored row of `personalization_keyspace.user_views`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub event_id: Uuid,
    pub user_id: String,
    pub page_url: String,
    pub event_time: DateTime<Utc>,
}

impl PageView {
    /// Stamps an incoming event with a fresh id and the current time.
    pub fn record(event: ViewEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            user_id: event.user_id,
            page_url: event.page_url,
            event_time: Utc::now(),
        }
    }
}

/// What the read path keeps in the cache for one user.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedViews {
    pub data: PageViews,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewSource {
    Cache,
    Database,
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub source: ViewSource,
    #[serde(flatten)]
    pub payload: CachedViews,
}
