use anyhow::Context;
use axum::{
    debug_handler,
    extract::{Path, State},
    Json,
};
use log::{error, info, warn};

use crate::cache::cache_key;
use crate::data::page_view::{CachedViews, PageView, ViewSource, ViewsResponse};

use super::{error::AppError, AppState};

/// Cache-aside read of a user's view history.
#[debug_handler]
pub async fn user_views(
    State(s): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ViewsResponse>, AppError> {
    let response = load_views(&s, &user_id).await.map_err(|e| {
        error!("Error fetching user views: {:#}", e);
        AppError::InternalServerError
    })?;
    Ok(Json(response))
}

async fn load_views(s: &AppState, user_id: &str) -> Result<ViewsResponse, anyhow::Error> {
    let key = cache_key(user_id);

    if let Some(cached) = s.cache.get(&key).await.context("Cache lookup failed")? {
        match serde_json::from_str::<CachedViews>(&cached) {
            Ok(payload) => {
                info!("CACHE HIT for key: {}", key);
                return Ok(ViewsResponse {
                    source: ViewSource::Cache,
                    payload,
                });
            }
            Err(e) => warn!("Ignoring undecodable cache entry {}: {}", key, e),
        }
    }

    info!("CACHE MISS for key: {}. Fetching from database.", key);
    let data = s
        .store
        .views_for_user(user_id)
        .await
        .context("Storage query failed")?;
    let explanation = explain(s, user_id, &data).await;
    let payload = CachedViews { data, explanation };

    let encoded = serde_json::to_string(&payload)?;
    s.cache
        .set(&key, encoded, s.cache_ttl)
        .await
        .context("Cache write failed")?;

    Ok(ViewsResponse {
        source: ViewSource::Database,
        payload,
    })
}

async fn explain(s: &AppState, user_id: &str, views: &[PageView]) -> Option<String> {
    let summarizer = s.summarizer.as_ref()?;
    if views.is_empty() {
        return None;
    }
    match summarizer.summarize(user_id, views).await {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!("Summary unavailable for {}: {:#}", user_id, e);
            None
        }
    }
}
