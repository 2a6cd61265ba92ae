pub mod error;
pub mod events;
pub mod health;
pub mod views;

use std::{sync::Arc, time::Duration};

use axum::{
    routing::{get, post},
    Router,
};

use crate::service::{EventPublisher, Summarizer, ViewCache, ViewStore};

#[derive(Clone)]
pub struct AppState {
    pub publisher: Arc<dyn EventPublisher>,
    pub store: Arc<dyn ViewStore>,
    pub cache: Arc<dyn ViewCache>,
    /// `None` leaves `explanation` null on every read.
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub cache_ttl: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/events/view", post(events::publish_view))
        .route("/api/users/:user_id/views", get(views::user_views))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::data::page_view::{CachedViews, PageView};
    use crate::service::{MockEventPublisher, MockSummarizer, MockViewCache, MockViewStore};

    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    struct Mocks {
        publisher: MockEventPublisher,
        store: MockViewStore,
        cache: MockViewCache,
        summarizer: Option<MockSummarizer>,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                publisher: MockEventPublisher::new(),
                store: MockViewStore::new(),
                cache: MockViewCache::new(),
                summarizer: None,
            }
        }

        fn into_app(self) -> Router {
            router(AppState {
                publisher: Arc::new(self.publisher),
                store: Arc::new(self.store),
                cache: Arc::new(self.cache),
                summarizer: self
                    .summarizer
                    .map(|s| Arc::new(s) as Arc<dyn Summarizer>),
                cache_ttl: TTL,
            })
        }
    }

    fn sample_views() -> Vec<PageView> {
        vec![
            PageView {
                event_id: Uuid::new_v4(),
                user_id: "u-1".to_string(),
                page_url: "/checkout".to_string(),
                event_time: Utc.timestamp_millis_opt(1_700_000_002_000).unwrap(),
            },
            PageView {
                event_id: Uuid::new_v4(),
                user_id: "u-1".to_string(),
                page_url: "/cart".to_string(),
                event_time: Utc.timestamp_millis_opt(1_700_000_001_000).unwrap(),
            },
        ]
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response: Response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get_views(user_id: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/api/users/{}/views", user_id))
            .body(Body::empty())
            .unwrap()
    }

    fn post_event(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/events/view")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();

        let (status, json) = send(Mocks::new().into_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({ "status": "ok", "message": "Backend is running!" })
        );
    }

    #[tokio::test]
    async fn test_post_event_publishes_body_verbatim() {
        let body = r#"{"userId":"u-1","pageUrl":"/home","extra":{"b":1,"a":2}}"#;
        let expected = body.as_bytes().to_vec();
        let mut mocks = Mocks::new();
        mocks
            .publisher
            .expect_publish()
            .withf(move |key, payload| key.as_deref() == Some("u-1") && *payload == expected)
            .times(1)
            .returning(|_, _| Ok(()));

        let (status, json) = send(mocks.into_app(), post_event(body)).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json, json!({ "message": "Event accepted" }));
    }

    #[tokio::test]
    async fn test_post_event_publish_failure_is_500() {
        let mut mocks = Mocks::new();
        mocks
            .publisher
            .expect_publish()
            .times(1)
            .returning(|_, _| Err(anyhow!("broker unreachable")));

        let (status, json) = send(
            mocks.into_app(),
            post_event(r#"{"userId":"u-1","pageUrl":"/home"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({ "message": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_post_event_rejects_non_json_without_publishing() {
        let mut mocks = Mocks::new();
        mocks.publisher.expect_publish().times(0);

        let response = mocks
            .into_app()
            .oneshot(post_event("userId=u-1"))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_post_event_rejects_non_object_json() {
        for body in ["42", r#""x""#, "null", r#"[{"userId":"u-1"}]"#] {
            let mut mocks = Mocks::new();
            mocks.publisher.expect_publish().times(0);

            let (status, json) = send(mocks.into_app(), post_event(body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
            assert_eq!(json, json!({ "message": "Event must be a JSON object" }));
        }
    }

    #[tokio::test]
    async fn test_cache_hit_returns_cached_payload() {
        let cached = CachedViews {
            data: sample_views(),
            explanation: Some("Getting ready to buy.".to_string()),
        };
        let encoded = serde_json::to_string(&cached).unwrap();
        let mut mocks = Mocks::new();
        mocks
            .cache
            .expect_get()
            .withf(|key| key == "views:u-1")
            .times(1)
            .returning(move |_| Ok(Some(encoded.clone())));
        mocks.cache.expect_set().times(0);
        mocks.store.expect_views_for_user().times(0);

        let (status, json) = send(mocks.into_app(), get_views("u-1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "cache");
        assert_eq!(json["explanation"], "Getting ready to buy.");
        let data: Vec<PageView> = serde_json::from_value(json["data"].clone()).unwrap();
        assert_eq!(data, cached.data);
    }

    #[tokio::test]
    async fn test_cache_miss_queries_store_once_and_writes_cache_once() {
        let views = sample_views();
        let rows = views.clone();
        let mut mocks = Mocks::new();
        mocks
            .cache
            .expect_get()
            .times(1)
            .returning(|_| Ok(None));
        mocks
            .store
            .expect_views_for_user()
            .withf(|user_id| user_id == "u-1")
            .times(1)
            .returning(move |_| Ok(rows.clone()));
        let expected = views.clone();
        mocks
            .cache
            .expect_set()
            .withf(move |key, value, ttl| {
                let stored: CachedViews = serde_json::from_str(value).unwrap();
                key == "views:u-1"
                    && *ttl == TTL
                    && stored.data == expected
                    && stored.explanation.is_none()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let (status, json) = send(mocks.into_app(), get_views("u-1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "database");
        assert_eq!(json["explanation"], Value::Null);
        assert_eq!(json["data"][0]["page_url"], "/checkout");
        assert_eq!(json["data"][1]["page_url"], "/cart");
    }

    #[tokio::test]
    async fn test_cache_miss_with_summary() {
        let mut mocks = Mocks::new();
        mocks.cache.expect_get().returning(|_| Ok(None));
        mocks
            .store
            .expect_views_for_user()
            .times(1)
            .returning(|_| Ok(sample_views()));
        mocks
            .cache
            .expect_set()
            .withf(|_, value, _| value.contains("Comparing prices before checkout."))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_summarize()
            .withf(|user_id, views| user_id == "u-1" && views.len() == 2)
            .times(1)
            .returning(|_, _| Ok("Comparing prices before checkout.".to_string()));
        mocks.summarizer = Some(summarizer);

        let (status, json) = send(mocks.into_app(), get_views("u-1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "database");
        assert_eq!(json["explanation"], "Comparing prices before checkout.");
    }

    #[tokio::test]
    async fn test_summary_failure_leaves_explanation_null() {
        let mut mocks = Mocks::new();
        mocks.cache.expect_get().returning(|_| Ok(None));
        mocks
            .store
            .expect_views_for_user()
            .returning(|_| Ok(sample_views()));
        mocks
            .cache
            .expect_set()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_summarize()
            .times(1)
            .returning(|_, _| Err(anyhow!("quota exceeded")));
        mocks.summarizer = Some(summarizer);

        let (status, json) = send(mocks.into_app(), get_views("u-1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["explanation"], Value::Null);
    }

    #[tokio::test]
    async fn test_no_summary_for_empty_history() {
        let mut mocks = Mocks::new();
        mocks.cache.expect_get().returning(|_| Ok(None));
        mocks
            .store
            .expect_views_for_user()
            .returning(|_| Ok(vec![]));
        mocks
            .cache
            .expect_set()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut summarizer = MockSummarizer::new();
        summarizer.expect_summarize().times(0);
        mocks.summarizer = Some(summarizer);

        let (status, json) = send(mocks.into_app(), get_views("u-1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "source": "database", "data": [], "explanation": null }));
    }

    #[tokio::test]
    async fn test_undecodable_cache_entry_is_a_miss() {
        let mut mocks = Mocks::new();
        mocks
            .cache
            .expect_get()
            .returning(|_| Ok(Some("[not a payload".to_string())));
        mocks
            .store
            .expect_views_for_user()
            .times(1)
            .returning(|_| Ok(sample_views()));
        mocks
            .cache
            .expect_set()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let (status, json) = send(mocks.into_app(), get_views("u-1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "database");
    }

    #[tokio::test]
    async fn test_cache_failure_is_500() {
        let mut mocks = Mocks::new();
        mocks
            .cache
            .expect_get()
            .returning(|_| Err(anyhow!("connection refused")));
        mocks.store.expect_views_for_user().times(0);

        let (status, json) = send(mocks.into_app(), get_views("u-1")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({ "message": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_store_failure_is_500_and_nothing_cached() {
        let mut mocks = Mocks::new();
        mocks.cache.expect_get().returning(|_| Ok(None));
        mocks
            .store
            .expect_views_for_user()
            .returning(|_| Err(anyhow!("unavailable")));
        mocks.cache.expect_set().times(0);

        let (status, _) = send(mocks.into_app(), get_views("u-1")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
