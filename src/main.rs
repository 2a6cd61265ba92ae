use std::sync::Arc;

use anyhow::Context;
use log::info;
use page_views::{
    api::{self, AppState},
    app_config,
    broker::producer::KafkaPublisher,
    cache::redis::RedisCache,
    db::scylladb::ScyllaDbService,
    service::Summarizer,
    summary::gemini::GeminiSummarizer,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let config = app_config::load().context("Error loading config")?;

    let publisher = KafkaPublisher::new(
        &config.kafka_brokers,
        &config.kafka_client_id,
        &config.kafka_topic,
        config.kafka_send_timeout(),
    )?;
    let cache = RedisCache::new(&config.redis_url)?;
    cache.check().await?;
    let store = ScyllaDbService::connect(&config.db_dc, &config.db_url, &config.schema_file).await?;
    info!("Connected to Kafka, Redis, and ScyllaDB.");

    let summarizer: Option<Arc<dyn Summarizer>> = match config.summary_key() {
        Some(api_key) => Some(Arc::new(GeminiSummarizer::new(
            &config.summary_endpoint,
            &config.summary_model,
            api_key,
            config.summary_timeout(),
        )?)),
        None => {
            info!("No summary API key configured; explanations disabled");
            None
        }
    };

    let app = api::router(AppState {
        publisher: Arc::new(publisher),
        store: Arc::new(store),
        cache: Arc::new(cache),
        summarizer,
        cache_ttl: config.cache_ttl(),
    });

    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port))
        .await
        .with_context(|| format!("Error binding {}:{}", config.host, config.port))?;
    info!("Backend server is listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down server");
    }
}
