use anyhow::Context;
use log::{error, info};
use page_views::{app_config, broker::subscriber, consumer, db::scylladb::ScyllaDbService};
use rdkafka::consumer::Consumer;

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(e) = run().await {
        error!("An error occurred: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), anyhow::Error> {
    let config = app_config::load().context("Error loading config")?;

    let store = ScyllaDbService::connect(&config.db_dc, &config.db_url, &config.schema_file).await?;
    let kafka = subscriber::subscribe(
        &config.kafka_brokers,
        &config.kafka_consumer_client_id,
        &config.kafka_group_id,
        &config.kafka_topic,
    )?;
    info!("Successfully connected to Kafka and ScyllaDB.");

    let result = tokio::select! {
        result = consumer::run(&kafka, &store) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down consumer");
            Ok(())
        }
    };
    kafka.unsubscribe();
    result
}
