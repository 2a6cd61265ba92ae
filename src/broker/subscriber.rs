use anyhow::Context;
use log::info;
use rdkafka::{
    consumer::{Consumer, StreamConsumer},
    ClientConfig,
};

/// Builds a group consumer subscribed to `topic`.
///
/// A new group starts from the earliest offset. Offsets are committed
/// automatically but only stored once a message has been handled, so
/// delivery is at-least-once.
pub fn subscribe(
    brokers: &str,
    client_id: &str,
    group_id: &str,
    topic: &str,
) -> Result<StreamConsumer, anyhow::Error> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("client.id", client_id)
        .set("group.id", group_id)
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "true")
        .set("enable.auto.offset.store", "false")
        .create()
        .context("Error creating Kafka consumer")?;
    consumer
        .subscribe(&[topic])
        .with_context(|| format!("Error subscribing to {}", topic))?;
    info!(
        "Consumer is listening for events on \"{}\" topic (group {})...",
        topic, group_id
    );
    Ok(consumer)
}
