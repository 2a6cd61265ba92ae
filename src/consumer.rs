use anyhow::Context;
use log::{debug, error, info};
use rdkafka::{
    consumer::{Consumer, StreamConsumer},
    Message,
};
use uuid::Uuid;

use crate::data::page_view::{PageView, ViewEvent};
use crate::service::ViewStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Stored(Uuid),
    Skipped,
}

/// Persists every message of the subscription until the broker or the store
/// fails. Malformed payloads are logged and skipped.
pub async fn run(consumer: &StreamConsumer, store: &dyn ViewStore) -> Result<(), anyhow::Error> {
    loop {
        let message = consumer
            .recv()
            .await
            .context("Error receiving from Kafka")?;
        debug!(
            "Received message from {} [{}] at offset {}",
            message.topic(),
            message.partition(),
            message.offset()
        );
        process_payload(message.payload(), store).await?;
        consumer
            .store_offset_from_message(&message)
            .context("Error storing consumer offset")?;
    }
}

pub async fn process_payload(
    payload: Option<&[u8]>,
    store: &dyn ViewStore,
) -> Result<Outcome, anyhow::Error> {
    let event = match decode(payload) {
        Ok(event) => event,
        Err(e) => {
            error!("Skipping malformed view event: {:#}", e);
            return Ok(Outcome::Skipped);
        }
    };
    info!("Received new event: {:?}", event);

    let view = PageView::record(event);
    store
        .insert(&view)
        .await
        .with_context(|| format!("Error saving event {}", view.event_id))?;
    info!("Saved event {} for user {}.", view.event_id, view.user_id);
    Ok(Outcome::Stored(view.event_id))
}

fn decode(payload: Option<&[u8]>) -> Result<ViewEvent, anyhow::Error> {
    let bytes = payload.context("message has no payload")?;
    serde_json::from_slice(bytes).context("payload is not a view event")
}
