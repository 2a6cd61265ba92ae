use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use log::{debug, info};
use rdkafka::{
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
    ClientConfig,
};

use crate::service::EventPublisher;

pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(
        brokers: &str,
        client_id: &str,
        topic: &str,
        send_timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("client.id", client_id)
            .set("message.timeout.ms", send_timeout.as_millis().to_string())
            .create()
            .context("Error creating Kafka producer")?;
        info!(
            "KafkaPublisher: producing to topic {} on {}",
            topic, brokers
        );
        Ok(Self {
            producer,
            topic: topic.to_owned(),
            send_timeout,
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, key: Option<String>, payload: Vec<u8>) -> Result<(), anyhow::Error> {
        let mut record: FutureRecord<'_, str, [u8]> =
            FutureRecord::to(&self.topic).payload(payload.as_slice());
        if let Some(key) = key.as_deref() {
            record = record.key(key);
        }
        match self
            .producer
            .send(record, Timeout::After(self.send_timeout))
            .await
        {
            Ok((partition, offset)) => {
                debug!(
                    "KafkaPublisher: delivered to {} [{}] at offset {}",
                    self.topic, partition, offset
                );
                Ok(())
            }
            Err((e, _)) => {
                Err(anyhow::Error::new(e).context(format!("Failed to deliver to {}", self.topic)))
            }
        }
    }
}
