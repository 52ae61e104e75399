use super::MarketQueue;
use crate::market::EventMarket;
use async_trait::async_trait;
use aws_sdk_sqs::Client;
use serde::Deserialize;
use tracing::error;

const WAIT_TIME_SECONDS: i32 = 20;

/// SQS driver. Message bodies are SNS envelopes whose `Message` field carries
/// the event-market JSON. Parsed messages are deleted by receipt handle;
/// malformed ones are logged and dropped rather than redelivered.
pub struct SqsMarketQueue {
    client: Client,
    queue_url: String,
}

/// The subset of the SNS notification envelope the consumer needs.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Message")]
    message: String,
}

impl SqsMarketQueue {
    pub fn new(client: Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }

    async fn delete_message(&self, receipt_handle: &str) {
        let result = self
            .client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await;

        if let Err(e) = result {
            error!("error deleting message from queue {}: {}", self.queue_url, e);
        }
    }
}

#[async_trait]
impl MarketQueue for SqsMarketQueue {
    async fn receive(&self) -> Vec<EventMarket> {
        let result = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .wait_time_seconds(WAIT_TIME_SECONDS)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                error!(
                    "unable to receive messages from queue {}: {}",
                    self.queue_url, e
                );
                return vec![];
            }
        };

        let mut markets = Vec::new();

        for message in output.messages() {
            let Some(body) = message.body() else {
                continue;
            };

            match parse_event_market(body) {
                Ok(market) => {
                    markets.push(market);

                    if let Some(handle) = message.receipt_handle() {
                        self.delete_message(handle).await;
                    }
                }
                Err(e) => {
                    error!("unable to parse queue message into event market: {}", e);
                }
            }
        }

        markets
    }
}

fn parse_event_market(body: &str) -> Result<EventMarket, serde_json::Error> {
    let envelope: Envelope = serde_json::from_str(body)?;

    serde_json::from_str(&envelope.message)
}
