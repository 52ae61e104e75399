use super::MarketQueue;
use crate::market::EventMarket;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Development driver: pretends to poll and yields nothing.
pub struct LogMarketQueue;

#[async_trait]
impl MarketQueue for LogMarketQueue {
    async fn receive(&self) -> Vec<EventMarket> {
        info!("pretending to poll for event markets from queue...");

        tokio::time::sleep(Duration::from_secs(10)).await;

        info!("..polling complete");

        vec![]
    }
}
