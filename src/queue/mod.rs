mod aws;
mod log;

pub use aws::SqsMarketQueue;
pub use log::LogMarketQueue;

use crate::market::EventMarket;
use async_trait::async_trait;

/// Pull-based source of live event markets. One `receive` call is one poll
/// cycle; transport failures are logged inside the driver and yield an empty
/// batch so the consumer loop never dies.
#[async_trait]
pub trait MarketQueue: Send + Sync {
    async fn receive(&self) -> Vec<EventMarket>;
}
