mod manager;
mod placer;
mod postgres;

pub use manager::{ExchangeTradeManager, TradeManager};
pub use placer::TradePlacer;
pub use postgres::{PostgresTradeReader, PostgresTradeWriter};

use crate::domain::{Side, Trade, TradeResult};
use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Market coordinates plus the best available price on one side, as handed to
/// the live placement path.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub market_id: String,
    pub market_name: String,
    pub runner_id: u64,
    pub runner_name: String,
    pub event_id: u64,
    pub competition_id: u64,
    pub season_id: u64,
    pub event_date: DateTime<Utc>,
    pub exchange: String,
    pub price: TicketPrice,
}

#[derive(Debug, Clone, Copy)]
pub struct TicketPrice {
    pub value: f64,
    pub size: f64,
    pub side: Side,
}

#[derive(Debug, Clone, Default)]
pub struct TradeQuery {
    pub strategy_id: Uuid,
    pub results: Vec<TradeResult>,
}

#[async_trait]
pub trait TradeReader: Send + Sync {
    async fn get(&self, query: &TradeQuery) -> Result<Vec<Trade>, Error>;

    async fn exists(
        &self,
        market: &str,
        runner: &str,
        event_id: u64,
        strategy_id: Uuid,
    ) -> Result<bool, Error>;
}

#[async_trait]
pub trait TradeWriter: Send + Sync {
    async fn insert(&self, trade: &Trade) -> Result<(), Error>;
}
