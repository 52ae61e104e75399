mod betfair;

pub use betfair::BetfairClient;

use crate::domain::Side;
use crate::error::Error;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub const BETFAIR: &str = "betfair";

#[derive(Debug, Clone, Copy)]
pub struct Account {
    pub balance: f64,
    pub exposure: f64,
    pub exposure_limit: f64,
}

/// A single fill-or-kill limit order to submit to the exchange.
#[derive(Debug, Clone)]
pub struct OrderTicket {
    pub market_id: String,
    pub runner_id: u64,
    pub price: f64,
    pub stake: f64,
    pub side: Side,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub exchange: String,
    pub reference: String,
    pub placed_at: String,
}

#[async_trait]
pub trait ExchangeClient: Send + Sync + std::fmt::Debug {
    async fn account(&self) -> Result<Account, Error>;
    async fn place_order(&self, order: &OrderTicket) -> Result<PlacedOrder, Error>;
}

/// Builds a credentialed exchange client for a named backend. Only `betfair`
/// is supported; unknown tags fail with InvalidExchange.
pub trait ClientFactory: Send + Sync {
    fn create(
        &self,
        exchange: &str,
        username: &str,
        password: &str,
        key: &str,
    ) -> Result<Arc<dyn ExchangeClient>, Error>;
}

pub struct ExchangeClientFactory {
    http: reqwest::Client,
}

impl ExchangeClientFactory {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self { http }
    }
}

impl Default for ExchangeClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory for ExchangeClientFactory {
    fn create(
        &self,
        exchange: &str,
        username: &str,
        password: &str,
        key: &str,
    ) -> Result<Arc<dyn ExchangeClient>, Error> {
        if exchange != BETFAIR {
            return Err(Error::InvalidExchange(exchange.to_string()));
        }

        Ok(Arc::new(BetfairClient::new(
            self.http.clone(),
            username.to_string(),
            password.to_string(),
            key.to_string(),
        )))
    }
}
