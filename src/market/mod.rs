mod handler;

pub use handler::MarketHandler;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live market payload delivered by the inbound queue: one event with its
/// runners and their price ladders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMarket {
    pub id: String,
    pub event_id: u64,
    pub name: String,
    pub competition_id: u64,
    pub season_id: u64,
    #[serde(rename = "date")]
    pub event_date: DateTime<Utc>,
    pub exchange: String,
    pub runners: Vec<Runner>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runner {
    pub id: u64,
    pub name: String,
    pub sort: i8,
    #[serde(default)]
    pub back_prices: Vec<PriceSize>,
    #[serde(default)]
    pub lay_prices: Vec<PriceSize>,
}

/// Prices are sorted best-first; element 0 is the best available price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSize {
    pub price: f64,
    pub size: f64,
}
