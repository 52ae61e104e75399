mod builder;
mod finder;
mod postgres;

pub use builder::StrategyBuilder;
pub use finder::{Finder, StrategyFinder};
pub use postgres::{PostgresStrategyReader, PostgresStrategyWriter};

use crate::domain::{
    OrderBy, ResultFilter, Side, StatFilter, Strategy, StrategyStatus, TradeResult, Visibility,
};
use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[async_trait]
pub trait StrategyReader: Send + Sync {
    async fn get(&self, query: &ReaderQuery) -> Result<Vec<Strategy>, Error>;
}

#[async_trait]
pub trait StrategyWriter: Send + Sync {
    async fn insert(&self, strategy: &Strategy) -> Result<(), Error>;
}

/// Optional selectors, AND-combined. Absent odds bounds on a strategy are
/// treated as unbounded when matching against `price`.
#[derive(Debug, Clone, Default)]
pub struct ReaderQuery {
    pub user_id: Option<Uuid>,
    pub market: Option<String>,
    pub runner: Option<String>,
    pub price: Option<f64>,
    pub competition_id: Option<u64>,
    pub side: Option<Side>,
    pub status: Option<StrategyStatus>,
    pub visibility: Option<Visibility>,
    pub order_by: Option<OrderBy>,
}

/// Historical build request: the market coordinates to sweep plus the filters
/// every candidate fixture must satisfy.
#[derive(Debug, Clone)]
pub struct BuilderQuery {
    pub market: String,
    pub runner: String,
    pub line: String,
    pub side: Side,
    pub min_odds: Option<f64>,
    pub max_odds: Option<f64>,
    pub competition_ids: Vec<u64>,
    pub season_ids: Vec<u64>,
    pub result_filters: Vec<ResultFilter>,
    pub stat_filters: Vec<StatFilter>,
}

/// Live lookup for strategies interested in one runner price.
#[derive(Debug, Clone)]
pub struct FinderQuery {
    pub market_name: String,
    pub runner_name: String,
    pub event_id: u64,
    pub competition_id: u64,
    pub price: f64,
    pub side: Side,
    pub status: StrategyStatus,
}

/// A settled historical trade emitted by the builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyTrade {
    pub market_name: String,
    pub runner_name: String,
    pub price: f64,
    pub event_id: u64,
    pub competition_id: u64,
    pub season_id: u64,
    pub event_date: DateTime<Utc>,
    pub exchange: String,
    pub side: Side,
    pub result: TradeResult,
}
