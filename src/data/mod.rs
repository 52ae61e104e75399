pub mod http;

use crate::domain::{Side, Venue};
use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, Deserialize)]
pub struct TeamSummary {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonSummary {
    pub id: u64,
}

/// A scheduled match as returned by the fixture service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureDetail {
    pub id: u64,
    pub home_team: TeamSummary,
    pub away_team: TeamSummary,
    pub season: SeasonSummary,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub goals: Option<u32>,
    pub shots_on_goal: Option<u32>,
}

/// A completed match as returned by the result service. Score and per-team
/// stats are sparse upstream, hence the options.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: u64,
    pub home_team: TeamSummary,
    pub away_team: TeamSummary,
    pub stats: Option<MatchScore>,
    pub home_team_stats: Option<TeamStats>,
    pub away_team_stats: Option<TeamStats>,
}

/// Window of historical results for one team: the last `limit` matches played
/// strictly before `date_before`, restricted by season and venue.
#[derive(Debug, Clone)]
pub struct TeamResultRequest {
    pub team_id: u64,
    pub limit: u8,
    pub date_before: DateTime<Utc>,
    pub season_ids: Vec<u64>,
    pub venue: Venue,
}

#[async_trait]
pub trait FixtureClient: Send + Sync {
    async fn by_id(&self, fixture_id: u64) -> Result<FixtureDetail, Error>;
}

#[async_trait]
pub trait ResultClient: Send + Sync {
    async fn by_id(&self, fixture_id: u64) -> Result<MatchResult, Error>;
    async fn by_team(&self, req: &TeamResultRequest) -> Result<Vec<MatchResult>, Error>;
}

/// A priced runner in a historical market, as streamed by the odds warehouse.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRunner {
    pub market_id: String,
    pub market_name: String,
    pub runner_id: u64,
    pub runner_name: String,
    pub event_id: u64,
    pub competition_id: u64,
    pub season_id: u64,
    pub event_date: DateTime<Utc>,
    pub exchange: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRunnerRequest {
    pub market: String,
    pub runner: String,
    pub line: String,
    pub side: Side,
    pub min_odds: Option<f64>,
    pub max_odds: Option<f64>,
    pub competition_ids: Vec<u64>,
    pub season_ids: Vec<u64>,
}

/// Client for the historical odds warehouse. The search yields a lazy stream
/// of market runners plus a slot carrying at most one upstream error, drained
/// by the consumer after the stream closes.
pub trait MarketClient: Send + Sync {
    fn market_runner_search(
        &self,
        req: MarketRunnerRequest,
    ) -> (mpsc::Receiver<MarketRunner>, oneshot::Receiver<Error>);
}
