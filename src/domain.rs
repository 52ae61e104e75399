use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub const MATCH_ODDS: &str = "MATCH_ODDS";
pub const OVER_UNDER_05: &str = "OVER_UNDER_05";
pub const OVER_UNDER_15: &str = "OVER_UNDER_15";
pub const OVER_UNDER_25: &str = "OVER_UNDER_25";
pub const OVER_UNDER_35: &str = "OVER_UNDER_35";
pub const OVER_UNDER_45: &str = "OVER_UNDER_45";

pub const RUNNER_HOME: &str = "Home";
pub const RUNNER_AWAY: &str = "Away";
pub const RUNNER_DRAW: &str = "Draw";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Back,
    Lay,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Back => "BACK",
            Side::Lay => "LAY",
        }
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "BACK" => Ok(Side::Back),
            "LAY" => Ok(Side::Lay),
            other => Err(Error::InvalidArgument(format!(
                "side '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
        }
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "PUBLIC" => Ok(Visibility::Public),
            "PRIVATE" => Ok(Visibility::Private),
            other => Err(Error::InvalidArgument(format!(
                "visibility '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyStatus {
    Active,
    Archived,
}

impl StrategyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyStatus::Active => "ACTIVE",
            StrategyStatus::Archived => "ARCHIVED",
        }
    }
}

impl FromStr for StrategyStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "ACTIVE" => Ok(StrategyStatus::Active),
            "ARCHIVED" => Ok(StrategyStatus::Archived),
            other => Err(Error::InvalidArgument(format!(
                "status '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeResult {
    InPlay,
    Success,
    Fail,
}

impl TradeResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeResult::InPlay => "IN_PLAY",
            TradeResult::Success => "SUCCESS",
            TradeResult::Fail => "FAIL",
        }
    }

    /// LAY settlement is the logical negation of the BACK settlement.
    pub fn invert(self) -> TradeResult {
        match self {
            TradeResult::Success => TradeResult::Fail,
            TradeResult::Fail => TradeResult::Success,
            TradeResult::InPlay => TradeResult::InPlay,
        }
    }
}

impl FromStr for TradeResult {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "IN_PLAY" => Ok(TradeResult::InPlay),
            "SUCCESS" => Ok(TradeResult::Success),
            "FAIL" => Ok(TradeResult::Fail),
            other => Err(Error::InvalidArgument(format!(
                "trade result '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterTeam {
    HomeTeam,
    AwayTeam,
}

impl FilterTeam {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterTeam::HomeTeam => "HOME_TEAM",
            FilterTeam::AwayTeam => "AWAY_TEAM",
        }
    }
}

impl FromStr for FilterTeam {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "HOME_TEAM" => Ok(FilterTeam::HomeTeam),
            "AWAY_TEAM" => Ok(FilterTeam::AwayTeam),
            other => Err(Error::InvalidArgument(format!(
                "team '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Venue {
    Home,
    Away,
    HomeAway,
}

impl Venue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Home => "HOME",
            Venue::Away => "AWAY",
            Venue::HomeAway => "HOME_AWAY",
        }
    }
}

impl FromStr for Venue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "HOME" => Ok(Venue::Home),
            "AWAY" => Ok(Venue::Away),
            "HOME_AWAY" => Ok(Venue::HomeAway),
            other => Err(Error::InvalidArgument(format!(
                "venue '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultType {
    Win,
    Lose,
    Draw,
    WinDraw,
    LoseDraw,
    WinLose,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Win => "WIN",
            ResultType::Lose => "LOSE",
            ResultType::Draw => "DRAW",
            ResultType::WinDraw => "WIN_DRAW",
            ResultType::LoseDraw => "LOSE_DRAW",
            ResultType::WinLose => "WIN_LOSE",
        }
    }
}

impl FromStr for ResultType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "WIN" => Ok(ResultType::Win),
            "LOSE" => Ok(ResultType::Lose),
            "DRAW" => Ok(ResultType::Draw),
            "WIN_DRAW" => Ok(ResultType::WinDraw),
            "LOSE_DRAW" => Ok(ResultType::LoseDraw),
            "WIN_LOSE" => Ok(ResultType::WinLose),
            other => Err(Error::InvalidArgument(format!(
                "result '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatType {
    Goals,
    ShotsOnGoal,
}

impl StatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatType::Goals => "GOALS",
            StatType::ShotsOnGoal => "SHOTS_ON_GOAL",
        }
    }
}

impl FromStr for StatType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "GOALS" => Ok(StatType::Goals),
            "SHOTS_ON_GOAL" => Ok(StatType::ShotsOnGoal),
            other => Err(Error::InvalidArgument(format!(
                "stat '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatAction {
    For,
    Against,
}

impl StatAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatAction::For => "FOR",
            StatAction::Against => "AGAINST",
        }
    }
}

impl FromStr for StatAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "FOR" => Ok(StatAction::For),
            "AGAINST" => Ok(StatAction::Against),
            other => Err(Error::InvalidArgument(format!(
                "action '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatMeasure {
    Total,
    Average,
    Continuous,
}

impl StatMeasure {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatMeasure::Total => "TOTAL",
            StatMeasure::Average => "AVERAGE",
            StatMeasure::Continuous => "CONTINUOUS",
        }
    }
}

impl FromStr for StatMeasure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "TOTAL" => Ok(StatMeasure::Total),
            "AVERAGE" => Ok(StatMeasure::Average),
            "CONTINUOUS" => Ok(StatMeasure::Continuous),
            other => Err(Error::InvalidArgument(format!(
                "measure '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatMetric {
    Gte,
    Lte,
}

impl StatMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatMetric::Gte => "GTE",
            StatMetric::Lte => "LTE",
        }
    }

    pub fn compare(&self, left: f64, right: f64) -> bool {
        match self {
            StatMetric::Gte => left >= right,
            StatMetric::Lte => left <= right,
        }
    }
}

impl FromStr for StatMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "GTE" => Ok(StatMetric::Gte),
            "LTE" => Ok(StatMetric::Lte),
            other => Err(Error::InvalidArgument(format!(
                "metric '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StakingPlanName {
    Percentage,
}

impl StakingPlanName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StakingPlanName::Percentage => "PERCENTAGE",
        }
    }
}

impl FromStr for StakingPlanName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "PERCENTAGE" => Ok(StakingPlanName::Percentage),
            other => Err(Error::InvalidArgument(format!(
                "staking plan '{}' is not supported",
                other
            ))),
        }
    }
}

/// Tagged staking plan record; persisted as a JSONB blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StakingPlan {
    pub name: StakingPlanName,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    NameAsc,
    NameDesc,
    CreatedAtAsc,
    CreatedAtDesc,
}

impl FromStr for OrderBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "name_asc" => Ok(OrderBy::NameAsc),
            "name_desc" => Ok(OrderBy::NameDesc),
            "created_at_asc" => Ok(OrderBy::CreatedAtAsc),
            "created_at_desc" => Ok(OrderBy::CreatedAtDesc),
            other => Err(Error::InvalidArgument(format!(
                "order by '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFilter {
    pub team: FilterTeam,
    pub result: ResultType,
    pub games: u8,
    pub venue: Venue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatFilter {
    pub stat: StatType,
    pub team: FilterTeam,
    pub action: StatAction,
    pub games: u8,
    pub measure: StatMeasure,
    pub metric: StatMetric,
    pub value: f64,
    pub venue: Venue,
}

/// A declarative trading rule owned by a user. Immutable after creation
/// except `status` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub user_id: Uuid,
    #[serde(rename = "market")]
    pub market_name: String,
    #[serde(rename = "runner")]
    pub runner_name: String,
    pub min_odds: Option<f64>,
    pub max_odds: Option<f64>,
    pub competition_ids: Vec<u64>,
    pub side: Side,
    pub visibility: Visibility,
    pub status: StrategyStatus,
    pub staking_plan: StakingPlan,
    pub result_filters: Vec<ResultFilter>,
    pub stat_filters: Vec<StatFilter>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A placed order, immutable once written. At most one trade exists per
/// (strategy_id, market, runner, event_id) tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub exchange: String,
    pub exchange_ref: String,
    pub market: String,
    pub runner: String,
    pub price: f64,
    pub stake: f64,
    pub event_id: u64,
    pub event_date: DateTime<Utc>,
    pub side: Side,
    pub result: TradeResult,
    pub timestamp: DateTime<Utc>,
}
