use super::result::match_score;
use crate::data::ResultClient;
use crate::domain::{
    Side, TradeResult, MATCH_ODDS, OVER_UNDER_05, OVER_UNDER_15, OVER_UNDER_25, OVER_UNDER_35,
    OVER_UNDER_45, RUNNER_AWAY, RUNNER_DRAW, RUNNER_HOME,
};
use crate::error::Error;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ResultParser: Send + Sync {
    /// Settles a market runner against the final score of the event, from the
    /// perspective of `side`.
    async fn parse(
        &self,
        event_id: u64,
        market: &str,
        runner: &str,
        side: Side,
    ) -> Result<TradeResult, Error>;
}

pub struct DataResultParser {
    results: Arc<dyn ResultClient>,
}

impl DataResultParser {
    pub fn new(results: Arc<dyn ResultClient>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl ResultParser for DataResultParser {
    async fn parse(
        &self,
        event_id: u64,
        market: &str,
        runner: &str,
        side: Side,
    ) -> Result<TradeResult, Error> {
        let result = self.results.by_id(event_id).await?;
        let (home, away) = match_score(&result)?;

        let outcome = parse_market_result(market, runner, home, away)?;

        Ok(transform_for_side(side, outcome))
    }
}

fn parse_market_result(
    market: &str,
    runner: &str,
    home: u32,
    away: u32,
) -> Result<TradeResult, Error> {
    match market {
        MATCH_ODDS => match_odds_result(market, runner, home, away),
        OVER_UNDER_05 => over_under_result(market, runner, home + away, 0),
        OVER_UNDER_15 => over_under_result(market, runner, home + away, 1),
        OVER_UNDER_25 => over_under_result(market, runner, home + away, 2),
        OVER_UNDER_35 => over_under_result(market, runner, home + away, 3),
        OVER_UNDER_45 => over_under_result(market, runner, home + away, 4),
        other => Err(Error::InvalidArgument(format!(
            "market {} is not supported",
            other
        ))),
    }
}

fn match_odds_result(market: &str, runner: &str, home: u32, away: u32) -> Result<TradeResult, Error> {
    let won = match runner {
        RUNNER_HOME => home > away,
        RUNNER_AWAY => away > home,
        RUNNER_DRAW => home == away,
        _ => return Err(runner_error(market, runner)),
    };

    Ok(settle(won))
}

fn over_under_result(
    market: &str,
    runner: &str,
    total: u32,
    goals: u32,
) -> Result<TradeResult, Error> {
    if runner.starts_with("Over") {
        return Ok(settle(total > goals));
    }

    if runner.starts_with("Under") {
        return Ok(settle(total <= goals));
    }

    Err(runner_error(market, runner))
}

fn settle(won: bool) -> TradeResult {
    if won {
        TradeResult::Success
    } else {
        TradeResult::Fail
    }
}

fn transform_for_side(side: Side, result: TradeResult) -> TradeResult {
    match side {
        Side::Back => result,
        Side::Lay => result.invert(),
    }
}

fn runner_error(market: &str, runner: &str) -> Error {
    Error::InvalidArgument(format!(
        "runner {} is not supported for market {}",
        runner, market
    ))
}
