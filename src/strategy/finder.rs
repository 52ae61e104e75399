use super::{FinderQuery, ReaderQuery, StrategyReader};
use crate::classify::{FilterMatcher, MatcherQuery};
use crate::domain::Strategy;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

const OUTPUT_BUFFER: usize = 100;

pub trait Finder: Send + Sync {
    /// Streams strategies registered against the queried market coordinates
    /// whose filters also match the event's fixture. Strategies that fail the
    /// matcher, or whose evaluation errors, are skipped.
    fn find_matching_strategies(&self, query: FinderQuery) -> mpsc::Receiver<Strategy>;
}

pub struct StrategyFinder {
    reader: Arc<dyn StrategyReader>,
    matcher: Arc<dyn FilterMatcher>,
}

impl StrategyFinder {
    pub fn new(reader: Arc<dyn StrategyReader>, matcher: Arc<dyn FilterMatcher>) -> Self {
        Self { reader, matcher }
    }
}

impl Finder for StrategyFinder {
    fn find_matching_strategies(&self, query: FinderQuery) -> mpsc::Receiver<Strategy> {
        let (tx, rx) = mpsc::channel(OUTPUT_BUFFER);

        let reader = self.reader.clone();
        let matcher = self.matcher.clone();

        tokio::spawn(find_strategies(reader, matcher, query, tx));

        rx
    }
}

async fn find_strategies(
    reader: Arc<dyn StrategyReader>,
    matcher: Arc<dyn FilterMatcher>,
    query: FinderQuery,
    out: mpsc::Sender<Strategy>,
) {
    let reader_query = ReaderQuery {
        market: Some(query.market_name.clone()),
        runner: Some(query.runner_name.clone()),
        price: Some(query.price),
        competition_id: Some(query.competition_id),
        side: Some(query.side),
        status: Some(query.status),
        ..Default::default()
    };

    let strategies = match reader.get(&reader_query).await {
        Ok(strategies) => strategies,
        Err(e) => {
            error!("error fetching matching strategies: {}", e);
            return;
        }
    };

    for strategy in strategies {
        let matcher_query = MatcherQuery {
            event_id: query.event_id,
            result_filters: strategy.result_filters.clone(),
            stat_filters: strategy.stat_filters.clone(),
        };

        match matcher.matches_filters(&matcher_query).await {
            Ok(true) => {
                if out.send(strategy).await.is_err() {
                    return;
                }
            }
            Ok(false) => {}
            Err(e) => {
                error!("error matching strategy {}: {}", strategy.id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Side, StakingPlan, StakingPlanName, StrategyStatus, Visibility,
    };
    use crate::error::Error;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    struct StubReader {
        strategies: Vec<Strategy>,
    }

    #[async_trait]
    impl StrategyReader for StubReader {
        async fn get(&self, _query: &ReaderQuery) -> Result<Vec<Strategy>, Error> {
            Ok(self.strategies.clone())
        }
    }

    struct FailingReader;

    #[async_trait]
    impl StrategyReader for FailingReader {
        async fn get(&self, _query: &ReaderQuery) -> Result<Vec<Strategy>, Error> {
            Err(Error::Database(sqlx::Error::PoolTimedOut))
        }
    }

    /// Accepts strategies with an even number of result filters, errors when
    /// asked about exactly three.
    struct CountingMatcher;

    #[async_trait]
    impl FilterMatcher for CountingMatcher {
        async fn matches_filters(&self, query: &MatcherQuery) -> Result<bool, Error> {
            if query.result_filters.len() == 3 {
                return Err(Error::FixtureLookup("fixture unreachable".to_string()));
            }

            Ok(query.result_filters.len() % 2 == 0)
        }
    }

    fn strategy(name: &str, result_filters: usize) -> Strategy {
        use crate::domain::{FilterTeam, ResultFilter, ResultType, Venue};

        Strategy {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            user_id: Uuid::new_v4(),
            market_name: "MATCH_ODDS".to_string(),
            runner_name: "Home".to_string(),
            min_odds: Some(1.5),
            max_odds: None,
            competition_ids: vec![8],
            side: Side::Back,
            visibility: Visibility::Private,
            status: StrategyStatus::Active,
            staking_plan: StakingPlan {
                name: StakingPlanName::Percentage,
                value: 2.5,
            },
            result_filters: vec![
                ResultFilter {
                    team: FilterTeam::HomeTeam,
                    result: ResultType::Win,
                    games: 3,
                    venue: Venue::Home,
                };
                result_filters
            ],
            stat_filters: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn finder_query() -> FinderQuery {
        FinderQuery {
            market_name: "MATCH_ODDS".to_string(),
            runner_name: "Home".to_string(),
            event_id: 1234,
            competition_id: 8,
            price: 1.95,
            side: Side::Back,
            status: StrategyStatus::Active,
        }
    }

    #[tokio::test]
    async fn streams_strategies_whose_filters_match() {
        let finder = StrategyFinder::new(
            Arc::new(StubReader {
                strategies: vec![strategy("matching", 2), strategy("failing", 1)],
            }),
            Arc::new(CountingMatcher),
        );

        let mut rx = finder.find_matching_strategies(finder_query());

        let mut names = Vec::new();
        while let Some(s) = rx.recv().await {
            names.push(s.name);
        }

        assert_eq!(names, vec!["matching".to_string()]);
    }

    #[tokio::test]
    async fn matcher_errors_skip_the_strategy_but_not_the_stream() {
        let finder = StrategyFinder::new(
            Arc::new(StubReader {
                strategies: vec![strategy("erroring", 3), strategy("matching", 2)],
            }),
            Arc::new(CountingMatcher),
        );

        let mut rx = finder.find_matching_strategies(finder_query());

        let mut names = Vec::new();
        while let Some(s) = rx.recv().await {
            names.push(s.name);
        }

        assert_eq!(names, vec!["matching".to_string()]);
    }

    #[tokio::test]
    async fn reader_failure_closes_the_stream_empty() {
        let finder = StrategyFinder::new(Arc::new(FailingReader), Arc::new(CountingMatcher));

        let mut rx = finder.find_matching_strategies(finder_query());
        assert!(rx.recv().await.is_none());
    }
}
