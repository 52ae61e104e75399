use super::{BuilderQuery, StrategyTrade};
use crate::classify::{FilterMatcher, MatcherQuery, ResultParser};
use crate::data::{MarketClient, MarketRunner, MarketRunnerRequest};
use crate::error::Error;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::error;

/// Number of concurrent workers draining the market-runner stream. Bounded so
/// the fan-out against the data services stays predictable.
const WORKERS: usize = 6;

const OUTPUT_BUFFER: usize = 1000;

/// Historical pipeline: sweeps the odds warehouse for market runners matching
/// the query coordinates, evaluates the query's filters against each fixture
/// and settles the survivors into a stream of trades.
pub struct StrategyBuilder {
    matcher: Arc<dyn FilterMatcher>,
    parser: Arc<dyn ResultParser>,
    markets: Arc<dyn MarketClient>,
}

impl StrategyBuilder {
    pub fn new(
        matcher: Arc<dyn FilterMatcher>,
        parser: Arc<dyn ResultParser>,
        markets: Arc<dyn MarketClient>,
    ) -> Self {
        Self {
            matcher,
            parser,
            markets,
        }
    }

    /// Emitted order is unspecified; workers race. Dropping the receiver
    /// stops outstanding work promptly. Per-market failures are logged and
    /// dropped, the stream itself always runs to completion.
    pub fn build(&self, query: BuilderQuery) -> mpsc::Receiver<StrategyTrade> {
        let (tx, rx) = mpsc::channel(OUTPUT_BUFFER);

        let matcher = self.matcher.clone();
        let parser = self.parser.clone();
        let markets = self.markets.clone();

        tokio::spawn(run(matcher, parser, markets, query, tx));

        rx
    }
}

async fn run(
    matcher: Arc<dyn FilterMatcher>,
    parser: Arc<dyn ResultParser>,
    markets: Arc<dyn MarketClient>,
    query: BuilderQuery,
    out: mpsc::Sender<StrategyTrade>,
) {
    let (runners, upstream_err) = markets.market_runner_search(market_request(&query));

    let runners = Arc::new(Mutex::new(runners));
    let query = Arc::new(query);

    let mut workers = Vec::with_capacity(WORKERS);

    for _ in 0..WORKERS {
        workers.push(tokio::spawn(worker(
            runners.clone(),
            matcher.clone(),
            parser.clone(),
            query.clone(),
            out.clone(),
        )));
    }

    drop(out);

    for worker in workers {
        let _ = worker.await;
    }

    // The warehouse client parks at most one error here; drain it once the
    // stream has closed.
    if let Ok(err) = upstream_err.await {
        error!("error fetching market runners from odds warehouse: {}", err);
    }
}

async fn worker(
    runners: Arc<Mutex<mpsc::Receiver<MarketRunner>>>,
    matcher: Arc<dyn FilterMatcher>,
    parser: Arc<dyn ResultParser>,
    query: Arc<BuilderQuery>,
    out: mpsc::Sender<StrategyTrade>,
) {
    loop {
        let runner = { runners.lock().await.recv().await };

        let Some(runner) = runner else {
            break;
        };

        if !handle_market(&runner, &query, matcher.as_ref(), parser.as_ref(), &out).await {
            break;
        }
    }
}

/// Returns false when the output channel has closed and the worker should
/// stop picking up new markets.
async fn handle_market(
    runner: &MarketRunner,
    query: &BuilderQuery,
    matcher: &dyn FilterMatcher,
    parser: &dyn ResultParser,
    out: &mpsc::Sender<StrategyTrade>,
) -> bool {
    let matcher_query = MatcherQuery {
        event_id: runner.event_id,
        result_filters: query.result_filters.clone(),
        stat_filters: query.stat_filters.clone(),
    };

    let matches = match matcher.matches_filters(&matcher_query).await {
        Ok(matches) => matches,
        Err(e) => {
            log_market_error(runner, &e);
            return true;
        }
    };

    if !matches {
        return true;
    }

    let result = match parser
        .parse(
            runner.event_id,
            &runner.market_name,
            &runner.runner_name,
            query.side,
        )
        .await
    {
        Ok(result) => result,
        Err(e) => {
            log_market_error(runner, &e);
            return true;
        }
    };

    let trade = StrategyTrade {
        market_name: runner.market_name.clone(),
        runner_name: runner.runner_name.clone(),
        price: runner.price,
        event_id: runner.event_id,
        competition_id: runner.competition_id,
        season_id: runner.season_id,
        event_date: runner.event_date,
        exchange: runner.exchange.clone(),
        side: query.side,
        result,
    };

    out.send(trade).await.is_ok()
}

fn log_market_error(runner: &MarketRunner, e: &Error) {
    error!(
        "error handling trade for market {}, runner {} and event {}: {}",
        runner.market_name, runner.runner_name, runner.event_id, e
    );
}

fn market_request(query: &BuilderQuery) -> MarketRunnerRequest {
    MarketRunnerRequest {
        market: query.market.clone(),
        runner: query.runner.clone(),
        line: query.line.clone(),
        side: query.side,
        min_odds: query.min_odds,
        max_odds: query.max_odds,
        competition_ids: query.competition_ids.clone(),
        season_ids: query.season_ids.clone(),
    }
}
