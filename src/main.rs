mod api;
mod classify;
mod clock;
mod config;
mod data;
mod domain;
mod error;
mod exchange;
mod market;
mod queue;
mod strategy;
mod trade;
mod users;

use api::AppState;
use classify::{
    DataFilterMatcher, DataResultParser, FilterMatcher, ResultFilterClassifier, ResultParser,
    StatFilterClassifier,
};
use clock::{Clock, SystemClock};
use config::Config;
use data::http::{DataServiceClient, OddsWarehouseClient};
use data::{FixtureClient, MarketClient, ResultClient};
use exchange::{ClientFactory, ExchangeClientFactory};
use market::MarketHandler;
use queue::{LogMarketQueue, MarketQueue, SqsMarketQueue};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use strategy::{
    Finder, PostgresStrategyReader, PostgresStrategyWriter, StrategyBuilder, StrategyFinder,
    StrategyReader,
};
use trade::{
    ExchangeTradeManager, PostgresTradeReader, PostgresTradeWriter, TradeManager, TradePlacer,
    TradeReader, TradeWriter,
};
use tracing::{info, warn};
use users::{ConfigUserService, User, UserService};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    dotenvy::dotenv().ok();

    info!("🚀 Starting trade engine...");

    let config = Config::from_env();
    info!("📋 Configuration loaded");

    info!("🔌 Connecting to Postgres...");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;
    info!("✅ Connected to Postgres");

    // Outbound data services.
    let data_client = Arc::new(DataServiceClient::new(config.data_service_url.clone()));
    let fixtures: Arc<dyn FixtureClient> = data_client.clone();
    let results: Arc<dyn ResultClient> = data_client;
    let warehouse: Arc<dyn MarketClient> =
        Arc::new(OddsWarehouseClient::new(config.odds_warehouse_url.clone()));

    // Filter evaluation and settlement.
    let matcher: Arc<dyn FilterMatcher> = Arc::new(DataFilterMatcher::new(
        fixtures,
        ResultFilterClassifier::new(results.clone()),
        StatFilterClassifier::new(results.clone()),
    ));
    let parser: Arc<dyn ResultParser> = Arc::new(DataResultParser::new(results));

    // Stores.
    let strategy_reader: Arc<dyn StrategyReader> =
        Arc::new(PostgresStrategyReader::new(pool.clone()));
    let strategy_writer = Arc::new(PostgresStrategyWriter::new(pool.clone()));
    let trade_reader: Arc<dyn TradeReader> = Arc::new(PostgresTradeReader::new(pool.clone()));
    let trade_writer: Arc<dyn TradeWriter> = Arc::new(PostgresTradeWriter::new(pool.clone()));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Live placement path.
    let placer = TradePlacer::new(trade_reader, trade_writer, clock.clone());
    let users: Arc<dyn UserService> = Arc::new(ConfigUserService::new(configured_user(&config)));
    let factory: Arc<dyn ClientFactory> = Arc::new(ExchangeClientFactory::new());
    let manager: Arc<dyn TradeManager> =
        Arc::new(ExchangeTradeManager::new(users, factory, placer));
    let finder: Arc<dyn Finder> = Arc::new(StrategyFinder::new(
        strategy_reader.clone(),
        matcher.clone(),
    ));
    let handler = Arc::new(MarketHandler::new(finder, manager));

    // Inbound queue consumer.
    let market_queue = build_market_queue(&config).await;
    info!("📡 Starting market consumer ({} driver)...", config.queue_driver);
    tokio::spawn(consume_event_markets(market_queue, handler));

    // Historical builder + API surface.
    let builder = Arc::new(StrategyBuilder::new(matcher, parser, warehouse));
    let state = Arc::new(AppState {
        reader: strategy_reader,
        writer: strategy_writer,
        builder,
        clock,
    });

    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("🌐 API server starting on {}", addr);
    info!("✅ Trade engine is ready!");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn configured_user(config: &Config) -> User {
    let id = Uuid::parse_str(&config.user.id).unwrap_or_else(|_| {
        warn!("USER_ID is missing or invalid; live placements will find no owner");
        Uuid::nil()
    });

    User {
        id,
        email: config.user.email.clone(),
        betfair_username: config.user.betfair_username.clone(),
        betfair_password: config.user.betfair_password.clone(),
        betfair_key: config.user.betfair_key.clone(),
    }
}

async fn build_market_queue(config: &Config) -> Arc<dyn MarketQueue> {
    match config.queue_driver.as_str() {
        "aws" => {
            let aws_config =
                aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

            Arc::new(SqsMarketQueue::new(
                aws_sdk_sqs::Client::new(&aws_config),
                config.queue_url.clone(),
            ))
        }
        "log" => Arc::new(LogMarketQueue),
        other => {
            warn!("unknown queue driver '{}', falling back to log", other);
            Arc::new(LogMarketQueue)
        }
    }
}

async fn consume_event_markets(queue: Arc<dyn MarketQueue>, handler: Arc<MarketHandler>) {
    loop {
        for event in queue.receive().await {
            handler.handle_event_market(&event).await;
        }
    }
}
