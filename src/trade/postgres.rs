use super::{TradeQuery, TradeReader, TradeWriter};
use crate::domain::Trade;
use crate::error::{is_unique_violation, Error};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

pub struct PostgresTradeReader {
    pool: PgPool,
}

impl PostgresTradeReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TradeReader for PostgresTradeReader {
    async fn get(&self, query: &TradeQuery) -> Result<Vec<Trade>, Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, strategy_id, exchange, exchange_ref, market, runner, price, stake, \
             event_id, event_date, side, result, timestamp FROM trade WHERE strategy_id = ",
        );

        builder.push_bind(query.strategy_id);

        if !query.results.is_empty() {
            let results: Vec<String> = query
                .results
                .iter()
                .map(|r| r.as_str().to_string())
                .collect();

            builder.push(" AND result = ANY(").push_bind(results).push(")");
        }

        let rows = builder.build().fetch_all(&self.pool).await?;

        let mut trades = Vec::with_capacity(rows.len());

        for row in rows {
            trades.push(trade_from_row(&row)?);
        }

        Ok(trades)
    }

    async fn exists(
        &self,
        market: &str,
        runner: &str,
        event_id: u64,
        strategy_id: Uuid,
    ) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT id FROM trade WHERE market = $1 AND runner = $2 AND \
             event_id = $3 AND strategy_id = $4)",
        )
        .bind(market)
        .bind(runner)
        .bind(event_id as i64)
        .bind(strategy_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

pub struct PostgresTradeWriter {
    pool: PgPool,
}

impl PostgresTradeWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TradeWriter for PostgresTradeWriter {
    async fn insert(&self, trade: &Trade) -> Result<(), Error> {
        let result = sqlx::query(
            "INSERT INTO trade (id, strategy_id, exchange, exchange_ref, market, runner, price, \
             stake, event_id, event_date, side, result, timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(trade.id)
        .bind(trade.strategy_id)
        .bind(&trade.exchange)
        .bind(&trade.exchange_ref)
        .bind(&trade.market)
        .bind(&trade.runner)
        .bind(trade.price)
        .bind(trade.stake)
        .bind(trade.event_id as i64)
        .bind(trade.event_date.timestamp())
        .bind(trade.side.as_str())
        .bind(trade.result.as_str())
        .bind(trade.timestamp.timestamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // A racing writer beat us to the tuple; surface the same error
            // the pre-check raises so callers treat both paths identically.
            Err(e) if is_unique_violation(&e) => Err(Error::Duplication(format!(
                "trade exists for market {}, runner {}, event {} and strategy {}",
                trade.market, trade.runner, trade.event_id, trade.strategy_id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

fn trade_from_row(row: &PgRow) -> Result<Trade, Error> {
    let event_id: i64 = row.try_get("event_id")?;
    let event_date: i64 = row.try_get("event_date")?;
    let timestamp: i64 = row.try_get("timestamp")?;

    Ok(Trade {
        id: row.try_get("id")?,
        strategy_id: row.try_get("strategy_id")?,
        exchange: row.try_get("exchange")?,
        exchange_ref: row.try_get("exchange_ref")?,
        market: row.try_get("market")?,
        runner: row.try_get("runner")?,
        price: row.try_get("price")?,
        stake: row.try_get("stake")?,
        event_id: event_id as u64,
        event_date: DateTime::from_timestamp(event_date, 0).unwrap_or_default(),
        side: row.try_get::<String, _>("side")?.parse()?,
        result: row.try_get::<String, _>("result")?.parse()?,
        timestamp: DateTime::from_timestamp(timestamp, 0).unwrap_or_default(),
    })
}
