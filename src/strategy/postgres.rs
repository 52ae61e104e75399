use super::{ReaderQuery, StrategyReader, StrategyWriter};
use crate::domain::{OrderBy, ResultFilter, StakingPlan, StatFilter, Strategy};
use crate::error::{is_unique_violation, Error};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

pub struct PostgresStrategyReader {
    pool: PgPool,
}

impl PostgresStrategyReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_result_filters(&self, strategy_id: Uuid) -> Result<Vec<ResultFilter>, Error> {
        let rows = sqlx::query(
            "SELECT team, result, games, venue FROM strategy_result_filter WHERE strategy_id = $1",
        )
        .bind(strategy_id)
        .fetch_all(&self.pool)
        .await?;

        let mut filters = Vec::with_capacity(rows.len());

        for row in rows {
            filters.push(ResultFilter {
                team: row.try_get::<String, _>("team")?.parse()?,
                result: row.try_get::<String, _>("result")?.parse()?,
                games: row.try_get::<i16, _>("games")? as u8,
                venue: row.try_get::<String, _>("venue")?.parse()?,
            });
        }

        Ok(filters)
    }

    async fn fetch_stat_filters(&self, strategy_id: Uuid) -> Result<Vec<StatFilter>, Error> {
        let rows = sqlx::query(
            "SELECT stat, team, action, measure, metric, games, value, venue \
             FROM strategy_stat_filter WHERE strategy_id = $1",
        )
        .bind(strategy_id)
        .fetch_all(&self.pool)
        .await?;

        let mut filters = Vec::with_capacity(rows.len());

        for row in rows {
            filters.push(StatFilter {
                stat: row.try_get::<String, _>("stat")?.parse()?,
                team: row.try_get::<String, _>("team")?.parse()?,
                action: row.try_get::<String, _>("action")?.parse()?,
                measure: row.try_get::<String, _>("measure")?.parse()?,
                metric: row.try_get::<String, _>("metric")?.parse()?,
                games: row.try_get::<i16, _>("games")? as u8,
                value: row.try_get("value")?,
                venue: row.try_get::<String, _>("venue")?.parse()?,
            });
        }

        Ok(filters)
    }
}

#[async_trait]
impl StrategyReader for PostgresStrategyReader {
    async fn get(&self, query: &ReaderQuery) -> Result<Vec<Strategy>, Error> {
        let mut builder = build_reader_query(query);
        let rows = builder.build().fetch_all(&self.pool).await?;

        let mut strategies = Vec::with_capacity(rows.len());

        for row in rows {
            let mut strategy = strategy_from_row(&row)?;
            strategy.result_filters = self.fetch_result_filters(strategy.id).await?;
            strategy.stat_filters = self.fetch_stat_filters(strategy.id).await?;
            strategies.push(strategy);
        }

        Ok(strategies)
    }
}

pub struct PostgresStrategyWriter {
    pool: PgPool,
}

impl PostgresStrategyWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StrategyWriter for PostgresStrategyWriter {
    async fn insert(&self, strategy: &Strategy) -> Result<(), Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT id FROM strategy WHERE name = $1 AND user_id = $2)",
        )
        .bind(&strategy.name)
        .bind(strategy.user_id)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            return Err(Error::Duplication(
                "strategy exists with name provided".to_string(),
            ));
        }

        let competition_ids: Vec<i64> = strategy
            .competition_ids
            .iter()
            .map(|&id| id as i64)
            .collect();

        let staking_plan = serde_json::to_value(strategy.staking_plan)
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        // The strategy row and its filter children land atomically; the
        // unique constraint on (user_id, name) backstops the pre-check under
        // concurrent inserts.
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO strategy (id, name, description, user_id, market, runner, min_odds, \
             max_odds, competition_ids, side, visibility, status, staking_plan, created_at, \
             updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(strategy.id)
        .bind(&strategy.name)
        .bind(&strategy.description)
        .bind(strategy.user_id)
        .bind(&strategy.market_name)
        .bind(&strategy.runner_name)
        .bind(strategy.min_odds)
        .bind(strategy.max_odds)
        .bind(&competition_ids)
        .bind(strategy.side.as_str())
        .bind(strategy.visibility.as_str())
        .bind(strategy.status.as_str())
        .bind(staking_plan)
        .bind(strategy.created_at.timestamp())
        .bind(strategy.updated_at.timestamp())
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                return Err(Error::Duplication(
                    "strategy exists with name provided".to_string(),
                ));
            }

            return Err(e.into());
        }

        for filter in &strategy.result_filters {
            sqlx::query(
                "INSERT INTO strategy_result_filter (strategy_id, team, result, games, venue) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(strategy.id)
            .bind(filter.team.as_str())
            .bind(filter.result.as_str())
            .bind(filter.games as i16)
            .bind(filter.venue.as_str())
            .execute(&mut *tx)
            .await?;
        }

        for filter in &strategy.stat_filters {
            sqlx::query(
                "INSERT INTO strategy_stat_filter (strategy_id, stat, team, action, measure, \
                 metric, games, value, venue) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(strategy.id)
            .bind(filter.stat.as_str())
            .bind(filter.team.as_str())
            .bind(filter.action.as_str())
            .bind(filter.measure.as_str())
            .bind(filter.metric.as_str())
            .bind(filter.games as i16)
            .bind(filter.value)
            .bind(filter.venue.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

fn build_reader_query(query: &ReaderQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "SELECT id, name, description, user_id, market, runner, min_odds, max_odds, \
         competition_ids, side, visibility, status, staking_plan, created_at, updated_at \
         FROM strategy WHERE 1 = 1",
    );

    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }

    if let Some(market) = &query.market {
        builder.push(" AND market = ").push_bind(market.clone());
    }

    if let Some(runner) = &query.runner {
        builder.push(" AND runner = ").push_bind(runner.clone());
    }

    if let Some(price) = query.price {
        builder
            .push(" AND (min_odds <= ")
            .push_bind(price)
            .push(" OR min_odds IS NULL)")
            .push(" AND (max_odds >= ")
            .push_bind(price)
            .push(" OR max_odds IS NULL)");
    }

    if let Some(competition_id) = query.competition_id {
        builder
            .push(" AND ")
            .push_bind(competition_id as i64)
            .push(" = ANY(competition_ids)");
    }

    if let Some(side) = query.side {
        builder.push(" AND side = ").push_bind(side.as_str());
    }

    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }

    if let Some(visibility) = query.visibility {
        builder
            .push(" AND visibility = ")
            .push_bind(visibility.as_str());
    }

    match query.order_by {
        Some(OrderBy::NameAsc) => {
            builder.push(" ORDER BY name ASC");
        }
        Some(OrderBy::NameDesc) => {
            builder.push(" ORDER BY name DESC");
        }
        Some(OrderBy::CreatedAtAsc) => {
            builder.push(" ORDER BY created_at ASC");
        }
        Some(OrderBy::CreatedAtDesc) => {
            builder.push(" ORDER BY created_at DESC");
        }
        None => {}
    }

    builder
}

fn strategy_from_row(row: &PgRow) -> Result<Strategy, Error> {
    let competition_ids: Vec<i64> = row.try_get("competition_ids")?;
    let staking_plan: serde_json::Value = row.try_get("staking_plan")?;
    let staking_plan: StakingPlan =
        serde_json::from_value(staking_plan).map_err(|e| sqlx::Error::Decode(e.into()))?;

    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(Strategy {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        user_id: row.try_get("user_id")?,
        market_name: row.try_get("market")?,
        runner_name: row.try_get("runner")?,
        min_odds: row.try_get("min_odds")?,
        max_odds: row.try_get("max_odds")?,
        competition_ids: competition_ids.into_iter().map(|id| id as u64).collect(),
        side: row.try_get::<String, _>("side")?.parse()?,
        visibility: row.try_get::<String, _>("visibility")?.parse()?,
        status: row.try_get::<String, _>("status")?.parse()?,
        staking_plan,
        result_filters: Vec::new(),
        stat_filters: Vec::new(),
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_default(),
        updated_at: DateTime::from_timestamp(updated_at, 0).unwrap_or_default(),
    })
}
