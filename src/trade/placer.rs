use super::{Ticket, TradeReader, TradeWriter};
use crate::clock::Clock;
use crate::domain::{StakingPlan, StakingPlanName, Strategy, Trade, TradeResult};
use crate::error::Error;
use crate::exchange::{Account, ExchangeClient, OrderTicket};
use std::sync::Arc;
use uuid::Uuid;

/// Places at most one trade per (strategy, market, runner, event) tuple:
/// existence pre-check, account read, stake sizing, order placement,
/// persistence. The pre-check avoids the exchange round-trip in the common
/// duplicate case; the trade store's unique constraint closes the race.
pub struct TradePlacer {
    reader: Arc<dyn TradeReader>,
    writer: Arc<dyn TradeWriter>,
    clock: Arc<dyn Clock>,
}

impl TradePlacer {
    pub fn new(
        reader: Arc<dyn TradeReader>,
        writer: Arc<dyn TradeWriter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reader,
            writer,
            clock,
        }
    }

    pub async fn place_trade(
        &self,
        client: &dyn ExchangeClient,
        ticket: &Ticket,
        strategy: &Strategy,
    ) -> Result<Trade, Error> {
        let exists = self
            .reader
            .exists(
                &ticket.market_name,
                &ticket.runner_name,
                ticket.event_id,
                strategy.id,
            )
            .await?;

        if exists {
            return Err(duplication_error(ticket, strategy.id));
        }

        let account = client.account().await?;

        let stake = calculate_stake(&account, &strategy.staking_plan);

        if stake <= 0.0 {
            return Err(Error::InvalidBalance(format!(
                "invalid balance of {:.2} when placing trade for market {}, runner {}, event {} \
                 and strategy {}",
                stake, ticket.market_name, ticket.runner_name, ticket.event_id, strategy.id
            )));
        }

        let order = OrderTicket {
            market_id: ticket.market_id.clone(),
            runner_id: ticket.runner_id,
            price: ticket.price.value,
            stake: round_stake(stake),
            side: ticket.price.side,
        };

        let placed = client.place_order(&order).await?;

        let trade = Trade {
            id: Uuid::new_v4(),
            strategy_id: strategy.id,
            exchange: placed.exchange,
            exchange_ref: placed.reference,
            market: ticket.market_name.clone(),
            runner: ticket.runner_name.clone(),
            price: order.price,
            stake: order.stake,
            event_id: ticket.event_id,
            event_date: ticket.event_date,
            side: order.side,
            result: TradeResult::InPlay,
            timestamp: self.clock.now(),
        };

        if let Err(e) = self.writer.insert(&trade).await {
            // The order is live with the exchange; hand the trade back with
            // the failure so the caller can reconcile.
            return Err(Error::PersistenceFailure {
                trade: Box::new(trade),
                message: e.to_string(),
            });
        }

        Ok(trade)
    }
}

fn duplication_error(ticket: &Ticket, strategy_id: Uuid) -> Error {
    Error::Duplication(format!(
        "trade exists for market {}, runner {}, event {} and strategy {}",
        ticket.market_name, ticket.runner_name, ticket.event_id, strategy_id
    ))
}

/// Total bank is the free balance plus the magnitude of open exposure. Only
/// percentage plans are supported; the stake is that share of the bank.
fn calculate_stake(account: &Account, plan: &StakingPlan) -> f64 {
    let bank = account.balance + account.exposure.abs();

    if bank <= 0.0 {
        return 0.0;
    }

    match plan.name {
        StakingPlanName::Percentage => (bank / 100.0) * plan.value,
    }
}

fn round_stake(stake: f64) -> f64 {
    (stake * 100.0).round() / 100.0
}
