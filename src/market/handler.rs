use super::{EventMarket, Runner};
use crate::domain::{Side, StrategyStatus};
use crate::strategy::{Finder, FinderQuery};
use crate::trade::{Ticket, TicketPrice, TradeManager};
use std::sync::Arc;
use tracing::error;

/// Live pipeline: fans one event market out into a placement attempt per
/// (runner × side × matching strategy). Returns once every spawned placement
/// has completed.
pub struct MarketHandler {
    finder: Arc<dyn Finder>,
    manager: Arc<dyn TradeManager>,
}

impl MarketHandler {
    pub fn new(finder: Arc<dyn Finder>, manager: Arc<dyn TradeManager>) -> Self {
        Self { finder, manager }
    }

    pub async fn handle_event_market(&self, event: &EventMarket) {
        let mut branches = Vec::new();

        for runner in &event.runners {
            for side in [Side::Back, Side::Lay] {
                let Some(ticket) = build_ticket(event, runner, side) else {
                    continue;
                };

                let finder = self.finder.clone();
                let manager = self.manager.clone();

                branches.push(tokio::spawn(handle_runner(finder, manager, ticket)));
            }
        }

        for branch in branches {
            let _ = branch.await;
        }
    }
}

/// Returns None when the runner has no prices on the requested side; that
/// side is skipped without error.
fn build_ticket(event: &EventMarket, runner: &Runner, side: Side) -> Option<Ticket> {
    let prices = match side {
        Side::Back => &runner.back_prices,
        Side::Lay => &runner.lay_prices,
    };

    let best = prices.first()?;

    Some(Ticket {
        market_id: event.id.clone(),
        market_name: event.name.clone(),
        runner_id: runner.id,
        runner_name: runner.name.clone(),
        event_id: event.event_id,
        competition_id: event.competition_id,
        season_id: event.season_id,
        event_date: event.event_date,
        exchange: event.exchange.clone(),
        price: TicketPrice {
            value: best.price,
            size: best.size,
            side,
        },
    })
}

async fn handle_runner(
    finder: Arc<dyn Finder>,
    manager: Arc<dyn TradeManager>,
    ticket: Ticket,
) {
    let query = FinderQuery {
        market_name: ticket.market_name.clone(),
        runner_name: ticket.runner_name.clone(),
        event_id: ticket.event_id,
        competition_id: ticket.competition_id,
        price: ticket.price.value,
        side: ticket.price.side,
        status: StrategyStatus::Active,
    };

    let mut strategies = finder.find_matching_strategies(query);
    let mut placements = Vec::new();

    while let Some(strategy) = strategies.recv().await {
        let manager = manager.clone();
        let ticket = ticket.clone();

        placements.push(tokio::spawn(async move {
            match manager.manage(&ticket, &strategy).await {
                Ok(()) => {}
                // An identical trade was already placed; de-dup is the
                // expected outcome, not a failure.
                Err(e) if e.is_duplication() => {}
                Err(e) => {
                    error!(
                        "error placing trade for strategy {} on market {}, runner {} and event {}: {}",
                        strategy.id, ticket.market_name, ticket.runner_name, ticket.event_id, e
                    );
                }
            }
        }));
    }

    for placement in placements {
        let _ = placement.await;
    }
}
