use super::{Ticket, TradePlacer};
use crate::domain::Strategy;
use crate::error::Error;
use crate::exchange::ClientFactory;
use crate::users::UserService;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait TradeManager: Send + Sync {
    /// Places one trade for a matched strategy: resolves the owning user's
    /// exchange credentials, builds a client for the ticket's exchange and
    /// runs the placer. A Duplication error means an identical trade already
    /// exists; callers absorb it.
    async fn manage(&self, ticket: &Ticket, strategy: &Strategy) -> Result<(), Error>;
}

pub struct ExchangeTradeManager {
    users: Arc<dyn UserService>,
    factory: Arc<dyn ClientFactory>,
    placer: TradePlacer,
}

impl ExchangeTradeManager {
    pub fn new(
        users: Arc<dyn UserService>,
        factory: Arc<dyn ClientFactory>,
        placer: TradePlacer,
    ) -> Self {
        Self {
            users,
            factory,
            placer,
        }
    }
}

#[async_trait]
impl TradeManager for ExchangeTradeManager {
    async fn manage(&self, ticket: &Ticket, strategy: &Strategy) -> Result<(), Error> {
        let user = self.users.by_id(strategy.user_id).await?;

        let client = self.factory.create(
            &ticket.exchange,
            &user.betfair_username,
            &user.betfair_password,
            &user.betfair_key,
        )?;

        self.placer
            .place_trade(client.as_ref(), ticket, strategy)
            .await?;

        Ok(())
    }
}
