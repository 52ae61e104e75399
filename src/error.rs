use crate::domain::Trade;
use thiserror::Error;
use uuid::Uuid;

/// Crate-wide error taxonomy. Variants are grouped by meaning rather than by
/// transport: callers dispatch on the variant, messages carry the detail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplication error: {0}")]
    Duplication(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("error fetching fixture: {0}")]
    FixtureLookup(String),

    #[error("unable to parse result: {0}")]
    ResultUnavailable(String),

    #[error("no stats available: {0}")]
    StatsUnavailable(String),

    #[error("data service error: {0}")]
    DataService(String),

    #[error("error returned by exchange client: {0}")]
    Exchange(String),

    #[error("error placing order for market {market_id} and runner {runner_id}: code {error_code}, status {status}")]
    OrderFailure {
        market_id: String,
        runner_id: u64,
        status: String,
        error_code: String,
    },

    #[error("trade unmatched for market '{market_id}' and runner '{runner_id}' with status '{status}'")]
    Unmatched {
        market_id: String,
        runner_id: u64,
        status: String,
    },

    #[error("invalid response in exchange client: {0}")]
    InvalidResponse(String),

    #[error("invalid balance: {0}")]
    InvalidBalance(String),

    #[error("exchange '{0}' is not supported")]
    InvalidExchange(String),

    #[error("user {0} does not exist")]
    UserNotFound(Uuid),

    /// The order is live with the exchange but the local record failed to
    /// persist. The trade is carried so the caller can reconcile.
    #[error("trade placed with exchange but failed to persist: {message}")]
    PersistenceFailure { trade: Box<Trade>, message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub fn is_duplication(&self) -> bool {
        matches!(self, Error::Duplication(_))
    }
}

/// Postgres unique-constraint violation; the durable half of every
/// duplicate-suppression guarantee in the stores.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
