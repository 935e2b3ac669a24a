use rust_decimal::Decimal;
use thiserror::Error;

use crate::{OrderId, OrderStatus};

#[derive(Debug, Error)]
pub enum Error {
    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("order {id} is already {status}")]
    AlreadyTerminal { id: OrderId, status: OrderStatus },

    #[error("order {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("order total must not be negative (got {0})")]
    InvalidAmount(Decimal),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("corrupt order record: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, Error>;
