//! Outcomes a caller of the gateway can see.

use std::fmt;

use policy::{Action, Role};
use storage::{OrderId, OrderStatus};
use thiserror::Error;

/// Why an intent was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub action: Action,
    pub role: Role,
    pub reason: String,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} attempted {})", self.reason, self.role, self.action)
    }
}

/// Gateway errors.
///
/// Every failure that leaves the gateway is one of these kinds. Lower
/// layers' errors are translated here and never passed through raw.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The actor's role or region does not permit the intent.
    #[error("denied: {0}")]
    Denied(Denial),

    /// No order with this id exists.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The order already reached a terminal status.
    #[error("order {id} is already {status}")]
    AlreadyTerminal { id: OrderId, status: OrderStatus },

    /// The request itself is malformed (empty cart, negative price, unknown
    /// restaurant).
    #[error("invalid request: {0}")]
    Validation(String),

    /// The order store could not be reached or returned unreadable data.
    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    pub fn is_denied(&self) -> bool {
        matches!(self, Error::Denied(_))
    }
}

impl From<storage::Error> for Error {
    fn from(err: storage::Error) -> Self {
        match err {
            storage::Error::NotFound(id) => Error::NotFound(id),
            storage::Error::AlreadyTerminal { id, status } => Error::AlreadyTerminal { id, status },
            storage::Error::InvalidTransition { id, from, to } => {
                Error::Validation(format!("order {id} cannot move from {from} to {to}"))
            }
            storage::Error::InvalidAmount(total) => {
                Error::Validation(format!("order total must not be negative (got {total})"))
            }
            storage::Error::Database(e) => Error::Unavailable(e.to_string()),
            storage::Error::Corrupt(detail) => Error::Unavailable(detail),
        }
    }
}

impl From<policy::Error> for Error {
    fn from(err: policy::Error) -> Self {
        match err {
            policy::Error::Invalid(detail) | policy::Error::Parse(detail) => {
                Error::Validation(detail)
            }
            policy::Error::Io(e) => Error::Unavailable(e.to_string()),
            other => Error::Validation(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
