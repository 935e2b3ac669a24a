//! Order storage for the storefront.
//!
//! This crate owns every order record. Nothing outside it changes an
//! order's status; callers go through the [`OrderStore`] trait.
//!
//! # Core Concepts
//!
//! ## Order
//!
//! An [`Order`] is created `Pending` and ends either `Cancelled` or
//! `Completed`. Once terminal it never changes again, and asking to cancel
//! it a second time fails with [`Error::AlreadyTerminal`] rather than
//! quietly succeeding.
//!
//! ## OrderStore
//!
//! The [`OrderStore`] trait is the contract. Two implementations exist:
//!
//! - [`MemoryOrderStore`] keeps orders in process memory.
//! - [`SqliteOrderStore`] keeps them in a SQLite file so that separate CLI
//!   invocations see the same orders.
//!
//! Both serialize every operation behind a lock, so concurrent callers
//! never interleave inside a status change.
//!
//! # Example
//!
//! ```
//! use policy::{Identity, Region, Role, UserId};
//! use rust_decimal::Decimal;
//! use storage::{MemoryOrderStore, NewOrder, OrderStatus, OrderStore};
//!
//! let store = MemoryOrderStore::new();
//! let order = store.create(NewOrder {
//!     owner: UserId::new("u2"),
//!     restaurant: "Spicy Tandoor".to_string(),
//!     item_count: 1,
//!     total: Decimal::new(1799, 2),
//! })?;
//! assert_eq!(order.status, OrderStatus::Pending);
//!
//! let manager = Identity::new(UserId::new("u2"), Role::Manager, Region::India);
//! assert_eq!(store.list_for(&manager)?.len(), 1);
//!
//! store.cancel(order.id)?;
//! assert!(store.cancel(order.id).is_err());
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod order;
mod sqlite;
mod store;

pub use error::{Error, Result};
pub use order::{NewOrder, Order, OrderId, OrderStatus};
pub use sqlite::SqliteOrderStore;
pub use store::{MemoryOrderStore, OrderStore};
