//! Storefront gateway: the one place intents are authorized.
//!
//! Callers hand in an [`policy::Identity`] and an intent (list the catalog,
//! place an order, cancel an order). The [`Gateway`] consults the policy,
//! and only on approval delegates to the order store or the catalog.
//!
//! # Overview
//!
//! - **Gateway**: authoritative checks in front of an [`storage::OrderStore`].
//! - **Session**: a logged-in identity with its [`Cart`].
//! - **Error**: the outward taxonomy. Denials, missing orders, terminal
//!   orders and malformed requests are all distinct kinds; none of them is
//!   ever reported as success.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gateway::{Gateway, OrderRequest};
//! use policy::{CartLine, Catalog, Identity, Policy, Region, RestaurantListing, Role, UserId};
//! use rust_decimal::Decimal;
//! use storage::MemoryOrderStore;
//!
//! let catalog = Catalog::new(vec![RestaurantListing {
//!     id: "r4".into(),
//!     name: "Brooklyn Burgers".into(),
//!     region: Region::America,
//!     cuisine: "American".into(),
//!     rating: 4.6,
//!     delivery_time: "25-35 min".into(),
//!     price_range: "$$".into(),
//! }])?;
//! let gateway = Gateway::new(Arc::new(MemoryOrderStore::new()), catalog, Policy::default());
//!
//! let manager = Identity::new(UserId::new("u3"), Role::Manager, Region::America);
//! let order = gateway.request_place_order(&manager, &OrderRequest {
//!     restaurant_id: "r4".into(),
//!     lines: vec![CartLine::new(Decimal::new(1299, 2), 2)],
//! })?;
//! gateway.request_cancel_order(&manager, order.id)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod gateway;
mod session;

pub use error::{Denial, Error, Result};
pub use gateway::{Gateway, OrderRequest};
pub use session::{Cart, CartItem, Session};
