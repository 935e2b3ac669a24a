//! Access policy for the storefront.
//!
//! Core principle: **every privilege is a per-action rule over roles.**
//! There is no role hierarchy; [`authorize`] decides each [`Action`] on
//! its own.
//!
//! The crate also owns the region lock for restaurant listings
//! ([`visible_listings`]) and order pricing ([`Pricing`]).

mod catalog;
mod error;
mod identity;
mod policy;
mod pricing;

pub use catalog::{Catalog, RestaurantListing, visible_listings};
pub use error::{Error, Result};
pub use identity::{Identity, Region, Role, UserId};
pub use policy::{
    Action, Decision, PaymentMethod, Policy, authorize, can_cancel_order, can_place_order,
};
pub use pricing::{CartLine, Pricing, Quote};
