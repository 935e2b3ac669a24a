//! Authorization gateway.

use std::sync::Arc;

use policy::{
    Action, CartLine, Catalog, Decision, Identity, PaymentMethod, Policy, Quote,
    RestaurantListing, authorize,
};
use serde::{Deserialize, Serialize};
use storage::{NewOrder, Order, OrderId, OrderStore};
use tracing::{info, warn};

use crate::{Denial, Error, Result};

/// An intent to pay for a cart at one restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub restaurant_id: String,
    pub lines: Vec<CartLine>,
}

/// Single entry point for every externally triggered operation.
///
/// The gateway checks policy before it touches the store. A refused intent
/// returns [`Error::Denied`] and leaves the store untouched.
pub struct Gateway<S: ?Sized> {
    store: Arc<S>,
    catalog: Catalog,
    policy: Policy,
}

impl<S: OrderStore + ?Sized> Gateway<S> {
    pub fn new(store: Arc<S>, catalog: Catalog, policy: Policy) -> Self {
        Self {
            store,
            catalog,
            policy,
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Fail with [`Error::Denied`] unless `identity` may perform `action`.
    ///
    /// The `request_*` methods call this themselves. Callers use it directly
    /// to refuse an intent before doing any lookup of their own.
    pub fn require(&self, identity: &Identity, action: Action) -> Result<()> {
        match authorize(identity, action) {
            Decision::Allow => Ok(()),
            Decision::Deny { reason } => {
                warn!(user = %identity.id(), role = %identity.role(), %action, %reason, "intent denied");
                Err(Error::Denied(Denial {
                    action,
                    role: identity.role(),
                    reason,
                }))
            }
        }
    }

    /// Restaurants `identity` may browse. Never fails.
    pub fn request_catalog(&self, identity: &Identity) -> Vec<&RestaurantListing> {
        self.catalog.visible_to(identity)
    }

    /// Price a cart without placing it.
    pub fn quote(&self, lines: &[CartLine]) -> Result<Quote> {
        Ok(self.policy.pricing.compute_order_total(lines)?)
    }

    /// Place an order as `identity`.
    ///
    /// Checks, in order: payment authority for the role, the cart lines,
    /// and that the restaurant exists in the caller's region.
    pub fn request_place_order(&self, identity: &Identity, request: &OrderRequest) -> Result<Order> {
        self.require(identity, Action::PlaceOrder)?;

        let quote = self.quote(&request.lines)?;
        let restaurant = self
            .catalog
            .visible_to(identity)
            .into_iter()
            .find(|l| l.id == request.restaurant_id)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "restaurant '{}' is not available in region {}",
                    request.restaurant_id,
                    identity.region()
                ))
            })?;

        let item_count = request
            .lines
            .iter()
            .try_fold(0u32, |n, line| n.checked_add(line.quantity))
            .ok_or_else(|| Error::Validation("too many items".to_string()))?;

        let order = self.store.create(NewOrder {
            owner: identity.id().clone(),
            restaurant: restaurant.name.clone(),
            item_count,
            total: quote.total,
        })?;

        info!(user = %identity.id(), order = %order.id, total = %order.total, "order placed");
        Ok(order)
    }

    /// Cancel an order as `identity`.
    ///
    /// Any role allowed to cancel may cancel any order; ownership only
    /// restricts what [`Gateway::request_orders`] returns.
    pub fn request_cancel_order(&self, identity: &Identity, id: OrderId) -> Result<Order> {
        self.require(identity, Action::CancelOrder)?;

        let order = self.store.cancel(id).inspect_err(|e| {
            warn!(user = %identity.id(), order = %id, error = %e, "cancel failed");
        })?;

        info!(user = %identity.id(), order = %id, owner = %order.owner, "order cancelled");
        Ok(order)
    }

    /// Orders visible to `identity`: all of them for admins, otherwise the
    /// caller's own.
    pub fn request_orders(&self, identity: &Identity) -> Result<Vec<Order>> {
        Ok(self.store.list_for(identity)?)
    }

    /// Configured payment gateways. Admins only.
    pub fn request_payment_methods(&self, identity: &Identity) -> Result<&[PaymentMethod]> {
        self.require(identity, Action::ManagePaymentMethods)?;
        Ok(&self.policy.payment_methods)
    }
}
