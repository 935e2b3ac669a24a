//! Session management.

use policy::{CartLine, Identity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storage::{Order, OrderStore};
use tracing::info;

use crate::{Error, Gateway, OrderRequest, Result};

/// An item waiting in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub restaurant_id: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Items collected before checkout.
///
/// A cart holds items from one restaurant at a time. Prices are never
/// negative, and [`Cart::add`] refuses anything that would push the unit
/// count past `u32::MAX` or the subtotal past `Decimal::MAX`, so the totals
/// below cannot overflow.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Add an item, merging with an existing line of the same id.
    pub fn add(&mut self, item: CartItem) -> Result<()> {
        if item.quantity == 0 {
            return Err(Error::Validation("quantity must be at least 1".to_string()));
        }
        if item.unit_price.is_sign_negative() && !item.unit_price.is_zero() {
            return Err(Error::Validation(format!(
                "unit price must not be negative (got {})",
                item.unit_price
            )));
        }
        if let Some(current) = self.restaurant_id() {
            if current != item.restaurant_id {
                return Err(Error::Validation(format!(
                    "cart holds items from restaurant '{current}'; clear it first"
                )));
            }
        }

        // A merged line keeps the price it was first added at.
        let unit_price = self
            .items
            .iter()
            .find(|i| i.id == item.id)
            .map_or(item.unit_price, |i| i.unit_price);
        self.item_count()
            .checked_add(item.quantity)
            .ok_or_else(|| Error::Validation("too many items".to_string()))?;
        unit_price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|amount| self.subtotal().checked_add(amount))
            .ok_or_else(|| Error::Validation("cart total out of range".to_string()))?;

        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => existing.quantity += item.quantity,
            None => self.items.push(item),
        }
        Ok(())
    }

    /// Take one unit off a line, dropping the line at zero.
    ///
    /// Returns `false` if the item is not in the cart.
    pub fn decrease(&mut self, item_id: &str) -> bool {
        let Some(pos) = self.items.iter().position(|i| i.id == item_id) else {
            return false;
        };
        if self.items[pos].quantity > 1 {
            self.items[pos].quantity -= 1;
        } else {
            self.items.remove(pos);
        }
        true
    }

    /// Drop a whole line. Returns `false` if the item is not in the cart.
    pub fn remove(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn restaurant_id(&self) -> Option<&str> {
        self.items.first().map(|i| i.restaurant_id.as_str())
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .map(|i| CartLine::new(i.unit_price, i.quantity))
            .collect()
    }

    /// Sum of line amounts before fees, for display.
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum()
    }
}

/// A logged-in user and their cart.
///
/// The identity is fixed at login. Switching user means logging out and
/// logging in again.
pub struct Session {
    identity: Identity,
    cart: Cart,
}

impl Session {
    pub fn login(identity: Identity) -> Self {
        info!(user = %identity.id(), role = %identity.role(), region = %identity.region(), "logged in");
        Self {
            identity,
            cart: Cart::default(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Pay for the cart through the gateway.
    ///
    /// The cart is emptied only when the order was placed.
    pub fn checkout<S: OrderStore + ?Sized>(&mut self, gateway: &Gateway<S>) -> Result<Order> {
        let request = OrderRequest {
            restaurant_id: self.cart.restaurant_id().unwrap_or_default().to_string(),
            lines: self.cart.lines(),
        };
        let order = gateway.request_place_order(&self.identity, &request)?;
        self.cart.clear();
        Ok(order)
    }

    /// End the session.
    pub fn logout(self) {
        info!(user = %self.identity.id(), "logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::{Catalog, Policy, Region, RestaurantListing, Role, UserId};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use storage::{MemoryOrderStore, OrderStatus};

    fn item(id: &str, restaurant: &str, price: Decimal) -> CartItem {
        CartItem {
            id: id.to_string(),
            name: format!("{id} special"),
            restaurant_id: restaurant.to_string(),
            unit_price: price,
            quantity: 1,
        }
    }

    fn gateway() -> Gateway<MemoryOrderStore> {
        let catalog = Catalog::new(vec![RestaurantListing {
            id: "r1".to_string(),
            name: "Spicy Tandoor".to_string(),
            region: Region::India,
            cuisine: "North Indian".to_string(),
            rating: 4.5,
            delivery_time: "30-40 min".to_string(),
            price_range: "$$".to_string(),
        }])
        .unwrap();
        Gateway::new(Arc::new(MemoryOrderStore::new()), catalog, Policy::default())
    }

    #[test]
    fn test_add_merges_same_item() {
        let mut cart = Cart::default();
        cart.add(item("a", "r1", dec!(15.99))).unwrap();
        cart.add(item("a", "r1", dec!(15.99))).unwrap();
        cart.add(item("b", "r1", dec!(4.50))).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), dec!(36.48));
    }

    #[test]
    fn test_add_rejects_second_restaurant() {
        let mut cart = Cart::default();
        cart.add(item("a", "r1", dec!(1))).unwrap();
        assert!(matches!(
            cart.add(item("b", "r2", dec!(1))),
            Err(Error::Validation(_))
        ));

        cart.clear();
        assert!(cart.add(item("b", "r2", dec!(1))).is_ok());
    }

    #[test]
    fn test_add_refuses_unit_count_overflow() {
        let mut cart = Cart::default();
        let mut big = item("a", "r1", dec!(0));
        big.quantity = u32::MAX;
        cart.add(big.clone()).unwrap();

        big.id = "b".to_string();
        assert!(matches!(cart.add(big.clone()), Err(Error::Validation(_))));
        big.id = "a".to_string();
        big.quantity = 1;
        assert!(matches!(cart.add(big), Err(Error::Validation(_))));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_add_refuses_subtotal_overflow() {
        let mut cart = Cart::default();
        cart.add(item("a", "r1", Decimal::MAX)).unwrap();
        assert!(matches!(
            cart.add(item("b", "r1", Decimal::MAX)),
            Err(Error::Validation(_))
        ));
        let mut twice = item("c", "r1", Decimal::MAX);
        twice.quantity = 2;
        assert!(matches!(
            Cart::default().add(twice),
            Err(Error::Validation(_))
        ));
        assert_eq!(cart.subtotal(), Decimal::MAX);
    }

    #[test]
    fn test_add_refuses_negative_price() {
        let mut cart = Cart::default();
        assert!(matches!(
            cart.add(item("a", "r1", dec!(-1))),
            Err(Error::Validation(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrease_drops_line_at_one() {
        let mut cart = Cart::default();
        cart.add(item("a", "r1", dec!(1))).unwrap();
        cart.add(item("a", "r1", dec!(1))).unwrap();

        assert!(cart.decrease("a"));
        assert_eq!(cart.item_count(), 1);
        assert!(cart.decrease("a"));
        assert!(cart.is_empty());
        assert!(!cart.decrease("a"));
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::default();
        cart.add(item("a", "r1", dec!(1))).unwrap();
        assert!(!cart.remove("zzz"));
        assert!(cart.remove("a"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_checkout_clears_cart_on_success() {
        let gw = gateway();
        let manager = Identity::new(UserId::new("u2"), Role::Manager, Region::India);
        let mut session = Session::login(manager);
        session.cart_mut().add(item("a", "r1", dec!(15.99))).unwrap();

        let order = session.checkout(&gw).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, dec!(17.99));
        assert!(session.cart().is_empty());
        session.logout();
    }

    #[test]
    fn test_checkout_keeps_cart_when_denied() {
        let gw = gateway();
        let member = Identity::new(UserId::new("u4"), Role::Member, Region::India);
        let mut session = Session::login(member);
        session.cart_mut().add(item("a", "r1", dec!(15.99))).unwrap();

        assert!(session.checkout(&gw).unwrap_err().is_denied());
        assert_eq!(session.cart().item_count(), 1);
    }

    #[test]
    fn test_checkout_empty_cart_is_validation_error() {
        let gw = gateway();
        let manager = Identity::new(UserId::new("u2"), Role::Manager, Region::India);
        let mut session = Session::login(manager);
        assert!(matches!(session.checkout(&gw), Err(Error::Validation(_))));
    }
}
