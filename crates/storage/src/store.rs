//! The order store contract and its in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use policy::Identity;
use tracing::debug;

use crate::{Error, NewOrder, Order, OrderId, OrderStatus, Result};

/// Authoritative collection of orders.
///
/// Implementations own their records and are the only place an order's
/// status changes. Each call is atomic with respect to every other call on
/// the same store: two concurrent cancels of one order cannot both succeed.
pub trait OrderStore: Send + Sync {
    /// Append a new pending order and return it as stored.
    fn create(&self, new: NewOrder) -> Result<Order>;

    /// Append `new` only if the store holds no orders at all.
    ///
    /// The emptiness check and the insert are one atomic step, so two
    /// callers seeding the same store create one order between them.
    fn create_if_empty(&self, new: NewOrder) -> Result<Option<Order>>;

    /// Fetch a single order.
    fn get(&self, id: OrderId) -> Result<Order>;

    /// Orders visible to `identity`, oldest first.
    ///
    /// Admins see every order. Everyone else sees the orders they own.
    fn list_for(&self, identity: &Identity) -> Result<Vec<Order>>;

    /// Move a pending order to the terminal status `to`.
    ///
    /// Fails with [`Error::NotFound`] for an unknown id, with
    /// [`Error::InvalidTransition`] when `to` is not terminal, and with
    /// [`Error::AlreadyTerminal`] when the order has left `Pending`.
    fn transition(&self, id: OrderId, to: OrderStatus) -> Result<Order>;

    /// Cancel a pending order. A second cancel is an error, not a no-op.
    fn cancel(&self, id: OrderId) -> Result<Order> {
        self.transition(id, OrderStatus::Cancelled)
    }

    /// Mark a pending order as fulfilled.
    fn complete(&self, id: OrderId) -> Result<Order> {
        self.transition(id, OrderStatus::Completed)
    }
}

pub(crate) fn check_new(new: &NewOrder) -> Result<()> {
    if new.total.is_sign_negative() && !new.total.is_zero() {
        return Err(Error::InvalidAmount(new.total));
    }
    Ok(())
}

pub(crate) fn check_transition(id: OrderId, from: OrderStatus, to: OrderStatus) -> Result<()> {
    if !to.is_terminal() {
        return Err(Error::InvalidTransition { id, from, to });
    }
    if from.is_terminal() {
        return Err(Error::AlreadyTerminal { id, status: from });
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Orders {
    records: Vec<Order>,
    index: HashMap<OrderId, usize>,
}

impl Orders {
    fn append(&mut self, order: Order) {
        self.index.insert(order.id, self.records.len());
        self.records.push(order);
    }
}

/// Order store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: Mutex<Orders>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single field write under the lock, so a poisoned
    // lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Orders> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OrderStore for MemoryOrderStore {
    fn create(&self, new: NewOrder) -> Result<Order> {
        check_new(&new)?;
        let order = Order::pending(new);
        self.lock().append(order.clone());

        debug!(order = %order.id, owner = %order.owner, total = %order.total, "order created");
        Ok(order)
    }

    fn create_if_empty(&self, new: NewOrder) -> Result<Option<Order>> {
        check_new(&new)?;
        let mut orders = self.lock();
        if !orders.records.is_empty() {
            return Ok(None);
        }
        let order = Order::pending(new);
        orders.append(order.clone());

        debug!(order = %order.id, owner = %order.owner, "store seeded");
        Ok(Some(order))
    }

    fn get(&self, id: OrderId) -> Result<Order> {
        let orders = self.lock();
        orders
            .index
            .get(&id)
            .and_then(|&i| orders.records.get(i))
            .cloned()
            .ok_or(Error::NotFound(id))
    }

    fn list_for(&self, identity: &Identity) -> Result<Vec<Order>> {
        let orders = self.lock();
        let visible = if identity.is_admin() {
            orders.records.clone()
        } else {
            orders
                .records
                .iter()
                .filter(|o| &o.owner == identity.id())
                .cloned()
                .collect()
        };
        Ok(visible)
    }

    fn transition(&self, id: OrderId, to: OrderStatus) -> Result<Order> {
        let mut orders = self.lock();
        let position = *orders.index.get(&id).ok_or(Error::NotFound(id))?;
        let order = orders
            .records
            .get_mut(position)
            .ok_or(Error::NotFound(id))?;

        check_transition(id, order.status, to)?;
        order.status = to;

        debug!(order = %id, status = %to, "order status changed");
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::{Region, Role, UserId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn identity(id: &str, role: Role) -> Identity {
        Identity::new(UserId::new(id), role, Region::India)
    }

    fn new_order(owner: &str, total: Decimal) -> NewOrder {
        NewOrder {
            owner: UserId::new(owner),
            restaurant: "Spicy Tandoor".to_string(),
            item_count: 2,
            total,
        }
    }

    #[test]
    fn test_create_starts_pending_and_is_readable() {
        let store = MemoryOrderStore::new();
        let order = store.create(new_order("u2", dec!(33.98))).unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.owner, UserId::new("u2"));
        assert_eq!(store.get(order.id).unwrap(), order);
    }

    #[test]
    fn test_create_rejects_negative_total() {
        let store = MemoryOrderStore::new();
        let err = store.create(new_order("u2", dec!(-0.01))).unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
        assert!(store.list_for(&identity("u1", Role::Admin)).unwrap().is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let store = MemoryOrderStore::new();
        let a = store.create(new_order("u2", dec!(1))).unwrap();
        let b = store.create(new_order("u2", dec!(1))).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_list_for_admin_sees_all_others_see_own() {
        let store = MemoryOrderStore::new();
        let a = store.create(new_order("u2", dec!(10))).unwrap();
        let b = store.create(new_order("u3", dec!(20))).unwrap();
        let c = store.create(new_order("u2", dec!(30))).unwrap();

        let admin: Vec<_> = store
            .list_for(&identity("u1", Role::Admin))
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(admin, [a.id, b.id, c.id]);

        let manager: Vec<_> = store
            .list_for(&identity("u2", Role::Manager))
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(manager, [a.id, c.id]);

        assert!(store.list_for(&identity("u4", Role::Member)).unwrap().is_empty());
    }

    #[test]
    fn test_cancel_twice_is_rejected() {
        let store = MemoryOrderStore::new();
        let order = store.create(new_order("u2", dec!(10))).unwrap();

        let cancelled = store.cancel(order.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let err = store.cancel(order.id).unwrap_err();
        assert!(matches!(
            err,
            Error::AlreadyTerminal {
                status: OrderStatus::Cancelled,
                ..
            }
        ));
        assert_eq!(store.get(order.id).unwrap().status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_completed_order_cannot_be_cancelled() {
        let store = MemoryOrderStore::new();
        let order = store.create(new_order("u1", dec!(35))).unwrap();
        store.complete(order.id).unwrap();

        let err = store.cancel(order.id).unwrap_err();
        assert!(matches!(
            err,
            Error::AlreadyTerminal {
                status: OrderStatus::Completed,
                ..
            }
        ));
    }

    #[test]
    fn test_cancel_unknown_order() {
        let store = MemoryOrderStore::new();
        let id = OrderId::new();
        assert!(matches!(store.cancel(id), Err(Error::NotFound(missing)) if missing == id));
    }

    #[test]
    fn test_transition_to_non_terminal_is_rejected() {
        let store = MemoryOrderStore::new();
        let order = store.create(new_order("u2", dec!(10))).unwrap();

        let err = store.transition(order.id, OrderStatus::Pending).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Pending,
                ..
            }
        ));
        assert_eq!(store.get(order.id).unwrap().status, OrderStatus::Pending);
        assert!(store.cancel(order.id).is_ok());
    }

    #[test]
    fn test_create_if_empty_only_once() {
        let store = MemoryOrderStore::new();
        assert!(store.create_if_empty(new_order("u1", dec!(35))).unwrap().is_some());
        assert!(store.create_if_empty(new_order("u1", dec!(35))).unwrap().is_none());
        assert_eq!(store.list_for(&identity("u1", Role::Admin)).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_seeding_creates_one_order() {
        let store = MemoryOrderStore::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| store.create_if_empty(new_order("u1", dec!(35))).unwrap());
            }
        });
        assert_eq!(store.list_for(&identity("u1", Role::Admin)).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_cancels_succeed_once() {
        let store = MemoryOrderStore::new();
        let order = store.create(new_order("u2", dec!(10))).unwrap();

        let successes = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| store.cancel(order.id).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(successes, 1);
    }
}
