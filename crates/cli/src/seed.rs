//! Demo accounts, restaurants and the opening order.

use policy::{Catalog, Identity, Region, RestaurantListing, Role, UserId};
use rust_decimal::Decimal;
use serde::Serialize;
use storage::{NewOrder, OrderStore};

use crate::error::{Error, Result};

/// Price of the quick-add "special" offered by every restaurant.
pub const SPECIAL_PRICE: Decimal = Decimal::from_parts(1599, 0, 0, false, 2);

/// A demo account. Logging in is choosing one of these.
#[derive(Debug, Clone, Serialize)]
pub struct SeedUser {
    pub id: &'static str,
    pub name: &'static str,
    pub role: Role,
    pub region: Region,
}

impl SeedUser {
    pub fn identity(&self) -> Identity {
        Identity::new(UserId::new(self.id), self.role, self.region)
    }
}

pub const USERS: &[SeedUser] = &[
    SeedUser { id: "u1", name: "Nick Fury", role: Role::Admin, region: Region::All },
    SeedUser { id: "u2", name: "Captain Marvel", role: Role::Manager, region: Region::India },
    SeedUser { id: "u3", name: "Captain America", role: Role::Manager, region: Region::America },
    SeedUser { id: "u4", name: "Thanos", role: Role::Member, region: Region::India },
    SeedUser { id: "u5", name: "Thor", role: Role::Member, region: Region::India },
    SeedUser { id: "u6", name: "Travis", role: Role::Member, region: Region::America },
];

pub fn find_user(id: &str) -> Result<&'static SeedUser> {
    USERS
        .iter()
        .find(|u| u.id == id)
        .ok_or_else(|| Error::UnknownUser(id.to_string()))
}

fn restaurant(
    id: &str,
    name: &str,
    region: Region,
    cuisine: &str,
    rating: f32,
    delivery_time: &str,
    price_range: &str,
) -> RestaurantListing {
    RestaurantListing {
        id: id.to_string(),
        name: name.to_string(),
        region,
        cuisine: cuisine.to_string(),
        rating,
        delivery_time: delivery_time.to_string(),
        price_range: price_range.to_string(),
    }
}

pub fn catalog() -> Result<Catalog> {
    Ok(Catalog::new(vec![
        restaurant("r1", "Spicy Tandoor", Region::India, "North Indian", 4.5, "30-40 min", "$$"),
        restaurant("r2", "Mumbai Chaat House", Region::India, "Street Food", 4.2, "20-30 min", "$"),
        restaurant("r3", "South Dravida", Region::India, "South Indian", 4.8, "35-45 min", "$$$"),
        restaurant("r4", "Brooklyn Burgers", Region::America, "American", 4.6, "25-35 min", "$$"),
        restaurant("r5", "Texas BBQ Pit", Region::America, "BBQ", 4.7, "40-50 min", "$$$"),
        restaurant("r6", "NY Pizza Slice", Region::America, "Italian-American", 4.3, "20-30 min", "$"),
    ])?)
}

/// Put the opening order into an empty store: a completed burger order by
/// the admin account.
pub fn seed_orders<S: OrderStore + ?Sized>(store: &S) -> Result<()> {
    let admin = find_user("u1")?.identity();
    let seeded = store.create_if_empty(NewOrder {
        owner: admin.id().clone(),
        restaurant: "Brooklyn Burgers".to_string(),
        item_count: 2,
        total: Decimal::new(3500, 2),
    })?;
    if let Some(order) = seeded {
        store.complete(order.id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use storage::{MemoryOrderStore, OrderStatus};

    #[test]
    fn test_special_price() {
        assert_eq!(SPECIAL_PRICE, dec!(15.99));
    }

    #[test]
    fn test_seed_catalog_is_valid() {
        let catalog = catalog().unwrap();
        assert_eq!(catalog.listings().len(), 6);
        let thor = find_user("u5").unwrap().identity();
        assert_eq!(catalog.visible_to(&thor).len(), 3);
    }

    #[test]
    fn test_seed_orders_once() {
        let store = MemoryOrderStore::new();
        seed_orders(&store).unwrap();
        seed_orders(&store).unwrap();

        let admin = find_user("u1").unwrap().identity();
        let orders = store.list_for(&admin).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Completed);
        assert_eq!(orders[0].total, dec!(35.00));
    }

    #[test]
    fn test_seed_orders_skips_store_with_other_orders() {
        let store = MemoryOrderStore::new();
        store
            .create(NewOrder {
                owner: UserId::new("u2"),
                restaurant: "Spicy Tandoor".to_string(),
                item_count: 1,
                total: dec!(17.99),
            })
            .unwrap();
        seed_orders(&store).unwrap();

        let admin = find_user("u1").unwrap().identity();
        let orders = store.list_for(&admin).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Pending);
    }

    #[test]
    fn test_unknown_user() {
        assert!(matches!(find_user("u99"), Err(Error::UnknownUser(_))));
    }
}
