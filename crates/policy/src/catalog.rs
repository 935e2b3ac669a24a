//! Region lock for restaurant listings.

use serde::{Deserialize, Serialize};

use crate::{Error, Identity, Region, Result};

/// A restaurant as shown in the catalog. Reference data, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantListing {
    pub id: String,
    pub name: String,
    pub region: Region,
    pub cuisine: String,
    pub rating: f32,
    pub delivery_time: String,
    pub price_range: String,
}

/// Listings visible to `identity`, in their original order.
///
/// An actor scoped to [`Region::All`] sees everything. Anyone else sees
/// exactly the listings of their own region.
pub fn visible_listings<'a>(
    identity: &Identity,
    listings: &'a [RestaurantListing],
) -> Vec<&'a RestaurantListing> {
    match identity.region() {
        Region::All => listings.iter().collect(),
        region @ (Region::India | Region::America) => {
            listings.iter().filter(|l| l.region == region).collect()
        }
    }
}

/// Validated set of restaurant listings.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    listings: Vec<RestaurantListing>,
}

impl Catalog {
    /// Build a catalog, rejecting listings without a concrete region.
    pub fn new(listings: Vec<RestaurantListing>) -> Result<Self> {
        if let Some(bad) = listings.iter().find(|l| l.region == Region::All) {
            return Err(Error::Invalid(format!(
                "restaurant '{}' must belong to a single region",
                bad.id
            )));
        }
        Ok(Self { listings })
    }

    pub fn listings(&self) -> &[RestaurantListing] {
        &self.listings
    }

    pub fn get(&self, id: &str) -> Option<&RestaurantListing> {
        self.listings.iter().find(|l| l.id == id)
    }

    pub fn visible_to(&self, identity: &Identity) -> Vec<&RestaurantListing> {
        visible_listings(identity, &self.listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, UserId};

    fn listing(id: &str, region: Region) -> RestaurantListing {
        RestaurantListing {
            id: id.to_string(),
            name: format!("Restaurant {id}"),
            region,
            cuisine: "Test".to_string(),
            rating: 4.0,
            delivery_time: "20-30 min".to_string(),
            price_range: "$$".to_string(),
        }
    }

    fn sample() -> Vec<RestaurantListing> {
        vec![
            listing("r1", Region::India),
            listing("r4", Region::America),
            listing("r2", Region::India),
            listing("r5", Region::America),
        ]
    }

    fn ids(listings: &[&RestaurantListing]) -> Vec<String> {
        listings.iter().map(|l| l.id.clone()).collect()
    }

    #[test]
    fn test_all_scope_sees_everything_in_order() {
        let admin = Identity::new(UserId::new("u1"), Role::Admin, Region::All);
        let all = sample();
        assert_eq!(ids(&visible_listings(&admin, &all)), ["r1", "r4", "r2", "r5"]);
    }

    #[test]
    fn test_region_lock_filters_and_keeps_order() {
        let all = sample();
        for role in [Role::Admin, Role::Manager, Role::Member] {
            let india = Identity::new(UserId::new("x"), role, Region::India);
            assert_eq!(ids(&visible_listings(&india, &all)), ["r1", "r2"]);

            let america = Identity::new(UserId::new("y"), role, Region::America);
            assert_eq!(ids(&visible_listings(&america, &all)), ["r4", "r5"]);
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let member = Identity::new(UserId::new("u4"), Role::Member, Region::India);
        assert!(visible_listings(&member, &[]).is_empty());
    }

    #[test]
    fn test_catalog_rejects_listing_in_all_regions() {
        let mut listings = sample();
        listings.push(listing("r9", Region::All));
        assert!(matches!(Catalog::new(listings), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = Catalog::new(sample()).unwrap();
        assert_eq!(catalog.get("r4").map(|l| l.region), Some(Region::America));
        assert!(catalog.get("r404").is_none());
    }
}
