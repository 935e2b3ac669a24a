//! Order totals.
//!
//! A total is built in a fixed order so the same cart always prices to the
//! same amount:
//!
//! 1. subtotal = sum of `unit_price * quantity`
//! 2. plus the flat delivery fee
//! 3. plus tax, computed on the subtotal and rounded to cents
//!    (midpoint away from zero)

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One priced line of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(unit_price: Decimal, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }
}

/// Surcharges applied on top of the subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    /// Flat fee added to every order.
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: Decimal,

    /// Tax as a fraction of the subtotal (`0.08` is 8%).
    #[serde(default)]
    pub tax_rate: Decimal,
}

fn default_delivery_fee() -> Decimal {
    Decimal::new(200, 2)
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            delivery_fee: default_delivery_fee(),
            tax_rate: Decimal::ZERO,
        }
    }
}

/// Breakdown of a priced cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Pricing {
    pub fn validate(&self) -> Result<()> {
        if is_negative(self.delivery_fee) {
            return Err(Error::Invalid(format!(
                "delivery fee must not be negative (got {})",
                self.delivery_fee
            )));
        }
        if is_negative(self.tax_rate) {
            return Err(Error::Invalid(format!(
                "tax rate must not be negative (got {})",
                self.tax_rate
            )));
        }
        Ok(())
    }

    /// Price a cart.
    ///
    /// Fails on an empty cart, a zero quantity or a negative unit price.
    pub fn compute_order_total(&self, lines: &[CartLine]) -> Result<Quote> {
        if lines.is_empty() {
            return Err(Error::Invalid("cart is empty".to_string()));
        }

        let mut subtotal = Decimal::ZERO;
        for (i, line) in lines.iter().enumerate() {
            if line.quantity == 0 {
                return Err(Error::Invalid(format!("line {i}: quantity must be at least 1")));
            }
            if is_negative(line.unit_price) {
                return Err(Error::Invalid(format!(
                    "line {i}: unit price must not be negative (got {})",
                    line.unit_price
                )));
            }
            subtotal = line
                .unit_price
                .checked_mul(Decimal::from(line.quantity))
                .and_then(|amount| subtotal.checked_add(amount))
                .ok_or_else(overflow)?;
        }

        let tax = subtotal
            .checked_mul(self.tax_rate)
            .ok_or_else(overflow)?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let total = subtotal
            .checked_add(self.delivery_fee)
            .and_then(|t| t.checked_add(tax))
            .ok_or_else(overflow)?;

        Ok(Quote {
            subtotal,
            delivery_fee: self.delivery_fee,
            tax,
            total,
        })
    }
}

/// Strictly below zero. `-0` counts as zero.
fn is_negative(amount: Decimal) -> bool {
    amount.is_sign_negative() && !amount.is_zero()
}

fn overflow() -> Error {
    Error::Invalid("order total out of range".to_string())
}
