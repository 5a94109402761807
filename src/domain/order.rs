//! Pending buy/sell orders.

use serde::{Deserialize, Serialize};

use super::fx;
use super::sref::SRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Buy,
    Sell,
}

/// Pending order. Identity within a portfolio is the (SRef, price) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub sref: SRef,
    pub kind: OrderKind,
    pub units: f64,
    pub price_per_unit: f64,
}

impl Order {
    pub fn matches(&self, sref: &SRef, price_per_unit: f64) -> bool {
        self.sref == *sref && fx::units_eq(self.price_per_unit, price_per_unit)
    }
}
