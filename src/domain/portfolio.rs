//! Portfolio: followed stocks, open lots, closed trades and pending orders.

use serde::{Deserialize, Serialize};

use super::holding::{Holding, Trade};
use super::order::Order;
use super::sref::SRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub name: String,
    pub followed: Vec<SRef>,
    pub holdings: Vec<Holding>,
    pub trades: Vec<Trade>,
    pub orders: Vec<Order>,
}

impl Portfolio {
    pub fn new(name: &str) -> Self {
        Portfolio {
            name: name.to_string(),
            followed: Vec::new(),
            holdings: Vec::new(),
            trades: Vec::new(),
            orders: Vec::new(),
        }
    }

    pub fn follows(&self, sref: &SRef) -> bool {
        self.followed.contains(sref)
    }

    /// Any holding, trade, order or follow pointing at the stock.
    pub fn references(&self, sref: &SRef) -> bool {
        self.follows(sref)
            || self.holdings.iter().any(|h| h.sref == *sref)
            || self.trades.iter().any(|t| t.holding.sref == *sref)
            || self.orders.iter().any(|o| o.sref == *sref)
    }

    /// Open units held for a stock.
    pub fn open_units(&self, sref: &SRef) -> f64 {
        self.holdings
            .iter()
            .filter(|h| h.sref == *sref)
            .map(|h| h.units)
            .sum()
    }
}
