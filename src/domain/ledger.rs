//! In-memory ledger store.
//!
//! The ledger exposes a read-only query surface; all mutation happens through
//! the command dispatcher, which lives in the same crate and reaches the
//! `pub(crate)` fields directly.

use serde::{Deserialize, Serialize};

use super::holding::{Holding, Trade};
use super::order::Order;
use super::portfolio::Portfolio;
use super::sector::{SectorSlot, SECTOR_SLOTS};
use super::sref::SRef;
use super::stock::Stock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub(crate) portfolios: Vec<Portfolio>,
    pub(crate) stocks: Vec<Stock>,
    pub(crate) sectors: Vec<SectorSlot>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            portfolios: Vec::new(),
            stocks: Vec::new(),
            sectors: vec![SectorSlot::Empty; SECTOR_SLOTS],
        }
    }

    /// Portfolios in semantic order (Top-Portfolio moves one to the front).
    pub fn portfolios(&self) -> &[Portfolio] {
        &self.portfolios
    }

    pub fn stocks(&self) -> &[Stock] {
        &self.stocks
    }

    /// Portfolio lookup, case-insensitive on the name.
    pub fn portfolio(&self, name: &str) -> Option<&Portfolio> {
        self.portfolios
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn portfolio_index(&self, name: &str) -> Option<usize> {
        self.portfolios
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn stock(&self, sref: &SRef) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.sref == *sref)
    }

    pub(crate) fn stock_mut(&mut self, sref: &SRef) -> Option<&mut Stock> {
        self.stocks.iter_mut().find(|s| s.sref == *sref)
    }

    /// Holdings of a portfolio, optionally narrowed to one stock, ordered by
    /// purchase date (stable on insertion order for ties).
    pub fn holdings_of(&self, portfolio: &str, sref: Option<&SRef>) -> Vec<&Holding> {
        let mut holdings: Vec<&Holding> = match self.portfolio(portfolio) {
            Some(pf) => pf
                .holdings
                .iter()
                .filter(|h| sref.is_none_or(|s| h.sref == *s))
                .collect(),
            None => Vec::new(),
        };
        holdings.sort_by_key(|h| h.date);
        holdings
    }

    /// Trades of a portfolio, optionally narrowed to one stock, ordered by
    /// sale date.
    pub fn trades_of(&self, portfolio: &str, sref: Option<&SRef>) -> Vec<&Trade> {
        let mut trades: Vec<&Trade> = match self.portfolio(portfolio) {
            Some(pf) => pf
                .trades
                .iter()
                .filter(|t| sref.is_none_or(|s| t.holding.sref == *s))
                .collect(),
            None => Vec::new(),
        };
        trades.sort_by_key(|t| t.sold.date);
        trades
    }

    pub fn orders_of(&self, portfolio: &str, sref: Option<&SRef>) -> Vec<&Order> {
        match self.portfolio(portfolio) {
            Some(pf) => pf
                .orders
                .iter()
                .filter(|o| sref.is_none_or(|s| o.sref == *s))
                .collect(),
            None => Vec::new(),
        }
    }

    /// True if the id is in use as a purchase id anywhere in the ledger,
    /// either on an open holding or on a consumed lot.
    pub fn is_purchase_id(&self, id: &str) -> bool {
        self.portfolios.iter().any(|p| {
            p.holdings.iter().any(|h| h.purchase_id == id)
                || p.trades.iter().any(|t| t.holding.purchase_id == id)
        })
    }

    /// True if the id is in use as a trade id anywhere in the ledger.
    pub fn is_trade_id(&self, id: &str) -> bool {
        self.portfolios
            .iter()
            .any(|p| p.trades.iter().any(|t| t.sold.trade_id == id))
    }

    /// Any portfolio holding, trade, order or follow pointing at the stock.
    pub fn stock_referenced(&self, sref: &SRef) -> bool {
        self.portfolios.iter().any(|p| p.references(sref))
    }

    pub fn sector(&self, slot: usize) -> Option<&SectorSlot> {
        self.sectors.get(slot)
    }

    pub fn sectors(&self) -> &[SectorSlot] {
        &self.sectors
    }

    /// Deep copy for try-then-discard workflows.
    pub fn snapshot(&self) -> Ledger {
        self.clone()
    }

    /// Subset of the ledger restricted to the given stocks, for filtered
    /// export. Sector definitions are carried over wholesale.
    pub fn filtered(&self, symbols: &[SRef]) -> Ledger {
        let portfolios = self
            .portfolios
            .iter()
            .map(|p| Portfolio {
                name: p.name.clone(),
                followed: p
                    .followed
                    .iter()
                    .filter(|s| symbols.contains(s))
                    .cloned()
                    .collect(),
                holdings: p
                    .holdings
                    .iter()
                    .filter(|h| symbols.contains(&h.sref))
                    .cloned()
                    .collect(),
                trades: p
                    .trades
                    .iter()
                    .filter(|t| symbols.contains(&t.holding.sref))
                    .cloned()
                    .collect(),
                orders: p
                    .orders
                    .iter()
                    .filter(|o| symbols.contains(&o.sref))
                    .cloned()
                    .collect(),
            })
            .collect();

        Ledger {
            portfolios,
            stocks: self
                .stocks
                .iter()
                .filter(|s| symbols.contains(&s.sref))
                .cloned()
                .collect(),
            sectors: self.sectors.clone(),
        }
    }
}
