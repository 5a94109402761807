//! Open purchase lots, sale records and dividends.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::sref::SRef;

/// One dividend payment attached to a holding or trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    pub ex_date: NaiveDate,
    pub pay_date: NaiveDate,
    /// Units of the owning record at distribution time.
    pub units: f64,
    /// Payment per unit.
    pub per_unit: f64,
    pub rate: f64,
}

/// An open purchase lot awaiting full or partial sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub sref: SRef,
    pub purchase_id: String,
    pub date: NaiveDate,
    pub units: f64,
    /// Units originally purchased; preserved across stock splits.
    pub original_units: f64,
    pub price_per_unit: f64,
    pub fee_per_unit: f64,
    pub rate: f64,
    pub note: String,
    pub dividends: Vec<Dividend>,
}

impl Holding {
    pub fn has_dividend_on(&self, ex_date: NaiveDate) -> bool {
        self.dividends.iter().any(|d| d.ex_date == ex_date)
    }
}

/// Sale attributes attached to a consumed lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sold {
    pub trade_id: String,
    pub date: NaiveDate,
    pub price_per_unit: f64,
    pub fee_per_unit: f64,
    pub note: String,
}

/// A sold lot (or a split portion of one). Retains every original purchase
/// attribute alongside the sale record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub holding: Holding,
    pub sold: Sold,
}
