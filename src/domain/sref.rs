//! Stock reference key: `{market}${symbol}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market name reserved for retired stocks. Closing a stock re-points its
/// reference here so history stays addressable.
pub const CLOSED_MARKET: &str = "CLOSED";

/// Composite stock key, rendered as `NASDAQ$MSFT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SRef {
    pub market: String,
    pub symbol: String,
}

impl SRef {
    pub fn new(market: &str, symbol: &str) -> Self {
        SRef {
            market: market.to_string(),
            symbol: symbol.to_string(),
        }
    }

    /// The same symbol under the reserved `CLOSED` market.
    pub fn closed(&self) -> SRef {
        SRef::new(CLOSED_MARKET, &self.symbol)
    }

    pub fn is_closed(&self) -> bool {
        self.market == CLOSED_MARKET
    }
}

impl fmt::Display for SRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.market, self.symbol)
    }
}

impl FromStr for SRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (market, symbol) = s
            .split_once('$')
            .ok_or_else(|| format!("'{s}' is not of the form MARKET$SYMBOL"))?;
        if market.is_empty() || symbol.is_empty() {
            return Err(format!("'{s}' has an empty market or symbol"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(format!("'{s}' contains whitespace"));
        }
        if symbol.contains('$') {
            return Err(format!("'{s}' contains more than one '$'"));
        }
        Ok(SRef::new(market, symbol))
    }
}
