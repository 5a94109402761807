//! Broker transaction CSV import.
//!
//! Reads exported broker rows and renders the equivalent command lines. The
//! adapter never mutates the ledger itself; the caller decides whether to
//! dispatch the rendered commands.

use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::sref::SRef;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Buy,
    Sell,
    Dividend,
    Round,
    Close,
}

/// One broker row. Column presence depends on the kind; `to_command`
/// enforces what each kind needs.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerTransaction {
    pub kind: TxKind,
    pub uid: String,
    pub sref: String,
    pub date: NaiveDate,
    pub units: Option<f64>,
    pub price: Option<f64>,
    pub fee: Option<f64>,
    pub rate: Option<f64>,
    pub pay_date: Option<NaiveDate>,
    pub note: Option<String>,
}

pub fn read_transactions<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<BrokerTransaction>, LedgerError> {
    let mut rdr = csv::Reader::from_path(path.as_ref()).map_err(|e| LedgerError::Import {
        row: 0,
        reason: format!("open {}: {e}", path.as_ref().display()),
    })?;
    let mut rows = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let tx: BrokerTransaction = result.map_err(|e| LedgerError::Import {
            row: index + 1,
            reason: e.to_string(),
        })?;
        rows.push(tx);
    }
    Ok(rows)
}

/// Render the command line equivalent to one broker row, after checking the
/// row's uid against ids already present in the ledger.
pub fn to_command(
    tx: &BrokerTransaction,
    portfolio: &str,
    ledger: &Ledger,
) -> Result<String, LedgerError> {
    let sref: SRef = tx.sref.parse().map_err(|reason| LedgerError::Validation {
        param: "sref".to_string(),
        reason,
    })?;

    match tx.kind {
        TxKind::Buy => {
            if ledger.is_purchase_id(&tx.uid) {
                return Err(LedgerError::Duplicate {
                    what: "purchase id",
                    key: tx.uid.clone(),
                });
            }
            let units = require(tx, "units", tx.units)?;
            let price = require(tx, "price", tx.price)?;
            let fee = tx.fee.unwrap_or(0.0);
            let rate = tx.rate.unwrap_or(1.0);
            let mut line = format!(
                "Add-Holding PfName={} SRef={sref} PurchaseId={} Date={} Units={units} Price={price} Fee={fee} Rate={rate}",
                quote(portfolio),
                quote(&tx.uid),
                tx.date,
            );
            if let Some(note) = tx.note.as_deref().filter(|n| !n.is_empty()) {
                line.push_str(&format!(" Note=[{note}]"));
            }
            Ok(line)
        }
        TxKind::Sell => {
            if ledger.is_trade_id(&tx.uid) {
                return Err(LedgerError::Duplicate {
                    what: "trade id",
                    key: tx.uid.clone(),
                });
            }
            let units = require(tx, "units", tx.units)?;
            let price = require(tx, "price", tx.price)?;
            let fee = tx.fee.unwrap_or(0.0);
            Ok(format!(
                "Add-Trade PfName={} SRef={sref} Date={} Units={units} Price={price} Fee={fee} TradeId={}",
                quote(portfolio),
                tx.date,
                quote(&tx.uid),
            ))
        }
        TxKind::Dividend => {
            let units = require(tx, "units", tx.units)?;
            let amount = require(tx, "price", tx.price)?;
            let pay_date = tx.pay_date.ok_or_else(|| missing(tx, "pay_date"))?;
            let mut line = format!(
                "Add-Divident PfName={} SRef={sref} ExDate={} PayDate={pay_date} Units={units} Amount={amount}",
                quote(portfolio),
                tx.date,
            );
            if let Some(rate) = tx.rate {
                line.push_str(&format!(" Rate={rate}"));
            }
            Ok(line)
        }
        TxKind::Round => {
            if ledger.is_trade_id(&tx.uid) {
                return Err(LedgerError::Duplicate {
                    what: "trade id",
                    key: tx.uid.clone(),
                });
            }
            let price = require(tx, "price", tx.price)?;
            Ok(format!(
                "Round-Holding PfName={} SRef={sref} TradeId={} Date={} Price={price}",
                quote(portfolio),
                quote(&tx.uid),
                tx.date,
            ))
        }
        TxKind::Close => Ok(format!("Close-Stock SRef={sref} Date={}", tx.date)),
    }
}

fn require(tx: &BrokerTransaction, name: &str, value: Option<f64>) -> Result<f64, LedgerError> {
    value.ok_or_else(|| missing(tx, name))
}

fn missing(tx: &BrokerTransaction, name: &str) -> LedgerError {
    LedgerError::Validation {
        param: name.to_string(),
        reason: format!("required for a {:?} row (uid {})", tx.kind, tx.uid),
    }
}

/// Bracket-quote a value when the plain token form would not survive the
/// command tokenizer.
fn quote(value: &str) -> String {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        format!("[{value}]")
    } else {
        value.to_string()
    }
}
