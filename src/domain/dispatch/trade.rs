//! Trade handlers: FIFO sale matching and rollback deletion.

use chrono::NaiveDate;

use super::{portfolio_index, require_stock};
use crate::domain::action::Action;
use crate::domain::error::LedgerError;
use crate::domain::fx;
use crate::domain::holding::{Sold, Trade};
use crate::domain::ledger::Ledger;

/// Record a sale. With an explicit PurchaseId the named lot is consumed;
/// without one, open lots are consumed oldest purchase date first. The last
/// lot touched may be split: a trade row carries the sold quantity while the
/// lot keeps the remainder.
pub(super) fn add(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?.clone();
    let date = action.date_of("Date")?;
    let units = action.decimal_of("Units")?;
    let trade_id = action.str_of("TradeId")?;
    let target_lot = action.opt_str("PurchaseId")?.map(str::to_string);

    require_stock(ledger, &sref)?;
    let index = portfolio_index(ledger, pf_name)?;
    if ledger.is_trade_id(trade_id) {
        return Err(LedgerError::Duplicate {
            what: "trade id",
            key: trade_id.to_string(),
        });
    }

    // Lots to consume, oldest first; all validation happens before the
    // first lot is touched.
    let lot_ids: Vec<String> = match &target_lot {
        Some(purchase_id) => {
            let pf = &ledger.portfolios[index];
            let lot = pf
                .holdings
                .iter()
                .find(|h| h.sref == sref && h.purchase_id == *purchase_id)
                .ok_or_else(|| LedgerError::NotFound {
                    what: "holding",
                    key: purchase_id.clone(),
                })?;
            if !fx::units_le(units, lot.units) {
                return Err(LedgerError::UnitMismatch {
                    reason: format!(
                        "sale of {units} units exceeds the {} open in lot {purchase_id}",
                        lot.units
                    ),
                });
            }
            vec![purchase_id.clone()]
        }
        None => {
            let pf = &ledger.portfolios[index];
            let open = pf.open_units(&sref);
            if !fx::units_le(units, open) {
                return Err(LedgerError::UnitMismatch {
                    reason: format!("sale of {units} units exceeds the {open} open for {sref}"),
                });
            }
            let mut lots: Vec<(NaiveDate, String)> = pf
                .holdings
                .iter()
                .filter(|h| h.sref == sref)
                .map(|h| (h.date, h.purchase_id.clone()))
                .collect();
            lots.sort_by_key(|(d, _)| *d);
            lots.into_iter().map(|(_, id)| id).collect()
        }
    };

    let sold = Sold {
        trade_id: trade_id.to_string(),
        date,
        price_per_unit: action.decimal_of("Price")?,
        fee_per_unit: action.decimal_of("Fee")?,
        note: String::new(),
    };

    let pf = &mut ledger.portfolios[index];
    let mut remaining = units;
    for purchase_id in lot_ids {
        if fx::is_drained(remaining) {
            break;
        }
        let Some(pos) = pf.holdings.iter().position(|h| h.purchase_id == purchase_id) else {
            continue;
        };
        if fx::units_le(pf.holdings[pos].units, remaining) {
            // Fully drained: the lot itself becomes a trade row.
            let lot = pf.holdings.remove(pos);
            remaining = fx::round3(remaining - lot.units);
            pf.trades.push(Trade {
                holding: lot,
                sold: sold.clone(),
            });
        } else {
            // Partially drained: split off a trade row for the sold
            // quantity, keep the remainder open.
            let mut portion = pf.holdings[pos].clone();
            portion.units = remaining;
            pf.holdings[pos].units = fx::round3(pf.holdings[pos].units - remaining);
            remaining = 0.0;
            pf.trades.push(Trade {
                holding: portion,
                sold: sold.clone(),
            });
        }
    }
    Ok(())
}

/// Delete all trade rows under one trade id, rolling the units back into
/// their lots. Rejected when a strictly newer trade exists for any affected
/// purchase id, which would break the FIFO lineage.
pub(super) fn delete(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let trade_id = action.str_of("TradeId")?;

    let index = ledger
        .portfolios
        .iter()
        .position(|p| p.trades.iter().any(|t| t.sold.trade_id == trade_id))
        .ok_or_else(|| LedgerError::NotFound {
            what: "trade",
            key: trade_id.to_string(),
        })?;

    {
        let pf = &ledger.portfolios[index];
        for row in pf.trades.iter().filter(|t| t.sold.trade_id == trade_id) {
            let newer_exists = pf.trades.iter().any(|t| {
                t.holding.purchase_id == row.holding.purchase_id
                    && t.sold.trade_id != trade_id
                    && t.sold.date > row.sold.date
            });
            if newer_exists {
                return Err(LedgerError::StateConflict {
                    reason: format!(
                        "a newer trade exists for purchase {}; delete it first",
                        row.holding.purchase_id
                    ),
                });
            }
        }
    }

    let pf = &mut ledger.portfolios[index];
    let mut removed = Vec::new();
    pf.trades.retain(|t| {
        if t.sold.trade_id == trade_id {
            removed.push(t.clone());
            false
        } else {
            true
        }
    });
    for row in removed {
        match pf
            .holdings
            .iter_mut()
            .find(|h| h.purchase_id == row.holding.purchase_id)
        {
            // Lot still open: return the sold units to it.
            Some(lot) => lot.units = fx::round3(lot.units + row.holding.units),
            // Lot fully consumed earlier: resurrect it from the trade row.
            None => pf.holdings.push(row.holding),
        }
    }
    Ok(())
}

pub(super) fn note(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let trade_id = action.str_of("TradeId")?;
    let text = action.str_of("Note")?.to_string();

    let mut found = false;
    for pf in &mut ledger.portfolios {
        for t in pf.trades.iter_mut().filter(|t| t.sold.trade_id == trade_id) {
            t.sold.note = text.clone();
            found = true;
        }
    }
    if !found {
        return Err(LedgerError::NotFound {
            what: "trade",
            key: trade_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::domain::dispatch::execute;
    use crate::domain::error::LedgerError;
    use crate::domain::fx;
    use crate::domain::ledger::Ledger;
    use crate::domain::sref::SRef;

    fn setup() -> Ledger {
        let mut ledger = Ledger::new();
        execute(&mut ledger, "Add-Portfolio Name=Main").unwrap();
        execute(&mut ledger, "Add-Stock SRef=[NASDAQ$X] Name=X").unwrap();
        ledger
    }

    fn buy(ledger: &mut Ledger, pid: &str, date: &str, units: f64) {
        execute(
            ledger,
            &format!(
                "Add-Holding PfName=Main SRef=[NASDAQ$X] PurchaseId={pid} Date={date} Units={units} Price=5 Fee=0 Rate=1"
            ),
        )
        .unwrap();
    }

    fn sell(ledger: &mut Ledger, tid: &str, date: &str, units: f64) -> Result<(), LedgerError> {
        execute(
            ledger,
            &format!(
                "Add-Trade PfName=Main SRef=[NASDAQ$X] Date={date} Units={units} Price=7 Fee=0 TradeId={tid}"
            ),
        )
    }

    #[test]
    fn fifo_partial_sale_splits_oldest_lot() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        sell(&mut ledger, "T1", "2023-02-01", 4.0).unwrap();

        let x = SRef::new("NASDAQ", "X");
        let holdings = ledger.holdings_of("Main", Some(&x));
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].units, 6.0);
        assert_eq!(holdings[0].purchase_id, "P1");

        let trades = ledger.trades_of("Main", Some(&x));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].holding.units, 4.0);
        assert_eq!(trades[0].holding.purchase_id, "P1");
        assert_eq!(trades[0].sold.trade_id, "T1");
        assert_eq!(trades[0].sold.price_per_unit, 7.0);
    }

    #[test]
    fn fifo_consumes_oldest_lot_first() {
        let mut ledger = setup();
        buy(&mut ledger, "P2", "2023-01-10", 5.0);
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        sell(&mut ledger, "T1", "2023-02-01", 12.0).unwrap();

        let x = SRef::new("NASDAQ", "X");
        let holdings = ledger.holdings_of("Main", Some(&x));
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].purchase_id, "P2");
        assert_eq!(holdings[0].units, 3.0);

        // Two trade rows under one trade id: P1 in full, 2 units of P2.
        let trades = ledger.trades_of("Main", Some(&x));
        assert_eq!(trades.len(), 2);
        assert!(trades.iter().all(|t| t.sold.trade_id == "T1"));
        let p1_row = trades
            .iter()
            .find(|t| t.holding.purchase_id == "P1")
            .unwrap();
        assert_eq!(p1_row.holding.units, 10.0);
        let p2_row = trades
            .iter()
            .find(|t| t.holding.purchase_id == "P2")
            .unwrap();
        assert_eq!(p2_row.holding.units, 2.0);
    }

    #[test]
    fn sale_exceeding_open_units_fails_before_mutation() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        let before = ledger.snapshot();
        let err = sell(&mut ledger, "T1", "2023-02-01", 11.0).unwrap_err();
        assert!(matches!(err, LedgerError::UnitMismatch { .. }));
        assert_eq!(ledger, before);
    }

    #[test]
    fn near_exact_sale_drains_the_lot() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        // Within the consumption tolerance of a full drain.
        sell(&mut ledger, "T1", "2023-02-01", 9.9995).unwrap();
        let x = SRef::new("NASDAQ", "X");
        assert!(ledger.holdings_of("Main", Some(&x)).is_empty());
    }

    #[test]
    fn targeted_sale_consumes_named_lot_only() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        buy(&mut ledger, "P2", "2023-01-10", 5.0);
        execute(
            &mut ledger,
            "Add-Trade PfName=Main SRef=[NASDAQ$X] Date=2023-02-01 Units=3 Price=7 Fee=0 TradeId=T1 PurchaseId=P2",
        )
        .unwrap();

        let x = SRef::new("NASDAQ", "X");
        let holdings = ledger.holdings_of("Main", Some(&x));
        assert_eq!(holdings[0].units, 10.0); // P1 untouched
        assert_eq!(holdings[1].units, 2.0);
    }

    #[test]
    fn targeted_sale_cannot_exceed_the_lot() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        buy(&mut ledger, "P2", "2023-01-10", 5.0);
        let err = execute(
            &mut ledger,
            "Add-Trade PfName=Main SRef=[NASDAQ$X] Date=2023-02-01 Units=6 Price=7 Fee=0 TradeId=T1 PurchaseId=P2",
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::UnitMismatch { .. }));
    }

    #[test]
    fn duplicate_trade_id_rejected() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        sell(&mut ledger, "T1", "2023-02-01", 2.0).unwrap();
        let err = sell(&mut ledger, "T1", "2023-03-01", 2.0).unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate { .. }));
    }

    #[test]
    fn delete_returns_units_to_open_lot() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        sell(&mut ledger, "T1", "2023-02-01", 4.0).unwrap();
        execute(&mut ledger, "Delete-Trade TradeId=T1").unwrap();

        let x = SRef::new("NASDAQ", "X");
        let holdings = ledger.holdings_of("Main", Some(&x));
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].units, 10.0);
        assert!(ledger.trades_of("Main", Some(&x)).is_empty());
        assert!(!ledger.is_trade_id("T1"));
    }

    #[test]
    fn delete_resurrects_fully_consumed_lot() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        sell(&mut ledger, "T1", "2023-02-01", 10.0).unwrap();

        let x = SRef::new("NASDAQ", "X");
        assert!(ledger.holdings_of("Main", Some(&x)).is_empty());

        execute(&mut ledger, "Delete-Trade TradeId=T1").unwrap();
        let holdings = ledger.holdings_of("Main", Some(&x));
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].purchase_id, "P1");
        assert_eq!(holdings[0].units, 10.0);
    }

    #[test]
    fn delete_out_of_order_is_rejected() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        sell(&mut ledger, "T1", "2023-02-01", 4.0).unwrap();
        sell(&mut ledger, "T2", "2023-03-01", 4.0).unwrap();

        let err = execute(&mut ledger, "Delete-Trade TradeId=T1").unwrap_err();
        assert!(matches!(err, LedgerError::StateConflict { .. }));

        // Newest first is fine.
        execute(&mut ledger, "Delete-Trade TradeId=T2").unwrap();
        execute(&mut ledger, "Delete-Trade TradeId=T1").unwrap();
        let x = SRef::new("NASDAQ", "X");
        let total: f64 = ledger
            .holdings_of("Main", Some(&x))
            .iter()
            .map(|h| h.units)
            .sum();
        assert!(fx::units_eq(total, 10.0));
    }

    #[test]
    fn note_applies_to_all_rows_of_the_sale() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0);
        buy(&mut ledger, "P2", "2023-01-10", 5.0);
        sell(&mut ledger, "T1", "2023-02-01", 12.0).unwrap();
        execute(&mut ledger, "Note-Trade TradeId=T1 Note=[rebalance sale]").unwrap();

        let x = SRef::new("NASDAQ", "X");
        let trades = ledger.trades_of("Main", Some(&x));
        assert_eq!(trades.len(), 2);
        assert!(trades.iter().all(|t| t.sold.note == "rebalance sale"));
    }
}
