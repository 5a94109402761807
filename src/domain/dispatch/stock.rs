//! Stock handlers: master data, splits, closure and follow references.

use super::{portfolio_index, require_name, require_stock};
use crate::domain::action::Action;
use crate::domain::error::LedgerError;
use crate::domain::fx;
use crate::domain::holding::{Sold, Trade};
use crate::domain::ledger::Ledger;
use crate::domain::sref::SRef;
use crate::domain::stock::Stock;

pub(super) fn add(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?;
    let name = action.str_of("Name")?;
    require_name("Name", name)?;
    if sref.is_closed() {
        return Err(LedgerError::Validation {
            param: "SRef".to_string(),
            reason: "the CLOSED market is reserved".to_string(),
        });
    }
    if ledger.stock(sref).is_some() {
        return Err(LedgerError::Duplicate {
            what: "stock",
            key: sref.to_string(),
        });
    }
    ledger.stocks.push(Stock::new(sref.clone(), name));
    Ok(())
}

/// Re-point a stock's reference across the whole ledger. Every validation
/// happens before the first record is touched.
pub(super) fn edit(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?.clone();
    let new_sref = action.sref_of("NewSRef")?.clone();
    let new_name = action.opt_str("NewName")?;

    require_stock(ledger, &sref)?;
    if new_sref.is_closed() {
        return Err(LedgerError::Validation {
            param: "NewSRef".to_string(),
            reason: "the CLOSED market is reserved".to_string(),
        });
    }
    if new_sref != sref && ledger.stock(&new_sref).is_some() {
        return Err(LedgerError::Duplicate {
            what: "stock",
            key: new_sref.to_string(),
        });
    }

    remap(ledger, &sref, &new_sref);
    if let Some(stock) = ledger.stock_mut(&new_sref) {
        if let Some(name) = new_name {
            stock.name = name.to_string();
        }
    }
    Ok(())
}

pub(super) fn delete(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?;
    require_stock(ledger, sref)?;
    if ledger.stock_referenced(sref) {
        return Err(LedgerError::StateConflict {
            reason: format!("stock {sref} is still referenced by a portfolio"),
        });
    }
    ledger.stocks.retain(|s| s.sref != *sref);
    Ok(())
}

/// Full teardown: removes the stock and every trace of it in every
/// portfolio. Intentionally bypasses the reference guard.
pub(super) fn delete_all(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?;
    require_stock(ledger, sref)?;
    for pf in &mut ledger.portfolios {
        pf.followed.retain(|s| s != sref);
        pf.holdings.retain(|h| h.sref != *sref);
        pf.trades.retain(|t| t.holding.sref != *sref);
        pf.orders.retain(|o| o.sref != *sref);
    }
    ledger.stocks.retain(|s| s.sref != *sref);
    Ok(())
}

/// Stock split: units divide by the factor; per-unit prices, fees and
/// historical dividend payments multiply by it. Factor 1 is a no-op.
pub(super) fn split(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?;
    let factor = action.decimal_of("Factor")?;
    require_stock(ledger, sref)?;
    if fx::units_eq(factor, 1.0) {
        return Ok(());
    }
    for pf in &mut ledger.portfolios {
        for h in pf.holdings.iter_mut().filter(|h| h.sref == *sref) {
            h.units = fx::round3(h.units / factor);
            h.price_per_unit = fx::round3(h.price_per_unit * factor);
            h.fee_per_unit = fx::round3(h.fee_per_unit * factor);
            for d in &mut h.dividends {
                d.per_unit = fx::round3(d.per_unit * factor);
            }
        }
    }
    Ok(())
}

/// Close a stock: liquidate every open lot at book value and re-point the
/// reference to the reserved CLOSED market so history stays addressable.
pub(super) fn close(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?.clone();
    let date = action.date_of("Date")?;

    require_stock(ledger, &sref)?;
    if sref.is_closed() {
        return Err(LedgerError::StateConflict {
            reason: format!("stock {sref} is already closed"),
        });
    }
    let closed = sref.closed();
    if ledger.stock(&closed).is_some() {
        return Err(LedgerError::StateConflict {
            reason: format!("a closed stock {closed} already exists"),
        });
    }
    // Synthetic trade ids must be free before anything is mutated.
    for pf in &ledger.portfolios {
        for h in pf.holdings.iter().filter(|h| h.sref == sref) {
            let trade_id = closing_trade_id(&h.purchase_id);
            if ledger.is_trade_id(&trade_id) {
                return Err(LedgerError::StateConflict {
                    reason: format!("closing trade id {trade_id} is already in use"),
                });
            }
        }
    }

    for pf in &mut ledger.portfolios {
        let mut kept = Vec::with_capacity(pf.holdings.len());
        for h in pf.holdings.drain(..) {
            if h.sref == sref {
                let sold = Sold {
                    trade_id: closing_trade_id(&h.purchase_id),
                    date,
                    price_per_unit: fx::round5(h.price_per_unit + h.fee_per_unit),
                    fee_per_unit: 0.0,
                    note: "closed".to_string(),
                };
                pf.trades.push(Trade { holding: h, sold });
            } else {
                kept.push(h);
            }
        }
        pf.holdings = kept;
    }
    remap(ledger, &sref, &closed);
    Ok(())
}

pub(super) fn follow(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?;
    require_stock(ledger, sref)?;
    let index = portfolio_index(ledger, pf_name)?;
    let pf = &mut ledger.portfolios[index];
    if pf.follows(sref) {
        return Err(LedgerError::Duplicate {
            what: "follow",
            key: sref.to_string(),
        });
    }
    pf.followed.push(sref.clone());
    Ok(())
}

pub(super) fn unfollow(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?;
    let index = portfolio_index(ledger, pf_name)?;
    let pf = &mut ledger.portfolios[index];
    if !pf.follows(sref) {
        return Err(LedgerError::NotFound {
            what: "follow",
            key: sref.to_string(),
        });
    }
    pf.followed.retain(|s| s != sref);
    Ok(())
}

/// Assign (or clear, when FieldId is absent) the stock's field reference in
/// one sector slot.
pub(super) fn set_sector(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?.clone();
    let slot = action.uint_of("SectorId")?;
    let field = action.opt_uint("FieldId")?;

    require_stock(ledger, &sref)?;
    let sector = ledger.sector(slot).ok_or(LedgerError::NotFound {
        what: "sector",
        key: slot.to_string(),
    })?;
    if sector.is_empty() {
        return Err(LedgerError::NotFound {
            what: "sector",
            key: slot.to_string(),
        });
    }
    if let Some(field) = field {
        if sector.field(field).is_none() {
            return Err(LedgerError::NotFound {
                what: "sector field",
                key: format!("{slot}/{field}"),
            });
        }
    }
    if let Some(stock) = ledger.stock_mut(&sref) {
        stock.sectors[slot] = field;
    }
    Ok(())
}

fn closing_trade_id(purchase_id: &str) -> String {
    format!("{purchase_id}.C")
}

/// Rewrite every occurrence of a stock reference, ledger wide.
fn remap(ledger: &mut Ledger, from: &SRef, to: &SRef) {
    if let Some(stock) = ledger.stock_mut(from) {
        stock.sref = to.clone();
    }
    for pf in &mut ledger.portfolios {
        for s in pf.followed.iter_mut().filter(|s| *s == from) {
            *s = to.clone();
        }
        for h in pf.holdings.iter_mut().filter(|h| h.sref == *from) {
            h.sref = to.clone();
        }
        for t in pf.trades.iter_mut().filter(|t| t.holding.sref == *from) {
            t.holding.sref = to.clone();
        }
        for o in pf.orders.iter_mut().filter(|o| o.sref == *from) {
            o.sref = to.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::dispatch::execute;
    use crate::domain::error::LedgerError;
    use crate::domain::ledger::Ledger;
    use crate::domain::sref::SRef;

    fn setup() -> Ledger {
        let mut ledger = Ledger::new();
        execute(&mut ledger, "Add-Portfolio Name=Main").unwrap();
        execute(&mut ledger, "Add-Stock SRef=[NASDAQ$X] Name=X").unwrap();
        ledger
    }

    fn buy(ledger: &mut Ledger, pid: &str, date: &str, units: f64, price: f64) {
        execute(
            ledger,
            &format!(
                "Add-Holding PfName=Main SRef=[NASDAQ$X] PurchaseId={pid} Date={date} Units={units} Price={price} Fee=0 Rate=1"
            ),
        )
        .unwrap();
    }

    #[test]
    fn add_rejects_duplicates_and_reserved_market() {
        let mut ledger = setup();
        assert!(matches!(
            execute(&mut ledger, "Add-Stock SRef=[NASDAQ$X] Name=X").unwrap_err(),
            LedgerError::Duplicate { .. }
        ));
        assert!(matches!(
            execute(&mut ledger, "Add-Stock SRef=[CLOSED$Y] Name=Y").unwrap_err(),
            LedgerError::Validation { .. }
        ));
    }

    #[test]
    fn edit_repoints_every_reference() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0, 5.0);
        execute(&mut ledger, "Follow-Stock PfName=Main SRef=[NASDAQ$X]").unwrap();
        execute(
            &mut ledger,
            "Add-Order PfName=Main SRef=[NASDAQ$X] Kind=Buy Units=5 Price=4",
        )
        .unwrap();

        execute(
            &mut ledger,
            "Edit-Stock SRef=[NASDAQ$X] NewSRef=[NYSE$X] NewName=[X Corp]",
        )
        .unwrap();

        let new = SRef::new("NYSE", "X");
        assert_eq!(ledger.stock(&new).unwrap().name, "X Corp");
        assert!(ledger.stock(&SRef::new("NASDAQ", "X")).is_none());
        let pf = ledger.portfolio("Main").unwrap();
        assert!(pf.followed.contains(&new));
        assert!(pf.holdings.iter().all(|h| h.sref == new));
        assert!(pf.orders.iter().all(|o| o.sref == new));
    }

    #[test]
    fn edit_rejects_collision() {
        let mut ledger = setup();
        execute(&mut ledger, "Add-Stock SRef=[NYSE$Y] Name=Y").unwrap();
        let err = execute(&mut ledger, "Edit-Stock SRef=[NASDAQ$X] NewSRef=[NYSE$Y]").unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate { .. }));
    }

    #[test]
    fn delete_guarded_but_delete_all_removes_all_trace() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0, 5.0);
        execute(&mut ledger, "Follow-Stock PfName=Main SRef=[NASDAQ$X]").unwrap();

        assert!(matches!(
            execute(&mut ledger, "Delete-Stock SRef=[NASDAQ$X]").unwrap_err(),
            LedgerError::StateConflict { .. }
        ));

        execute(&mut ledger, "DeleteAll-Stock SRef=[NASDAQ$X]").unwrap();
        let x = SRef::new("NASDAQ", "X");
        assert!(ledger.stock(&x).is_none());
        assert!(!ledger.stock_referenced(&x));
    }

    #[test]
    fn delete_succeeds_once_unreferenced() {
        let mut ledger = setup();
        execute(&mut ledger, "Follow-Stock PfName=Main SRef=[NASDAQ$X]").unwrap();
        execute(&mut ledger, "Unfollow-Stock PfName=Main SRef=[NASDAQ$X]").unwrap();
        execute(&mut ledger, "Delete-Stock SRef=[NASDAQ$X]").unwrap();
        assert!(ledger.stock(&SRef::new("NASDAQ", "X")).is_none());
    }

    #[test]
    fn split_scales_units_prices_and_dividends() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0, 5.0);
        execute(
            &mut ledger,
            "Add-Divident PfName=Main SRef=[NASDAQ$X] ExDate=2023-02-01 PayDate=2023-02-15 Units=10 Amount=0.5",
        )
        .unwrap();

        execute(&mut ledger, "Split-Stock SRef=[NASDAQ$X] Factor=0.5").unwrap();

        let x = SRef::new("NASDAQ", "X");
        let holdings = ledger.holdings_of("Main", Some(&x));
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].units, 20.0);
        assert_eq!(holdings[0].price_per_unit, 2.5);
        assert_eq!(holdings[0].original_units, 10.0); // preserved
        assert_eq!(holdings[0].dividends[0].per_unit, 0.25);
    }

    #[test]
    fn split_factor_one_is_a_noop() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", "2023-01-01", 10.0, 5.0);
        let before = ledger.snapshot();
        execute(&mut ledger, "Split-Stock SRef=[NASDAQ$X] Factor=1").unwrap();
        assert_eq!(ledger, before);
    }

    #[test]
    fn close_liquidates_at_book_value_and_remaps() {
        let mut ledger = setup();
        execute(
            &mut ledger,
            "Add-Holding PfName=Main SRef=[NASDAQ$X] PurchaseId=P1 Date=2023-01-01 Units=10 Price=5 Fee=0.25 Rate=1",
        )
        .unwrap();

        execute(&mut ledger, "Close-Stock SRef=[NASDAQ$X] Date=2023-06-30").unwrap();

        let closed = SRef::new("CLOSED", "X");
        assert!(ledger.stock(&closed).is_some());
        assert!(ledger.stock(&SRef::new("NASDAQ", "X")).is_none());

        let trades = ledger.trades_of("Main", Some(&closed));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].sold.trade_id, "P1.C");
        assert_eq!(trades[0].sold.price_per_unit, 5.25);
        assert_eq!(trades[0].sold.fee_per_unit, 0.0);
        assert!(ledger.holdings_of("Main", Some(&closed)).is_empty());
    }

    #[test]
    fn close_twice_conflicts() {
        let mut ledger = setup();
        execute(&mut ledger, "Close-Stock SRef=[NASDAQ$X] Date=2023-06-30").unwrap();
        let err = execute(&mut ledger, "Close-Stock SRef=[CLOSED$X] Date=2023-07-01").unwrap_err();
        assert!(matches!(err, LedgerError::StateConflict { .. }));
    }

    #[test]
    fn sector_assignment_requires_defined_slot_and_field() {
        let mut ledger = setup();
        assert!(matches!(
            execute(&mut ledger, "Set-Stock SRef=[NASDAQ$X] SectorId=0 FieldId=0").unwrap_err(),
            LedgerError::NotFound { .. }
        ));

        execute(&mut ledger, "Add-Sector SectorId=0 Name=Industry").unwrap();
        execute(&mut ledger, "Set-Sector SectorId=0 FieldId=2 Name=Tech").unwrap();
        execute(&mut ledger, "Set-Stock SRef=[NASDAQ$X] SectorId=0 FieldId=2").unwrap();

        let x = SRef::new("NASDAQ", "X");
        assert_eq!(ledger.stock(&x).unwrap().sectors[0], Some(2));

        // Clearing: omit FieldId.
        execute(&mut ledger, "Set-Stock SRef=[NASDAQ$X] SectorId=0").unwrap();
        assert_eq!(ledger.stock(&x).unwrap().sectors[0], None);
    }
}
