//! Holding handlers: open purchase lots.

use super::{portfolio_index, require_stock};
use crate::domain::action::Action;
use crate::domain::error::LedgerError;
use crate::domain::fx;
use crate::domain::holding::{Holding, Sold, Trade};
use crate::domain::ledger::Ledger;

pub(super) fn add(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?.clone();
    let purchase_id = action.str_of("PurchaseId")?;
    let units = action.decimal_of("Units")?;

    require_stock(ledger, &sref)?;
    let index = portfolio_index(ledger, pf_name)?;
    if ledger.is_purchase_id(purchase_id) {
        return Err(LedgerError::Duplicate {
            what: "purchase id",
            key: purchase_id.to_string(),
        });
    }

    let holding = Holding {
        sref,
        purchase_id: purchase_id.to_string(),
        date: action.date_of("Date")?,
        units,
        original_units: units,
        price_per_unit: action.decimal_of("Price")?,
        fee_per_unit: action.decimal_of("Fee")?,
        rate: action.decimal_of("Rate")?,
        note: action.opt_str("Note")?.unwrap_or_default().to_string(),
        dividends: Vec::new(),
    };
    ledger.portfolios[index].holdings.push(holding);
    Ok(())
}

/// Rewrite the purchase attributes of an untouched lot. A lot that has
/// already fed a sale cannot be edited; delete the trade first.
pub(super) fn edit(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let purchase_id = action.str_of("PurchaseId")?;

    let sold_against = ledger.portfolios.iter().any(|p| {
        p.trades
            .iter()
            .any(|t| t.holding.purchase_id == purchase_id)
    });
    if sold_against {
        return Err(LedgerError::StateConflict {
            reason: format!("purchase {purchase_id} has already been partially sold"),
        });
    }

    let holding = find_mut(ledger, purchase_id)?;
    holding.date = action.date_of("Date")?;
    holding.units = action.decimal_of("Units")?;
    holding.original_units = holding.units;
    holding.price_per_unit = action.decimal_of("Price")?;
    holding.fee_per_unit = action.decimal_of("Fee")?;
    holding.rate = action.decimal_of("Rate")?;
    Ok(())
}

pub(super) fn delete(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let purchase_id = action.str_of("PurchaseId")?;

    let dependent_trades = ledger.portfolios.iter().any(|p| {
        p.trades
            .iter()
            .any(|t| t.holding.purchase_id == purchase_id)
    });
    if dependent_trades {
        return Err(LedgerError::StateConflict {
            reason: format!("purchase {purchase_id} has dependent trades"),
        });
    }
    let (pf_index, holding) = find(ledger, purchase_id)?;
    if !holding.dividends.is_empty() {
        return Err(LedgerError::StateConflict {
            reason: format!("purchase {purchase_id} has recorded dividends"),
        });
    }
    ledger.portfolios[pf_index]
        .holdings
        .retain(|h| h.purchase_id != purchase_id);
    Ok(())
}

pub(super) fn note(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let purchase_id = action.str_of("PurchaseId")?;
    let note = action.str_of("Note")?.to_string();
    find_mut(ledger, purchase_id)?.note = note;
    Ok(())
}

/// Fractional-share sweep: round every open lot of the stock down to whole
/// units and book the shaved fractions as one sale at the given price.
/// A no-op success when nothing is fractional.
pub(super) fn round(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?.clone();
    let trade_id = action.str_of("TradeId")?;
    let date = action.date_of("Date")?;
    let price = action.decimal_of("Price")?;

    require_stock(ledger, &sref)?;
    let index = portfolio_index(ledger, pf_name)?;

    let any_fractional = ledger.portfolios[index]
        .holdings
        .iter()
        .any(|h| h.sref == sref && !fx::is_drained(h.units.fract()));
    if !any_fractional {
        return Ok(());
    }
    if ledger.is_trade_id(trade_id) {
        return Err(LedgerError::Duplicate {
            what: "trade id",
            key: trade_id.to_string(),
        });
    }

    let pf = &mut ledger.portfolios[index];
    let mut kept = Vec::with_capacity(pf.holdings.len());
    for mut h in pf.holdings.drain(..) {
        if h.sref != sref || fx::is_drained(h.units.fract()) {
            kept.push(h);
            continue;
        }
        let whole = h.units.floor();
        let fraction = fx::round3(h.units - whole);
        let sold = Sold {
            trade_id: trade_id.to_string(),
            date,
            price_per_unit: price,
            fee_per_unit: 0.0,
            note: "fractional sweep".to_string(),
        };
        if fx::is_drained(whole) {
            // The whole lot was fractional.
            pf.trades.push(Trade { holding: h, sold });
        } else {
            let mut shaved = h.clone();
            shaved.units = fraction;
            pf.trades.push(Trade {
                holding: shaved,
                sold,
            });
            h.units = whole;
            kept.push(h);
        }
    }
    pf.holdings = kept;
    Ok(())
}

fn find<'a>(ledger: &'a Ledger, purchase_id: &str) -> Result<(usize, &'a Holding), LedgerError> {
    for (index, pf) in ledger.portfolios.iter().enumerate() {
        if let Some(h) = pf.holdings.iter().find(|h| h.purchase_id == purchase_id) {
            return Ok((index, h));
        }
    }
    Err(LedgerError::NotFound {
        what: "holding",
        key: purchase_id.to_string(),
    })
}

fn find_mut<'a>(
    ledger: &'a mut Ledger,
    purchase_id: &str,
) -> Result<&'a mut Holding, LedgerError> {
    for pf in &mut ledger.portfolios {
        if let Some(h) = pf
            .holdings
            .iter_mut()
            .find(|h| h.purchase_id == purchase_id)
        {
            return Ok(h);
        }
    }
    Err(LedgerError::NotFound {
        what: "holding",
        key: purchase_id.to_string(),
    })
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

    fn buy(ledger: &mut Ledger, pid: &str, units: f64) {
        execute(
            ledger,
            &format!(
                "Add-Holding PfName=Main SRef=[NASDAQ$X] PurchaseId={pid} Date=2023-01-01 Units={units} Price=5 Fee=0 Rate=1"
            ),
        )
        .unwrap();
    }

    #[test]
    fn add_records_lot_with_original_units() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", 10.0);
        let x = SRef::new("NASDAQ", "X");
        let holdings = ledger.holdings_of("Main", Some(&x));
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].units, 10.0);
        assert_eq!(holdings[0].original_units, 10.0);
    }

    #[test]
    fn purchase_id_is_unique_ledger_wide() {
        let mut ledger = setup();
        execute(&mut ledger, "Add-Portfolio Name=Side").unwrap();
        buy(&mut ledger, "P1", 10.0);
        let err = execute(
            &mut ledger,
            "Add-Holding PfName=Side SRef=[NASDAQ$X] PurchaseId=P1 Date=2023-02-01 Units=5 Price=6 Fee=0 Rate=1",
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate { .. }));
    }

    #[test]
    fn edit_updates_untouched_lot() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", 10.0);
        execute(
            &mut ledger,
            "Edit-Holding PurchaseId=P1 Date=2023-01-02 Units=12 Price=4.5 Fee=0.1 Rate=1.1",
        )
        .unwrap();
        let x = SRef::new("NASDAQ", "X");
        let holdings = ledger.holdings_of("Main", Some(&x));
        assert_eq!(holdings[0].units, 12.0);
        assert_eq!(holdings[0].original_units, 12.0);
        assert_eq!(holdings[0].price_per_unit, 4.5);
    }

    #[test]
    fn edit_after_partial_sale_conflicts() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", 10.0);
        execute(
            &mut ledger,
            "Add-Trade PfName=Main SRef=[NASDAQ$X] Date=2023-02-01 Units=4 Price=7 Fee=0 TradeId=T1",
        )
        .unwrap();
        let err = execute(
            &mut ledger,
            "Edit-Holding PurchaseId=P1 Date=2023-01-01 Units=10 Price=5 Fee=0 Rate=1",
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::StateConflict { .. }));
    }

    #[test]
    fn delete_guards_dependents() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", 10.0);
        execute(
            &mut ledger,
            "Add-Divident PfName=Main SRef=[NASDAQ$X] ExDate=2023-02-01 PayDate=2023-02-15 Units=10 Amount=0.5",
        )
        .unwrap();
        let err = execute(&mut ledger, "Delete-Holding PurchaseId=P1").unwrap_err();
        assert!(matches!(err, LedgerError::StateConflict { .. }));

        buy(&mut ledger, "P2", 5.0);
        execute(&mut ledger, "Delete-Holding PurchaseId=P2").unwrap();
        assert!(!ledger.is_purchase_id("P2"));
    }

    #[test]
    fn note_replaces_lot_note() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", 10.0);
        execute(&mut ledger, "Note-Holding PurchaseId=P1 Note=[starter lot]").unwrap();
        let x = SRef::new("NASDAQ", "X");
        assert_eq!(ledger.holdings_of("Main", Some(&x))[0].note, "starter lot");
    }

    #[test]
    fn round_sweeps_fractions_into_one_sale() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", 10.4);
        buy(&mut ledger, "P2", 0.6);
        buy(&mut ledger, "P3", 3.0);

        execute(
            &mut ledger,
            "Round-Holding PfName=Main SRef=[NASDAQ$X] TradeId=R1 Date=2023-03-01 Price=6",
        )
        .unwrap();

        let x = SRef::new("NASDAQ", "X");
        let holdings = ledger.holdings_of("Main", Some(&x));
        let units: Vec<f64> = holdings.iter().map(|h| h.units).collect();
        assert_eq!(units, vec![10.0, 3.0]); // P2 consumed entirely

        let trades = ledger.trades_of("Main", Some(&x));
        assert_eq!(trades.len(), 2);
        assert!(trades.iter().all(|t| t.sold.trade_id == "R1"));
        let sold: f64 = trades.iter().map(|t| t.holding.units).sum();
        assert!((sold - 1.0).abs() < 1e-9);
    }

    #[test]
    fn round_without_fractions_is_a_noop() {
        let mut ledger = setup();
        buy(&mut ledger, "P1", 10.0);
        let before = ledger.snapshot();
        execute(
            &mut ledger,
            "Round-Holding PfName=Main SRef=[NASDAQ$X] TradeId=R1 Date=2023-03-01 Price=6",
        )
        .unwrap();
        assert_eq!(ledger, before);
        assert!(!ledger.is_trade_id("R1"));
    }
}
