//! Dividend handlers.
//!
//! Distribution is strict reconciliation: the declared unit total must match
//! the summed units of every eligible record, or nothing is written.

use super::{portfolio_index, require_stock};
use crate::domain::action::Action;
use crate::domain::error::LedgerError;
use crate::domain::fx;
use crate::domain::holding::Dividend;
use crate::domain::ledger::Ledger;

pub(super) fn add(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?.clone();
    let ex_date = action.date_of("ExDate")?;
    let pay_date = action.date_of("PayDate")?;
    let total_units = action.decimal_of("Units")?;
    let per_unit = action.decimal_of("Amount")?;
    let rate = action.opt_decimal("Rate")?.unwrap_or(1.0);
    let purchase_id = action.opt_str("PurchaseId")?.map(str::to_string);
    let trade_id = action.opt_str("TradeId")?.map(str::to_string);

    require_stock(ledger, &sref)?;
    let index = portfolio_index(ledger, pf_name)?;
    let pf = &ledger.portfolios[index];

    // Eligibility: holdings purchased strictly before the ex-dividend date;
    // trades purchased before it and sold on or after it.
    let in_scope = |pid: &str, tid: Option<&str>| -> bool {
        purchase_id.as_deref().is_none_or(|p| p == pid)
            && match (trade_id.as_deref(), tid) {
                (None, _) => true,
                (Some(want), Some(have)) => want == have,
                (Some(_), None) => false,
            }
    };

    let eligible_holdings: Vec<usize> = pf
        .holdings
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            h.sref == sref && h.date < ex_date && in_scope(&h.purchase_id, None)
        })
        .map(|(i, _)| i)
        .collect();
    let eligible_trades: Vec<usize> = pf
        .trades
        .iter()
        .enumerate()
        .filter(|(_, t)| {
            t.holding.sref == sref
                && t.holding.date < ex_date
                && t.sold.date >= ex_date
                && in_scope(&t.holding.purchase_id, Some(&t.sold.trade_id))
        })
        .map(|(i, _)| i)
        .collect();

    let duplicate = eligible_holdings
        .iter()
        .any(|&i| pf.holdings[i].has_dividend_on(ex_date))
        || eligible_trades
            .iter()
            .any(|&i| pf.trades[i].holding.has_dividend_on(ex_date));
    if duplicate {
        return Err(LedgerError::Duplicate {
            what: "dividend",
            key: format!("{sref} ex {ex_date}"),
        });
    }

    let eligible_units: f64 = eligible_holdings
        .iter()
        .map(|&i| pf.holdings[i].units)
        .chain(eligible_trades.iter().map(|&i| pf.trades[i].holding.units))
        .sum();
    if !fx::units_eq(eligible_units, total_units) {
        return Err(LedgerError::UnitMismatch {
            reason: format!(
                "declared {total_units} units but {eligible_units} are eligible for {sref} ex {ex_date}"
            ),
        });
    }

    let pf = &mut ledger.portfolios[index];
    for i in eligible_holdings {
        let units = pf.holdings[i].units;
        pf.holdings[i].dividends.push(Dividend {
            ex_date,
            pay_date,
            units,
            per_unit,
            rate,
        });
    }
    for i in eligible_trades {
        let units = pf.trades[i].holding.units;
        pf.trades[i].holding.dividends.push(Dividend {
            ex_date,
            pay_date,
            units,
            per_unit,
            rate,
        });
    }
    Ok(())
}

/// Remove every dividend entry with the given ex-date from the stock's
/// records in the portfolio.
pub(super) fn delete(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?.clone();
    let ex_date = action.date_of("ExDate")?;

    require_stock(ledger, &sref)?;
    let index = portfolio_index(ledger, pf_name)?;
    let pf = &mut ledger.portfolios[index];

    let mut removed = 0usize;
    for h in pf.holdings.iter_mut().filter(|h| h.sref == sref) {
        let before = h.dividends.len();
        h.dividends.retain(|d| d.ex_date != ex_date);
        removed += before - h.dividends.len();
    }
    for t in pf.trades.iter_mut().filter(|t| t.holding.sref == sref) {
        let before = t.holding.dividends.len();
        t.holding.dividends.retain(|d| d.ex_date != ex_date);
        removed += before - t.holding.dividends.len();
    }
    if removed == 0 {
        return Err(LedgerError::NotFound {
            what: "dividend",
            key: format!("{sref} ex {ex_date}"),
        });
    }
    Ok(())
}
