//! Order handlers. Order identity within a portfolio is the (stock, price)
//! pair.

use super::{portfolio_index, require_stock};
use crate::domain::action::Action;
use crate::domain::error::LedgerError;
use crate::domain::fx;
use crate::domain::ledger::Ledger;
use crate::domain::order::{Order, OrderKind};

fn parse_kind(raw: &str) -> OrderKind {
    if raw == "Buy" {
        OrderKind::Buy
    } else {
        OrderKind::Sell
    }
}

pub(super) fn add(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?.clone();
    let kind = parse_kind(action.choice_of("Kind")?);
    let units = action.decimal_of("Units")?;
    let price = action.decimal_of("Price")?;

    require_stock(ledger, &sref)?;
    let index = portfolio_index(ledger, pf_name)?;
    let pf = &mut ledger.portfolios[index];
    if pf.orders.iter().any(|o| o.matches(&sref, price)) {
        return Err(LedgerError::Duplicate {
            what: "order",
            key: format!("{sref} @ {price}"),
        });
    }
    pf.orders.push(Order {
        sref,
        kind,
        units,
        price_per_unit: price,
    });
    Ok(())
}

pub(super) fn edit(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?.clone();
    let price = action.decimal_of("Price")?;
    let new_units = action.decimal_of("NewUnits")?;
    let new_price = action.decimal_of("NewPrice")?;

    let index = portfolio_index(ledger, pf_name)?;
    let pf = &ledger.portfolios[index];
    let pos = pf
        .orders
        .iter()
        .position(|o| o.matches(&sref, price))
        .ok_or_else(|| LedgerError::NotFound {
            what: "order",
            key: format!("{sref} @ {price}"),
        })?;
    // Re-keying must not collide with another order.
    let collides = !fx::units_eq(new_price, price)
        && pf
            .orders
            .iter()
            .enumerate()
            .any(|(i, o)| i != pos && o.matches(&sref, new_price));
    if collides {
        return Err(LedgerError::Duplicate {
            what: "order",
            key: format!("{sref} @ {new_price}"),
        });
    }

    let order = &mut ledger.portfolios[index].orders[pos];
    order.units = new_units;
    order.price_per_unit = new_price;
    Ok(())
}

pub(super) fn delete(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.sref_of("SRef")?.clone();
    let price = action.decimal_of("Price")?;

    let index = portfolio_index(ledger, pf_name)?;
    let pf = &mut ledger.portfolios[index];
    let pos = pf
        .orders
        .iter()
        .position(|o| o.matches(&sref, price))
        .ok_or_else(|| LedgerError::NotFound {
            what: "order",
            key: format!("{sref} @ {price}"),
        })?;
    pf.orders.remove(pos);
    Ok(())
}

/// Clear pending orders, optionally only those for one stock. Always
/// succeeds for an existing portfolio, even when nothing matches.
pub(super) fn delete_all(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let pf_name = action.str_of("PfName")?;
    let sref = action.opt_sref("SRef")?.cloned();

    let index = portfolio_index(ledger, pf_name)?;
    let pf = &mut ledger.portfolios[index];
    match sref {
        Some(sref) => pf.orders.retain(|o| o.sref != sref),
        None => pf.orders.clear(),
    }
    Ok(())
}
