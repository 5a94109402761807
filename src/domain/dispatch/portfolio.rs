//! Portfolio handlers.

use super::{portfolio_index, require_name};
use crate::domain::action::Action;
use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::portfolio::Portfolio;

pub(super) fn add(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let name = action.str_of("Name")?;
    require_name("Name", name)?;
    if ledger.portfolio(name).is_some() {
        return Err(LedgerError::Duplicate {
            what: "portfolio",
            key: name.to_string(),
        });
    }
    ledger.portfolios.push(Portfolio::new(name));
    Ok(())
}

pub(super) fn edit(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let name = action.str_of("Name")?;
    let new_name = action.str_of("NewName")?;
    require_name("NewName", new_name)?;

    let index = portfolio_index(ledger, name)?;
    let taken = ledger
        .portfolio_index(new_name)
        .is_some_and(|other| other != index);
    if taken {
        return Err(LedgerError::Duplicate {
            what: "portfolio",
            key: new_name.to_string(),
        });
    }
    ledger.portfolios[index].name = new_name.to_string();
    Ok(())
}

pub(super) fn delete(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let name = action.str_of("Name")?;
    let index = portfolio_index(ledger, name)?;
    let pf = &ledger.portfolios[index];
    if !pf.holdings.is_empty() || !pf.trades.is_empty() {
        return Err(LedgerError::StateConflict {
            reason: format!("portfolio '{name}' still has holdings or trades"),
        });
    }
    ledger.portfolios.remove(index);
    Ok(())
}

/// Full teardown: intentionally bypasses the delete guard.
pub(super) fn delete_all(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let name = action.str_of("Name")?;
    let index = portfolio_index(ledger, name)?;
    ledger.portfolios.remove(index);
    Ok(())
}

pub(super) fn top(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let name = action.str_of("Name")?;
    let index = portfolio_index(ledger, name)?;
    let pf = ledger.portfolios.remove(index);
    ledger.portfolios.insert(0, pf);
    Ok(())
}
