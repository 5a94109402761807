//! Command dispatcher: the single mutation surface of the ledger.
//!
//! One handler per (Element, Operation) pair. Handlers validate their domain
//! preconditions fully before touching the store, so a failed call never
//! leaves a partially applied mutation behind.

mod alarm;
mod dividend;
mod holding;
mod order;
mod portfolio;
mod sector;
mod stock;
mod trade;

use super::action::Action;
use super::catalog::{Element as E, Operation as O};
use super::command_parser;
use super::error::LedgerError;
use super::ledger::Ledger;
use super::sref::SRef;

/// Parse one command line and apply it to the ledger.
pub fn execute(ledger: &mut Ledger, line: &str) -> Result<(), LedgerError> {
    let action = command_parser::parse(line)?;
    apply(ledger, &action)
}

/// Apply a ready action to the ledger.
pub fn apply(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    match (action.element, action.operation) {
        (E::Portfolio, O::Add) => portfolio::add(ledger, action),
        (E::Portfolio, O::Edit) => portfolio::edit(ledger, action),
        (E::Portfolio, O::Delete) => portfolio::delete(ledger, action),
        (E::Portfolio, O::DeleteAll) => portfolio::delete_all(ledger, action),
        (E::Portfolio, O::Top) => portfolio::top(ledger, action),

        (E::Stock, O::Add) => stock::add(ledger, action),
        (E::Stock, O::Edit) => stock::edit(ledger, action),
        (E::Stock, O::Delete) => stock::delete(ledger, action),
        (E::Stock, O::DeleteAll) => stock::delete_all(ledger, action),
        (E::Stock, O::Split) => stock::split(ledger, action),
        (E::Stock, O::Close) => stock::close(ledger, action),
        (E::Stock, O::Follow) => stock::follow(ledger, action),
        (E::Stock, O::Unfollow) => stock::unfollow(ledger, action),
        (E::Stock, O::Set) => stock::set_sector(ledger, action),

        (E::Holding, O::Add) => holding::add(ledger, action),
        (E::Holding, O::Edit) => holding::edit(ledger, action),
        (E::Holding, O::Delete) => holding::delete(ledger, action),
        (E::Holding, O::Note) => holding::note(ledger, action),
        (E::Holding, O::Round) => holding::round(ledger, action),

        (E::Trade, O::Add) => trade::add(ledger, action),
        (E::Trade, O::Delete) => trade::delete(ledger, action),
        (E::Trade, O::Note) => trade::note(ledger, action),

        (E::Dividend, O::Add) => dividend::add(ledger, action),
        (E::Dividend, O::Delete) => dividend::delete(ledger, action),

        (E::Order, O::Add) => order::add(ledger, action),
        (E::Order, O::Edit) => order::edit(ledger, action),
        (E::Order, O::Delete) => order::delete(ledger, action),
        (E::Order, O::DeleteAll) => order::delete_all(ledger, action),

        (E::Alarm, O::Add) => alarm::add(ledger, action),
        (E::Alarm, O::Delete) => alarm::delete(ledger, action),
        (E::Alarm, O::DeleteAll) => alarm::delete_all(ledger, action),

        (E::Sector, O::Add) => sector::add(ledger, action),
        (E::Sector, O::Edit) => sector::edit(ledger, action),
        (E::Sector, O::Delete) => sector::delete(ledger, action),
        (E::Sector, O::Set) => sector::set_field(ledger, action),

        _ => Err(LedgerError::Unsupported {
            operation: action.operation.to_string(),
            element: action.element.to_string(),
        }),
    }
}

fn portfolio_index(ledger: &Ledger, name: &str) -> Result<usize, LedgerError> {
    ledger
        .portfolio_index(name)
        .ok_or_else(|| LedgerError::NotFound {
            what: "portfolio",
            key: name.to_string(),
        })
}

fn require_stock(ledger: &Ledger, sref: &SRef) -> Result<(), LedgerError> {
    if ledger.stock(sref).is_none() {
        return Err(LedgerError::NotFound {
            what: "stock",
            key: sref.to_string(),
        });
    }
    Ok(())
}

fn require_name(param: &str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::Validation {
            param: param.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}
