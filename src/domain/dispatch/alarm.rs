//! Price alarm handlers. The level is the alarm's key, unique per stock
//! across both kinds.

use crate::domain::action::Action;
use crate::domain::error::LedgerError;
use crate::domain::fx;
use crate::domain::ledger::Ledger;
use crate::domain::stock::{Alarm, AlarmKind};

fn parse_kind(raw: &str) -> AlarmKind {
    if raw == "Over" {
        AlarmKind::Over
    } else {
        AlarmKind::Under
    }
}

pub(super) fn add(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?.clone();
    let kind = parse_kind(action.choice_of("Kind")?);
    let level = action.decimal_of("Level")?;
    let note = action.opt_str("Note")?.unwrap_or_default().to_string();

    let stock = ledger.stock_mut(&sref).ok_or_else(|| LedgerError::NotFound {
        what: "stock",
        key: sref.to_string(),
    })?;
    if stock.alarm_at(level).is_some() {
        return Err(LedgerError::Duplicate {
            what: "alarm",
            key: format!("{sref} @ {level}"),
        });
    }
    stock.alarms.push(Alarm { kind, level, note });
    Ok(())
}

pub(super) fn delete(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?.clone();
    let level = action.decimal_of("Level")?;

    let stock = ledger.stock_mut(&sref).ok_or_else(|| LedgerError::NotFound {
        what: "stock",
        key: sref.to_string(),
    })?;
    if stock.alarm_at(level).is_none() {
        return Err(LedgerError::NotFound {
            what: "alarm",
            key: format!("{sref} @ {level}"),
        });
    }
    stock.alarms.retain(|a| !fx::units_eq(a.level, level));
    Ok(())
}

pub(super) fn delete_all(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let sref = action.sref_of("SRef")?.clone();
    let stock = ledger.stock_mut(&sref).ok_or_else(|| LedgerError::NotFound {
        what: "stock",
        key: sref.to_string(),
    })?;
    stock.alarms.clear();
    Ok(())
}
