//! Sector taxonomy handlers. Deleting a sector or one of its fields
//! cascades to the stocks that reference it.

use super::require_name;
use crate::domain::action::Action;
use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::sector::SectorSlot;

pub(super) fn add(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let slot = action.uint_of("SectorId")?;
    let name = action.str_of("Name")?;
    require_name("Name", name)?;

    match ledger.sector(slot) {
        None => Err(LedgerError::NotFound {
            what: "sector",
            key: slot.to_string(),
        }),
        Some(s) if !s.is_empty() => Err(LedgerError::Duplicate {
            what: "sector",
            key: slot.to_string(),
        }),
        Some(_) => {
            ledger.sectors[slot] = SectorSlot::defined(name);
            Ok(())
        }
    }
}

pub(super) fn edit(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let slot = action.uint_of("SectorId")?;
    let new_name = action.str_of("Name")?;
    require_name("Name", new_name)?;

    match ledger.sectors.get_mut(slot) {
        Some(SectorSlot::Defined { name, .. }) => {
            *name = new_name.to_string();
            Ok(())
        }
        _ => Err(LedgerError::NotFound {
            what: "sector",
            key: slot.to_string(),
        }),
    }
}

/// With a FieldId: undefine that field and detach the stocks assigned to it.
/// Without: drop the whole sector and detach every stock assignment in the
/// slot.
pub(super) fn delete(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let slot = action.uint_of("SectorId")?;
    let field = action.opt_uint("FieldId")?;

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

    match field {
        Some(field) => {
            if sector.field(field).is_none() {
                return Err(LedgerError::NotFound {
                    what: "sector field",
                    key: format!("{slot}/{field}"),
                });
            }
            if let SectorSlot::Defined { fields, .. } = &mut ledger.sectors[slot] {
                fields[field] = None;
            }
            for stock in &mut ledger.stocks {
                if stock.sectors[slot] == Some(field) {
                    stock.sectors[slot] = None;
                }
            }
        }
        None => {
            ledger.sectors[slot] = SectorSlot::Empty;
            for stock in &mut ledger.stocks {
                stock.sectors[slot] = None;
            }
        }
    }
    Ok(())
}

/// Define or rename one field of a sector.
pub(super) fn set_field(ledger: &mut Ledger, action: &Action) -> Result<(), LedgerError> {
    let slot = action.uint_of("SectorId")?;
    let field = action.uint_of("FieldId")?;
    let name = action.str_of("Name")?;
    require_name("Name", name)?;

    match ledger.sectors.get_mut(slot) {
        Some(SectorSlot::Defined { fields, .. }) => {
            fields[field] = Some(name.to_string());
            Ok(())
        }
        _ => Err(LedgerError::NotFound {
            what: "sector",
            key: slot.to_string(),
        }),
    }
}
