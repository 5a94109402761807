//! A fully specified command: operation, element and parameter slots.
//!
//! Actions are constructed only through the template catalog; slot access is
//! typed, so a handler asking for the wrong kind gets an error instead of a
//! silently misread value.

use chrono::NaiveDate;

use super::catalog::{self, Element, Operation, ParamSpec};
use super::error::LedgerError;
use super::param::{self, ParamValue};
use super::sref::SRef;

#[derive(Debug, Clone)]
pub struct Slot {
    pub spec: &'static ParamSpec,
    pub value: Option<ParamValue>,
}

#[derive(Debug, Clone)]
pub struct Action {
    pub operation: Operation,
    pub element: Element,
    slots: Vec<Slot>,
}

impl Action {
    /// Catalog lookup; fails with `Unsupported` for unknown combinations.
    pub fn from_catalog(operation: Operation, element: Element) -> Result<Action, LedgerError> {
        let specs = catalog::template(operation, element).ok_or_else(|| {
            LedgerError::Unsupported {
                operation: operation.to_string(),
                element: element.to_string(),
            }
        })?;
        Ok(Action {
            operation,
            element,
            slots: specs.iter().map(|spec| Slot { spec, value: None }).collect(),
        })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.spec.name == name)
    }

    fn slot(&self, name: &str) -> Result<&Slot, LedgerError> {
        self.slots
            .iter()
            .find(|s| s.spec.name == name)
            .ok_or_else(|| LedgerError::Validation {
                param: name.to_string(),
                reason: "no such parameter in this template".to_string(),
            })
    }

    /// Parse a raw token into the named slot. An empty raw value leaves an
    /// optional slot unset (the "empty means absent" convention).
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), LedgerError> {
        let slot = match self.slot_mut(name) {
            Some(s) => s,
            None => {
                return Err(LedgerError::Validation {
                    param: name.to_string(),
                    reason: "no such parameter in this template".to_string(),
                })
            }
        };
        if raw.is_empty() && slot.spec.optional {
            slot.value = None;
            return Ok(());
        }
        slot.value = Some(param::parse(slot.spec, raw)?);
        Ok(())
    }

    /// Ready only once every required slot holds a parsed value.
    pub fn is_ready(&self) -> Result<(), LedgerError> {
        for slot in &self.slots {
            if !slot.spec.optional && slot.value.is_none() {
                return Err(LedgerError::Validation {
                    param: slot.spec.name.to_string(),
                    reason: "missing required parameter".to_string(),
                });
            }
        }
        Ok(())
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        pick: impl FnOnce(&'a ParamValue) -> Option<T>,
    ) -> Result<T, LedgerError> {
        let slot = self.slot(name)?;
        let value = slot.value.as_ref().ok_or_else(|| LedgerError::Validation {
            param: name.to_string(),
            reason: "missing required parameter".to_string(),
        })?;
        pick(value).ok_or_else(|| LedgerError::Validation {
            param: name.to_string(),
            reason: "parameter accessed with the wrong type".to_string(),
        })
    }

    fn typed_opt<'a, T>(
        &'a self,
        name: &str,
        pick: impl FnOnce(&'a ParamValue) -> Option<T>,
    ) -> Result<Option<T>, LedgerError> {
        let slot = self.slot(name)?;
        match slot.value.as_ref() {
            None => Ok(None),
            Some(value) => pick(value)
                .map(Some)
                .ok_or_else(|| LedgerError::Validation {
                    param: name.to_string(),
                    reason: "parameter accessed with the wrong type".to_string(),
                }),
        }
    }

    pub fn str_of(&self, name: &str) -> Result<&str, LedgerError> {
        self.typed(name, |v| match v {
            ParamValue::Str(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn decimal_of(&self, name: &str) -> Result<f64, LedgerError> {
        self.typed(name, |v| match v {
            ParamValue::Decimal(d) => Some(*d),
            _ => None,
        })
    }

    pub fn date_of(&self, name: &str) -> Result<NaiveDate, LedgerError> {
        self.typed(name, |v| match v {
            ParamValue::Date(d) => Some(*d),
            _ => None,
        })
    }

    pub fn sref_of(&self, name: &str) -> Result<&SRef, LedgerError> {
        self.typed(name, |v| match v {
            ParamValue::SRef(s) => Some(s),
            _ => None,
        })
    }

    pub fn uint_of(&self, name: &str) -> Result<usize, LedgerError> {
        self.typed(name, |v| match v {
            ParamValue::Uint(u) => Some(*u as usize),
            _ => None,
        })
    }

    pub fn choice_of(&self, name: &str) -> Result<&'static str, LedgerError> {
        self.typed(name, |v| match v {
            ParamValue::Choice(c) => Some(*c),
            _ => None,
        })
    }

    pub fn opt_str(&self, name: &str) -> Result<Option<&str>, LedgerError> {
        self.typed_opt(name, |v| match v {
            ParamValue::Str(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn opt_decimal(&self, name: &str) -> Result<Option<f64>, LedgerError> {
        self.typed_opt(name, |v| match v {
            ParamValue::Decimal(d) => Some(*d),
            _ => None,
        })
    }

    pub fn opt_sref(&self, name: &str) -> Result<Option<&SRef>, LedgerError> {
        self.typed_opt(name, |v| match v {
            ParamValue::SRef(s) => Some(s),
            _ => None,
        })
    }

    pub fn opt_uint(&self, name: &str) -> Result<Option<usize>, LedgerError> {
        self.typed_opt(name, |v| match v {
            ParamValue::Uint(u) => Some(*u as usize),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_combo_fails_construction() {
        let err = Action::from_catalog(Operation::Split, Element::Portfolio).unwrap_err();
        assert!(matches!(err, LedgerError::Unsupported { .. }));
    }

    #[test]
    fn ready_only_when_required_slots_are_filled() {
        let mut action = Action::from_catalog(Operation::Add, Element::Portfolio).unwrap();
        assert!(action.is_ready().is_err());
        action.set("Name", "Main").unwrap();
        assert!(action.is_ready().is_ok());
    }

    #[test]
    fn optional_slots_do_not_block_readiness() {
        let mut action = Action::from_catalog(Operation::Add, Element::Trade).unwrap();
        for (name, raw) in [
            ("PfName", "Main"),
            ("SRef", "NASDAQ$MSFT"),
            ("Date", "2023-02-01"),
            ("Units", "4"),
            ("Price", "7"),
            ("Fee", "0"),
            ("TradeId", "T1"),
        ] {
            action.set(name, raw).unwrap();
        }
        assert!(action.is_ready().is_ok());
        assert_eq!(action.opt_str("PurchaseId").unwrap(), None);
    }

    #[test]
    fn empty_raw_leaves_optional_slot_unset() {
        let mut action = Action::from_catalog(Operation::Add, Element::Trade).unwrap();
        action.set("PurchaseId", "").unwrap();
        assert_eq!(action.opt_str("PurchaseId").unwrap(), None);
        action.set("PurchaseId", "P1").unwrap();
        assert_eq!(action.opt_str("PurchaseId").unwrap(), Some("P1"));
    }

    #[test]
    fn typed_access_rejects_wrong_kind() {
        let mut action = Action::from_catalog(Operation::Add, Element::Portfolio).unwrap();
        action.set("Name", "Main").unwrap();
        assert_eq!(action.str_of("Name").unwrap(), "Main");
        assert!(action.decimal_of("Name").is_err());
        assert!(action.str_of("NoSuch").is_err());
    }

    #[test]
    fn set_rejects_unknown_parameter() {
        let mut action = Action::from_catalog(Operation::Add, Element::Portfolio).unwrap();
        assert!(action.set("Bogus", "x").is_err());
    }
}
