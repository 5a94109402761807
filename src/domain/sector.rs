//! User-defined two-level sector taxonomy.

use serde::{Deserialize, Serialize};

/// Number of sector slots available in a ledger.
pub const SECTOR_SLOTS: usize = 4;

/// Number of field positions per defined sector.
pub const SECTOR_FIELDS: usize = 16;

/// One sector slot. A stock references at most one field per slot; the
/// assignment lives on [`crate::domain::stock::Stock`] as a field index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectorSlot {
    Empty,
    Defined {
        name: String,
        fields: Vec<Option<String>>,
    },
}

impl SectorSlot {
    pub fn defined(name: &str) -> Self {
        SectorSlot::Defined {
            name: name.to_string(),
            fields: vec![None; SECTOR_FIELDS],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SectorSlot::Empty)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SectorSlot::Empty => None,
            SectorSlot::Defined { name, .. } => Some(name),
        }
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        match self {
            SectorSlot::Empty => None,
            SectorSlot::Defined { fields, .. } => {
                fields.get(index).and_then(|f| f.as_deref())
            }
        }
    }
}
