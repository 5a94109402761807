//! Stock master records and price alarms.

use serde::{Deserialize, Serialize};

use super::sector::SECTOR_SLOTS;
use super::sref::SRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmKind {
    Over,
    Under,
}

/// Price alarm. The level is unique per stock across both kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub kind: AlarmKind,
    pub level: f64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub sref: SRef,
    pub name: String,
    pub alarms: Vec<Alarm>,
    /// Per sector slot, the index of the referenced field, or `None` when
    /// unassigned.
    pub sectors: [Option<usize>; SECTOR_SLOTS],
}

impl Stock {
    pub fn new(sref: SRef, name: &str) -> Self {
        Stock {
            sref,
            name: name.to_string(),
            alarms: Vec::new(),
            sectors: [None; SECTOR_SLOTS],
        }
    }

    pub fn alarm_at(&self, level: f64) -> Option<&Alarm> {
        self.alarms
            .iter()
            .find(|a| super::fx::units_eq(a.level, level))
    }
}
