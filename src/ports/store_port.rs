//! Ledger persistence port.

use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::sref::SRef;

pub trait StorePort {
    /// Persist the whole ledger, replacing any previous state.
    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError>;

    /// Load the persisted ledger. `NotFound` when nothing was saved yet.
    fn load(&self) -> Result<Ledger, LedgerError>;

    /// Render the ledger for export, optionally restricted to the given
    /// stocks.
    fn export(&self, ledger: &Ledger, symbols: Option<&[SRef]>) -> Result<String, LedgerError>;
}
