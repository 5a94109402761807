//! JSON file ledger store.
//!
//! The whole ledger is serialized as one pretty-printed JSON document and
//! written atomically via a sibling temp file.

use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::sref::SRef;
use crate::ports::store_port::StorePort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonStoreAdapter {
    path: PathBuf,
}

impl JsonStoreAdapter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(ledger: &Ledger) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(ledger).map_err(|e| LedgerError::Storage {
            reason: format!("serialize ledger: {e}"),
        })
    }
}

impl StorePort for JsonStoreAdapter {
    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let body = Self::render(ledger)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Ledger, LedgerError> {
        if !self.path.exists() {
            return Err(LedgerError::NotFound {
                what: "store file",
                key: self.path.display().to_string(),
            });
        }
        let body = fs::read_to_string(&self.path)?;
        serde_json::from_str(&body).map_err(|e| LedgerError::Storage {
            reason: format!("malformed store {}: {e}", self.path.display()),
        })
    }

    fn export(&self, ledger: &Ledger, symbols: Option<&[SRef]>) -> Result<String, LedgerError> {
        match symbols {
            Some(symbols) => Self::render(&ledger.filtered(symbols)),
            None => Self::render(ledger),
        }
    }
}
