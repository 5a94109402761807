//! Command engine: a ledger plus the journal of accepted command lines.

use super::dispatch;
use super::error::LedgerError;
use super::ledger::Ledger;

/// Wraps a [`Ledger`] and records every line that was accepted, in order.
/// Replaying the journal against an empty ledger reproduces the state.
#[derive(Debug, Default)]
pub struct Engine {
    ledger: Ledger,
    journal: Vec<String>,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            ledger: Ledger::new(),
            journal: Vec::new(),
        }
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Engine {
            ledger,
            journal: Vec::new(),
        }
    }

    /// Run one command line. The line is journaled only when it applied
    /// cleanly; a rejected line leaves both ledger and journal untouched.
    pub fn run(&mut self, line: &str) -> Result<(), LedgerError> {
        dispatch::execute(&mut self.ledger, line)?;
        self.journal.push(line.to_string());
        Ok(())
    }

    /// Run a whole script, stopping at the first rejected line. Blank lines
    /// and `#` comments are skipped. On error, reports the offending
    /// one-based line number alongside the cause.
    pub fn run_script(&mut self, script: &str) -> Result<usize, (usize, LedgerError)> {
        let mut applied = 0;
        for (number, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.run(line).map_err(|e| (number + 1, e))?;
            applied += 1;
        }
        Ok(applied)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    pub fn journal(&self) -> &[String] {
        &self.journal
    }
}
