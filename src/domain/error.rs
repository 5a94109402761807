//! Domain error types.

/// A parse error with position information for command parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for folioledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unsupported command: {operation}-{element}")]
    Unsupported { operation: String, element: String },

    #[error("invalid value for {param}: {reason}")]
    Validation { param: String, reason: String },

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("duplicate {what}: {key}")]
    Duplicate { what: &'static str, key: String },

    #[error("unit mismatch: {reason}")]
    UnitMismatch { reason: String },

    #[error("state conflict: {reason}")]
    StateConflict { reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("import error in row {row}: {reason}")]
    Import { row: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&LedgerError> for std::process::ExitCode {
    fn from(err: &LedgerError) -> Self {
        let code: u8 = match err {
            LedgerError::Io(_) | LedgerError::Storage { .. } => 1,
            LedgerError::Parse(_)
            | LedgerError::Unsupported { .. }
            | LedgerError::Validation { .. } => 2,
            LedgerError::NotFound { .. } | LedgerError::Duplicate { .. } => 3,
            LedgerError::UnitMismatch { .. } | LedgerError::StateConflict { .. } => 4,
            LedgerError::Import { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
