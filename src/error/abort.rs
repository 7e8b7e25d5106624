//! Move abort decoding.
//!
//! Aborts come back from the ledger as a status string such as
//!
//! ```text
//! MoveAbort(MoveLocation { module: ModuleId { address: 0x.., name: Identifier("swap_batch") },
//!     function: 2, instruction: 18, function_name: Some("swap_in_batch") }, 0) in command 3
//! ```
//!
//! [`MoveAbort::parse`] extracts the module, function, code and command index, and [`lookup`]
//! maps `(module, code)` to a [`FailureKind`]. The table is static and read-only.

use super::FailureKind;
use crate::constants::{MODULE_BALANCE, MODULE_ESCROW, MODULE_SPLIT, MODULE_SWAP_BATCH};
use std::fmt;

/// Maps an abort code raised by one of the futarchy modules to its label.
pub fn lookup(module: &str, code: u64) -> Option<FailureKind> {
    use FailureKind::*;

    let kind = match (module, code) {
        (MODULE_SPLIT, 0) => ZeroAmount,
        (MODULE_SPLIT, 1) => OutOfOrderOutcome,
        (MODULE_SPLIT, 2) => OutcomeOutOfBounds,
        (MODULE_SPLIT, 3) => IncompleteSplit,
        (MODULE_SPLIT, 4) => AllocationExceedsRemaining,

        (MODULE_SWAP_BATCH, 0) => InsufficientOutput,
        (MODULE_SWAP_BATCH, 1) => OutcomeOutOfBounds,
        (MODULE_SWAP_BATCH, 2) => MarketMismatch,
        (MODULE_SWAP_BATCH, 3) => InsufficientBalance,
        (MODULE_SWAP_BATCH, 4) => ZeroAmount,

        (MODULE_BALANCE, 0) => MalformedWrapper,
        (MODULE_BALANCE, 1) => OutcomeOutOfBounds,
        (MODULE_BALANCE, 2) => MarketMismatch,
        (MODULE_BALANCE, 3) => NotEmpty,
        (MODULE_BALANCE, 4) => Overflow,

        (MODULE_ESCROW, 0) => NotFinalized,
        (MODULE_ESCROW, 1) => OutcomeDidNotWin,
        (MODULE_ESCROW, 2) => NotEmpty,
        (MODULE_ESCROW, 3) => OutcomeOutOfBounds,
        (MODULE_ESCROW, 4) => InsufficientBalance,
        (MODULE_ESCROW, 5) => ReceiptMismatch,

        _ => return None,
    };
    Some(kind)
}

/// A decoded Move abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAbort {
    /// The aborting module.
    pub module: String,
    /// The aborting function, when reported.
    pub function: Option<String>,
    /// The abort code.
    pub code: u64,
    /// Index of the transaction command that aborted.
    pub command: Option<u16>,
}

impl MoveAbort {
    /// Parses an execution status error. Returns `None` if it is not a Move abort.
    pub fn parse(status: &str) -> Option<Self> {
        let body = &status[status.find("MoveAbort(")? + "MoveAbort(".len()..];

        let module = quoted_after(body, "name: Identifier(\"")?.to_string();
        let function = quoted_after(body, "function_name: Some(\"").map(str::to_string);

        let (location, tail) = match body.find(" in command ") {
            Some(idx) => (&body[..idx], Some(&body[idx + " in command ".len()..])),
            None => (body, None),
        };
        let code_start = location.rfind("}, ")? + "}, ".len();
        let code = leading_digits(&location[code_start..])?.parse().ok()?;
        let command = tail.and_then(leading_digits).and_then(|digits| digits.parse().ok());

        Some(Self { module, function, code, command })
    }

    /// The taxonomy label, if the abort comes from a known module and code.
    pub fn kind(&self) -> Option<FailureKind> {
        lookup(&self.module, self.code)
    }
}

impl fmt::Display for MoveAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module)?;
        if let Some(function) = &self.function {
            write!(f, "::{function}")?;
        }
        write!(f, " aborted with code {}", self.code)?;
        if let Some(kind) = self.kind() {
            write!(f, " ({kind:?})")?;
        }
        if let Some(command) = self.command {
            write!(f, " in command {command}")?;
        }
        Ok(())
    }
}

fn quoted_after<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let start = s.find(prefix)? + prefix.len();
    let len = s[start..].find('"')?;
    Some(&s[start..start + len])
}

fn leading_digits(s: &str) -> Option<&str> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    (end > 0).then(|| &s[..end])
}
