//! Error types for the two reportable classes in this crate.
//!
//! Normal end-of-data/absence (missing key, end of a pipeline stream) is
//! never an error here — it is a `bool`, `Option`, or empty `Vec`. Only
//! contract violations and invariant breaks get a `thiserror` type; both are
//! declared but unused in the `rust-wrapper` ancestor of this crate, wired
//! up here since a library wants typed errors at its public seams.

use thiserror::Error;

/// A caller violated an executor's construction contract (spec.md §7.2).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("invalid attribute {attr:?}: expected one of \"id\", \"val1\", \"val2\"")]
    InvalidAttribute { attr: String },
}

/// A B+ tree structural mutation left the tree inconsistent (spec.md §7.3,
/// the fatal class). `BPlusTree` is built so this can only be raised from
/// `check_invariants`, a test-only consistency auditor; no production path
/// returns it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BTreeError {
    #[error("b+ tree invariant violated: {0}")]
    InvariantViolation(String),
}
