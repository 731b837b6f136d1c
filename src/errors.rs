//! Error types returned by table operations.

use std::error::Error;
use std::fmt;

use crate::node::NodeTwin;

/// The ways a table operation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadixError {
    /// A route with the identical key and canonical mask is already present.
    DuplicateRoute,
    /// The requested key/mask pair is not in the table.
    NotFound,
    /// The mask cache could not allocate a new canonical mask. The table is
    /// left unchanged.
    AllocationFailure,
    /// Two different normal masks would claim the same attachment slot on an
    /// ancestor's mask list. The insert is rolled back.
    MaskConflict,
    /// A mask-list link that must exist was missing or pointed at the wrong
    /// entry. The operation is aborted rather than desynchronizing the tree.
    Inconsistent,
    /// The key's declared length exceeds the runtime's maximum key length.
    KeyTooLong,
}

impl RadixError {
    /// A short, static description of the error.
    pub fn as_str(self) -> &'static str {
        match self {
            RadixError::DuplicateRoute => "route already present",
            RadixError::NotFound => "route not found",
            RadixError::AllocationFailure => "mask cache exhausted",
            RadixError::MaskConflict => "normal mask attachment conflict",
            RadixError::Inconsistent => "inconsistent mask annotation",
            RadixError::KeyTooLong => "key exceeds the maximum key length",
        }
    }
}

impl fmt::Display for RadixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error for RadixError {}

/// A failed insertion. Carries the caller's [`NodeTwin`] back out so the
/// storage is not lost; failed inserts leave the table unchanged.
#[derive(Debug)]
pub struct InsertError {
    /// Why the insert failed.
    pub kind: RadixError,
    /// The untouched node storage supplied to the insert.
    pub twin: NodeTwin,
}

impl InsertError {
    pub(crate) fn new(kind: RadixError, twin: NodeTwin) -> Self {
        Self { kind, twin }
    }
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())
    }
}

impl Error for InsertError {}
