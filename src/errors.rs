//! Unified error types for the tracker.
//!
//! Every fallible operation in the crate returns [`Result`]. Entry validation problems
//! get their own enum so callers can map each one to a distinct user-facing message.

use crate::core::access::Action;
use sea_orm::DbErr;
use thiserror::Error;

/// Reasons a new entry is rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryValidationError {
    /// Total missing, unparsable, zero or negative
    #[error("Enter a valid total.")]
    InvalidTotal,

    /// Total above the per-entry cap
    #[error("The maximum per entry is {cap}.")]
    TotalExceedsCap {
        /// The total that was submitted
        total: i64,
        /// The per-entry cap
        cap: i64,
    },

    /// No branch was picked
    #[error("Select at least one branch.")]
    NoBranchSelected,

    /// The same branch was picked more than once
    #[error("Duplicate branches ({branch_id}). Select different branches.")]
    DuplicateBranch {
        /// First branch id seen twice
        branch_id: String,
    },

    /// More branches than an entry may be split across
    #[error("Maximum {max} branches per entry (got {count}).")]
    TooManyBranches {
        /// Number of branches submitted
        count: usize,
        /// Allowed maximum
        max: usize,
    },
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Storage backend failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Entry draft failed validation
    #[error("Invalid entry: {0}")]
    InvalidEntry(#[from] EntryValidationError),

    /// Referenced branch does not exist
    #[error("Branch not found: {id}")]
    BranchNotFound {
        /// Branch key that was looked up
        id: String,
    },

    /// Referenced entry does not exist
    #[error("Entry not found: {id}")]
    EntryNotFound {
        /// Entry id that was looked up
        id: i64,
    },

    /// Goals must be non-negative integers
    #[error("Invalid goal {goal}: goals cannot be negative")]
    InvalidGoal {
        /// Rejected goal value
        goal: i64,
    },

    /// The resolved role may not perform this action
    #[error("Role '{role}' is not allowed to {action}")]
    PermissionDenied {
        /// Label of the caller's role
        role: String,
        /// Action that was attempted
        action: Action,
    },

    /// PIN did not match any configured role
    #[error("Invalid PIN")]
    InvalidPin,

    /// I/O failure (config files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
