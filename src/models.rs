//! In-memory snapshots handed to the allocation and reporting code.
//!
//! These are plain data: the persistence layer builds them from entity rows, and the
//! pure functions in [`crate::core`] read them without touching the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A branch together with its derived running total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Stable string key
    pub id: String,
    /// Display name
    pub name: String,
    /// Display color
    pub color: String,
    /// Sum of all non-deleted allocations addressed to this branch
    pub total: i64,
    /// Admin-set goal, never negative
    pub goal: i64,
}

/// `(branch, amount)` share of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Branch receiving the amount
    pub branch_id: String,
    /// Whole-unit amount
    pub amount: i64,
}

impl Allocation {
    /// Builds an allocation from anything string-like.
    pub fn new(branch_id: impl Into<String>, amount: i64) -> Self {
        Self {
            branch_id: branch_id.into(),
            amount,
        }
    }
}

/// One recorded contribution with its allocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Storage identifier
    pub id: i64,
    /// When the contribution happened
    pub timestamp: DateTime<Utc>,
    /// Optional free-text note
    pub note: Option<String>,
    /// Allocations in the order they were written
    pub allocations: Vec<Allocation>,
    /// Soft delete flag
    pub is_deleted: bool,
}

impl Entry {
    /// Total of the entry, i.e. the sum of its allocations.
    #[must_use]
    pub fn amount(&self) -> i64 {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    /// Whether any allocation targets `branch_id`.
    #[must_use]
    pub fn touches(&self, branch_id: &str) -> bool {
        self.allocations.iter().any(|a| a.branch_id == branch_id)
    }
}

/// One branch picked on the entry form, with the optional amount typed next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSelection {
    /// Selected branch
    pub branch_id: String,
    /// User-entered weight; `None` when left blank
    pub entered: Option<i64>,
}

impl BranchSelection {
    /// Selection with an explicit entered amount.
    pub fn new(branch_id: impl Into<String>, entered: Option<i64>) -> Self {
        Self {
            branch_id: branch_id.into(),
            entered,
        }
    }

    /// Selection built from raw form input; unparsable amounts count as blank.
    pub fn from_input(branch_id: impl Into<String>, raw_amount: &str) -> Self {
        Self::new(
            branch_id,
            crate::core::allocation::parse_entered_amount(raw_amount),
        )
    }
}

/// Everything needed to create an entry, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    /// Declared total; `None` when missing or unparsable
    pub total: Option<i64>,
    /// When the contribution happened
    pub timestamp: DateTime<Utc>,
    /// Optional note; blank notes are stored as `None`
    pub note: Option<String>,
    /// Branch rows from the form, in display order
    pub selections: Vec<BranchSelection>,
}
