//! Branch seed configuration loaded from config.toml
//!
//! The `[[branches]]` tables describe the branches that exist in the region. They are
//! used to seed the database on first run or when a branch is missing; goals set later
//! by an admin are never overwritten by the seed values.

use serde::Deserialize;

/// Configuration for a single branch
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BranchConfig {
    /// Stable key (e.g. `"santiago"`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Display color
    #[serde(default = "default_color")]
    pub color: String,
    /// Initial goal used when the branch is first created
    #[serde(default)]
    pub goal: i64,
}

fn default_color() -> String {
    "bg-slate-500".to_string()
}
