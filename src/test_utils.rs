//! Shared test utilities for the tally.
//!
//! This module provides common helper functions for setting up test databases,
//! seeding the standard three-branch fixture and building in-memory snapshots.

use crate::{
    config::branches::BranchConfig,
    core::{access::Role, branch, entry},
    errors::Result,
    models::{self, BranchSelection, EntryDraft},
};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The standard fixture: Santiago (goal 1000), Moca (goal 500), La Vega (no goal).
pub fn test_branch_configs() -> Vec<BranchConfig> {
    [("santiago", "Santiago", 1000), ("moca", "Moca", 500), ("la-vega", "La Vega", 0)]
        .into_iter()
        .map(|(id, name, goal)| BranchConfig {
            id: id.to_string(),
            name: name.to_string(),
            color: "bg-slate-500".to_string(),
            goal,
        })
        .collect()
}

/// Sets up a test database with the standard branches seeded.
pub async fn setup_with_branches() -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    branch::seed_branches(&db, &test_branch_configs()).await?;
    Ok(db)
}

/// Creates an entry split equally across `branch_ids`, timestamped now.
pub async fn create_test_entry(
    db: &DatabaseConnection,
    total: i64,
    branch_ids: &[&str],
) -> Result<models::Entry> {
    create_entry_at(db, Utc::now(), total, branch_ids).await
}

/// Creates an equally split entry at a given instant.
pub async fn create_entry_at(
    db: &DatabaseConnection,
    timestamp: DateTime<Utc>,
    total: i64,
    branch_ids: &[&str],
) -> Result<models::Entry> {
    let draft = EntryDraft {
        total: Some(total),
        timestamp,
        note: None,
        selections: branch_ids
            .iter()
            .map(|id| BranchSelection::new(*id, None))
            .collect(),
    };
    entry::add_entry(db, &Role::Admin, draft).await
}

/// UTC instant from calendar parts.
///
/// # Panics
/// Panics on an invalid date; test input only.
#[allow(clippy::unwrap_used)]
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

/// The default reporting zone, UTC-4.
#[allow(clippy::unwrap_used)]
pub fn region_zone() -> FixedOffset {
    FixedOffset::west_opt(4 * 3600).unwrap()
}

/// In-memory copy of the standard fixture with zero totals, in fixture order.
pub fn sample_branches() -> Vec<models::Branch> {
    test_branch_configs()
        .into_iter()
        .map(|c| models::Branch {
            id: c.id,
            name: c.name,
            color: c.color,
            total: 0,
            goal: c.goal,
        })
        .collect()
}

/// In-memory entry with the given allocations.
pub fn sample_entry(id: i64, timestamp: DateTime<Utc>, allocations: &[(&str, i64)]) -> models::Entry {
    models::Entry {
        id,
        timestamp,
        note: None,
        allocations: allocations
            .iter()
            .map(|(branch_id, amount)| models::Allocation::new(*branch_id, *amount))
            .collect(),
        is_deleted: false,
    }
}
