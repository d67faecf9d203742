//! Report generation business logic.
//!
//! Reports bucket non-deleted entries by period and branch, and express each bucket
//! as a percentage of the branch goal (or of the regional goal when the branch has
//! none). The aggregation itself is pure; [`generate_report`] only loads the snapshot
//! and hands it over.

use crate::{
    core::{
        access::{self, Action, Role},
        branch, entry,
        period::{DateWindow, Granularity, Period},
    },
    errors::Result,
    models::{Branch, Entry},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Which entries to report on and how to bucket them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Bucketing unit
    pub granularity: Granularity,
    /// Inclusive date filter
    pub window: DateWindow,
}

impl ReportQuery {
    /// The report view's starting point: `granularity` over the current Monday-Sunday
    /// week in `zone`.
    #[must_use]
    pub fn current_week(granularity: Granularity, now: DateTime<Utc>, zone: &FixedOffset) -> Self {
        Self {
            granularity,
            window: DateWindow::current_week(now, zone),
        }
    }
}

/// One `(period, branch)` line of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Period label, e.g. `19 oct 2026 – 25 oct 2026`
    pub period: String,
    /// Branch key
    pub branch_id: String,
    /// Branch display name
    pub branch_name: String,
    /// Amount allocated to the branch within the period
    pub amount: i64,
    /// Amount as a percentage of the branch goal (or the regional goal as fallback)
    pub percentage: f64,
}

/// Regional goal: always the sum of the branch goals.
#[must_use]
pub fn regional_goal(branches: &[Branch]) -> i64 {
    branches.iter().map(|b| b.goal).sum()
}

/// `amount` as a percentage of `goal`; zero when there is no positive goal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent_of(amount: i64, goal: i64) -> f64 {
    if goal <= 0 {
        return 0.0;
    }

    (amount as f64 / goal as f64) * 100.0
}

/// Percentage for a report row: branch goal first, regional goal as fallback.
#[must_use]
pub fn row_percentage(amount: i64, branch_goal: i64, regional_goal: i64) -> f64 {
    if branch_goal > 0 {
        percent_of(amount, branch_goal)
    } else {
        percent_of(amount, regional_goal)
    }
}

/// Buckets `entries` into report rows.
///
/// Deleted entries and entries outside the window are skipped. For [`Granularity::Total`]
/// every branch gets exactly one `Total` row. Otherwise each period that has at least one
/// entry produces one row per branch, including branches with nothing in that period;
/// periods are ordered newest first and branches keep the order of `branches`.
#[must_use]
pub fn build_report(
    branches: &[Branch],
    entries: &[Entry],
    query: &ReportQuery,
    zone: &FixedOffset,
) -> Vec<ReportRow> {
    let regional = regional_goal(branches);

    let mut sums: BTreeMap<Period, HashMap<&str, i64>> = BTreeMap::new();
    for entry in entries
        .iter()
        .filter(|e| !e.is_deleted && query.window.contains(e.timestamp, zone))
    {
        let period = Period::of(entry.timestamp, query.granularity, zone);
        let bucket = sums.entry(period).or_default();
        for allocation in &entry.allocations {
            *bucket.entry(allocation.branch_id.as_str()).or_insert(0) += allocation.amount;
        }
    }

    if query.granularity == Granularity::Total {
        let collapsed = sums.remove(&Period::Total).unwrap_or_default();
        return branches
            .iter()
            .map(|b| make_row(Period::Total.label(), b, &collapsed, regional))
            .collect();
    }

    let mut rows = Vec::with_capacity(sums.len() * branches.len());
    for (period, bucket) in sums.iter().rev() {
        let label = period.label();
        rows.extend(
            branches
                .iter()
                .map(|b| make_row(label.clone(), b, bucket, regional)),
        );
    }
    rows
}

fn make_row(
    period: String,
    branch: &Branch,
    bucket: &HashMap<&str, i64>,
    regional: i64,
) -> ReportRow {
    let amount = bucket.get(branch.id.as_str()).copied().unwrap_or(0);
    ReportRow {
        period,
        branch_id: branch.id.clone(),
        branch_name: branch.name.clone(),
        amount,
        percentage: row_percentage(amount, branch.goal, regional),
    }
}

/// Per-period footer totals, in the order periods first appear in `rows`.
#[must_use]
pub fn period_totals(rows: &[ReportRow]) -> Vec<(String, i64)> {
    let mut totals: Vec<(String, i64)> = Vec::new();
    for row in rows {
        match totals.iter_mut().find(|(period, _)| *period == row.period) {
            Some((_, sum)) => *sum += row.amount,
            None => totals.push((row.period.clone(), row.amount)),
        }
    }
    totals
}

/// Loads the current snapshot and builds a report for an admin.
///
/// Reports are admin-only; other roles get `PermissionDenied` before anything is read.
#[instrument(skip(db, zone))]
pub async fn generate_report(
    db: &DatabaseConnection,
    role: &Role,
    query: ReportQuery,
    zone: &FixedOffset,
) -> Result<Vec<ReportRow>> {
    access::authorize(role, Action::ViewReports)?;

    let branches = branch::list_branches(db).await?;
    let entries = entry::list_entries(db).await?;
    let rows = build_report(&branches, &entries, &query, zone);
    debug!(rows = rows.len(), "Report generated");
    Ok(rows)
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`. The bar is clamped to
/// 0-100 but the printed percentage is not, so overshooting a goal stays visible.
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}
