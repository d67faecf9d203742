//! Dashboard summary: regional progress, per-branch progress, badges and the weekly
//! highlight, computed from one snapshot of branches and entries.

use crate::{
    core::{
        access::{self, Action, Role},
        badge::{self, Badge, RuleContext, WeeklyHighlight},
        branch::{self, name_sort_key},
        entry,
        period::format_amount,
        report::{format_progress_bar, percent_of, regional_goal},
    },
    errors::Result,
    models::{Branch, Entry},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::fmt;
use tracing::{debug, instrument};

/// Progress of one branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchProgress {
    /// Branch key
    pub id: String,
    /// Display name
    pub name: String,
    /// Display color
    pub color: String,
    /// Derived total
    pub total: i64,
    /// Branch goal
    pub goal: i64,
    /// Total as a percentage of the branch goal (0 without a goal)
    pub percent_of_goal: f64,
    /// Total as a percentage of the regional goal, capped at 100
    pub percent_of_region: f64,
    /// Badges this branch earns right now
    pub badges: Vec<Badge>,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Sum of all branch totals
    pub total: i64,
    /// Sum of all branch goals
    pub goal: i64,
    /// What is left to reach the regional goal, never negative
    pub remaining: i64,
    /// Regional total as a percentage of the regional goal
    pub percent: f64,
    /// Featured branch first, then alphabetical by name
    pub branches: Vec<BranchProgress>,
    /// Badges earned anywhere in the region
    pub badges: Vec<Badge>,
    /// Seven-day headline
    pub highlight: WeeklyHighlight,
    /// When the snapshot was computed
    pub generated_at: DateTime<Utc>,
}

/// Builds the dashboard from an in-memory snapshot.
#[must_use]
pub fn build_dashboard(
    branches: &[Branch],
    entries: &[Entry],
    now: DateTime<Utc>,
    featured: Option<&str>,
) -> DashboardSnapshot {
    let goal = regional_goal(branches);
    let total: i64 = branches.iter().map(|b| b.total).sum();
    let ctx = RuleContext {
        entries,
        branches,
        now,
    };

    let mut ordered: Vec<&Branch> = branches.iter().collect();
    ordered.sort_by_cached_key(|b| (featured != Some(b.id.as_str()), name_sort_key(&b.name)));

    let progress = ordered
        .into_iter()
        .map(|b| BranchProgress {
            id: b.id.clone(),
            name: b.name.clone(),
            color: b.color.clone(),
            total: b.total,
            goal: b.goal,
            percent_of_goal: percent_of(b.total, b.goal),
            percent_of_region: percent_of(b.total, goal).min(100.0),
            badges: badge::branch_badges(b, &ctx),
        })
        .collect();

    DashboardSnapshot {
        total,
        goal,
        remaining: (goal - total).max(0),
        percent: percent_of(total, goal),
        branches: progress,
        badges: badge::regional_badges(&ctx),
        highlight: badge::weekly_highlight(branches, entries, now),
        generated_at: now,
    }
}

/// Loads branches and entries and builds the dashboard.
#[instrument(skip(db))]
pub async fn load_dashboard(
    db: &DatabaseConnection,
    role: &Role,
    featured: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DashboardSnapshot> {
    access::authorize(role, Action::ViewDashboard)?;

    let branches = branch::list_branches(db).await?;
    let entries = entry::list_entries(db).await?;
    let snapshot = build_dashboard(&branches, &entries, now, featured);
    debug!(total = snapshot.total, goal = snapshot.goal, "Dashboard loaded");
    Ok(snapshot)
}

impl fmt::Display for DashboardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Region: {} of {} {}",
            format_amount(self.total),
            format_amount(self.goal),
            format_progress_bar(self.percent, None)
        )?;
        writeln!(f, "Remaining: {}", format_amount(self.remaining))?;
        for branch in &self.branches {
            let icons: String = branch.badges.iter().map(|b| b.icon).collect();
            writeln!(
                f,
                "  {:<16} {:>8} / {:<8} {} {}",
                branch.name,
                format_amount(branch.total),
                format_amount(branch.goal),
                format_progress_bar(branch.percent_of_goal, None),
                icons
            )?;
        }
        if !self.badges.is_empty() {
            writeln!(f, "Badges:")?;
            for badge in &self.badges {
                writeln!(f, "  {} {}: {}", badge.icon, badge.name, badge.description)?;
            }
        }
        write!(f, "{}", self.highlight)
    }
}
