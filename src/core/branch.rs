//! Branch business logic - listing, goals and seeding.
//!
//! A branch's total is never stored. [`list_branches`] derives it on every call from
//! the allocations of non-deleted entries, so it cannot drift from the entries, and the
//! regional goal is likewise recomputed as the sum of the branch goals.

use crate::{
    config::branches::BranchConfig,
    core::access::{self, Action, Role},
    entities::{Allocation, Branch, branch, entry},
    errors::{Error, Result},
    models,
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

/// Sort key for branch names in Spanish alphabetical order.
///
/// Case and accents are folded (`Ángeles` sorts with `angeles`) and `ñ` sorts after
/// every other `n` sequence, before `o`.
#[must_use]
pub fn name_sort_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'á' | 'à' | 'â' | 'ä' => key.push('a'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'í' | 'ì' | 'î' | 'ï' => key.push('i'),
            'ó' | 'ò' | 'ô' | 'ö' => key.push('o'),
            'ú' | 'ù' | 'û' | 'ü' => key.push('u'),
            'ç' => key.push('c'),
            // '~' is above every ASCII letter
            'ñ' => key.push_str("n~"),
            other => key.push(other),
        }
    }
    key
}

/// Lists every branch, alphabetically by name (see [`name_sort_key`]), with its
/// derived total.
#[instrument(skip(db))]
pub async fn list_branches(db: &DatabaseConnection) -> Result<Vec<models::Branch>> {
    let mut rows = Branch::find()
        .all(db)
        .await
        .inspect_err(|e| error!("Failed to list branches: {}", e))?;
    rows.sort_by_cached_key(|row| name_sort_key(&row.name));
    let totals = active_totals(db).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let total = totals.get(&row.id).copied().unwrap_or(0);
            models::Branch {
                id: row.id,
                name: row.name,
                color: row.color,
                total,
                goal: row.goal,
            }
        })
        .collect())
}

/// Sum of allocations per branch over entries that are not soft-deleted.
async fn active_totals<C>(db: &C) -> Result<HashMap<String, i64>>
where
    C: ConnectionTrait,
{
    let allocations = Allocation::find()
        .inner_join(crate::entities::Entry)
        .filter(entry::Column::IsDeleted.eq(false))
        .all(db)
        .await
        .inspect_err(|e| error!("Failed to load allocations for totals: {}", e))?;

    let mut totals = HashMap::new();
    for allocation in allocations {
        *totals.entry(allocation.branch_id).or_insert(0) += allocation.amount;
    }
    Ok(totals)
}

/// Finds a branch row by its key.
pub async fn get_branch_by_id<C>(db: &C, branch_id: &str) -> Result<Option<branch::Model>>
where
    C: ConnectionTrait,
{
    Branch::find_by_id(branch_id.to_string())
        .one(db)
        .await
        .inspect_err(|e| error!("Failed to look up branch {}: {}", branch_id, e))
        .map_err(Into::into)
}

/// Regional goal: the sum of all branch goals, read fresh every time.
#[instrument(skip(db))]
pub async fn get_regional_goal(db: &DatabaseConnection) -> Result<i64> {
    let rows = Branch::find()
        .all(db)
        .await
        .inspect_err(|e| error!("Failed to load branch goals: {}", e))?;
    Ok(rows.iter().map(|b| b.goal).sum())
}

/// Sets one branch goal. Admin only; goals cannot be negative.
#[instrument(skip(db))]
pub async fn update_branch_goal(
    db: &DatabaseConnection,
    role: &Role,
    branch_id: &str,
    goal: i64,
) -> Result<branch::Model> {
    access::authorize(role, Action::UpdateGoals)?;
    let updated = set_goal(db, branch_id, goal).await?;
    info!(branch = %branch_id, goal, "Branch goal updated");
    Ok(updated)
}

/// Saves the goals form: `(branch_id, raw input)` pairs.
///
/// Inputs that are not whole numbers or are negative are skipped, the rest are written
/// in one transaction. Returns how many goals were saved.
#[instrument(skip(db, inputs))]
pub async fn update_branch_goals(
    db: &DatabaseConnection,
    role: &Role,
    inputs: &[(String, String)],
) -> Result<usize> {
    access::authorize(role, Action::UpdateGoals)?;

    let txn = db
        .begin()
        .await
        .inspect_err(|e| error!("Failed to start goal transaction: {}", e))?;
    let mut saved = 0;
    for (branch_id, raw) in inputs {
        match raw.trim().parse::<i64>() {
            Ok(goal) if goal >= 0 => {
                set_goal(&txn, branch_id, goal).await?;
                saved += 1;
            }
            _ => warn!(branch = %branch_id, input = %raw, "Skipping invalid goal input"),
        }
    }
    txn.commit()
        .await
        .inspect_err(|e| error!("Failed to commit goal updates: {}", e))?;

    info!(saved, "Branch goals saved");
    Ok(saved)
}

async fn set_goal<C>(db: &C, branch_id: &str, goal: i64) -> Result<branch::Model>
where
    C: ConnectionTrait,
{
    if goal < 0 {
        return Err(Error::InvalidGoal { goal });
    }

    let row = get_branch_by_id(db, branch_id)
        .await?
        .ok_or_else(|| Error::BranchNotFound {
            id: branch_id.to_string(),
        })?;

    let mut active_model: branch::ActiveModel = row.into();
    active_model.goal = Set(goal);
    active_model
        .update(db)
        .await
        .inspect_err(|e| error!("Failed to update goal of {}: {}", branch_id, e))
        .map_err(Into::into)
}

/// Inserts configured branches that do not exist yet. Existing rows are left alone so
/// goals changed by an admin survive restarts. Returns how many branches were created.
#[instrument(skip(db, configs))]
pub async fn seed_branches(db: &DatabaseConnection, configs: &[BranchConfig]) -> Result<usize> {
    let mut created = 0;
    for config in configs {
        if get_branch_by_id(db, &config.id).await?.is_some() {
            continue;
        }

        branch::ActiveModel {
            id: Set(config.id.clone()),
            name: Set(config.name.trim().to_string()),
            color: Set(config.color.clone()),
            goal: Set(config.goal.max(0)),
        }
        .insert(db)
        .await
        .inspect_err(|e| error!("Failed to seed branch {}: {}", config.id, e))?;
        created += 1;
    }

    info!(created, configured = configs.len(), "Branches seeded");
    Ok(created)
}
