//! Entry business logic - Handles creating, listing and deleting entries.
//!
//! New entries are validated, their total normalized into allocations, and then the
//! entry row and its allocation rows are written in one database transaction so a
//! failure never leaves a half-written entry. Deletion comes in two flavours: soft
//! delete (reversible, hides the entry from every total) and hard delete (removes the
//! entry and its allocations for good, only after an explicit confirmation).

use crate::{
    core::{
        access::{self, Action, Role},
        allocation::{normalize_allocations, selected_rows, validate_entry},
        branch::get_branch_by_id,
        period::{format_amount, format_timestamp},
    },
    entities::{Allocation, Entry, allocation, entry},
    errors::{Error, Result},
    models::{self, EntryDraft},
};
use chrono::{FixedOffset, SubsecRound};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

/// How many entries the recent-entries list shows.
pub const RECENT_ENTRIES_LIMIT: usize = 20;

/// Result of a hard-delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardDelete {
    /// The entry and its allocations were removed
    Deleted,
    /// The confirmation was declined; nothing changed
    Cancelled,
}

/// Validates a draft, splits its total across the selected branches and stores it.
///
/// Form rows without a branch are dropped first. Validation failures and unknown
/// branches abort before anything is written.
#[instrument(skip(db, draft), fields(total = ?draft.total))]
pub async fn add_entry(
    db: &DatabaseConnection,
    role: &Role,
    draft: EntryDraft,
) -> Result<models::Entry> {
    access::authorize(role, Action::AddEntry)?;

    let selections = selected_rows(draft.selections);
    let total = validate_entry(draft.total, &selections)
        .inspect_err(|e| warn!("Rejected entry: {}", e))?;

    let txn = db
        .begin()
        .await
        .inspect_err(|e| error!("Failed to start entry transaction: {}", e))?;

    for selection in &selections {
        if get_branch_by_id(&txn, &selection.branch_id).await?.is_none() {
            return Err(Error::BranchNotFound {
                id: selection.branch_id.clone(),
            });
        }
    }

    let allocations = normalize_allocations(total, &selections);
    let note = draft
        .note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let entry_model = entry::ActiveModel {
        timestamp: Set(draft.timestamp.trunc_subsecs(3)),
        note: Set(note),
        is_deleted: Set(false),
        submitted_by: Set(Some(role.to_string())),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .inspect_err(|e| error!("Failed to insert entry: {}", e))?;

    let rows = allocations.iter().map(|a| allocation::ActiveModel {
        entry_id: Set(entry_model.id),
        branch_id: Set(a.branch_id.clone()),
        amount: Set(a.amount),
        ..Default::default()
    });
    Allocation::insert_many(rows)
        .exec(&txn)
        .await
        .inspect_err(|e| error!("Failed to insert allocations: {}", e))?;

    txn.commit()
        .await
        .inspect_err(|e| error!("Failed to commit entry: {}", e))?;

    info!(entry_id = entry_model.id, total, "Entry saved");
    Ok(to_entry(entry_model, allocations))
}

fn to_entry(row: entry::Model, allocations: Vec<models::Allocation>) -> models::Entry {
    models::Entry {
        id: row.id,
        timestamp: row.timestamp,
        note: row.note,
        allocations,
        is_deleted: row.is_deleted,
    }
}

/// Lists every entry, deleted ones included, newest first.
#[instrument(skip(db))]
pub async fn list_entries(db: &DatabaseConnection) -> Result<Vec<models::Entry>> {
    let rows = Entry::find()
        .order_by_desc(entry::Column::Timestamp)
        .order_by_desc(entry::Column::Id)
        .all(db)
        .await
        .inspect_err(|e| error!("Failed to list entries: {}", e))?;

    let mut by_entry: HashMap<i64, Vec<models::Allocation>> = HashMap::new();
    for row in Allocation::find()
        .order_by_asc(allocation::Column::Id)
        .all(db)
        .await
        .inspect_err(|e| error!("Failed to list allocations: {}", e))?
    {
        by_entry
            .entry(row.entry_id)
            .or_default()
            .push(models::Allocation::new(row.branch_id, row.amount));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let allocations = by_entry.remove(&row.id).unwrap_or_default();
            to_entry(row, allocations)
        })
        .collect())
}

/// Fetches one entry with its allocations, deleted or not.
pub async fn get_entry(db: &DatabaseConnection, entry_id: i64) -> Result<Option<models::Entry>> {
    let Some(row) = Entry::find_by_id(entry_id)
        .one(db)
        .await
        .inspect_err(|e| error!("Failed to load entry {}: {}", entry_id, e))?
    else {
        return Ok(None);
    };

    let allocations = Allocation::find()
        .filter(allocation::Column::EntryId.eq(entry_id))
        .order_by_asc(allocation::Column::Id)
        .all(db)
        .await
        .inspect_err(|e| error!("Failed to load allocations of entry {}: {}", entry_id, e))?
        .into_iter()
        .map(|a| models::Allocation::new(a.branch_id, a.amount))
        .collect();

    Ok(Some(to_entry(row, allocations)))
}

/// One-line description of an entry for listings, e.g.
/// `19 oct 2026, 14:05 · 90 · Santiago 30, Moca 60 · Sunday offering`.
///
/// Branch ids without a matching branch are shown as-is.
#[must_use]
pub fn entry_line(entry: &models::Entry, branches: &[models::Branch], zone: &FixedOffset) -> String {
    let split: Vec<String> = entry
        .allocations
        .iter()
        .map(|a| {
            let name = branches
                .iter()
                .find(|b| b.id == a.branch_id)
                .map_or(a.branch_id.as_str(), |b| b.name.as_str());
            format!("{name} {}", format_amount(a.amount))
        })
        .collect();

    let mut line = format!(
        "{} · {} · {}",
        format_timestamp(entry.timestamp, zone),
        format_amount(entry.amount()),
        split.join(", ")
    );
    if let Some(note) = &entry.note {
        line.push_str(" · ");
        line.push_str(note);
    }
    line
}

/// Admin panel listing: every entry including soft-deleted ones.
pub async fn list_all_entries(db: &DatabaseConnection, role: &Role) -> Result<Vec<models::Entry>> {
    access::authorize(role, Action::ManageEntries)?;
    list_entries(db).await
}

/// Recent entries visible to `role`, newest first, capped at [`RECENT_ENTRIES_LIMIT`].
pub async fn list_recent_entries(
    db: &DatabaseConnection,
    role: &Role,
) -> Result<Vec<models::Entry>> {
    access::authorize(role, Action::ViewRecentEntries)?;
    let entries = list_entries(db).await?;
    Ok(access::visible_entries(role, &entries)
        .into_iter()
        .take(RECENT_ENTRIES_LIMIT)
        .cloned()
        .collect())
}

/// Hides an entry from every total, report and badge. Reversible with [`restore_entry`].
#[instrument(skip(db))]
pub async fn soft_delete_entry(db: &DatabaseConnection, role: &Role, entry_id: i64) -> Result<()> {
    access::authorize(role, Action::SoftDeleteEntry)?;
    set_deleted(db, entry_id, true).await?;
    info!(entry_id, "Entry moved to deleted");
    Ok(())
}

/// Brings a soft-deleted entry back.
#[instrument(skip(db))]
pub async fn restore_entry(db: &DatabaseConnection, role: &Role, entry_id: i64) -> Result<()> {
    access::authorize(role, Action::RestoreEntry)?;
    set_deleted(db, entry_id, false).await?;
    info!(entry_id, "Entry restored");
    Ok(())
}

async fn set_deleted(db: &DatabaseConnection, entry_id: i64, is_deleted: bool) -> Result<()> {
    let row = Entry::find_by_id(entry_id)
        .one(db)
        .await
        .inspect_err(|e| error!("Failed to load entry {}: {}", entry_id, e))?
        .ok_or(Error::EntryNotFound { id: entry_id })?;

    let mut active_model: entry::ActiveModel = row.into();
    active_model.is_deleted = Set(is_deleted);
    active_model
        .update(db)
        .await
        .inspect_err(|e| error!("Failed to update entry {}: {}", entry_id, e))?;
    Ok(())
}

/// Permanently removes an entry and its allocations.
///
/// `confirm` is shown the entry and must return `true` for anything to happen; when it
/// declines the call returns [`HardDelete::Cancelled`] and the database is untouched.
#[instrument(skip(db, confirm))]
pub async fn hard_delete_entry<F>(
    db: &DatabaseConnection,
    role: &Role,
    entry_id: i64,
    confirm: F,
) -> Result<HardDelete>
where
    F: FnOnce(&models::Entry) -> bool,
{
    access::authorize(role, Action::HardDeleteEntry)?;

    let entry = get_entry(db, entry_id)
        .await?
        .ok_or(Error::EntryNotFound { id: entry_id })?;
    if !confirm(&entry) {
        info!(entry_id, "Permanent delete cancelled");
        return Ok(HardDelete::Cancelled);
    }

    let txn = db
        .begin()
        .await
        .inspect_err(|e| error!("Failed to start delete transaction: {}", e))?;
    Allocation::delete_many()
        .filter(allocation::Column::EntryId.eq(entry_id))
        .exec(&txn)
        .await
        .inspect_err(|e| error!("Failed to delete allocations of entry {}: {}", entry_id, e))?;
    Entry::delete_by_id(entry_id)
        .exec(&txn)
        .await
        .inspect_err(|e| error!("Failed to delete entry {}: {}", entry_id, e))?;
    txn.commit()
        .await
        .inspect_err(|e| error!("Failed to delete entry {}: {}", entry_id, e))?;

    info!(entry_id, "Entry permanently deleted");
    Ok(HardDelete::Deleted)
}
