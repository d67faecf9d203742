//! Allocation entity - The share of one entry attributed to one branch.
//!
//! Rows are removed with their entry (`ON DELETE CASCADE`).
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Allocation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entry_allocations")]
pub struct Model {
    /// Unique identifier, also preserves the order allocations were written in
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Entry this allocation belongs to
    pub entry_id: i64,
    /// Branch receiving the amount
    pub branch_id: String,
    /// Whole-unit amount attributed to the branch
    pub amount: i64,
}

/// Defines relationships between Allocation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each allocation belongs to one entry
    #[sea_orm(
        belongs_to = "super::entry::Entity",
        from = "Column::EntryId",
        to = "super::entry::Column::Id",
        on_delete = "Cascade"
    )]
    Entry,
    /// Each allocation targets one branch
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
}

impl Related<super::entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entry.def()
    }
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
