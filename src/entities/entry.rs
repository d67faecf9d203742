//! Entry entity - One recorded contribution.
//!
//! The amount of an entry is not a column; it is the sum of its rows in
//! `entry_allocations`. `is_deleted` implements soft delete.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the contribution happened
    pub timestamp: DateTimeUtc,
    /// Optional free-text note
    pub note: Option<String>,
    /// Soft delete flag - hidden from totals but restorable
    pub is_deleted: bool,
    /// Label of the role that submitted the entry (`"public"`, `"leader:<branch>"`, `"admin"`)
    pub submitted_by: Option<String>,
}

/// Defines relationships between Entry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One entry is split into many allocations
    #[sea_orm(has_many = "super::allocation::Entity")]
    Allocations,
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
