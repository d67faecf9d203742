//! Entity module - SeaORM entity definitions for the tracker's tables.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod allocation;
pub mod branch;
pub mod entry;

// Re-export specific types to avoid conflicts
pub use allocation::{
    Column as AllocationColumn, Entity as Allocation, Model as AllocationModel,
};
pub use branch::{Column as BranchColumn, Entity as Branch, Model as BranchModel};
pub use entry::{Column as EntryColumn, Entity as Entry, Model as EntryModel};
