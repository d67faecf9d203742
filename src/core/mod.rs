//! Core business logic, independent of any user interface.
//!
//! The allocation, report, badge and dashboard code is pure and works on in-memory
//! snapshots; the branch and entry modules own persistence.

pub mod access;
pub mod allocation;
pub mod badge;
pub mod branch;
pub mod dashboard;
pub mod entry;
pub mod period;
pub mod report;
