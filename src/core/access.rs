//! Role gating.
//!
//! A shared PIN resolves to one of three roles. PIN comparison sits behind
//! [`PinVerifier`] so the static table can later be swapped for real credentials; the
//! rest of the crate only ever sees the resolved [`Role`].

use crate::{
    config::access::AccessConfig,
    errors::{Error, Result},
    models::Entry,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Resolved caller role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Role {
    /// Anyone without a PIN, or with the public PIN
    Public,
    /// Leader of one branch
    Leader {
        /// Branch the leader is responsible for
        branch_id: String,
    },
    /// Regional administrator
    Admin,
}

impl Role {
    /// Branch the role is tied to, if any.
    #[must_use]
    pub fn branch_id(&self) -> Option<&str> {
        match self {
            Self::Leader { branch_id } => Some(branch_id),
            Self::Public | Self::Admin => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Leader { branch_id } => write!(f, "leader:{branch_id}"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Things a caller may ask the tracker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Record a new entry
    AddEntry,
    /// Read the dashboard summary
    ViewDashboard,
    /// Read the recent-entries list filtered for the role
    ViewRecentEntries,
    /// Read period reports
    ViewReports,
    /// Change branch goals
    UpdateGoals,
    /// List every entry, deleted ones included
    ManageEntries,
    /// Soft-delete an entry
    SoftDeleteEntry,
    /// Restore a soft-deleted entry
    RestoreEntry,
    /// Permanently delete an entry
    HardDeleteEntry,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AddEntry => "add entries",
            Self::ViewDashboard => "view the dashboard",
            Self::ViewRecentEntries => "view recent entries",
            Self::ViewReports => "view reports",
            Self::UpdateGoals => "update goals",
            Self::ManageEntries => "manage entries",
            Self::SoftDeleteEntry => "delete entries",
            Self::RestoreEntry => "restore entries",
            Self::HardDeleteEntry => "permanently delete entries",
        };
        f.write_str(text)
    }
}

/// Whether `role` may perform `action`.
#[must_use]
pub const fn is_allowed(role: &Role, action: Action) -> bool {
    match action {
        Action::AddEntry | Action::ViewDashboard | Action::ViewRecentEntries => true,
        Action::ViewReports
        | Action::UpdateGoals
        | Action::ManageEntries
        | Action::SoftDeleteEntry
        | Action::RestoreEntry
        | Action::HardDeleteEntry => matches!(role, Role::Admin),
    }
}

/// Fails with [`Error::PermissionDenied`] when `role` may not perform `action`.
pub fn authorize(role: &Role, action: Action) -> Result<()> {
    if is_allowed(role, action) {
        return Ok(());
    }
    warn!(%role, %action, "Permission denied");
    Err(Error::PermissionDenied {
        role: role.to_string(),
        action,
    })
}

/// Entries a role sees in the recent-entries list.
///
/// Admins see every non-deleted entry, leaders the non-deleted entries that allocate
/// anything to their branch, and the public nothing.
#[must_use]
pub fn visible_entries<'a>(role: &Role, entries: &'a [Entry]) -> Vec<&'a Entry> {
    if *role == Role::Public {
        return Vec::new();
    }
    entries
        .iter()
        .filter(|e| !e.is_deleted && role.branch_id().is_none_or(|b| e.touches(b)))
        .collect()
}

/// Turns a PIN into a role.
pub trait PinVerifier {
    /// Role for `pin`, or `None` when the PIN is unknown.
    fn resolve(&self, pin: &str) -> Option<Role>;
}

/// Static PIN table loaded from configuration.
#[derive(Debug, Clone)]
pub struct PinTable {
    admin_pin: String,
    public_pin: String,
    branch_pins: Vec<(String, String)>,
}

impl PinTable {
    /// Builds the table; `branch_pins` maps branch id to PIN.
    #[must_use]
    pub fn new(
        admin_pin: impl Into<String>,
        public_pin: impl Into<String>,
        branch_pins: Vec<(String, String)>,
    ) -> Self {
        Self {
            admin_pin: admin_pin.into(),
            public_pin: public_pin.into(),
            branch_pins,
        }
    }

    /// Builds the table from the `[access]` section of the configuration.
    #[must_use]
    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(
            config.admin_pin.clone(),
            config.public_pin.clone(),
            config
                .branch_pins
                .iter()
                .map(|(branch, pin)| (branch.clone(), pin.clone()))
                .collect(),
        )
    }
}

impl PinVerifier for PinTable {
    fn resolve(&self, pin: &str) -> Option<Role> {
        if !self.admin_pin.is_empty() && pin == self.admin_pin {
            return Some(Role::Admin);
        }
        if let Some((branch_id, _)) = self.branch_pins.iter().find(|(_, p)| p == pin) {
            return Some(Role::Leader {
                branch_id: branch_id.clone(),
            });
        }
        if !self.public_pin.is_empty() && pin == self.public_pin {
            return Some(Role::Public);
        }
        None
    }
}

/// Resolves a typed PIN (surrounding whitespace ignored).
pub fn sign_in(verifier: &impl PinVerifier, pin: &str) -> Result<Role> {
    let trimmed = pin.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidPin);
    }
    let role = verifier.resolve(trimmed).ok_or(Error::InvalidPin)?;
    debug!(%role, "PIN accepted");
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, sample_entry};

    fn table() -> PinTable {
        PinTable::new(
            "9999",
            "0000",
            vec![
                ("santiago".to_string(), "1234".to_string()),
                ("moca".to_string(), "2345".to_string()),
            ],
        )
    }

    #[test]
    fn test_sign_in_resolves_roles() {
        let table = table();
        assert_eq!(sign_in(&table, "9999").ok(), Some(Role::Admin));
        assert_eq!(
            sign_in(&table, " 2345 ").ok(),
            Some(Role::Leader {
                branch_id: "moca".to_string()
            })
        );
        assert_eq!(sign_in(&table, "0000").ok(), Some(Role::Public));
    }

    #[test]
    fn test_sign_in_rejects_unknown_and_blank() {
        let table = table();
        assert!(matches!(sign_in(&table, "1111"), Err(Error::InvalidPin)));
        assert!(matches!(sign_in(&table, "   "), Err(Error::InvalidPin)));
    }

    #[test]
    fn test_empty_configured_pins_never_match() {
        let table = PinTable::new("", "", Vec::new());
        assert_eq!(table.resolve(""), None);
    }

    #[test]
    fn test_permissions() {
        let leader = Role::Leader {
            branch_id: "moca".to_string(),
        };
        for role in [Role::Public, leader.clone(), Role::Admin] {
            assert!(is_allowed(&role, Action::AddEntry));
            assert!(is_allowed(&role, Action::ViewDashboard));
        }
        assert!(is_allowed(&Role::Admin, Action::HardDeleteEntry));
        assert!(is_allowed(&Role::Admin, Action::ViewReports));
        assert!(!is_allowed(&leader, Action::UpdateGoals));
        assert!(!is_allowed(&Role::Public, Action::SoftDeleteEntry));
        assert!(matches!(
            authorize(&leader, Action::RestoreEntry),
            Err(Error::PermissionDenied { action: Action::RestoreEntry, .. })
        ));
    }

    #[test]
    fn test_visible_entries_per_role() {
        let mut deleted = sample_entry(3, at(2026, 10, 19, 12, 0), &[("moca", 5)]);
        deleted.is_deleted = true;
        let entries = vec![
            sample_entry(1, at(2026, 10, 19, 12, 0), &[("santiago", 5)]),
            sample_entry(2, at(2026, 10, 19, 12, 0), &[("moca", 5), ("santiago", 5)]),
            deleted,
        ];

        let ids = |role: &Role| -> Vec<i64> {
            visible_entries(role, &entries).iter().map(|e| e.id).collect()
        };
        assert_eq!(ids(&Role::Admin), vec![1, 2]);
        assert_eq!(
            ids(&Role::Leader {
                branch_id: "moca".to_string()
            }),
            vec![2]
        );
        assert!(ids(&Role::Public).is_empty());
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(
            Role::Leader {
                branch_id: "moca".to_string()
            }
            .to_string(),
            "leader:moca"
        );
        assert_eq!(Role::Public.branch_id(), None);
    }
}
