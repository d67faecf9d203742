//! PIN configuration.
//!
//! PINs come from the `[access]` table of config.toml. `ADMIN_PIN` and `PUBLIC_PIN`
//! in the environment (or `.env`) take precedence, so the admin PIN does not have to
//! live in a checked-in file.

use serde::Deserialize;
use std::collections::BTreeMap;

/// The `[access]` section
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    /// PIN that resolves to the admin role
    #[serde(default)]
    pub admin_pin: String,
    /// PIN that resolves to the public role
    #[serde(default = "default_public_pin")]
    pub public_pin: String,
    /// Branch id to leader PIN
    #[serde(default)]
    pub branch_pins: BTreeMap<String, String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_pin: String::new(),
            public_pin: default_public_pin(),
            branch_pins: BTreeMap::new(),
        }
    }
}

fn default_public_pin() -> String {
    "0000".to_string()
}

impl AccessConfig {
    /// Applies `ADMIN_PIN` / `PUBLIC_PIN` from the environment when they are set and non-empty.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("ADMIN_PIN").ok(),
            std::env::var("PUBLIC_PIN").ok(),
        )
    }

    fn with_overrides(mut self, admin_pin: Option<String>, public_pin: Option<String>) -> Self {
        if let Some(pin) = admin_pin.filter(|p| !p.trim().is_empty()) {
            self.admin_pin = pin.trim().to_string();
        }
        if let Some(pin) = public_pin.filter(|p| !p.trim().is_empty()) {
            self.public_pin = pin.trim().to_string();
        }
        self
    }
}
