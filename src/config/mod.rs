//! Application configuration.
//!
//! Everything lives in one TOML file (default `./config.toml`, overridable with
//! `CONFIG_PATH`): the region settings, the dashboard refresh interval, the PIN table
//! and the branch seed list.

/// PIN table configuration
pub mod access;
/// Branch seed configuration
pub mod branches;
/// Database configuration and connection management
pub mod database;

use crate::errors::{Error, Result};
use access::AccessConfig;
use branches::BranchConfig;
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// The whole config.toml file
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// `[region]` table
    #[serde(default)]
    pub region: RegionConfig,
    /// `[dashboard]` table
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// `[access]` table
    #[serde(default)]
    pub access: AccessConfig,
    /// `[[branches]]` tables
    #[serde(default)]
    pub branches: Vec<BranchConfig>,
}

/// Region-wide display settings
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    /// Region name shown on the dashboard
    #[serde(default = "default_region_name")]
    pub name: String,
    /// Offset of the reporting zone from UTC, in minutes
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    /// Branch listed first on the dashboard
    #[serde(default)]
    pub featured_branch: Option<String>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: default_region_name(),
            utc_offset_minutes: default_utc_offset_minutes(),
            featured_branch: None,
        }
    }
}

fn default_region_name() -> String {
    "Region".to_string()
}

// America/Santo_Domingo, which observes no DST
const fn default_utc_offset_minutes() -> i32 {
    -240
}

impl RegionConfig {
    /// Reporting zone as a fixed offset.
    pub fn zone(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ),
            })
    }
}

/// Live dashboard settings
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Seconds between refreshes
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh_secs(),
        }
    }
}

const fn default_refresh_secs() -> u64 {
    30
}

impl DashboardConfig {
    /// Refresh interval; never shorter than one second.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

impl AppConfig {
    /// Checks cross-field consistency: unique branch ids, non-negative goals, PINs
    /// that point at known branches, and a valid zone offset.
    pub fn validate(&self) -> Result<()> {
        self.region.zone()?;

        let mut ids = std::collections::HashSet::new();
        for branch in &self.branches {
            if branch.id.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("Branch '{}' has an empty id", branch.name),
                });
            }
            if !ids.insert(branch.id.as_str()) {
                return Err(Error::Config {
                    message: format!("Duplicate branch id '{}'", branch.id),
                });
            }
            if branch.goal < 0 {
                return Err(Error::Config {
                    message: format!("Branch '{}' has a negative goal", branch.id),
                });
            }
        }

        if let Some(unknown) = self
            .access
            .branch_pins
            .keys()
            .find(|id| !ids.contains(id.as_str()))
        {
            return Err(Error::Config {
                message: format!("PIN configured for unknown branch '{unknown}'"),
            });
        }

        Ok(())
    }
}

/// Parses configuration from a TOML string and validates it.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file and applies environment PIN overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    let mut config = parse_config(&contents)?;
    config.access = config.access.with_env_overrides();
    info!(
        branches = config.branches.len(),
        "Loaded configuration from {}",
        path_ref.display()
    );
    Ok(config)
}

/// Loads configuration from `CONFIG_PATH`, or `./config.toml` when unset.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const SAMPLE: &str = r#"
        [region]
        name = "Cibao"
        featured_branch = "santiago"

        [dashboard]
        refresh_secs = 60

        [access]
        admin_pin = "9999"

        [access.branch_pins]
        santiago = "1234"

        [[branches]]
        id = "santiago"
        name = "Santiago"
        goal = 1000

        [[branches]]
        id = "moca"
        name = "Moca"
        goal = 500
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.region.name, "Cibao");
        assert_eq!(config.region.utc_offset_minutes, -240);
        assert_eq!(config.region.featured_branch.as_deref(), Some("santiago"));
        assert_eq!(config.dashboard.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.branches.len(), 2);
        assert_eq!(config.access.admin_pin, "9999");
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = parse_config("").unwrap();
        assert!(config.branches.is_empty());
        assert_eq!(config.dashboard.refresh_secs, 30);
        assert_eq!(config.region.zone().unwrap().local_minus_utc(), -4 * 3600);
    }

    #[test]
    fn test_rejects_duplicate_branch_ids() {
        let toml_str = r#"
            [[branches]]
            id = "moca"
            name = "Moca"

            [[branches]]
            id = "moca"
            name = "Moca 2"
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_pin_for_unknown_branch() {
        let toml_str = r#"
            [access.branch_pins]
            nowhere = "1111"
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        let toml_str = r#"
            [region]
            utc_offset_minutes = 100000
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_refresh_interval_has_floor() {
        let config = DashboardConfig { refresh_secs: 0 };
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
