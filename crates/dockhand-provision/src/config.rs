// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for dockhand-provision.

use std::path::PathBuf;

/// Default configuration root on provisioned hosts.
pub const DEFAULT_DATABASE_CONFIG_ROOT: &str = "/data/dockhand/databases";

/// Compiler configuration.
///
/// The configuration root is an explicit parameter so the compiler stays a
/// pure function of its inputs; embedding applications that need a different
/// layout (development installs, volume-backed data dirs) pass their own root
/// instead of the compiler probing the environment at plan time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory on the remote host under which each resource gets its own
    /// `{root}/{uuid}/` configuration directory.
    pub database_config_root: PathBuf,
}

impl Config {
    /// Create a configuration with an explicit root.
    pub fn new(database_config_root: impl Into<PathBuf>) -> Self {
        Self {
            database_config_root: database_config_root.into(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database_config_root = PathBuf::from(
            std::env::var("DOCKHAND_DATABASE_CONFIG_ROOT")
                .unwrap_or_else(|_| DEFAULT_DATABASE_CONFIG_ROOT.to_string()),
        );

        Self {
            database_config_root,
        }
    }

    /// Configuration directory for a resource.
    pub fn configuration_dir(&self, resource_uuid: &str) -> String {
        format!("{}/{}", self.database_config_root.display(), resource_uuid)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_CONFIG_ROOT)
    }
}
