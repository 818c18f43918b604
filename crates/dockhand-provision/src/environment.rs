// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Environment variable resolution.
//!
//! Produces the flat `KEY=VALUE` list for the compose service: user-defined
//! variables first, then any missing mandatory defaults in fixed order, then
//! the platform-wide defaults.

use crate::model::DatabaseResource;
use crate::store::Platform;

/// Resolve the environment list for a resource.
///
/// The "already defined" check for mandatory keys is substring containment
/// against the full `KEY=VALUE` text, not an exact key match. A user variable
/// whose value merely mentions `POSTGRES_USER` suppresses the default for
/// that key. Kept verbatim for compatibility with existing deployments;
/// downstream behavior may depend on it.
pub fn resolve_environment(resource: &DatabaseResource, platform: &dyn Platform) -> Vec<String> {
    let mut variables: Vec<String> = resource
        .environment
        .iter()
        .map(|env| format!("{}={}", env.key, env.value))
        .collect();

    let mandatory = [
        ("POSTGRES_USER", resource.postgres_user.as_str()),
        ("PGUSER", resource.postgres_user.as_str()),
        ("POSTGRES_PASSWORD", resource.postgres_password.as_str()),
        ("POSTGRES_DB", resource.postgres_db.as_str()),
    ];

    for (key, value) in mandatory {
        if !variables.iter().any(|entry| entry.contains(key)) {
            variables.push(format!("{key}={value}"));
        }
    }

    let defaults = platform.default_environment(resource, &variables);
    variables.extend(defaults);

    variables
}
