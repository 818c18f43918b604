// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Volume and file mount planning.
//!
//! Derives the bind list and named-volume registry from the resource's
//! declarations. Declaration order is preserved; the only deduplication is
//! the named-volume registry key.

use std::collections::BTreeMap;

use crate::compose::NamedVolume;
use crate::model::{DatabaseResource, FileMountKind};

/// Bind entries for the resource's persistent storage declarations.
///
/// Host-backed storages bind `host_path:mount_path`; the rest reference a
/// named volume `name:mount_path`.
pub fn persistent_volume_binds(resource: &DatabaseResource) -> Vec<String> {
    resource
        .persistent_storages
        .iter()
        .map(|storage| {
            if storage.is_host_backed() {
                format!(
                    "{}:{}",
                    storage.host_path.as_deref().unwrap_or_default(),
                    storage.mount_path
                )
            } else {
                format!("{}:{}", storage.name, storage.mount_path)
            }
        })
        .collect()
}

/// Registry of named volumes referenced by the bind list.
///
/// Only storages without a host path appear here, deduplicated by name and
/// marked locally-managed (`external: false`).
pub fn named_volumes(resource: &DatabaseResource) -> BTreeMap<String, NamedVolume> {
    let mut registry = BTreeMap::new();
    for storage in &resource.persistent_storages {
        if storage.is_host_backed() {
            continue;
        }
        registry.insert(
            storage.name.clone(),
            NamedVolume {
                name: storage.name.clone(),
                external: false,
            },
        );
    }
    registry
}

/// Bind entries for user-declared single-file mounts.
///
/// Certificate-kind mounts are excluded; the TLS step appends those so they
/// land in their own category at the end of the volume list.
pub fn file_mount_binds(resource: &DatabaseResource) -> Vec<String> {
    resource
        .file_mounts
        .iter()
        .filter(|mount| mount.kind == FileMountKind::User)
        .map(|mount| format!("{}:{}", mount.fs_path, mount.mount_path))
        .collect()
}
