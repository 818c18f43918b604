// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Compose document types.
//!
//! The container runtime consumes a compose-style YAML document with a single
//! service keyed by the resource uuid. These types serialize to that document;
//! field order within a service is fixed by struct declaration order so
//! repeated runs produce byte-identical output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A full compose document: one service, its network, optional named volumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeFile {
    /// Services keyed by container name (always exactly one here).
    pub services: BTreeMap<String, ComposeService>,
    /// Network attachments.
    pub networks: BTreeMap<String, NetworkDef>,
    /// Named volumes managed by the runtime.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, NamedVolume>,
}

/// A single compose service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeService {
    /// Container image reference.
    pub image: String,
    /// Container name (the resource uuid).
    pub container_name: String,
    /// Environment as `KEY=VALUE` entries, order stable.
    pub environment: Vec<String>,
    /// Restart policy.
    pub restart: String,
    /// Networks the service attaches to.
    pub networks: Vec<String>,
    /// Platform labels.
    pub labels: Vec<String>,
    /// Liveness probe.
    pub healthcheck: Healthcheck,
    /// Memory limit.
    pub mem_limit: String,
    /// Memory+swap limit.
    pub memswap_limit: String,
    /// Swappiness.
    pub mem_swappiness: i64,
    /// Soft memory reservation.
    pub mem_reservation: String,
    /// CPU limit.
    pub cpus: f64,
    /// Relative CPU shares.
    pub cpu_shares: i64,
    /// CPU pinning set, only when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpuset: Option<String>,
    /// Log-drain logging block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSection>,
    /// Port mappings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,
    /// Volume entries, category order fixed by the synthesizer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeEntry>,
    /// Command override, if any rule applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

/// Healthcheck definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Healthcheck {
    /// Probe command (`CMD-SHELL` form).
    pub test: Vec<String>,
    /// Probe interval.
    pub interval: String,
    /// Probe timeout.
    pub timeout: String,
    /// Failures before unhealthy.
    pub retries: u32,
    /// Grace period after container start.
    pub start_period: String,
}

/// A service volume entry: either short `source:target` syntax or a long-form
/// bind mount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeEntry {
    /// Short syntax (`host_path:mount_path` or `volume_name:mount_path`).
    Short(String),
    /// Long-form bind mount.
    Bind(BindMount),
}

/// Long-form bind mount entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindMount {
    /// Mount type, always `bind`.
    #[serde(rename = "type")]
    pub mount_type: String,
    /// Source path on the host.
    pub source: String,
    /// Target path in the container.
    pub target: String,
    /// Whether the mount is read-only.
    pub read_only: bool,
}

impl BindMount {
    /// A read-only bind mount.
    pub fn read_only(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            mount_type: "bind".to_string(),
            source: source.into(),
            target: target.into(),
            read_only: true,
        }
    }
}

/// Network definition referencing a pre-existing attachable network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDef {
    /// The network exists outside this compose file.
    pub external: bool,
    /// Network name.
    pub name: String,
    /// Whether standalone containers may attach.
    pub attachable: bool,
}

impl NetworkDef {
    /// An external attachable network.
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            external: true,
            name: name.into(),
            attachable: true,
        }
    }
}

/// A runtime-managed named volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedVolume {
    /// Volume name.
    pub name: String,
    /// Always false: the volume is created by this compose file, not
    /// pre-existing.
    pub external: bool,
}

/// Logging section injected when log draining is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log driver name (e.g. `fluentd`).
    pub driver: String,
    /// Driver options.
    pub options: BTreeMap<String, String>,
}

/// Deep-merge `overlay` into `base`, overlay winning on conflicts.
///
/// Mappings merge recursively; sequences and scalars are replaced wholesale.
/// Used to apply the custom run-option overlay with final precedence.
pub fn merge_overlay(base: &mut serde_yaml::Value, overlay: &serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge_overlay(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}
