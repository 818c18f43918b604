// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runtime spec synthesis.
//!
//! Assembles the compose service description from the resource, the volume
//! plan, and the resolved environment. Pure: no filesystem or network side
//! effects. Conditional sections apply in a fixed order so later rules can
//! override earlier ones, and the custom run-option overlay merges last with
//! final precedence.

use std::collections::BTreeMap;

use crate::certificates::{SERVER_CERT_MOUNT_PATH, SERVER_KEY_MOUNT_PATH};
use crate::compose::{
    BindMount, ComposeFile, ComposeService, Healthcheck, NetworkDef, VolumeEntry, merge_overlay,
};
use crate::error::Result;
use crate::model::{DatabaseResource, Host};
use crate::store::Platform;
use crate::volumes;

/// Restart policy applied to every database container.
pub const RESTART_MODE: &str = "unless-stopped";

/// In-container directory init scripts are mounted into.
pub const INIT_SCRIPTS_DIR: &str = "/docker-entrypoint-initdb.d";

/// In-container path of the custom configuration file.
pub const CONFIG_MOUNT_PATH: &str = "/etc/postgresql/postgresql.conf";

/// Resolve the service command override.
///
/// Modeled as an ordered rule list: each active rule replaces the prior
/// result, so the TLS rule wins over the config-file rule when both apply.
pub fn resolve_command(resource: &DatabaseResource) -> Option<Vec<String>> {
    let rules: [(bool, Vec<String>); 2] = [
        (
            resource.has_custom_config(),
            vec![
                "postgres".to_string(),
                "-c".to_string(),
                format!("config_file={CONFIG_MOUNT_PATH}"),
            ],
        ),
        (
            resource.enable_ssl,
            vec![
                "postgres".to_string(),
                "-c".to_string(),
                "ssl=on".to_string(),
                "-c".to_string(),
                format!("ssl_cert_file={SERVER_CERT_MOUNT_PATH}"),
                "-c".to_string(),
                format!("ssl_key_file={SERVER_KEY_MOUNT_PATH}"),
            ],
        ),
    ];

    let mut command = None;
    for (applies, replacement) in rules {
        if applies {
            command = Some(replacement);
        }
    }
    command
}

/// Healthcheck probing the database with `SELECT 1`.
fn healthcheck(resource: &DatabaseResource) -> Healthcheck {
    Healthcheck {
        test: vec![
            "CMD-SHELL".to_string(),
            format!(
                "psql -U {} -d {} -c 'SELECT 1' || exit 1",
                resource.postgres_user, resource.postgres_db
            ),
        ],
        interval: "5s".to_string(),
        timeout: "5s".to_string(),
        retries: 10,
        start_period: "5s".to_string(),
    }
}

/// Service volume list in fixed category order: persistent storages, user
/// file mounts, init-script binds, config bind, certificate binds.
fn volume_entries(resource: &DatabaseResource, configuration_dir: &str) -> Vec<VolumeEntry> {
    let mut entries: Vec<VolumeEntry> = volumes::persistent_volume_binds(resource)
        .into_iter()
        .chain(volumes::file_mount_binds(resource))
        .map(VolumeEntry::Short)
        .collect();

    for script in &resource.init_scripts {
        entries.push(VolumeEntry::Bind(BindMount::read_only(
            format!(
                "{configuration_dir}{INIT_SCRIPTS_DIR}/{}",
                script.filename
            ),
            format!("{INIT_SCRIPTS_DIR}/{}", script.filename),
        )));
    }

    if resource.has_custom_config() {
        entries.push(VolumeEntry::Bind(BindMount::read_only(
            format!("{configuration_dir}/custom-postgres.conf"),
            CONFIG_MOUNT_PATH,
        )));
    }

    if resource.enable_ssl {
        entries.push(VolumeEntry::Short(format!(
            "{configuration_dir}/ssl/server.crt:{SERVER_CERT_MOUNT_PATH}"
        )));
        entries.push(VolumeEntry::Short(format!(
            "{configuration_dir}/ssl/server.key:{SERVER_KEY_MOUNT_PATH}"
        )));
    }

    entries
}

/// Synthesize the full compose document for a resource.
///
/// Returns the document as a YAML value with the custom run-option overlay
/// already merged; the plan builder serializes it as-is.
pub fn synthesize_spec(
    resource: &DatabaseResource,
    host: &Host,
    configuration_dir: &str,
    environment: Vec<String>,
    platform: &dyn Platform,
) -> Result<serde_yaml::Value> {
    let logging = (host.log_drain_enabled && resource.log_drain_enabled)
        .then(|| platform.log_drain_logging());

    let ports = (!resource.ports_mappings.is_empty()).then(|| resource.ports_mappings.clone());

    let service = ComposeService {
        image: resource.image.clone(),
        container_name: resource.uuid.clone(),
        environment,
        restart: RESTART_MODE.to_string(),
        networks: vec![resource.network.clone()],
        labels: platform.database_labels(resource),
        healthcheck: healthcheck(resource),
        mem_limit: resource.limits.memory.clone(),
        memswap_limit: resource.limits.memory_swap.clone(),
        mem_swappiness: resource.limits.memory_swappiness,
        mem_reservation: resource.limits.memory_reservation.clone(),
        cpus: resource.limits.cpus,
        cpu_shares: resource.limits.cpu_shares,
        cpuset: resource.limits.cpuset.clone(),
        logging,
        ports,
        volumes: volume_entries(resource, configuration_dir),
        command: resolve_command(resource),
    };

    let compose = ComposeFile {
        services: BTreeMap::from([(resource.uuid.clone(), service)]),
        networks: BTreeMap::from([(
            resource.network.clone(),
            NetworkDef::external(resource.network.clone()),
        )]),
        volumes: volumes::named_volumes(resource),
    };

    let mut document = serde_yaml::to_value(&compose)?;

    if resource.has_custom_run_options() {
        let raw = resource.custom_docker_run_options.as_deref().unwrap_or_default();
        let overlay = serde_yaml::Value::Mapping(platform.run_options_overlay(raw));
        merge_overlay(&mut document["services"][resource.uuid.as_str()], &overlay);
    }

    Ok(document)
}
