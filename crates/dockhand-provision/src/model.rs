// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Resource model for database provisioning.
//!
//! These types mirror the rows the persistence layer hands us. The compiler
//! treats them as the desired state; it never mutates them except for the
//! `listen_addresses` amendment on custom configuration text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resource kind tag used on leaf certificates and certificate mounts.
pub const RESOURCE_KIND_POSTGRESQL: &str = "standalone_postgresql";

/// A host a database can be provisioned on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    /// Host ID.
    pub id: Uuid,
    /// Human-readable host name.
    pub name: String,
    /// Whether log draining is enabled host-wide.
    pub log_drain_enabled: bool,
}

/// An init script materialized into the container's init directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitScript {
    /// File name inside `docker-entrypoint-initdb.d/`.
    pub filename: String,
    /// Script content, written verbatim.
    pub content: String,
}

/// A persistent storage declaration.
///
/// With a `host_path` this becomes a plain bind mount; without one it
/// references a runtime-managed named volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentStorage {
    /// Generated volume name, used when no host path is set.
    pub name: String,
    /// Optional host filesystem path backing the mount.
    pub host_path: Option<String>,
    /// Mount path inside the container.
    pub mount_path: String,
}

impl PersistentStorage {
    /// Whether this storage is backed by a host path rather than a named volume.
    pub fn is_host_backed(&self) -> bool {
        self.host_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// What a file mount carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileMountKind {
    /// An arbitrary user-declared file mount.
    User,
    /// A TLS certificate or key written by the issuance capability.
    Certificate,
}

/// A single-file bind mount declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMount {
    /// Host filesystem path.
    pub fs_path: String,
    /// Mount path inside the container.
    pub mount_path: String,
    /// What this mount carries. Certificate mounts are managed by the
    /// certificate lifecycle, not by the user.
    pub kind: FileMountKind,
}

/// A user-defined runtime environment variable.
///
/// Values arrive already run through the platform's variable substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    /// Variable name.
    pub key: String,
    /// Resolved value.
    pub value: String,
}

/// Container resource limits, passed through to the compose service verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory limit (e.g. `512m`, `0` for unlimited).
    pub memory: String,
    /// Memory+swap limit.
    pub memory_swap: String,
    /// Swappiness, 0-100.
    pub memory_swappiness: i64,
    /// Soft memory reservation.
    pub memory_reservation: String,
    /// CPU limit as a fraction of cores.
    pub cpus: f64,
    /// Relative CPU shares.
    pub cpu_shares: i64,
    /// CPU pinning set (e.g. `0-2`), only emitted when declared.
    pub cpuset: Option<String>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory: "0".to_string(),
            memory_swap: "0".to_string(),
            memory_swappiness: 60,
            memory_reservation: "0".to_string(),
            cpus: 0.0,
            cpu_shares: 1024,
            cpuset: None,
        }
    }
}

/// Desired state of a standalone PostgreSQL database container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseResource {
    /// Unique identifier. Immutable; doubles as the container name and the
    /// root of the resource's configuration directory on the host.
    pub uuid: String,
    /// Human-readable name.
    pub name: String,
    /// Container image reference.
    pub image: String,
    /// Database superuser name.
    pub postgres_user: String,
    /// Database superuser password.
    pub postgres_password: String,
    /// Initial database name.
    pub postgres_db: String,
    /// Desired TLS posture.
    pub enable_ssl: bool,
    /// Custom postgresql.conf content, if any.
    pub postgres_conf: Option<String>,
    /// Init scripts, in declared order.
    pub init_scripts: Vec<InitScript>,
    /// Persistent storage declarations, in declared order.
    pub persistent_storages: Vec<PersistentStorage>,
    /// Single-file mounts, in declared order.
    pub file_mounts: Vec<FileMount>,
    /// User-defined runtime environment variables.
    pub environment: Vec<EnvironmentVariable>,
    /// Container resource limits.
    pub limits: ResourceLimits,
    /// Port mappings (`host:container`).
    pub ports_mappings: Vec<String>,
    /// Free-form `docker run` flags, converted to a structured overlay by the
    /// platform collaborator.
    pub custom_docker_run_options: Option<String>,
    /// Network the container attaches to.
    pub network: String,
    /// Whether this resource opts in to log draining.
    pub log_drain_enabled: bool,
}

impl DatabaseResource {
    /// Whether custom configuration text is present and non-blank.
    pub fn has_custom_config(&self) -> bool {
        self.postgres_conf
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }

    /// Whether custom docker run options are present and non-blank.
    pub fn has_custom_run_options(&self) -> bool {
        self.custom_docker_run_options
            .as_deref()
            .is_some_and(|o| !o.trim().is_empty())
    }
}

/// A CA or leaf TLS certificate record.
///
/// At most one CA certificate exists per host, and at most one leaf
/// certificate exists per (resource kind, resource uuid) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SslCertificate {
    /// Record ID.
    pub id: Uuid,
    /// Owning host.
    pub host_id: Uuid,
    /// Whether this is the host's CA certificate.
    pub is_ca_certificate: bool,
    /// Certificate common name (the resource uuid for leaves).
    pub common_name: String,
    /// Certificate PEM.
    pub certificate_pem: String,
    /// Private key PEM.
    pub private_key_pem: String,
    /// Resource kind this leaf is bound to (None for CA certificates).
    pub resource_kind: Option<String>,
    /// Resource uuid this leaf is bound to (None for CA certificates).
    pub resource_uuid: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}
