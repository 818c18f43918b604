// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Collaborator trait definitions.
//!
//! The compiler is a pure function of its inputs apart from these seams:
//! certificate persistence and issuance, resource persistence mutations,
//! remote command execution, and platform conventions. Implementations live
//! in the surrounding application; tests use in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::compose::LoggingSection;
use crate::error::Result;
use crate::model::{DatabaseResource, Host, SslCertificate};
use crate::plan::CommandPlan;

/// Persistence operations for certificate records.
///
/// Stores are pure persistence - they do NOT generate key material.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Find the host's CA certificate, if one exists.
    async fn find_ca_certificate(&self, host_id: Uuid) -> Result<Option<SslCertificate>>;

    /// Find the leaf certificate bound to a (kind, uuid) pair.
    async fn find_leaf_certificate(
        &self,
        resource_kind: &str,
        resource_uuid: &str,
    ) -> Result<Option<SslCertificate>>;

    /// Delete all leaf certificate records bound to a (kind, uuid) pair.
    async fn delete_leaf_certificates(
        &self,
        resource_kind: &str,
        resource_uuid: &str,
    ) -> Result<()>;
}

/// Parameters for issuing a leaf certificate.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Certificate common name (the resource uuid).
    pub common_name: String,
    /// Resource kind the leaf is bound to.
    pub resource_kind: String,
    /// Resource uuid the leaf is bound to.
    pub resource_uuid: String,
    /// Host the certificate belongs to.
    pub host_id: Uuid,
    /// Signing CA certificate PEM.
    pub ca_certificate_pem: String,
    /// Signing CA private key PEM.
    pub ca_private_key_pem: String,
    /// Directory on the host the certificate pair is written to.
    pub configuration_dir: String,
    /// Mount path of the certificate directory inside the container.
    pub mount_path: String,
}

/// Certificate authority capability.
///
/// Wraps the actual cryptography (out of scope here): CA bootstrap and leaf
/// issuance. `issue` persists the resulting leaf record and any certificate
/// file-mount records before returning.
#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    /// Create a CA certificate for the host if it can.
    ///
    /// Callers must re-query the store afterwards rather than assume success;
    /// a concurrent bootstrap for the same host may have won the race.
    async fn bootstrap_ca(&self, host_id: Uuid) -> Result<()>;

    /// Issue a leaf certificate signed by the host's CA.
    async fn issue(&self, request: &IssueRequest) -> Result<SslCertificate>;
}

/// Persistence mutations on the database resource itself.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Persist amended custom configuration text for a resource.
    async fn save_custom_config(&self, resource_uuid: &str, content: &str) -> Result<()>;

    /// Delete certificate-kind file-mount records for a resource.
    async fn delete_certificate_mounts(&self, resource_uuid: &str) -> Result<()>;
}

/// Handle for a dispatched command plan (fire-and-forget).
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    /// Unique identifier for this dispatch.
    pub id: Uuid,
    /// Host the plan was dispatched to.
    pub host_id: Uuid,
    /// When the plan was handed off.
    pub dispatched_at: DateTime<Utc>,
}

/// Remote command execution transport.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute an ordered command plan on a host.
    ///
    /// The executor fires `completion_event` when the plan finishes; the
    /// compiler does not wait for it. Partial failures leave the host in
    /// whatever state the already-run commands produced - every emitted
    /// command is idempotent, so re-running the whole plan is the recovery
    /// path.
    async fn execute(
        &self,
        plan: CommandPlan,
        host: &Host,
        completion_event: &str,
    ) -> Result<ExecutionHandle>;
}

/// Platform conventions injected into the synthesized spec.
pub trait Platform: Send + Sync {
    /// Labels attached to every database container.
    fn database_labels(&self, resource: &DatabaseResource) -> Vec<String>;

    /// Platform-wide default environment variables, appended after the
    /// resource's own variables. `resolved` is the list built so far.
    fn default_environment(&self, resource: &DatabaseResource, resolved: &[String])
    -> Vec<String>;

    /// Logging section used when log draining is enabled.
    fn log_drain_logging(&self) -> LoggingSection;

    /// Convert free-form `docker run` flags into a structured service overlay.
    ///
    /// The overlay is deep-merged into the synthesized service with final
    /// precedence.
    fn run_options_overlay(&self, raw_options: &str) -> serde_yaml::Mapping;
}
