// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! TLS certificate lifecycle.
//!
//! Reconciles the desired TLS posture of a resource: per-host CA, per-resource
//! leaf, and teardown when TLS is disabled. CA material is shared across all
//! resources on a host; leaves are bound to exactly one resource and reused
//! verbatim on every run until deleted.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ProvisionError, Result};
use crate::model::{DatabaseResource, Host, RESOURCE_KIND_POSTGRESQL, SslCertificate};
use crate::plan::CommandPlan;
use crate::store::{CertificateIssuer, CertificateStore, IssueRequest, ResourceStore};

/// In-container directory the certificate pair is mounted at.
pub const CERT_MOUNT_DIR: &str = "/var/lib/postgresql/certs";

/// Reserved in-container path of the server certificate.
///
/// Kept literal for on-disk compatibility with existing deployments; the
/// record-level distinction is the [`FileMountKind`](crate::model::FileMountKind)
/// tag, not this string.
pub const SERVER_CERT_MOUNT_PATH: &str = "/var/lib/postgresql/certs/server.crt";

/// Reserved in-container path of the server private key.
pub const SERVER_KEY_MOUNT_PATH: &str = "/var/lib/postgresql/certs/server.key";

/// Outcome of TLS reconciliation.
#[derive(Debug, Clone)]
pub enum TlsState {
    /// TLS is disabled; teardown commands are in the plan and no leaf record
    /// remains.
    Disabled,
    /// TLS is enabled with this leaf certificate.
    Enabled(SslCertificate),
}

impl TlsState {
    /// Whether TLS ended up enabled.
    pub fn is_enabled(&self) -> bool {
        matches!(self, TlsState::Enabled(_))
    }
}

/// Certificate lifecycle manager.
pub struct CertificateManager {
    certificates: Arc<dyn CertificateStore>,
    issuer: Arc<dyn CertificateIssuer>,
    resources: Arc<dyn ResourceStore>,
}

impl CertificateManager {
    /// Create a manager over the given collaborators.
    pub fn new(
        certificates: Arc<dyn CertificateStore>,
        issuer: Arc<dyn CertificateIssuer>,
        resources: Arc<dyn ResourceStore>,
    ) -> Self {
        Self {
            certificates,
            issuer,
            resources,
        }
    }

    /// Bring certificate records and the command plan into agreement with the
    /// resource's TLS flag.
    ///
    /// On success either TLS is disabled and no leaf record or on-disk
    /// key material remains for this resource, or TLS is enabled with a CA
    /// for the host and a leaf signed by it. A host with no CA after one
    /// bootstrap attempt is a terminal configuration error; nothing is
    /// dispatched in that case.
    pub async fn reconcile(
        &self,
        resource: &DatabaseResource,
        host: &Host,
        configuration_dir: &str,
        plan: &mut CommandPlan,
    ) -> Result<TlsState> {
        if !resource.enable_ssl {
            self.teardown(resource, configuration_dir, plan).await?;
            return Ok(TlsState::Disabled);
        }

        plan.echo("Setting up SSL for this database.");
        plan.push(format!("mkdir -p {configuration_dir}/ssl"));

        // CA existence must be settled before the leaf lookup: issuance
        // needs the CA material.
        let ca = self.ensure_ca(host).await?;
        let leaf = self.ensure_leaf(resource, host.id, &ca, configuration_dir, plan).await?;

        Ok(TlsState::Enabled(leaf))
    }

    /// Remove the leaf record, certificate mount records, and on-disk files.
    async fn teardown(
        &self,
        resource: &DatabaseResource,
        configuration_dir: &str,
        plan: &mut CommandPlan,
    ) -> Result<()> {
        plan.push(format!("rm -rf {configuration_dir}/ssl"));

        self.certificates
            .delete_leaf_certificates(RESOURCE_KIND_POSTGRESQL, &resource.uuid)
            .await?;
        self.resources
            .delete_certificate_mounts(&resource.uuid)
            .await?;

        debug!(resource = %resource.uuid, "Tore down TLS certificate state");

        Ok(())
    }

    /// Look up the host's CA, bootstrapping it once if missing.
    ///
    /// The re-query after bootstrap tolerates losing a creation race to a
    /// concurrent provisioning run on the same host. A CA still missing
    /// after that is terminal, not retried.
    async fn ensure_ca(&self, host: &Host) -> Result<SslCertificate> {
        if let Some(ca) = self.certificates.find_ca_certificate(host.id).await? {
            return Ok(ca);
        }

        info!(host = %host.name, "No CA certificate for host, attempting bootstrap");
        self.issuer.bootstrap_ca(host.id).await?;

        self.certificates
            .find_ca_certificate(host.id)
            .await?
            .ok_or_else(|| ProvisionError::MissingCaCertificate {
                host: host.name.clone(),
            })
    }

    /// Look up the resource's leaf, issuing one if missing.
    async fn ensure_leaf(
        &self,
        resource: &DatabaseResource,
        host_id: Uuid,
        ca: &SslCertificate,
        configuration_dir: &str,
        plan: &mut CommandPlan,
    ) -> Result<SslCertificate> {
        if let Some(leaf) = self
            .certificates
            .find_leaf_certificate(RESOURCE_KIND_POSTGRESQL, &resource.uuid)
            .await?
        {
            // No implicit rotation: an existing leaf is reused verbatim.
            return Ok(leaf);
        }

        plan.echo("No SSL certificate found, generating new SSL certificate for this database.");

        let request = IssueRequest {
            common_name: resource.uuid.clone(),
            resource_kind: RESOURCE_KIND_POSTGRESQL.to_string(),
            resource_uuid: resource.uuid.clone(),
            host_id,
            ca_certificate_pem: ca.certificate_pem.clone(),
            ca_private_key_pem: ca.private_key_pem.clone(),
            configuration_dir: format!("{configuration_dir}/ssl"),
            mount_path: CERT_MOUNT_DIR.to_string(),
        };

        let leaf = self.issuer.issue(&request).await?;

        info!(
            resource = %resource.uuid,
            common_name = %leaf.common_name,
            "Issued leaf certificate"
        );

        Ok(leaf)
    }
}
