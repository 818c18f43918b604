// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for dockhand-provision integration tests.
//!
//! Provides in-memory collaborator fakes and a harness wiring them into a
//! Provisioner.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use dockhand_provision::compose::LoggingSection;
use dockhand_provision::error::{ProvisionError, Result};
use dockhand_provision::model::{
    DatabaseResource, Host, RESOURCE_KIND_POSTGRESQL, ResourceLimits, SslCertificate,
};
use dockhand_provision::plan::CommandPlan;
use dockhand_provision::store::{
    CertificateIssuer, CertificateStore, CommandExecutor, ExecutionHandle, IssueRequest, Platform,
    ResourceStore,
};
use dockhand_provision::{Config, Provisioner};

/// In-memory certificate record store.
#[derive(Default)]
pub struct InMemoryCertificateStore {
    pub records: Mutex<Vec<SslCertificate>>,
}

impl InMemoryCertificateStore {
    pub async fn seed_ca(&self, host_id: Uuid) -> SslCertificate {
        let ca = SslCertificate {
            id: Uuid::new_v4(),
            host_id,
            is_ca_certificate: true,
            common_name: "dockhand-ca".to_string(),
            certificate_pem: "CA CERT".to_string(),
            private_key_pem: "CA KEY".to_string(),
            resource_kind: None,
            resource_uuid: None,
            created_at: Utc::now(),
        };
        self.records.lock().await.push(ca.clone());
        ca
    }

    pub async fn leaf_count(&self, resource_uuid: &str) -> usize {
        self.records
            .lock()
            .await
            .iter()
            .filter(|c| !c.is_ca_certificate && c.resource_uuid.as_deref() == Some(resource_uuid))
            .count()
    }
}

#[async_trait]
impl CertificateStore for InMemoryCertificateStore {
    async fn find_ca_certificate(&self, host_id: Uuid) -> Result<Option<SslCertificate>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|c| c.is_ca_certificate && c.host_id == host_id)
            .cloned())
    }

    async fn find_leaf_certificate(
        &self,
        resource_kind: &str,
        resource_uuid: &str,
    ) -> Result<Option<SslCertificate>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|c| {
                !c.is_ca_certificate
                    && c.resource_kind.as_deref() == Some(resource_kind)
                    && c.resource_uuid.as_deref() == Some(resource_uuid)
            })
            .cloned())
    }

    async fn delete_leaf_certificates(
        &self,
        resource_kind: &str,
        resource_uuid: &str,
    ) -> Result<()> {
        self.records.lock().await.retain(|c| {
            c.is_ca_certificate
                || c.resource_kind.as_deref() != Some(resource_kind)
                || c.resource_uuid.as_deref() != Some(resource_uuid)
        });
        Ok(())
    }
}

/// Issuance fake that counts calls and writes records into the store.
pub struct CountingIssuer {
    store: Arc<InMemoryCertificateStore>,
    /// Whether bootstrap_ca actually creates a CA record.
    pub bootstrap_creates_ca: bool,
    /// Whether issue() fails.
    pub fail_issuance: bool,
    pub bootstrap_calls: AtomicUsize,
    pub issue_calls: AtomicUsize,
}

impl CountingIssuer {
    pub fn new(store: Arc<InMemoryCertificateStore>) -> Self {
        Self {
            store,
            bootstrap_creates_ca: true,
            fail_issuance: false,
            bootstrap_calls: AtomicUsize::new(0),
            issue_calls: AtomicUsize::new(0),
        }
    }

    /// An issuer whose bootstrap never produces a CA (broken host).
    pub fn without_ca(store: Arc<InMemoryCertificateStore>) -> Self {
        Self {
            bootstrap_creates_ca: false,
            ..Self::new(store)
        }
    }
}

#[async_trait]
impl CertificateIssuer for CountingIssuer {
    async fn bootstrap_ca(&self, host_id: Uuid) -> Result<()> {
        self.bootstrap_calls.fetch_add(1, Ordering::SeqCst);
        if self.bootstrap_creates_ca {
            self.store.seed_ca(host_id).await;
        }
        Ok(())
    }

    async fn issue(&self, request: &IssueRequest) -> Result<SslCertificate> {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_issuance {
            return Err(ProvisionError::Issuance("key generation failed".to_string()));
        }

        let leaf = SslCertificate {
            id: Uuid::new_v4(),
            host_id: request.host_id,
            is_ca_certificate: false,
            common_name: request.common_name.clone(),
            certificate_pem: "LEAF CERT".to_string(),
            private_key_pem: "LEAF KEY".to_string(),
            resource_kind: Some(request.resource_kind.clone()),
            resource_uuid: Some(request.resource_uuid.clone()),
            created_at: Utc::now(),
        };
        self.store.records.lock().await.push(leaf.clone());
        Ok(leaf)
    }
}

/// Resource store fake recording mutations.
#[derive(Default)]
pub struct RecordingResourceStore {
    pub saved_configs: Mutex<Vec<(String, String)>>,
    pub deleted_certificate_mounts: Mutex<Vec<String>>,
}

#[async_trait]
impl ResourceStore for RecordingResourceStore {
    async fn save_custom_config(&self, resource_uuid: &str, content: &str) -> Result<()> {
        self.saved_configs
            .lock()
            .await
            .push((resource_uuid.to_string(), content.to_string()));
        Ok(())
    }

    async fn delete_certificate_mounts(&self, resource_uuid: &str) -> Result<()> {
        self.deleted_certificate_mounts
            .lock()
            .await
            .push(resource_uuid.to_string());
        Ok(())
    }
}

/// A dispatched plan captured by the executor fake.
pub struct Dispatch {
    pub commands: Vec<String>,
    pub host_name: String,
    pub completion_event: String,
}

/// Executor fake recording every dispatch.
#[derive(Default)]
pub struct RecordingExecutor {
    pub dispatches: Mutex<Vec<Dispatch>>,
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(
        &self,
        plan: CommandPlan,
        host: &Host,
        completion_event: &str,
    ) -> Result<ExecutionHandle> {
        let host_id = host.id;
        self.dispatches.lock().await.push(Dispatch {
            commands: plan.into_commands(),
            host_name: host.name.clone(),
            completion_event: completion_event.to_string(),
        });
        Ok(ExecutionHandle {
            id: Uuid::new_v4(),
            host_id,
            dispatched_at: Utc::now(),
        })
    }
}

/// Static platform conventions for tests.
pub struct TestPlatform;

impl Platform for TestPlatform {
    fn database_labels(&self, resource: &DatabaseResource) -> Vec<String> {
        vec![
            "dockhand.managed=true".to_string(),
            format!("dockhand.resource={}", resource.uuid),
        ]
    }

    fn default_environment(
        &self,
        _resource: &DatabaseResource,
        _resolved: &[String],
    ) -> Vec<String> {
        vec!["TZ=UTC".to_string()]
    }

    fn log_drain_logging(&self) -> LoggingSection {
        LoggingSection {
            driver: "fluentd".to_string(),
            options: Default::default(),
        }
    }

    fn run_options_overlay(&self, raw_options: &str) -> serde_yaml::Mapping {
        let mut overlay = serde_yaml::Mapping::new();
        if raw_options.contains("--privileged") {
            overlay.insert(
                serde_yaml::Value::from("privileged"),
                serde_yaml::Value::from(true),
            );
        }
        overlay
    }
}

/// Harness wiring the fakes into a Provisioner.
pub struct TestContext {
    pub provisioner: Provisioner,
    pub certificates: Arc<InMemoryCertificateStore>,
    pub issuer: Arc<CountingIssuer>,
    pub resources: Arc<RecordingResourceStore>,
    pub executor: Arc<RecordingExecutor>,
}

impl TestContext {
    pub fn new() -> Self {
        let certificates = Arc::new(InMemoryCertificateStore::default());
        Self::with_parts(
            Arc::clone(&certificates),
            Arc::new(CountingIssuer::new(certificates)),
        )
    }

    /// Harness whose CA bootstrap never succeeds.
    pub fn without_ca() -> Self {
        let certificates = Arc::new(InMemoryCertificateStore::default());
        Self::with_parts(
            Arc::clone(&certificates),
            Arc::new(CountingIssuer::without_ca(certificates)),
        )
    }

    /// Harness over an explicit store and issuer pair.
    pub fn with_parts(
        certificates: Arc<InMemoryCertificateStore>,
        issuer: Arc<CountingIssuer>,
    ) -> Self {
        let resources = Arc::new(RecordingResourceStore::default());
        let executor = Arc::new(RecordingExecutor::default());

        let provisioner = Provisioner::new(
            Config::new("/data/dockhand/databases"),
            Arc::clone(&certificates) as Arc<dyn CertificateStore>,
            Arc::clone(&issuer) as Arc<dyn CertificateIssuer>,
            Arc::clone(&resources) as Arc<dyn ResourceStore>,
            Arc::clone(&executor) as Arc<dyn CommandExecutor>,
            Arc::new(TestPlatform),
        );

        Self {
            provisioner,
            certificates,
            issuer,
            resources,
            executor,
        }
    }
}

/// A minimal resource with the given uuid.
pub fn test_resource(uuid: &str) -> DatabaseResource {
    DatabaseResource {
        uuid: uuid.to_string(),
        name: format!("{uuid}-name"),
        image: "postgres:15".to_string(),
        postgres_user: "postgres".to_string(),
        postgres_password: "secret".to_string(),
        postgres_db: "postgres".to_string(),
        enable_ssl: false,
        postgres_conf: None,
        init_scripts: vec![],
        persistent_storages: vec![],
        file_mounts: vec![],
        environment: vec![],
        limits: ResourceLimits::default(),
        ports_mappings: vec![],
        custom_docker_run_options: None,
        network: "dockhand".to_string(),
        log_drain_enabled: false,
    }
}

/// A test host.
pub fn test_host() -> Host {
    Host {
        id: Uuid::new_v4(),
        name: "host-1".to_string(),
        log_drain_enabled: false,
    }
}

/// The resource kind constant, re-exported for assertions.
pub const KIND: &str = RESOURCE_KIND_POSTGRESQL;

/// Extract and parse the compose document written by a plan.
pub fn extract_compose(commands: &[String]) -> serde_yaml::Value {
    let write = commands
        .iter()
        .find(|c| c.contains("docker-compose.yml") && c.contains("base64 -d"))
        .expect("plan should contain a compose write command");

    let encoded = write
        .split('\'')
        .nth(1)
        .expect("compose write should carry base64 payload");
    let yaml = BASE64.decode(encoded).expect("payload should be base64");
    serde_yaml::from_slice(&yaml).expect("payload should be YAML")
}

/// Index of the first command containing `needle`.
pub fn position(commands: &[String], needle: &str) -> Option<usize> {
    commands.iter().position(|c| c.contains(needle))
}
