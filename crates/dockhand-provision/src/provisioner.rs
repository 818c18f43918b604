// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Provisioning orchestration.
//!
//! Compiles a [`DatabaseResource`] into an ordered command plan and hands it
//! to the executor. Compilation is synchronous apart from the certificate
//! collaborator calls; nothing touches the remote host until the finished
//! plan is dispatched, so any error before that point leaves the host
//! untouched.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::certificates::CertificateManager;
use crate::config::Config;
use crate::environment::resolve_environment;
use crate::error::Result;
use crate::model::{DatabaseResource, Host};
use crate::plan::{CommandPlan, exec_in_container, generate_readme};
use crate::store::{
    CertificateIssuer, CertificateStore, CommandExecutor, ExecutionHandle, Platform, ResourceStore,
};
use crate::synthesize::{INIT_SCRIPTS_DIR, synthesize_spec};

/// Completion event fired by the executor when the plan finishes.
pub const COMPLETION_EVENT: &str = "DatabaseStatusChanged";

/// Desired-state-to-plan compiler for standalone PostgreSQL containers.
pub struct Provisioner {
    config: Config,
    certificates: CertificateManager,
    resources: Arc<dyn ResourceStore>,
    executor: Arc<dyn CommandExecutor>,
    platform: Arc<dyn Platform>,
}

impl Provisioner {
    /// Create a provisioner over the given collaborators.
    pub fn new(
        config: Config,
        certificate_store: Arc<dyn CertificateStore>,
        issuer: Arc<dyn CertificateIssuer>,
        resources: Arc<dyn ResourceStore>,
        executor: Arc<dyn CommandExecutor>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        let certificates =
            CertificateManager::new(certificate_store, issuer, Arc::clone(&resources));
        Self {
            config,
            certificates,
            resources,
            executor,
            platform,
        }
    }

    /// Configuration directory for a resource on its host.
    pub fn configuration_dir(&self, resource: &DatabaseResource) -> String {
        self.config.configuration_dir(&resource.uuid)
    }

    /// Compile the resource into a command plan without dispatching it.
    ///
    /// Takes the resource mutably because a custom configuration missing a
    /// `listen_addresses` directive is amended and persisted before the
    /// config file command is emitted.
    pub async fn compile(
        &self,
        resource: &mut DatabaseResource,
        host: &Host,
    ) -> Result<CommandPlan> {
        let configuration_dir = self.configuration_dir(resource);
        let mut plan = CommandPlan::new();

        plan.echo("Starting database.");
        plan.echo("Creating directories.");
        plan.push(format!("mkdir -p {configuration_dir}"));
        plan.push(format!("mkdir -p {configuration_dir}{INIT_SCRIPTS_DIR}/"));
        plan.echo("Directories created successfully.");

        let tls = self
            .certificates
            .reconcile(resource, host, &configuration_dir, &mut plan)
            .await?;

        self.materialize_init_scripts(resource, &configuration_dir, &mut plan);
        self.materialize_custom_config(resource, &configuration_dir, &mut plan)
            .await?;

        let environment = resolve_environment(resource, self.platform.as_ref());
        let spec = synthesize_spec(
            resource,
            host,
            &configuration_dir,
            environment,
            self.platform.as_ref(),
        )?;

        let compose_yaml = serde_yaml::to_string(&spec)?;
        plan.write_base64(
            &format!("{configuration_dir}/docker-compose.yml"),
            &compose_yaml,
        );

        let readme = generate_readme(&resource.name, Utc::now());
        plan.push(format!("echo '{readme}' > {configuration_dir}/README.md"));

        plan.echo(&format!("Pulling {} image.", resource.image));
        plan.push(format!(
            "docker compose -f {configuration_dir}/docker-compose.yml pull"
        ));
        plan.push(format!(
            "docker compose -f {configuration_dir}/docker-compose.yml up -d"
        ));

        if tls.is_enabled() {
            // The issuance capability writes key material as host root; the
            // engine refuses to start with a key the runtime user does not own.
            plan.push(exec_in_container(
                &resource.uuid,
                &format!(
                    "chown {user}:{user} {key} {cert}",
                    user = resource.postgres_user,
                    key = crate::certificates::SERVER_KEY_MOUNT_PATH,
                    cert = crate::certificates::SERVER_CERT_MOUNT_PATH,
                ),
            ));
        }

        plan.echo("Database started.");

        Ok(plan)
    }

    /// Compile the resource and dispatch the plan to the executor.
    ///
    /// Fire-and-forget: the returned handle identifies the dispatch, and the
    /// executor reports completion through [`COMPLETION_EVENT`].
    pub async fn provision(
        &self,
        resource: &mut DatabaseResource,
        host: &Host,
    ) -> Result<ExecutionHandle> {
        let plan = self.compile(resource, host).await?;

        info!(
            resource = %resource.uuid,
            host = %host.name,
            commands = plan.len(),
            "Dispatching provisioning plan"
        );

        self.executor.execute(plan, host, COMPLETION_EVENT).await
    }

    /// Purge stale init scripts, then write each declared script.
    fn materialize_init_scripts(
        &self,
        resource: &DatabaseResource,
        configuration_dir: &str,
        plan: &mut CommandPlan,
    ) {
        plan.push(format!("rm -rf {configuration_dir}{INIT_SCRIPTS_DIR}/*"));

        for script in &resource.init_scripts {
            plan.write_base64(
                &format!("{configuration_dir}{INIT_SCRIPTS_DIR}/{}", script.filename),
                &script.content,
            );
        }
    }

    /// Write or remove the custom configuration file.
    ///
    /// Text without a `listen_addresses` directive gets a wildcard default
    /// appended; the amended text is persisted back to the resource before
    /// the write command is emitted.
    async fn materialize_custom_config(
        &self,
        resource: &mut DatabaseResource,
        configuration_dir: &str,
        plan: &mut CommandPlan,
    ) -> Result<()> {
        let config_file_path = format!("{configuration_dir}/custom-postgres.conf");

        if !resource.has_custom_config() {
            plan.push(format!("rm -f {config_file_path}"));
            return Ok(());
        }

        let mut content = resource.postgres_conf.clone().unwrap_or_default();
        if !content.contains("listen_addresses") {
            content.push_str("\nlisten_addresses = '*'");
            resource.postgres_conf = Some(content.clone());
            self.resources
                .save_custom_config(&resource.uuid, &content)
                .await?;
        }

        plan.write_base64(&config_file_path, &content);
        Ok(())
    }
}
