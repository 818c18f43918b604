// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Dockhand Provision - PostgreSQL Container Provisioning Compiler
//!
//! Compiles the desired state of a standalone PostgreSQL database (image,
//! credentials, limits, network, TLS posture, custom configuration, init
//! scripts, storage mounts) into two artifacts:
//!
//! 1. a compose-style container runtime specification, and
//! 2. an ordered, idempotent sequence of remote shell operations that bring
//!    the host's filesystem and container state into agreement with it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     DatabaseResource (desired state)             │
//! └──────────────────────────────────────────────────────────────────┘
//!        │                    │                      │
//!        ▼                    ▼                      ▼
//! ┌─────────────┐      ┌─────────────┐      ┌──────────────────┐
//! │ Certificate │      │   Volume    │      │   Environment    │
//! │  Lifecycle  │      │  Planning   │      │   Resolution     │
//! └──────┬──────┘      └──────┬──────┘      └────────┬─────────┘
//!        │                    │                      │
//!        └──────────┬─────────┴──────────────────────┘
//!                   ▼
//!          ┌─────────────────┐       ┌──────────────────────────┐
//!          │  Spec Synthesis │──────▶│  Command Plan + Executor │
//!          └─────────────────┘       └──────────────────────────┘
//! ```
//!
//! The compiler is synchronous and single-threaded per invocation. The only
//! suspension points are the collaborator traits in [`store`]: certificate
//! persistence and issuance, resource persistence mutations, and the command
//! executor. Re-running a whole plan is the uniform recovery strategy; every
//! emitted command tolerates re-execution.
//!
//! Callers are responsible for per-resource mutual exclusion: two concurrent
//! runs for the same resource uuid would rewrite the same configuration
//! directory. Concurrent runs for different resources on one host are fine,
//! including racing CA creation - the certificate manager re-queries after a
//! bootstrap attempt instead of assuming it won.
//!
//! # Modules
//!
//! - [`config`]: Compiler configuration (the host-side configuration root)
//! - [`error`]: Error types for provisioning operations
//! - [`model`]: Desired-state resource model and certificate records
//! - [`store`]: Collaborator trait seams (persistence, issuance, execution)
//! - [`certificates`]: TLS certificate lifecycle reconciliation
//! - [`volumes`]: Bind mount and named-volume planning
//! - [`environment`]: Environment variable resolution
//! - [`compose`]: Compose document types and overlay merging
//! - [`synthesize`]: Runtime spec synthesis
//! - [`plan`]: Ordered command plans
//! - [`provisioner`]: Orchestration and dispatch

#![deny(missing_docs)]

/// Compiler configuration.
pub mod config;

/// Error types for provisioning operations.
pub mod error;

/// Desired-state resource model and certificate records.
pub mod model;

/// Collaborator trait definitions.
pub mod store;

/// TLS certificate lifecycle reconciliation.
pub mod certificates;

/// Bind mount and named-volume planning.
pub mod volumes;

/// Environment variable resolution.
pub mod environment;

/// Compose document types and overlay merging.
pub mod compose;

/// Runtime spec synthesis.
pub mod synthesize;

/// Ordered command plans.
pub mod plan;

/// Orchestration and dispatch.
pub mod provisioner;

pub use config::Config;
pub use error::{ProvisionError, Result};
pub use model::{DatabaseResource, Host, SslCertificate};
pub use plan::CommandPlan;
pub use provisioner::Provisioner;
