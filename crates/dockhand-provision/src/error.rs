// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for dockhand-provision.

use thiserror::Error;

/// Provisioning errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProvisionError {
    /// No CA certificate exists for the host, even after a bootstrap attempt.
    ///
    /// Terminal configuration error: the operator must generate a CA
    /// certificate for the host before the resource can be provisioned
    /// with TLS. No commands are dispatched when this is returned.
    #[error(
        "No CA certificate found for host '{host}'. Generate a CA certificate for this host before enabling SSL."
    )]
    MissingCaCertificate {
        /// Name of the host missing CA material.
        host: String,
    },

    /// Leaf certificate issuance failed.
    #[error("Certificate issuance failed: {0}")]
    Issuance(String),

    /// Persistence layer operation failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Compose document serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Dispatching the command plan to the executor failed.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type using ProvisionError.
pub type Result<T> = std::result::Result<T, ProvisionError>;
