// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Ordered command plans.
//!
//! A plan is a linear list of shell commands executed remotely, in order,
//! with no implicit retries. File content travels base64-encoded through the
//! shell channel to avoid quoting issues, and every write overwrites its
//! target, so re-running a full plan converges to the same host state.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};

/// An ordered, idempotent sequence of remote shell operations.
///
/// Consumed exactly once by the command executor.
#[derive(Debug, Clone, Default)]
pub struct CommandPlan {
    commands: Vec<String>,
}

impl CommandPlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw shell command.
    pub fn push(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    /// Append a progress announcement.
    ///
    /// The message is interpolated into a single-quoted shell string and must
    /// not contain single quotes.
    pub fn echo(&mut self, message: &str) {
        self.commands.push(format!("echo '{message}'"));
    }

    /// Append a command that writes `content` to `path`, overwriting any
    /// previous file. Content is base64-transported.
    pub fn write_base64(&mut self, path: &str, content: &str) {
        let encoded = BASE64.encode(content);
        self.commands
            .push(format!("echo '{encoded}' | base64 -d | tee {path} > /dev/null"));
    }

    /// The commands in execution order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Consume the plan, yielding the command list.
    pub fn into_commands(self) -> Vec<String> {
        self.commands
    }

    /// Number of commands in the plan.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Command that runs `command` inside a container via the docker CLI.
///
/// `command` is interpolated into a single-quoted shell string and must not
/// contain single quotes.
pub fn exec_in_container(container_name: &str, command: &str) -> String {
    format!("docker exec {container_name} sh -c '{command}'")
}

/// Human-readable description file written next to the compose file.
///
/// The text travels through a single-quoted `echo`, so neither the template
/// nor the resource name may contain single quotes.
pub fn generate_readme(resource_name: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "# {resource_name}\n\nGenerated by dockhand at {}.\n\nDo not edit the files in this directory by hand; they are rewritten on every provisioning run.",
        generated_at.to_rfc3339()
    )
}
