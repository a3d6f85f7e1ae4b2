// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Name server reload.

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use crate::errors::ProcessError;
use crate::process::{run_command, split_command};

/// Signals the name server to load freshly deployed zone files.
#[async_trait]
pub trait ServiceController: Send + Sync {
    /// Reload the name server.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] if the reload could not be performed.
    async fn reload(&self) -> Result<(), ProcessError>;

    /// Short description for reports (e.g. the command line).
    fn describe(&self) -> String;
}

/// [`ServiceController`] that runs a configured command such as
/// `systemctl reload bind9` or `rndc reload`.
#[derive(Debug, Clone)]
pub struct CommandServiceController {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandServiceController {
    #[must_use]
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

#[async_trait]
impl ServiceController for CommandServiceController {
    async fn reload(&self) -> Result<(), ProcessError> {
        let (program, args) = split_command(&self.command)?;
        let output = run_command(program, args, self.timeout).await?;

        if !output.success {
            return Err(ProcessError::Failed {
                program: self.describe(),
                status: output.status,
                output: output.output,
            });
        }

        info!(command = %self.describe(), "Name server reloaded");
        Ok(())
    }

    fn describe(&self) -> String {
        self.command.join(" ")
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
