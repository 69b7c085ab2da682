pub mod retry;

pub use retry::{CommandExecutor, CommandReceipt};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::automation::console_command;
use crate::models::{CoreError, CoreErrorKind, InstallStep};

pub type ExecutionResult<T> = Result<T, CoreError>;

/// What the orchestrator does once a command has used up its attempts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Log and continue with the next step. A rejected command may still have run.
    #[default]
    Tolerate,
    /// Abort the workflow with `RetryExhausted`.
    Escalate,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstallCommand {
    pub script: PathBuf,
    pub package_id: String,
    pub update_all: bool,
}

impl InstallCommand {
    pub fn new(script: impl Into<PathBuf>, package_id: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            package_id: package_id.into(),
            update_all: false,
        }
    }

    pub fn update_all(mut self, update_all: bool) -> Self {
        self.update_all = update_all;
        self
    }

    pub fn validate(&self) -> ExecutionResult<()> {
        if self.script.as_os_str().is_empty() {
            return Err(self.invalid("install script path must not be empty"));
        }

        if self
            .script
            .to_string_lossy()
            .chars()
            .any(|ch| ch == '"' || ch.is_control())
        {
            return Err(self.invalid(
                "install script path must not contain quotes or control characters",
            ));
        }

        if self.package_id.is_empty()
            || self
                .package_id
                .chars()
                .any(|ch| ch == '"' || ch.is_control())
        {
            return Err(self.invalid(
                "package id must be non-empty and must not contain quotes or control characters",
            ));
        }

        Ok(())
    }

    /// `& "<script>" "<id>" "<True|False>"`. Every argument is quoted so paths with spaces
    /// survive the console's tokenizer.
    pub fn command_line(&self) -> String {
        let update_all = if self.update_all { "True" } else { "False" };
        format!(
            "& \"{}\" \"{}\" \"{update_all}\"",
            self.script.display(),
            self.package_id
        )
    }

    pub fn console_command(&self) -> String {
        console_command(&self.command_line())
    }

    fn invalid(&self, message: &str) -> CoreError {
        CoreError {
            package: Some(self.package_id.clone()),
            step: Some(InstallStep::Invoke),
            kind: CoreErrorKind::InvalidInput,
            message: message.to_string(),
        }
    }
}
