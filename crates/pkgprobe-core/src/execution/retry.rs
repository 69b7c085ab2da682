use std::sync::Arc;
use std::time::Duration;

use crate::automation::AutomationPort;
use crate::execution::{ExecutionResult, RetryPolicy};
use crate::models::{CoreError, CoreErrorKind};
use crate::settings::HarnessTimings;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandReceipt {
    pub command: String,
    pub attempts: u32,
}

#[derive(Clone)]
pub struct CommandExecutor {
    port: Arc<dyn AutomationPort>,
    settle: Duration,
    backoff: Duration,
    max_attempts: u32,
}

impl CommandExecutor {
    pub fn new(port: Arc<dyn AutomationPort>) -> Self {
        Self::from_timings(port, &HarnessTimings::default())
    }

    pub fn from_timings(port: Arc<dyn AutomationPort>, timings: &HarnessTimings) -> Self {
        Self {
            port,
            settle: timings.command_settle,
            backoff: timings.retry_backoff,
            max_attempts: timings.max_attempts.max(1),
        }
    }

    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn execute_with_retry(&self, command: &str) -> ExecutionResult<CommandReceipt> {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.port.execute_command(command) {
                Ok(()) => {
                    tracing::debug!(command, attempt, "automation command submitted");
                    return Ok(CommandReceipt {
                        command: command.to_string(),
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        command,
                        attempt,
                        max_attempts = self.max_attempts,
                        kind = ?error.kind,
                        message = %error.message,
                        "automation command rejected"
                    );
                    if attempt >= self.max_attempts {
                        return Err(CoreError {
                            package: error.package,
                            step: error.step,
                            kind: CoreErrorKind::RetryExhausted,
                            message: format!(
                                "command '{command}' was rejected {attempt} times; last error: {}",
                                error.message
                            ),
                        });
                    }
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }
    }

    pub async fn execute_best_effort(&self, command: &str) {
        if let Err(error) = self.execute_with_retry(command).await {
            tracing::warn!(
                command,
                message = %error.message,
                "giving up on automation command"
            );
        }
    }

    pub async fn execute(&self, command: &str, policy: RetryPolicy) -> ExecutionResult<()> {
        match policy {
            RetryPolicy::Tolerate => {
                self.execute_best_effort(command).await;
                Ok(())
            }
            RetryPolicy::Escalate => self.execute_with_retry(command).await.map(|_| ()),
        }
    }
}
