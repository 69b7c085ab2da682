use std::sync::Arc;
use std::time::Duration;

use crate::automation::{CONSOLE_COMMAND, EXIT_COMMAND, SAVE_ALL_COMMAND, clear_console_command};
use crate::execution::{CommandExecutor, InstallCommand};
use crate::models::{
    CoreError, CoreErrorKind, InstallOutcome, InstallStep, PackageIdentity,
};
use crate::orchestration::{AutomationSession, OrchestrationResult};
use crate::polling::{CompletionPoller, FileSentinelProbe, SentinelProbe};
use crate::settings::HarnessSettings;
use crate::transcript;

/// Drives one package install through the host's scripting console.
#[derive(Clone)]
pub struct InstallOrchestrator {
    session: AutomationSession,
    executor: CommandExecutor,
    poller: CompletionPoller,
    settings: HarnessSettings,
}

impl InstallOrchestrator {
    pub fn new(session: AutomationSession, settings: HarnessSettings) -> OrchestrationResult<Self> {
        let probe = Arc::new(FileSentinelProbe::new(settings.sentinel_dir()));
        Self::with_probe(session, settings, probe)
    }

    pub fn with_probe(
        session: AutomationSession,
        settings: HarnessSettings,
        probe: Arc<dyn SentinelProbe>,
    ) -> OrchestrationResult<Self> {
        settings.validate()?;
        let executor = CommandExecutor::from_timings(session.port().clone(), &settings.timings);
        let poller = CompletionPoller::new(probe, settings.timings.poll_interval);
        Ok(Self {
            session,
            executor,
            poller,
            settings,
        })
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    pub fn session(&self) -> &AutomationSession {
        &self.session
    }

    pub async fn install(
        &self,
        package: &PackageIdentity,
        update_all: bool,
        timeout: Duration,
    ) -> OrchestrationResult<InstallOutcome> {
        package.validate()?;
        self.check_preconditions(&package.id)?;

        let command = InstallCommand::new(&self.settings.install_script, &package.id)
            .update_all(update_all);
        command.validate()?;

        let _guard = self.session.lock().await;
        let timings = &self.settings.timings;
        let package_id = package.id.as_str();

        tracing::info!(
            package_id,
            version = package.version.as_deref().unwrap_or("latest"),
            update_all,
            timeout_ms = timeout.as_millis() as u64,
            "starting package install"
        );

        self.settle(timings.console_settle, InstallStep::OpenConsole)
            .await;
        self.run(package_id, InstallStep::OpenConsole, CONSOLE_COMMAND)
            .await?;
        self.settle(timings.console_settle, InstallStep::ActivateConsole)
            .await;
        if let Err(error) = self.session.port().activate_window() {
            tracing::warn!(
                package_id,
                message = %error.message,
                "could not activate console window"
            );
        }
        self.run(package_id, InstallStep::ClearConsole, &clear_console_command())
            .await?;
        self.run(package_id, InstallStep::Invoke, &command.console_command())
            .await?;

        let wait = self.poller.wait(package_id, timeout).await;

        // Cleanup never overrides the observed signal.
        self.run_after_await(package_id, InstallStep::Cleanup, &clear_console_command())
            .await;
        self.settle(timings.save_settle, InstallStep::SaveAll).await;
        self.run_after_await(package_id, InstallStep::SaveAll, SAVE_ALL_COMMAND)
            .await;

        let diagnostic_text = self.diagnostic_text(package_id);
        let outcome = InstallOutcome::from_signal(package.clone(), wait.signal, diagnostic_text);

        tracing::info!(
            package_id,
            status = ?outcome.status,
            succeeded = outcome.succeeded,
            polls = wait.polls,
            elapsed_ms = wait.elapsed.as_millis() as u64,
            has_diagnostics = outcome.diagnostic_text.is_some(),
            "package install finished"
        );

        Ok(outcome)
    }

    pub async fn open_solution(&self) -> OrchestrationResult<()> {
        let solution_file = self
            .settings
            .solution_file
            .as_deref()
            .ok_or_else(|| missing_solution_error("no solution file is configured".to_string()))?;
        if !solution_file.is_file() {
            return Err(missing_solution_error(format!(
                "solution file '{}' does not exist",
                solution_file.display()
            )));
        }

        let _guard = self.session.lock().await;
        tracing::info!(solution = %solution_file.display(), "opening solution");
        self.session
            .port()
            .open_solution(solution_file)
            .map_err(|error| CoreError {
                step: error.step.or(Some(InstallStep::OpenSolution)),
                ..error
            })
    }

    /// Asks the host to exit through its own command surface.
    pub async fn close_host(&self) -> OrchestrationResult<()> {
        let _guard = self.session.lock().await;
        self.executor
            .execute(EXIT_COMMAND, self.settings.retry_policy)
            .await
            .map_err(|error| CoreError {
                step: error.step.or(Some(InstallStep::CloseHost)),
                ..error
            })
    }

    async fn run(
        &self,
        package_id: &str,
        step: InstallStep,
        command: &str,
    ) -> OrchestrationResult<()> {
        tracing::debug!(package_id, step = step.as_str(), command, "running install step");
        self.executor
            .execute(command, self.settings.retry_policy)
            .await
            .map_err(|error| error.attribute(package_id, step))
    }

    async fn run_after_await(&self, package_id: &str, step: InstallStep, command: &str) {
        if let Err(error) = self.run(package_id, step, command).await {
            tracing::warn!(
                package_id,
                step = step.as_str(),
                kind = ?error.kind,
                message = %error.message,
                "install cleanup step failed"
            );
        }
    }

    async fn settle(&self, delay: Duration, before: InstallStep) {
        if delay.is_zero() {
            return;
        }
        tracing::debug!(
            before = before.as_str(),
            delay_ms = delay.as_millis() as u64,
            "waiting for host to settle"
        );
        tokio::time::sleep(delay).await;
    }

    fn diagnostic_text(&self, package_id: &str) -> Option<String> {
        match self.session.transcript(&self.settings.console_pane) {
            Ok(text) => transcript::extract(&text, package_id).text,
            Err(error) => {
                tracing::debug!(
                    package_id,
                    pane = %self.settings.console_pane,
                    message = %error.message,
                    "console transcript unavailable"
                );
                None
            }
        }
    }

    fn check_preconditions(&self, package_id: &str) -> OrchestrationResult<()> {
        if let Some(solution_file) = &self.settings.solution_file
            && !solution_file.is_file()
        {
            return Err(precondition_error(
                package_id,
                format!("solution file '{}' does not exist", solution_file.display()),
            ));
        }
        let sentinel_dir = self.settings.sentinel_dir();
        if !sentinel_dir.is_dir() {
            return Err(precondition_error(
                package_id,
                format!("solution directory '{}' does not exist", sentinel_dir.display()),
            ));
        }
        Ok(())
    }
}

fn precondition_error(package_id: &str, message: String) -> CoreError {
    CoreError {
        package: Some(package_id.to_string()),
        step: Some(InstallStep::CheckPreconditions),
        kind: CoreErrorKind::Precondition,
        message,
    }
}

fn missing_solution_error(message: String) -> CoreError {
    CoreError {
        package: None,
        step: Some(InstallStep::OpenSolution),
        kind: CoreErrorKind::Precondition,
        message,
    }
}
