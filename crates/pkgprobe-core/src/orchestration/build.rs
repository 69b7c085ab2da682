use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::automation::BUILD_PANE;
use crate::models::{CoreError, CoreErrorKind, InstallStep};
use crate::orchestration::{AutomationSession, OrchestrationResult};
use crate::settings::HarnessTimings;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BuildOutcome {
    pub failed_projects: u32,
    pub output: String,
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        self.failed_projects == 0
    }
}

/// Builds the open solution and waits for the host to report it idle.
#[derive(Clone)]
pub struct BuildMonitor {
    session: AutomationSession,
    poll_interval: Duration,
}

impl BuildMonitor {
    pub fn new(session: AutomationSession, timings: &HarnessTimings) -> Self {
        Self {
            session,
            poll_interval: timings.build_poll_interval,
        }
    }

    pub async fn build_solution(&self, timeout: Duration) -> OrchestrationResult<BuildOutcome> {
        let _guard = self.session.lock().await;
        let port = self.session.port();
        let started = Instant::now();

        port.start_build().map_err(attribute)?;
        tracing::info!(timeout_ms = timeout.as_millis() as u64, "solution build started");

        let mut polls = 0usize;
        while port.build_in_progress().map_err(attribute)? {
            polls += 1;
            if started.elapsed() >= timeout {
                return Err(CoreError {
                    package: None,
                    step: Some(InstallStep::Build),
                    kind: CoreErrorKind::Timeout,
                    message: format!(
                        "build still running after {}ms",
                        timeout.as_millis()
                    ),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        let output = self.session.transcript(BUILD_PANE).map_err(attribute)?;
        let failed_projects = port.last_build_failures().map_err(attribute)?;

        tracing::info!(
            failed_projects,
            polls,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "solution build finished"
        );

        Ok(BuildOutcome {
            failed_projects,
            output,
        })
    }
}

fn attribute(error: CoreError) -> CoreError {
    CoreError {
        step: error.step.or(Some(InstallStep::Build)),
        ..error
    }
}
