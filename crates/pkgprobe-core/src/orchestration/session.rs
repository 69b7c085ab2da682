use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::automation::{AutomationPort, AutomationResult};
use crate::models::{CoreError, CoreErrorKind};
use crate::orchestration::OrchestrationResult;

pub type SessionGuard = OwnedMutexGuard<()>;

/// Clones share the port and the exclusive guard.
#[derive(Clone)]
pub struct AutomationSession {
    port: Arc<dyn AutomationPort>,
    guard: Arc<Mutex<()>>,
}

impl AutomationSession {
    pub fn new(port: Arc<dyn AutomationPort>) -> Self {
        Self {
            port,
            guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn port(&self) -> &Arc<dyn AutomationPort> {
        &self.port
    }

    pub async fn lock(&self) -> SessionGuard {
        self.guard.clone().lock_owned().await
    }

    pub fn try_lock(&self) -> OrchestrationResult<SessionGuard> {
        self.guard.clone().try_lock_owned().map_err(|_| {
            CoreError::new(
                CoreErrorKind::Precondition,
                "automation session is already driving another workflow",
            )
        })
    }

    pub fn transcript(&self, pane: &str) -> AutomationResult<String> {
        self.port.output_text(pane)
    }

    pub fn quit(&self) -> AutomationResult<()> {
        tracing::info!("quitting automation host");
        self.port.quit()
    }
}
