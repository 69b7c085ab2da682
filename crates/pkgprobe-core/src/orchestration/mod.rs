pub mod build;
pub mod installer;
pub mod session;

pub use build::{BuildMonitor, BuildOutcome};
pub use installer::InstallOrchestrator;
pub use session::{AutomationSession, SessionGuard};

use crate::models::CoreError;

pub type OrchestrationResult<T> = Result<T, CoreError>;
