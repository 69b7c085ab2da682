use serde::Serialize;

use crate::models::{PackageIdentity, SentinelSignal};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub found: bool,
    pub text: Option<String>,
}

impl ExtractionResult {
    pub fn found(text: impl Into<String>) -> Self {
        Self {
            found: true,
            text: Some(text.into()),
        }
    }

    pub fn missing() -> Self {
        Self {
            found: false,
            text: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    Passed,
    Failed,
    /// Neither sentinel appeared before the deadline; the host may still be working.
    TimedOut,
}

impl From<SentinelSignal> for InstallStatus {
    fn from(signal: SentinelSignal) -> Self {
        match signal {
            SentinelSignal::Pass => Self::Passed,
            SentinelSignal::Fail => Self::Failed,
            SentinelSignal::Missing => Self::TimedOut,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct InstallOutcome {
    pub package: PackageIdentity,
    pub status: InstallStatus,
    pub succeeded: bool,
    pub diagnostic_text: Option<String>,
}

impl InstallOutcome {
    pub fn from_signal(
        package: PackageIdentity,
        signal: SentinelSignal,
        diagnostic_text: Option<String>,
    ) -> Self {
        Self {
            package,
            status: signal.into(),
            succeeded: signal == SentinelSignal::Pass,
            diagnostic_text,
        }
    }
}
