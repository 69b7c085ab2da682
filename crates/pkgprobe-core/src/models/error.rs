use thiserror::Error;

use crate::models::InstallStep;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    InvalidInput,
    Precondition,
    Automation,
    RetryExhausted,
    Timeout,
    ParseFailure,
    Internal,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub package: Option<String>,
    pub step: Option<InstallStep>,
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            package: None,
            step: None,
            kind,
            message: message.into(),
        }
    }

    /// Fills in the package and step only where the error does not already carry them.
    pub fn attribute(mut self, package: &str, step: InstallStep) -> Self {
        if self.package.is_none() {
            self.package = Some(package.to_string());
        }
        if self.step.is_none() {
            self.step = Some(step);
        }
        self
    }
}
