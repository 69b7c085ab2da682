use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{CoreError, CoreErrorKind, InstallStep};

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub id: String,
    pub version: Option<String>,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: Option<String>) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// The id is embedded in a quoted console command line and in sentinel file names,
    /// so quotes, path separators and control characters are rejected.
    pub fn validate(&self) -> Result<(), CoreError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(invalid_identity(&self.id, "package id must not be empty"));
        }

        if id.len() != self.id.len() {
            return Err(invalid_identity(
                &self.id,
                "package id must not have leading or trailing whitespace",
            ));
        }

        if self
            .id
            .chars()
            .any(|ch| ch == '"' || ch == '/' || ch == '\\' || ch.is_control())
        {
            return Err(invalid_identity(
                &self.id,
                "package id must not contain quotes, path separators or control characters",
            ));
        }

        if let Some(version) = &self.version
            && (version.trim().is_empty() || version.chars().any(char::is_control))
        {
            return Err(invalid_identity(
                &self.id,
                "package version must be non-empty and free of control characters when provided",
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PackageSource {
    Identity(PackageIdentity),
    Archive(PathBuf),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstallRequest {
    pub source: PackageSource,
    pub update_all: bool,
}

impl InstallRequest {
    pub fn by_id(id: impl Into<String>, version: Option<String>) -> Self {
        Self {
            source: PackageSource::Identity(PackageIdentity::new(id, version)),
            update_all: false,
        }
    }

    pub fn from_archive(path: impl Into<PathBuf>) -> Self {
        Self {
            source: PackageSource::Archive(path.into()),
            update_all: false,
        }
    }

    pub fn update_all(mut self, update_all: bool) -> Self {
        self.update_all = update_all;
        self
    }
}

fn invalid_identity(id: &str, message: &str) -> CoreError {
    CoreError {
        package: Some(id.to_string()),
        step: Some(InstallStep::ResolveIdentity),
        kind: CoreErrorKind::InvalidInput,
        message: message.to_string(),
    }
}
