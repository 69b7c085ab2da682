use std::path::Path;
use std::sync::Arc;

use crate::archive::{ManifestIdentityReader, PackageIdentityReader};
use crate::models::{InstallOutcome, InstallRequest, PackageIdentity, PackageSource};
use crate::orchestration::{InstallOrchestrator, OrchestrationResult};

/// Entry point for install validation runs: resolves which package to install and hands it
/// to the orchestrator with the configured default timeout.
#[derive(Clone)]
pub struct PackageInstaller {
    orchestrator: InstallOrchestrator,
    identity_reader: Arc<dyn PackageIdentityReader>,
}

impl PackageInstaller {
    pub fn new(orchestrator: InstallOrchestrator) -> Self {
        Self::with_identity_reader(orchestrator, Arc::new(ManifestIdentityReader))
    }

    pub fn with_identity_reader(
        orchestrator: InstallOrchestrator,
        identity_reader: Arc<dyn PackageIdentityReader>,
    ) -> Self {
        Self {
            orchestrator,
            identity_reader,
        }
    }

    pub fn orchestrator(&self) -> &InstallOrchestrator {
        &self.orchestrator
    }

    pub async fn install_by_id(
        &self,
        id: impl Into<String>,
        version: Option<String>,
        update_all: bool,
    ) -> OrchestrationResult<InstallOutcome> {
        self.install(&InstallRequest::by_id(id, version).update_all(update_all))
            .await
    }

    pub async fn install_from_archive(
        &self,
        archive: impl AsRef<Path>,
        update_all: bool,
    ) -> OrchestrationResult<InstallOutcome> {
        let request = InstallRequest::from_archive(archive.as_ref()).update_all(update_all);
        self.install(&request).await
    }

    pub async fn install(&self, request: &InstallRequest) -> OrchestrationResult<InstallOutcome> {
        let package = self.resolve(&request.source)?;
        let timeout = self.orchestrator.settings().timings.default_timeout;
        self.orchestrator
            .install(&package, request.update_all, timeout)
            .await
    }

    pub fn resolve(&self, source: &PackageSource) -> OrchestrationResult<PackageIdentity> {
        match source {
            PackageSource::Identity(identity) => {
                identity.validate()?;
                Ok(identity.clone())
            }
            PackageSource::Archive(path) => {
                let identity = self.identity_reader.read_identity(path)?;
                tracing::debug!(
                    archive = %path.display(),
                    package_id = %identity.id,
                    version = identity.version.as_deref().unwrap_or_default(),
                    "resolved package identity from archive"
                );
                Ok(identity)
            }
        }
    }
}
