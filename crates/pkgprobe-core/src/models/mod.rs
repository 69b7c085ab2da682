pub mod error;
pub mod outcome;
pub mod package;
pub mod signal;
pub mod step;

pub use error::{CoreError, CoreErrorKind};
pub use outcome::{ExtractionResult, InstallOutcome, InstallStatus};
pub use package::{InstallRequest, PackageIdentity, PackageSource};
pub use signal::SentinelSignal;
pub use step::InstallStep;
