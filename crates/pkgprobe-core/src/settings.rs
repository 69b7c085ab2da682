use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::automation::PACKAGE_MANAGER_PANE;
use crate::execution::RetryPolicy;
use crate::models::{CoreError, CoreErrorKind};

pub const INSTALL_SCRIPT_NAME: &str = "Install.ps1";

const COMMAND_SETTLE: Duration = Duration::from_secs(1);
const RETRY_BACKOFF: Duration = Duration::from_secs(5);
const MAX_ATTEMPTS: u32 = 5;
const CONSOLE_SETTLE: Duration = Duration::from_secs(10);
const SAVE_SETTLE: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const BUILD_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Delays used while driving the host. Durations are written as seconds in JSON.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessTimings {
    #[serde(with = "seconds")]
    pub command_settle: Duration,
    #[serde(with = "seconds")]
    pub retry_backoff: Duration,
    pub max_attempts: u32,
    #[serde(with = "seconds")]
    pub console_settle: Duration,
    #[serde(with = "seconds")]
    pub save_settle: Duration,
    #[serde(with = "seconds")]
    pub poll_interval: Duration,
    #[serde(with = "seconds")]
    pub default_timeout: Duration,
    #[serde(with = "seconds")]
    pub build_poll_interval: Duration,
}

impl Default for HarnessTimings {
    fn default() -> Self {
        Self {
            command_settle: COMMAND_SETTLE,
            retry_backoff: RETRY_BACKOFF,
            max_attempts: MAX_ATTEMPTS,
            console_settle: CONSOLE_SETTLE,
            save_settle: SAVE_SETTLE,
            poll_interval: POLL_INTERVAL,
            default_timeout: DEFAULT_TIMEOUT,
            build_poll_interval: BUILD_POLL_INTERVAL,
        }
    }
}

impl HarnessTimings {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_attempts == 0 {
            return Err(invalid_settings("max_attempts must be at least 1"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid_settings("poll_interval must be greater than zero"));
        }
        if self.build_poll_interval.is_zero() {
            return Err(invalid_settings(
                "build_poll_interval must be greater than zero",
            ));
        }
        if self.default_timeout.is_zero() {
            return Err(invalid_settings("default_timeout must be greater than zero"));
        }
        let durations = [
            ("command_settle", self.command_settle),
            ("retry_backoff", self.retry_backoff),
            ("console_settle", self.console_settle),
            ("save_settle", self.save_settle),
            ("poll_interval", self.poll_interval),
            ("default_timeout", self.default_timeout),
            ("build_poll_interval", self.build_poll_interval),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| *value > MAX_DURATION) {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                format!("{name} must not exceed {} seconds", MAX_DURATION.as_secs()),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    pub timings: HarnessTimings,
    /// Directory the install script drops its sentinel files into when no solution file is set.
    pub solution_dir: PathBuf,
    pub solution_file: Option<PathBuf>,
    pub install_script: PathBuf,
    pub console_pane: String,
    pub retry_policy: RetryPolicy,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            timings: HarnessTimings::default(),
            install_script: working_dir.join(INSTALL_SCRIPT_NAME),
            solution_dir: working_dir,
            solution_file: None,
            console_pane: PACKAGE_MANAGER_PANE.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl HarnessSettings {
    pub fn new(solution_dir: impl Into<PathBuf>) -> Self {
        Self {
            solution_dir: solution_dir.into(),
            ..Self::default()
        }
    }

    /// Targets an existing solution; its directory receives the sentinel files.
    pub fn solution_file(mut self, solution_file: impl Into<PathBuf>) -> Self {
        self.solution_file = Some(solution_file.into());
        self
    }

    pub fn timings(mut self, timings: HarnessTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn install_script(mut self, install_script: impl Into<PathBuf>) -> Self {
        self.install_script = install_script.into();
        self
    }

    pub fn console_pane(mut self, console_pane: impl Into<String>) -> Self {
        self.console_pane = console_pane.into();
        self
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CoreError> {
        let settings: Self = serde_json::from_str(raw).map_err(|error| {
            CoreError::new(
                CoreErrorKind::ParseFailure,
                format!("invalid harness settings: {error}"),
            )
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            CoreError::new(
                CoreErrorKind::Precondition,
                format!("failed to read settings '{}': {error}", path.display()),
            )
        })?;
        Self::from_json_str(&raw)
    }

    pub fn sentinel_dir(&self) -> PathBuf {
        match &self.solution_file {
            Some(file) => match file.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
            None => self.solution_dir.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.timings.validate()?;
        if self.solution_dir.as_os_str().is_empty() {
            return Err(invalid_settings("solution_dir must not be empty"));
        }
        if self
            .solution_file
            .as_ref()
            .is_some_and(|file| file.file_name().is_none())
        {
            return Err(invalid_settings("solution_file must name a file"));
        }
        if self.console_pane.trim().is_empty() {
            return Err(invalid_settings("console_pane must not be empty"));
        }
        Ok(())
    }
}

fn invalid_settings(message: &str) -> CoreError {
    CoreError::new(CoreErrorKind::InvalidInput, message)
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
