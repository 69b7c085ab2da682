pub mod in_memory;

pub use in_memory::{CommandEffect, ScriptedAutomationPort};

use std::path::Path;

use crate::models::CoreError;

pub type AutomationResult<T> = Result<T, CoreError>;

pub const CONSOLE_COMMAND: &str = "View.PackageManagerConsole";
pub const CLEAR_HOST: &str = "clear-Host";
pub const SAVE_ALL_COMMAND: &str = "File.SaveAll";
pub const EXIT_COMMAND: &str = "File.Exit";

pub const PACKAGE_MANAGER_PANE: &str = "Package Manager";
pub const BUILD_PANE: &str = "Build";

/// Host IDE automation surface.
///
/// Every call is a single blocking round trip to the host. `execute_command` only submits the
/// command; it returns before the command has run and fails when the host is busy.
pub trait AutomationPort: Send + Sync {
    fn open_solution(&self, solution_file: &Path) -> AutomationResult<()>;

    fn execute_command(&self, command: &str) -> AutomationResult<()>;

    fn output_text(&self, pane: &str) -> AutomationResult<String>;

    fn activate_window(&self) -> AutomationResult<()>;

    fn quit(&self) -> AutomationResult<()>;

    fn start_build(&self) -> AutomationResult<()>;

    fn build_in_progress(&self) -> AutomationResult<bool>;

    /// Number of projects that failed in the most recent build.
    fn last_build_failures(&self) -> AutomationResult<u32>;
}

pub fn console_command(input: &str) -> String {
    format!("{CONSOLE_COMMAND} {input}")
}

pub fn clear_console_command() -> String {
    console_command(CLEAR_HOST)
}
