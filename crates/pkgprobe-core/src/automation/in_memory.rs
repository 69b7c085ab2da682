use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::automation::{AutomationPort, AutomationResult, BUILD_PANE};
use crate::models::{CoreError, CoreErrorKind};

/// Side effect applied when an executed command contains a trigger substring.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandEffect {
    /// Create an empty file, the way the install script drops its sentinel.
    WriteFile(PathBuf),
    AppendPane { pane: String, text: String },
}

/// Scripted stand-in for a host IDE. Records every command and replays configured failures,
/// pane contents and build states.
#[derive(Default)]
pub struct ScriptedAutomationPort {
    state: Mutex<PortState>,
}

struct Rejection {
    after: String,
    command: String,
    armed: bool,
}

#[derive(Default)]
struct PortState {
    attempts: Vec<String>,
    executed: Vec<String>,
    transient_failures: usize,
    always_fail: bool,
    activation_fails: bool,
    rejections: Vec<Rejection>,
    opened_solutions: Vec<PathBuf>,
    panes: HashMap<String, String>,
    triggers: Vec<(String, CommandEffect)>,
    activations: usize,
    quit_calls: usize,
    builds_started: usize,
    build_polls_remaining: usize,
    build_polls: usize,
    build_failures: u32,
}

impl ScriptedAutomationPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the next `count` command submissions before accepting any.
    pub fn failing_first(self, count: usize) -> Self {
        self.configure(|state| state.transient_failures = count)
    }

    pub fn always_failing(self) -> Self {
        self.configure(|state| state.always_fail = true)
    }

    pub fn failing_activation(self) -> Self {
        self.configure(|state| state.activation_fails = true)
    }

    /// Rejects every command containing `command` once a command containing `after` has run.
    pub fn rejecting_after(self, after: impl Into<String>, command: impl Into<String>) -> Self {
        let rejection = Rejection {
            after: after.into(),
            command: command.into(),
            armed: false,
        };
        self.configure(|state| state.rejections.push(rejection))
    }

    pub fn with_pane_text(self, pane: impl Into<String>, text: impl Into<String>) -> Self {
        let pane = pane.into();
        let text = text.into();
        self.configure(|state| {
            state.panes.insert(pane, text);
        })
    }

    pub fn on_command(self, trigger: impl Into<String>, effect: CommandEffect) -> Self {
        let trigger = trigger.into();
        self.configure(|state| state.triggers.push((trigger, effect)))
    }

    /// The next build reports in-progress for `polls` status checks, then finishes with
    /// `failures` failed projects and `output` in the Build pane.
    pub fn with_build(self, polls: usize, failures: u32, output: impl Into<String>) -> Self {
        let output = output.into();
        self.configure(|state| {
            state.build_polls = polls;
            state.build_failures = failures;
            state.panes.insert(BUILD_PANE.to_string(), output);
        })
    }

    pub fn attempts(&self) -> Vec<String> {
        self.snapshot().attempts.clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.snapshot().executed.clone()
    }

    pub fn opened_solutions(&self) -> Vec<PathBuf> {
        self.snapshot().opened_solutions.clone()
    }

    pub fn activations(&self) -> usize {
        self.snapshot().activations
    }

    pub fn quit_calls(&self) -> usize {
        self.snapshot().quit_calls
    }

    pub fn builds_started(&self) -> usize {
        self.snapshot().builds_started
    }

    fn configure(mut self, apply: impl FnOnce(&mut PortState)) -> Self {
        apply(self.state.get_mut().unwrap_or_else(PoisonError::into_inner));
        self
    }

    fn snapshot(&self) -> MutexGuard<'_, PortState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> AutomationResult<MutexGuard<'_, PortState>> {
        self.state.lock().map_err(|_| {
            CoreError::new(
                CoreErrorKind::Internal,
                "scripted automation port mutex poisoned",
            )
        })
    }
}

impl AutomationPort for ScriptedAutomationPort {
    fn open_solution(&self, solution_file: &Path) -> AutomationResult<()> {
        let mut state = self.lock_state()?;
        state.opened_solutions.push(solution_file.to_path_buf());
        Ok(())
    }

    fn execute_command(&self, command: &str) -> AutomationResult<()> {
        let mut state = self.lock_state()?;
        state.attempts.push(command.to_string());

        let rejected = state
            .rejections
            .iter()
            .any(|rejection| rejection.armed && command.contains(rejection.command.as_str()));
        if state.always_fail || state.transient_failures > 0 || rejected {
            state.transient_failures = state.transient_failures.saturating_sub(1);
            return Err(CoreError::new(
                CoreErrorKind::Automation,
                format!("call was rejected by callee while submitting '{command}'"),
            ));
        }

        state.executed.push(command.to_string());
        for rejection in &mut state.rejections {
            if command.contains(rejection.after.as_str()) {
                rejection.armed = true;
            }
        }

        let effects: Vec<CommandEffect> = state
            .triggers
            .iter()
            .filter(|(trigger, _)| command.contains(trigger.as_str()))
            .map(|(_, effect)| effect.clone())
            .collect();

        for effect in effects {
            match effect {
                CommandEffect::WriteFile(path) => {
                    std::fs::write(&path, b"").map_err(|error| {
                        CoreError::new(
                            CoreErrorKind::Internal,
                            format!("failed to write '{}': {error}", path.display()),
                        )
                    })?;
                }
                CommandEffect::AppendPane { pane, text } => {
                    state.panes.entry(pane).or_default().push_str(&text);
                }
            }
        }

        Ok(())
    }

    fn output_text(&self, pane: &str) -> AutomationResult<String> {
        let state = self.lock_state()?;
        state.panes.get(pane).cloned().ok_or_else(|| {
            CoreError::new(
                CoreErrorKind::Automation,
                format!("output pane '{pane}' does not exist"),
            )
        })
    }

    fn activate_window(&self) -> AutomationResult<()> {
        let mut state = self.lock_state()?;
        if state.activation_fails {
            return Err(CoreError::new(
                CoreErrorKind::Automation,
                "active window is not available",
            ));
        }
        state.activations += 1;
        Ok(())
    }

    fn quit(&self) -> AutomationResult<()> {
        let mut state = self.lock_state()?;
        state.quit_calls += 1;
        Ok(())
    }

    fn start_build(&self) -> AutomationResult<()> {
        let mut state = self.lock_state()?;
        state.builds_started += 1;
        state.build_polls_remaining = state.build_polls;
        Ok(())
    }

    fn build_in_progress(&self) -> AutomationResult<bool> {
        let mut state = self.lock_state()?;
        if state.build_polls_remaining > 0 {
            state.build_polls_remaining -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn last_build_failures(&self) -> AutomationResult<u32> {
        Ok(self.lock_state()?.build_failures)
    }
}
