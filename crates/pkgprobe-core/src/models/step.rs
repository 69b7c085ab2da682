use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStep {
    ResolveIdentity,
    CheckPreconditions,
    OpenSolution,
    OpenConsole,
    ActivateConsole,
    ClearConsole,
    Invoke,
    Await,
    Cleanup,
    SaveAll,
    Build,
    CloseHost,
}

impl InstallStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolveIdentity => "resolve_identity",
            Self::CheckPreconditions => "check_preconditions",
            Self::OpenSolution => "open_solution",
            Self::OpenConsole => "open_console",
            Self::ActivateConsole => "activate_console",
            Self::ClearConsole => "clear_console",
            Self::Invoke => "invoke",
            Self::Await => "await",
            Self::Cleanup => "cleanup",
            Self::SaveAll => "save_all",
            Self::Build => "build",
            Self::CloseHost => "close_host",
        }
    }
}
