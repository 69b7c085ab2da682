use serde::Serialize;

/// Completion state left behind by the install script.
///
/// The script writes exactly one of the two sentinel files, so `Pass` and `Fail` never
/// coexist for a single run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelSignal {
    Pass,
    Fail,
    Missing,
}

impl SentinelSignal {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Missing)
    }
}
