use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::models::SentinelSignal;

pub const PASS_SENTINEL_SUFFIX: &str = "Pass.txt";
pub const FAIL_SENTINEL_SUFFIX: &str = "Fail.txt";

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub trait SentinelProbe: Send + Sync {
    fn probe(&self, package_id: &str) -> SentinelSignal;
}

/// Looks for `<id>Pass.txt` / `<id>Fail.txt` in the solution directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileSentinelProbe {
    solution_dir: PathBuf,
}

impl FileSentinelProbe {
    pub fn new(solution_dir: impl Into<PathBuf>) -> Self {
        Self {
            solution_dir: solution_dir.into(),
        }
    }

    pub fn pass_path(&self, package_id: &str) -> PathBuf {
        self.solution_dir
            .join(format!("{package_id}{PASS_SENTINEL_SUFFIX}"))
    }

    pub fn fail_path(&self, package_id: &str) -> PathBuf {
        self.solution_dir
            .join(format!("{package_id}{FAIL_SENTINEL_SUFFIX}"))
    }
}

impl SentinelProbe for FileSentinelProbe {
    fn probe(&self, package_id: &str) -> SentinelSignal {
        if sentinel_exists(self.pass_path(package_id)) {
            SentinelSignal::Pass
        } else if sentinel_exists(self.fail_path(package_id)) {
            SentinelSignal::Fail
        } else {
            SentinelSignal::Missing
        }
    }
}

fn sentinel_exists(path: PathBuf) -> bool {
    match path.try_exists() {
        Ok(exists) => exists,
        Err(error) => {
            tracing::debug!(
                path = %path.display(),
                error = %error,
                "sentinel probe failed; treating as absent"
            );
            false
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SignalWait {
    pub signal: SentinelSignal,
    pub polls: usize,
    pub elapsed: Duration,
}

/// Probes once immediately, then on every interval tick until a sentinel appears or the
/// deadline passes.
#[derive(Clone)]
pub struct CompletionPoller {
    probe: Arc<dyn SentinelProbe>,
    interval: Duration,
}

impl CompletionPoller {
    pub fn new(probe: Arc<dyn SentinelProbe>, interval: Duration) -> Self {
        Self {
            probe,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn wait_for_signal(&self, package_id: &str, timeout: Duration) -> SentinelSignal {
        self.wait(package_id, timeout).await.signal
    }

    pub async fn wait(&self, package_id: &str, timeout: Duration) -> SignalWait {
        let started = Instant::now();
        tracing::info!(
            package_id,
            timeout_ms = timeout.as_millis() as u64,
            interval_ms = self.interval.as_millis() as u64,
            "waiting for install sentinel"
        );

        let mut polls = 1usize;
        let mut signal = self.probe.probe(package_id);

        if !signal.is_terminal() {
            let watch = async {
                let Some(first_tick) = started.checked_add(self.interval) else {
                    return std::future::pending::<SentinelSignal>().await;
                };
                let mut ticker = tokio::time::interval_at(first_tick, self.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    polls += 1;
                    let observed = self.probe.probe(package_id);
                    tracing::debug!(package_id, polls, signal = ?observed, "probed install sentinel");
                    if observed.is_terminal() {
                        return observed;
                    }
                }
            };

            signal = match started.checked_add(timeout) {
                Some(deadline) => tokio::time::timeout_at(deadline, watch)
                    .await
                    .unwrap_or(SentinelSignal::Missing),
                None => watch.await,
            };
        }

        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        if signal.is_terminal() {
            tracing::info!(package_id, polls, elapsed_ms, signal = ?signal, "install sentinel observed");
        } else {
            tracing::warn!(package_id, polls, elapsed_ms, "install sentinel not observed before timeout");
        }

        SignalWait {
            signal,
            polls,
            elapsed,
        }
    }
}
