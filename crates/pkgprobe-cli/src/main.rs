use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pkgprobe_core::archive::{ManifestIdentityReader, PackageIdentityReader};
use pkgprobe_core::execution::InstallCommand;
use pkgprobe_core::logging::init_tracing;
use pkgprobe_core::models::{InstallStatus, SentinelSignal};
use pkgprobe_core::polling::{CompletionPoller, FileSentinelProbe};
use pkgprobe_core::settings::HarnessSettings;
use pkgprobe_core::transcript;
use serde::Serialize;

const EXIT_FAILED: u8 = 1;
const EXIT_TIMED_OUT: u8 = 2;
const EXIT_ERROR: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "pkgprobe")]
#[command(about = "Package install validation helpers", long_about = None)]
struct Cli {
    /// JSON harness settings; defaults apply to anything left out
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wait for a package's Pass/Fail sentinel in the solution directory
    Wait {
        package: String,
        #[arg(long)]
        solution_dir: Option<PathBuf>,
        #[arg(long)]
        timeout_secs: Option<f64>,
        #[arg(long)]
        interval_secs: Option<f64>,
    },
    /// Print the output of a package's install command from a saved console transcript
    Extract { package: String, file: PathBuf },
    /// Print the id and version recorded in a package archive
    Identify { archive: PathBuf },
    /// Print the console command that installs a package
    #[command(name = "command")]
    CommandLine {
        package: String,
        #[arg(long)]
        update_all: bool,
        #[arg(long)]
        script: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct WaitReport {
    package: String,
    signal: SentinelSignal,
    status: InstallStatus,
    polls: usize,
    elapsed_secs: f64,
}

fn main() -> ExitCode {
    init_tracing("info");
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = match &cli.config {
        Some(path) => HarnessSettings::load(path)?,
        None => HarnessSettings::default(),
    };
    tracing::debug!(config = ?cli.config, "harness settings loaded");

    match cli.command {
        Commands::Wait {
            package,
            solution_dir,
            timeout_secs,
            interval_secs,
        } => {
            let solution_dir = solution_dir.unwrap_or_else(|| settings.sentinel_dir());
            let timeout = seconds(timeout_secs, settings.timings.default_timeout)?;
            let interval = seconds(interval_secs, settings.timings.poll_interval)?;
            if interval.is_zero() {
                bail!("--interval-secs must be greater than zero");
            }

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("failed to create tokio runtime")?;
            let poller =
                CompletionPoller::new(Arc::new(FileSentinelProbe::new(solution_dir)), interval);
            let wait = runtime.block_on(poller.wait(&package, timeout));
            let status = InstallStatus::from(wait.signal);

            print_json(&WaitReport {
                package,
                signal: wait.signal,
                status,
                polls: wait.polls,
                elapsed_secs: wait.elapsed.as_secs_f64(),
            })?;

            Ok(match status {
                InstallStatus::Passed => ExitCode::SUCCESS,
                InstallStatus::Failed => ExitCode::from(EXIT_FAILED),
                InstallStatus::TimedOut => ExitCode::from(EXIT_TIMED_OUT),
            })
        }
        Commands::Extract { package, file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read transcript '{}'", file.display()))?;
            let result = transcript::extract(&text, &package);
            print_json(&result)?;
            Ok(if result.found {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILED)
            })
        }
        Commands::Identify { archive } => {
            let identity = ManifestIdentityReader.read_identity(&archive)?;
            print_json(&identity)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CommandLine {
            package,
            update_all,
            script,
        } => {
            let script = script.unwrap_or(settings.install_script);
            let command = InstallCommand::new(script, package).update_all(update_all);
            command.validate()?;
            println!("{}", command.console_command());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn seconds(value: Option<f64>, default: Duration) -> Result<Duration> {
    match value {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid duration '{secs}' seconds")),
        None => Ok(default),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}
