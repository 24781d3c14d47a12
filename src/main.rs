use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use viewport::ErrorCode;

use mapview::config::{ConfigError, MapConfig};
use mapview::coordinator::CameraCoordinator;
use mapview::location::{CachedLocationStore, FixedLocation, StaticCachedLocation};
use mapview::provider::{Platform, Provider};
use mapview::replay::{self, SurfaceCommand, TraceSurfaceFactory};
use mapview::session::{Session, SessionError, SessionReport, SessionSummary};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to load env file {}: {source}", path.display())]
    EnvFile { path: PathBuf, source: dotenvy::Error },
    #[error("failed to write trace: {0}")]
    Trace(#[from] std::io::Error),
    #[error("failed to encode trace line: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ErrorCode for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::EnvFile { .. } => "E_ENV_FILE",
            Self::Trace(_) => "E_IO",
            Self::Encode(_) => "E_ENCODE",
            Self::Join(_) => "E_TASK_FAILED",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mapview", about = "Replay host events against a map camera session")]
struct Cli {
    /// JSON-lines host event file; `-` reads stdin.
    #[arg(long, env = "MAPVIEW_EVENTS", default_value = "-")]
    events: String,

    /// Dotenv file loaded before configuration is read. Defaults to `./.env` if present.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Overrides `MAPVIEW_PLATFORM`.
    #[arg(long)]
    platform: Option<Platform>,

    /// Overrides `MAPVIEW_PROVIDER`.
    #[arg(long)]
    provider: Option<Provider>,

    /// Seconds a surface callback waits for its surface to be built.
    #[arg(long, default_value_t = 5)]
    surface_wait_secs: u64,
}

#[tokio::main]
async fn main() {
    // stdout carries the trace.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(summary) => info!(
            signals = summary.signals,
            cameras_applied = summary.cameras_applied,
            surfaces_created = summary.surfaces_created,
            "replay complete"
        ),
        Err(e) => {
            tracing::error!(error = %e, code = e.error_code(), "mapview failed");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<SessionSummary, AppError> {
    load_env_file(cli.env_file.as_ref())?;

    let mut config = MapConfig::from_env()?;
    if let Some(platform) = cli.platform {
        config.platform = platform;
    }
    if let Some(provider) = cli.provider {
        config.provider = Some(provider);
    }
    let provider = config.starting_provider()?;
    let cached = StaticCachedLocation(config.cached_location);

    let coordinator = CameraCoordinator::new(
        config.registry(),
        provider,
        config.default_zoom,
        cached.last_known(),
        config.initial_camera(),
    );
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (reports_tx, reports_rx) = mpsc::unbounded_channel();
    let (factory, mut tracker) = TraceSurfaceFactory::new(commands_tx);
    let (session, handle) = Session::new(
        coordinator,
        Arc::new(factory),
        Arc::new(FixedLocation(config.device_location)),
        config.queue_capacity,
    );
    info!(session = %session.id(), platform = %config.platform, %provider, credentials = ?config.credentials, "starting replay");

    let session_task = tokio::spawn(session.with_reports(reports_tx).run());
    let trace_task = tokio::spawn(write_trace(commands_rx, reports_rx));

    let wait = Duration::from_secs(cli.surface_wait_secs);
    let replayed = if cli.events == "-" {
        replay::replay(BufReader::new(tokio::io::stdin()), &handle, &mut tracker, wait).await
    } else {
        match tokio::fs::File::open(&cli.events).await {
            Ok(file) => replay::replay(BufReader::new(file), &handle, &mut tracker, wait).await,
            Err(e) => Err(SessionError::Io(e)),
        }
    };

    // Let the session drain whatever was queued before reporting a replay error.
    drop(handle);
    let summary = session_task.await?;
    let written = trace_task.await??;
    let replayed = replayed?;
    info!(replayed, written, "trace written");
    Ok(summary)
}

fn load_env_file(path: Option<&PathBuf>) -> Result<(), AppError> {
    match path {
        Some(path) => dotenvy::from_path(path).map_err(|source| AppError::EnvFile { path: path.clone(), source }),
        None => match dotenvy::dotenv() {
            Ok(path) => {
                info!(path = %path.display(), "loaded .env");
                Ok(())
            }
            Err(e) if e.not_found() => Ok(()),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable .env");
                Ok(())
            }
        },
    }
}

/// Write each surface command to stdout as one JSON line and log session
/// reports. Returns the number of lines written.
async fn write_trace(
    mut commands: mpsc::UnboundedReceiver<SurfaceCommand>,
    mut reports: mpsc::UnboundedReceiver<SessionReport>,
) -> Result<usize, AppError> {
    let mut out = tokio::io::stdout();
    let mut written = 0_usize;
    let mut reports_open = true;

    loop {
        tokio::select! {
            report = reports.recv(), if reports_open => match report {
                Some(SessionReport::MapReady { surface, provider }) => info!(%surface, %provider, "map ready"),
                Some(SessionReport::LocationFailed(e)) => warn!(error = %e, "location request failed"),
                None => reports_open = false,
            },
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                let mut line = serde_json::to_vec(&command)?;
                line.push(b'\n');
                out.write_all(&line).await?;
                written += 1;
            }
        }
    }
    out.flush().await?;
    Ok(written)
}
