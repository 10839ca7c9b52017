use std::time::Duration;

use clap::{Parser, Subcommand};
use pixelboard::backend::CellBackend;
use pixelboard::config::ConfigError;
use pixelboard::net::HttpCellBackend;
use pixelboard::{AuthState, CanvasSession, EditError, Identity, SubmitOutcome, SyncConfig};
use serde_json::Value;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("missing identity; pass --user-id or set PIXELBOARD_USER_ID")]
    MissingIdentity,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("transport: {0}")]
    Transport(#[from] pixelboard::backend::TransportError),
    #[error("session: {0}")]
    Session(#[from] pixelboard::canvas::SessionError),
    #[error("edit: {0}")]
    Edit(#[from] EditError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "pixelboard", about = "Pixelboard canvas CLI")]
struct Cli {
    /// Server origin; overrides the engine's own `PIXELBOARD_BASE_URL` lookup.
    #[arg(long, env = "PIXELBOARD_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "PIXELBOARD_USER_ID")]
    user_id: Option<String>,

    #[arg(long, env = "PIXELBOARD_EMAIL", default_value = "")]
    email: String,

    /// Log engine debug events.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server is up.
    Ping,
    /// Print every painted cell as JSON.
    Cells,
    /// Paint one cell.
    Paint {
        #[arg(allow_negative_numbers = true)]
        x: i64,
        #[arg(allow_negative_numbers = true)]
        y: i64,
        /// `#rgb` or `#rrggbb`.
        color: String,
    },
    /// Follow the live feed and log grid size and presence.
    Watch {
        /// Stop after this many seconds; runs until Ctrl-C when omitted.
        #[arg(long)]
        seconds: Option<u64>,

        #[arg(long, default_value_t = 5)]
        report_every: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let config = resolve_config(cli.base_url.as_deref())?;
    let identity = cli.user_id.map(|user_id| Identity::new(user_id, cli.email));

    match cli.command {
        Command::Ping => run_ping(&config).await,
        Command::Cells => run_cells(&config).await,
        Command::Paint { x, y, color } => run_paint(&config, identity, x, y, &color).await,
        Command::Watch { seconds, report_every } => {
            run_watch(&config, identity, seconds.map(Duration::from_secs), Duration::from_secs(report_every.max(1)))
                .await
        }
    }
}

fn resolve_config(base_url: Option<&str>) -> Result<SyncConfig, CliError> {
    let mut config = SyncConfig::from_env()?;
    if let Some(base_url) = base_url {
        config.base_url = base_url.trim_end_matches('/').to_owned();
    }
    Ok(config)
}

async fn run_ping(config: &SyncConfig) -> Result<(), CliError> {
    let url = format!("{}/healthz", config.base_url);
    let status = reqwest::Client::new().get(url).send().await?.status();
    if !status.is_success() {
        return Err(CliError::Status(status.as_u16()));
    }
    println!("ok");
    Ok(())
}

async fn run_cells(config: &SyncConfig) -> Result<(), CliError> {
    let backend = HttpCellBackend::new(config.cells_url(), config.request_timeout)?;
    let cells = backend.fetch_all().await?;
    print_json(&serde_json::to_value(&cells)?)?;
    eprintln!("{} cells", cells.len());
    Ok(())
}

async fn run_paint(
    config: &SyncConfig,
    identity: Option<Identity>,
    x: i64,
    y: i64,
    color: &str,
) -> Result<(), CliError> {
    let identity = identity.ok_or(CliError::MissingIdentity)?;
    let session = CanvasSession::connect_to(config, AuthState::signed_in(identity))?;
    session.submitter().select_cell(x, y).await?;
    match session.submitter().submit_hex(color).await? {
        SubmitOutcome::Confirmed(cell) => print_json(&serde_json::to_value(&cell)?)?,
        SubmitOutcome::Superseded => eprintln!("cell ({x}, {y}) was repainted by someone else first"),
    }
    Ok(())
}

async fn run_watch(
    config: &SyncConfig,
    identity: Option<Identity>,
    limit: Option<Duration>,
    report_every: Duration,
) -> Result<(), CliError> {
    let auth = identity.map_or_else(AuthState::new, AuthState::signed_in);
    let mut session = CanvasSession::connect_to(config, auth)?;
    session.start().await;

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut ticker = tokio::time::interval(report_every);
    loop {
        tokio::select! {
            () = &mut deadline => break,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "watch: ctrl-c handler failed");
                }
                break;
            }
            _ = ticker.tick() => {
                let status = *session.status().borrow();
                let online: Vec<String> = session.online().await.into_iter().map(|entry| entry.user_id).collect();
                tracing::info!(?status, cells = session.cell_count().await, ?online, "watch");
            }
        }
    }

    session.stop().await;
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;
