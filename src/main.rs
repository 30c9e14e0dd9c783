mod extract;
mod format;
mod gateway;
mod i18n;
mod transform;
mod users;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wabridge_channels::whatsapp::{self, WhatsAppConnector};
use wabridge_core::config::{self, shellexpand, Config};

/// Capacity of the queue carrying socket events into the gateway.
const CLIENT_INBOX: usize = 1024;

#[derive(Parser)]
#[command(
    name = "wabridge",
    version,
    about = "Bridge a WhatsApp multi-device session to WebSocket clients"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bridge: WhatsApp session plus WebSocket server.
    Start,
    /// Show configuration and whether a WhatsApp session is stored.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (cfg, source) = config::load_with_source(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let _guard = init_logging(&cfg)?;
            info!("config {source}");
            run(cfg).await?;
        }
        Commands::Status => {
            println!("wabridge status\n");
            println!("Config: {source}");
            println!("Listen: {}", cfg.server.bind_addr());
            println!("Data dir: {}", shellexpand(&cfg.bridge.data_dir));
            println!(
                "  whatsapp session: {}",
                if whatsapp::has_session(&cfg.bridge.data_dir) {
                    "paired"
                } else {
                    "not paired (start and scan the QR code)"
                }
            );
        }
    }

    Ok(())
}

/// Stdout plus a daily log file under `{data_dir}/logs`. `RUST_LOG`
/// overrides the configured level.
fn init_logging(cfg: &Config) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = PathBuf::from(shellexpand(&cfg.bridge.data_dir)).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::daily(&log_dir, format!("{}.log", cfg.bridge.name));
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.bridge.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

async fn run(cfg: Config) -> anyhow::Result<()> {
    let connector = Arc::new(WhatsAppConnector::new(
        cfg.whatsapp.clone(),
        &cfg.bridge.data_dir,
    ));
    let gw = gateway::Gateway::new(connector, &cfg.display, cfg.whatsapp.print_qr);

    let (inbox_tx, inbox_rx) = mpsc::channel(CLIENT_INBOX);
    let app = gateway::router(inbox_tx, cfg.server.client_buffer);
    let addr = cfg.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
    info!("WebSocket server listening on {addr}");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("WebSocket server error: {e}");
        }
    });

    let result = gw.run(inbox_rx).await;
    server.abort();
    result
}
