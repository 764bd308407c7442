use anyhow::Context;
use clap::Parser;
use logger_redacted::LoggerConfig;
use std::net::SocketAddr;
use tracing::info;

use hms_server::{create_app, AppConfig, HmsServer};

/// HMS Engine HTTP Server
#[derive(Parser, Debug)]
#[command(name = "hms-server")]
#[command(about = "Hospital management API server")]
struct Args {
    /// Server bind address, overrides the configuration file
    #[arg(long, env = "HMS_HOST")]
    host: Option<String>,

    /// Server port, overrides the configuration file
    #[arg(short, long, env = "HMS_PORT")]
    port: Option<u16>,

    /// Configuration file path
    #[arg(short, long, default_value = "hms-server.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config).context("Failed to load configuration")?;
    if let Ok(environment) = std::env::var("HMS_ENV") {
        config.environment = environment;
        config.validate()?;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // JSON logs outside development regardless of the file's format
    let logging = if config.is_development() {
        config.logging.clone()
    } else {
        LoggerConfig::for_environment(&config.environment).with_level(config.logging.level.clone())
    };
    let logging = if args.verbose {
        logging.with_level("debug")
    } else {
        logging
    };
    logger_redacted::init(&logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        backend = ?config.database.backend,
        "Starting HMS server"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    let server = HmsServer::from_config(config).await?;
    let app = create_app(server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(address = %addr, "HMS server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("HMS server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
