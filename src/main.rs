use anyhow::Result;
use clap::Parser;
use hiring_platform::admin_cli::{handle_create_admin, Cli, Command};
use hiring_platform::environment::EnvironmentConfig;
use hiring_platform::start_web_server;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging first
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Clear file on startup
        .open("/tmp/hiring_api.log")
        .expect("Failed to open log file");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(Arc::new(file))
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or(EnvFilter::new("hiring_platform=info,rocket::server=off")),
        )
        .init();

    let cli = Cli::parse();

    let config = EnvironmentConfig::load()?;
    config.ensure_directories().await?;

    if let Some(Command::CreateAdmin {
        email,
        password,
        full_name,
    }) = cli.command
    {
        return handle_create_admin(&config, &email, &password, &full_name).await;
    }

    let port = std::env::var("ROCKET_PORT")
        .map_err(|_| anyhow::anyhow!("ROCKET_PORT environment variable not set"))?
        .parse::<u16>()
        .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number"))?;

    let jwt_secret = std::env::var("JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

    info!("Starting Inclusive Hiring Platform API Server");
    info!(
        "Environment: {}",
        std::env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string())
    );
    info!("Database: {}", config.database_path.display());
    info!("Server: http://0.0.0.0:{}", port);

    start_web_server(
        config.database_path,
        port,
        jwt_secret,
        config.frontend_origin,
    )
    .await
}
