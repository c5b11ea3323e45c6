// src/admin_cli.rs
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::core::identity::IdentityService;
use crate::core::ServiceError;
use crate::database::DatabaseConfig;
use crate::environment::EnvironmentConfig;

#[derive(Parser)]
#[command(name = "inclusive-hiring")]
#[command(about = "Job board API for the inclusive hiring platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server (the default when no subcommand is given)
    Serve,
    /// Create an admin account directly against the database
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
    },
}

/// First-run bootstrap: seed an admin account without going through the API
pub async fn handle_create_admin(
    config: &EnvironmentConfig,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<()> {
    let mut db_config = DatabaseConfig::new(config.database_path.clone());
    db_config.init_pool().await?;
    db_config.migrate().await?;

    let identity = IdentityService::new(db_config.pool()?);

    match identity.create_admin(email, password, full_name).await {
        Ok(admin_id) => {
            info!("Admin account created successfully");
            info!("   Email: {}", email);
            info!("   ID: {}", admin_id);
            Ok(())
        }
        Err(ServiceError::DuplicateEmail) => {
            warn!("Admin account already exists for {}", email);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
