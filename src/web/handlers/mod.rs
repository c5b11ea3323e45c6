// src/web/handlers/mod.rs
pub mod admin_handlers;
pub mod application_handlers;
pub mod auth_handlers;
pub mod job_handlers;

use rocket::http::Status;
use rocket::State;
use sqlx::SqlitePool;
use tracing::error;

use crate::database::DatabaseConfig;
use crate::web::types::{error_body, ApiError};

pub(crate) fn pool<'a>(db: &'a State<DatabaseConfig>) -> Result<&'a SqlitePool, ApiError> {
    db.pool().map_err(|e| {
        error!("Database connection failed: {}", e);
        error_body(Status::InternalServerError, "Database error occurred")
    })
}
