// src/core/mod.rs
pub mod admin;
pub mod applications;
pub mod identity;
pub mod listings;

pub use admin::AdminService;
pub use applications::{ApplicationService, ApplicationStatus};
pub use identity::{IdentityService, Role};
pub use listings::ListingService;

use std::fmt;

/// Failure taxonomy for the store services. Every database failure is either
/// classified here or carried as `Store` and mapped to a 500 at the request
/// boundary. No operation is retried.
#[derive(Debug)]
pub enum ServiceError {
    Validation(String),
    DuplicateEmail,
    DuplicateApplication,
    InvalidCredentials,
    NotFound(&'static str),
    ProfileMissing(&'static str),
    Store(sqlx::Error),
    Internal(String),
}

impl ServiceError {
    pub fn missing(field: &str) -> Self {
        ServiceError::Validation(format!("Missing required field: {}", field))
    }

    pub fn message(&self) -> String {
        match self {
            ServiceError::Validation(msg) => msg.clone(),
            ServiceError::DuplicateEmail => "Email already exists".to_string(),
            ServiceError::DuplicateApplication => {
                "You have already applied to this job".to_string()
            }
            ServiceError::InvalidCredentials => "Invalid email or password".to_string(),
            ServiceError::NotFound(what) => format!("{} not found", what),
            ServiceError::ProfileMissing(what) => {
                format!("{} profile not found. Please contact support.", what)
            }
            ServiceError::Store(_) => "Database error occurred".to_string(),
            ServiceError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Store(e) => write!(f, "store failure: {}", e),
            ServiceError::Internal(msg) => write!(f, "internal error: {}", msg),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Store(err)
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Reject empty or missing required string fields
pub(crate) fn require<'a>(
    value: Option<&'a str>,
    field: &str,
) -> Result<&'a str, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::missing(field)),
    }
}
