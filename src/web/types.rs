// src/web/types.rs
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::core::identity::Role;
use crate::core::listings::JobFields;
use crate::core::ServiceError;

// ===== Request bodies =====

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub employer_id: i64,
    #[serde(flatten)]
    pub fields: JobFields,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub job_seeker_id: i64,
    pub job_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

// ===== Response bodies =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSuccess {
    pub token: String,
    pub account_id: i64,
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreated {
    pub admin_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminExists {
    pub admin_exists: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct JobsResponse<T> {
    pub jobs: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse<T> {
    pub job: T,
}

#[derive(Debug, Serialize)]
pub struct ApplicationsResponse<T> {
    pub applications: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse<T> {
    pub application: T,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse<T> {
    pub users: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse<T> {
    pub stats: T,
}

#[derive(Debug, Serialize)]
pub struct ActivitiesResponse<T> {
    pub activities: Vec<T>,
}

/// Error responses always carry a human-readable `error` field
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = Custom<Json<ErrorBody>>;
pub type ApiResult<T> = Result<Json<T>, ApiError>;
pub type CreatedResult<T> = Result<Custom<Json<T>>, ApiError>;

pub fn error_body(status: Status, message: impl Into<String>) -> ApiError {
    Custom(
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Map a service failure onto the HTTP taxonomy. Unclassified store failures
/// become opaque 500s; the detail only goes to the log.
pub fn service_error(err: ServiceError) -> ApiError {
    let status = match &err {
        ServiceError::Validation(_)
        | ServiceError::DuplicateEmail
        | ServiceError::DuplicateApplication => Status::BadRequest,
        ServiceError::InvalidCredentials => Status::Unauthorized,
        ServiceError::NotFound(_) | ServiceError::ProfileMissing(_) => Status::NotFound,
        ServiceError::Store(_) | ServiceError::Internal(_) => Status::InternalServerError,
    };

    if status == Status::InternalServerError {
        error!("{}", err);
    }

    error_body(status, err.message())
}

pub fn not_authorized() -> ApiError {
    error_body(Status::Unauthorized, "Not authorized for this operation")
}

pub fn created<T>(body: T) -> CreatedResult<T> {
    Ok(Custom(Status::Created, Json(body)))
}
