// src/web/handlers/job_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::pool;
use crate::auth::AuthenticatedUser;
use crate::core::identity::{IdentityService, Role};
use crate::core::listings::{EmployerJob, Job, JobDetails, JobFields, JobListing, ListingService};
use crate::core::ServiceError;
use crate::database::DatabaseConfig;
use crate::web::types::{
    created, not_authorized, service_error, ApiError, ApiResult, CreateJobRequest, CreatedResult,
    JobResponse, JobsResponse, MessageResponse,
};

pub async fn list_jobs_handler(db: &State<DatabaseConfig>) -> ApiResult<JobsResponse<JobListing>> {
    let pool = pool(db)?;

    let jobs = ListingService::new(pool)
        .list_active()
        .await
        .map_err(service_error)?;

    Ok(Json(JobsResponse { jobs }))
}

pub async fn get_job_handler(
    job_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<JobResponse<JobDetails>> {
    let pool = pool(db)?;

    let job = ListingService::new(pool)
        .get(job_id)
        .await
        .map_err(service_error)?;

    Ok(Json(JobResponse { job }))
}

pub async fn create_job_handler(
    request: Json<CreateJobRequest>,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> CreatedResult<JobResponse<Job>> {
    let pool = pool(db)?;

    // Employers may only post under their own profile; admins under any
    if !auth.is_admin() {
        if auth.role() != Role::Employer {
            return Err(not_authorized());
        }
        let owned = IdentityService::new(pool)
            .employer_profile_id(auth.account_id())
            .await
            .map_err(service_error)?;
        if owned != Some(request.employer_id) {
            warn!(
                "Account {} attempted to post as employer {}",
                auth.account_id(),
                request.employer_id
            );
            return Err(not_authorized());
        }
    }

    let job = ListingService::new(pool)
        .create(request.employer_id, &request.fields)
        .await
        .map_err(service_error)?;

    info!("Job {} posted for employer {}", job.id, request.employer_id);
    created(JobResponse { job })
}

pub async fn employer_jobs_handler(
    employer_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<JobsResponse<EmployerJob>> {
    let pool = pool(db)?;

    let jobs = ListingService::new(pool)
        .list_by_employer(employer_id)
        .await
        .map_err(service_error)?;

    Ok(Json(JobsResponse { jobs }))
}

pub async fn update_job_handler(
    job_id: i64,
    request: Json<JobFields>,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<JobResponse<Job>> {
    let pool = pool(db)?;
    authorize_job_mutation(pool, job_id, &auth).await?;

    let job = ListingService::new(pool)
        .update(job_id, &request)
        .await
        .map_err(service_error)?;

    Ok(Json(JobResponse { job }))
}

pub async fn delete_job_handler(
    job_id: i64,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<MessageResponse> {
    let pool = pool(db)?;
    authorize_job_mutation(pool, job_id, &auth).await?;

    ListingService::new(pool)
        .delete(job_id)
        .await
        .map_err(service_error)?;

    Ok(Json(MessageResponse {
        message: "Job deleted successfully!".to_string(),
    }))
}

/// Only the owning employer or an admin may mutate a listing
async fn authorize_job_mutation(
    pool: &SqlitePool,
    job_id: i64,
    auth: &AuthenticatedUser,
) -> Result<(), ApiError> {
    if auth.is_admin() {
        return Ok(());
    }

    match ListingService::new(pool)
        .owner_account(job_id)
        .await
        .map_err(service_error)?
    {
        Some(owner) if owner == auth.account_id() => Ok(()),
        Some(_) => {
            warn!(
                "Account {} attempted to mutate job {} it does not own",
                auth.account_id(),
                job_id
            );
            Err(not_authorized())
        }
        None => Err(service_error(ServiceError::NotFound("Job"))),
    }
}
