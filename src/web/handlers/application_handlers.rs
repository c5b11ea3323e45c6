// src/web/handlers/application_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::{info, warn};

use super::pool;
use crate::auth::AuthenticatedUser;
use crate::core::applications::{
    AdminApplication, Application, ApplicationService, EmployerApplication, JobApplicant,
    SeekerApplication,
};
use crate::core::identity::{IdentityService, Role};
use crate::core::ServiceError;
use crate::database::DatabaseConfig;
use crate::web::types::{
    created, not_authorized, service_error, ApiResult, ApplicationResponse, ApplicationsResponse,
    ApplyRequest, CreatedResult, StatusUpdateRequest,
};

pub async fn create_application_handler(
    request: Json<ApplyRequest>,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> CreatedResult<ApplicationResponse<Application>> {
    let pool = pool(db)?;

    // Job seekers apply as themselves; admins may apply on anyone's behalf
    if !auth.is_admin() {
        if auth.role() != Role::JobSeeker {
            return Err(not_authorized());
        }
        let owned = IdentityService::new(pool)
            .job_seeker_profile_id(auth.account_id())
            .await
            .map_err(service_error)?;
        if owned != Some(request.job_seeker_id) {
            warn!(
                "Account {} attempted to apply as job seeker {}",
                auth.account_id(),
                request.job_seeker_id
            );
            return Err(not_authorized());
        }
    }

    let application = ApplicationService::new(pool)
        .apply(request.job_seeker_id, request.job_id)
        .await
        .map_err(service_error)?;

    info!(
        "Application {} submitted for job {}",
        application.id, request.job_id
    );
    created(ApplicationResponse { application })
}

pub async fn job_seeker_applications_handler(
    job_seeker_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationsResponse<SeekerApplication>> {
    let pool = pool(db)?;

    let applications = ApplicationService::new(pool)
        .list_for_job_seeker(job_seeker_id)
        .await
        .map_err(service_error)?;

    Ok(Json(ApplicationsResponse { applications }))
}

pub async fn job_applications_handler(
    job_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationsResponse<JobApplicant>> {
    let pool = pool(db)?;

    let applications = ApplicationService::new(pool)
        .list_for_job(job_id)
        .await
        .map_err(service_error)?;

    Ok(Json(ApplicationsResponse { applications }))
}

pub async fn employer_applications_handler(
    employer_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationsResponse<EmployerApplication>> {
    let pool = pool(db)?;

    let applications = ApplicationService::new(pool)
        .list_for_employer(employer_id)
        .await
        .map_err(service_error)?;

    Ok(Json(ApplicationsResponse { applications }))
}

pub async fn all_applications_handler(
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationsResponse<AdminApplication>> {
    let pool = pool(db)?;

    let applications = ApplicationService::new(pool)
        .list_all()
        .await
        .map_err(service_error)?;

    Ok(Json(ApplicationsResponse { applications }))
}

pub async fn update_application_handler(
    application_id: i64,
    request: Json<StatusUpdateRequest>,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationResponse<Application>> {
    let pool = pool(db)?;

    // Status moves are for the employer who owns the listing, or an admin
    if !auth.is_admin() {
        if auth.role() != Role::Employer {
            return Err(not_authorized());
        }
        match ApplicationService::new(pool)
            .listing_owner_account(application_id)
            .await
            .map_err(service_error)?
        {
            Some(owner) if owner == auth.account_id() => {}
            Some(_) => {
                warn!(
                    "Account {} attempted to decide application {} it does not own",
                    auth.account_id(),
                    application_id
                );
                return Err(not_authorized());
            }
            None => return Err(service_error(ServiceError::NotFound("Application"))),
        }
    }

    let application = ApplicationService::new(pool)
        .set_status(application_id, &request.status)
        .await
        .map_err(service_error)?;

    Ok(Json(ApplicationResponse { application }))
}
