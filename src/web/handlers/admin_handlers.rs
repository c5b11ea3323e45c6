// src/web/handlers/admin_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::{info, warn};

use super::pool;
use crate::auth::{AdminUser, OptionalAuth};
use crate::core::admin::{ActivityEntry, AdminJob, AdminService, AdminUserRow, PlatformStats};
use crate::core::identity::IdentityService;
use crate::core::listings::ListingService;
use crate::database::DatabaseConfig;
use crate::web::types::{
    created, not_authorized, service_error, AdminCreated, AdminExists, ApiResult,
    ActivitiesResponse, CreateAdminRequest, CreatedResult, JobsResponse, MessageResponse,
    StatsResponse, UsersResponse,
};

const DEFAULT_ACTIVITY_LIMIT: i64 = 10;

pub async fn admin_users_handler(
    _admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<UsersResponse<AdminUserRow>> {
    let pool = pool(db)?;

    let users = AdminService::new(pool)
        .list_users()
        .await
        .map_err(service_error)?;

    Ok(Json(UsersResponse { users }))
}

pub async fn admin_jobs_handler(
    _admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<JobsResponse<AdminJob>> {
    let pool = pool(db)?;

    let jobs = AdminService::new(pool)
        .list_jobs()
        .await
        .map_err(service_error)?;

    Ok(Json(JobsResponse { jobs }))
}

pub async fn admin_stats_handler(
    _admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<StatsResponse<PlatformStats>> {
    let pool = pool(db)?;

    let stats = AdminService::new(pool)
        .stats()
        .await
        .map_err(service_error)?;

    Ok(Json(StatsResponse { stats }))
}

pub async fn admin_activity_handler(
    limit: Option<i64>,
    _admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<ActivitiesResponse<ActivityEntry>> {
    let pool = pool(db)?;

    let activities = AdminService::new(pool)
        .recent_activity(limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT))
        .await
        .map_err(service_error)?;

    Ok(Json(ActivitiesResponse { activities }))
}

pub async fn admin_delete_user_handler(
    account_id: i64,
    admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<MessageResponse> {
    let pool = pool(db)?;

    AdminService::new(pool)
        .delete_account(account_id)
        .await
        .map_err(service_error)?;

    info!("Admin {} deleted account {}", admin.claims.sub, account_id);
    Ok(Json(MessageResponse {
        message: "User deleted successfully!".to_string(),
    }))
}

pub async fn admin_delete_job_handler(
    job_id: i64,
    admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<MessageResponse> {
    let pool = pool(db)?;

    ListingService::new(pool)
        .delete(job_id)
        .await
        .map_err(service_error)?;

    info!("Admin {} deleted job {}", admin.claims.sub, job_id);
    Ok(Json(MessageResponse {
        message: "Job deleted successfully!".to_string(),
    }))
}

/// Normally admin-only. The exception is the first-run bootstrap: while no
/// admin account exists, the endpoint is open so the platform can be seeded.
pub async fn create_admin_handler(
    request: Json<CreateAdminRequest>,
    auth: OptionalAuth,
    db: &State<DatabaseConfig>,
) -> CreatedResult<AdminCreated> {
    let pool = pool(db)?;
    let identity = IdentityService::new(pool);

    let admin_exists = identity.check_admin_exists().await.map_err(service_error)?;
    let caller_is_admin = auth.user.as_ref().map(|u| u.is_admin()).unwrap_or(false);

    if admin_exists && !caller_is_admin {
        warn!("Rejected create-admin request without admin credentials");
        return Err(not_authorized());
    }

    let admin_id = identity
        .create_admin(&request.email, &request.password, &request.full_name)
        .await
        .map_err(service_error)?;

    info!("Admin account {} created", admin_id);
    created(AdminCreated { admin_id })
}

pub async fn check_admin_exists_handler(db: &State<DatabaseConfig>) -> ApiResult<AdminExists> {
    let pool = pool(db)?;

    let admin_exists = IdentityService::new(pool)
        .check_admin_exists()
        .await
        .map_err(service_error)?;

    Ok(Json(AdminExists { admin_exists }))
}
