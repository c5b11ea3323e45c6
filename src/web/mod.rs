// src/web/mod.rs
pub mod handlers;
pub mod types;

pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, post, put, routes, Request, Response, State};
use std::path::PathBuf;
use tracing::info;

use crate::auth::{AuthenticatedUser, AdminUser, OptionalAuth, TokenService};
use crate::core::admin::{ActivityEntry, AdminJob, AdminUserRow, PlatformStats};
use crate::core::applications::{
    AdminApplication, Application, EmployerApplication, JobApplicant, SeekerApplication,
};
use crate::core::identity::{AccountProfile, SignupFields};
use crate::core::listings::{EmployerJob, Job, JobDetails, JobFields, JobListing};
use crate::database::DatabaseConfig;

// CORS Fairing
pub struct Cors {
    allowed_origin: String,
}

impl Cors {
    pub fn new(allowed_origin: String) -> Self {
        Self { allowed_origin }
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new(
            "Access-Control-Allow-Origin",
            self.allowed_origin.clone(),
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// ===== Auth routes =====

#[post("/auth/signup", data = "<request>")]
pub async fn signup(
    request: Json<SignupFields>,
    tokens: &State<TokenService>,
    db: &State<DatabaseConfig>,
) -> CreatedResult<AuthSuccess> {
    handlers::auth_handlers::signup_handler(request, tokens, db).await
}

#[post("/auth/login", data = "<request>")]
pub async fn login(
    request: Json<LoginRequest>,
    tokens: &State<TokenService>,
    db: &State<DatabaseConfig>,
) -> ApiResult<AuthSuccess> {
    handlers::auth_handlers::login_handler(request, tokens, db).await
}

#[get("/auth/profile/<account_id>")]
pub async fn profile(account_id: i64, db: &State<DatabaseConfig>) -> ApiResult<AccountProfile> {
    handlers::auth_handlers::profile_handler(account_id, db).await
}

// ===== Job routes =====

#[get("/jobs")]
pub async fn list_jobs(db: &State<DatabaseConfig>) -> ApiResult<JobsResponse<JobListing>> {
    handlers::job_handlers::list_jobs_handler(db).await
}

#[get("/jobs/<job_id>")]
pub async fn get_job(job_id: i64, db: &State<DatabaseConfig>) -> ApiResult<JobResponse<JobDetails>> {
    handlers::job_handlers::get_job_handler(job_id, db).await
}

#[post("/jobs", data = "<request>")]
pub async fn create_job(
    request: Json<CreateJobRequest>,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> CreatedResult<JobResponse<Job>> {
    handlers::job_handlers::create_job_handler(request, auth, db).await
}

#[get("/jobs/employer/<employer_id>")]
pub async fn employer_jobs(
    employer_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<JobsResponse<EmployerJob>> {
    handlers::job_handlers::employer_jobs_handler(employer_id, db).await
}

#[put("/jobs/<job_id>", data = "<request>")]
pub async fn update_job(
    job_id: i64,
    request: Json<JobFields>,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<JobResponse<Job>> {
    handlers::job_handlers::update_job_handler(job_id, request, auth, db).await
}

#[delete("/jobs/<job_id>")]
pub async fn delete_job(
    job_id: i64,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<MessageResponse> {
    handlers::job_handlers::delete_job_handler(job_id, auth, db).await
}

// ===== Application routes =====

#[post("/applications", data = "<request>")]
pub async fn create_application(
    request: Json<ApplyRequest>,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> CreatedResult<ApplicationResponse<Application>> {
    handlers::application_handlers::create_application_handler(request, auth, db).await
}

#[get("/applications/job-seeker/<job_seeker_id>")]
pub async fn job_seeker_applications(
    job_seeker_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationsResponse<SeekerApplication>> {
    handlers::application_handlers::job_seeker_applications_handler(job_seeker_id, db).await
}

#[get("/applications/job/<job_id>")]
pub async fn job_applications(
    job_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationsResponse<JobApplicant>> {
    handlers::application_handlers::job_applications_handler(job_id, db).await
}

#[get("/applications/employer/<employer_id>")]
pub async fn employer_applications(
    employer_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationsResponse<EmployerApplication>> {
    handlers::application_handlers::employer_applications_handler(employer_id, db).await
}

#[get("/applications/all")]
pub async fn all_applications(
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationsResponse<AdminApplication>> {
    handlers::application_handlers::all_applications_handler(db).await
}

#[put("/applications/<application_id>", data = "<request>")]
pub async fn update_application(
    application_id: i64,
    request: Json<StatusUpdateRequest>,
    auth: AuthenticatedUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<ApplicationResponse<Application>> {
    handlers::application_handlers::update_application_handler(application_id, request, auth, db)
        .await
}

// ===== Admin routes =====

#[get("/admin/users")]
pub async fn admin_users(
    admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<UsersResponse<AdminUserRow>> {
    handlers::admin_handlers::admin_users_handler(admin, db).await
}

#[get("/admin/jobs")]
pub async fn admin_jobs(
    admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<JobsResponse<AdminJob>> {
    handlers::admin_handlers::admin_jobs_handler(admin, db).await
}

#[get("/admin/stats")]
pub async fn admin_stats(
    admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<StatsResponse<PlatformStats>> {
    handlers::admin_handlers::admin_stats_handler(admin, db).await
}

#[get("/admin/activity?<limit>")]
pub async fn admin_activity(
    limit: Option<i64>,
    admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<ActivitiesResponse<ActivityEntry>> {
    handlers::admin_handlers::admin_activity_handler(limit, admin, db).await
}

#[delete("/admin/users/<account_id>")]
pub async fn admin_delete_user(
    account_id: i64,
    admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<MessageResponse> {
    handlers::admin_handlers::admin_delete_user_handler(account_id, admin, db).await
}

#[delete("/admin/jobs/<job_id>")]
pub async fn admin_delete_job(
    job_id: i64,
    admin: AdminUser,
    db: &State<DatabaseConfig>,
) -> ApiResult<MessageResponse> {
    handlers::admin_handlers::admin_delete_job_handler(job_id, admin, db).await
}

#[post("/admin/create-admin", data = "<request>")]
pub async fn create_admin(
    request: Json<CreateAdminRequest>,
    auth: OptionalAuth,
    db: &State<DatabaseConfig>,
) -> CreatedResult<AdminCreated> {
    handlers::admin_handlers::create_admin_handler(request, auth, db).await
}

#[get("/admin/check-admin-exists")]
pub async fn check_admin_exists(db: &State<DatabaseConfig>) -> ApiResult<AdminExists> {
    handlers::admin_handlers::check_admin_exists_handler(db).await
}

// ===== Misc =====

// Public health check with optional identity logging
#[get("/health")]
pub async fn health(auth: OptionalAuth) -> Json<&'static str> {
    if let Some(user) = auth.user {
        info!(
            "Health check by account {} ({})",
            user.account_id(),
            user.role().as_str()
        );
    }
    Json("OK")
}

// Handle OPTIONS requests for CORS preflight
#[options("/<_..>")]
pub async fn preflight() -> Status {
    Status::Ok
}

// Error catchers

#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Invalid request".to_string(),
    })
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Authorization required".to_string(),
    })
}

#[rocket::catch(404)]
pub fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Resource not found".to_string(),
    })
}

// Body deserialization failures surface as 422; the API contract is 400
#[rocket::catch(422)]
pub fn unprocessable() -> ApiError {
    error_body(Status::BadRequest, "Invalid request body")
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Internal server error".to_string(),
    })
}

// Main server start function
pub async fn start_web_server(
    database_path: PathBuf,
    port: u16,
    jwt_secret: String,
    frontend_origin: String,
) -> Result<()> {
    let mut db_config = DatabaseConfig::new(database_path);
    db_config.init_pool().await?;
    db_config.migrate().await?;

    info!("Starting Inclusive Hiring Platform API server");
    info!("Database: {}", db_config.database_path.display());
    info!("Allowed origin: {}", frontend_origin);

    let figment = rocket::Config::figment()
        .merge(("port", port))
        .merge(("address", "0.0.0.0"));

    rocket::custom(figment)
        .attach(Cors::new(frontend_origin))
        .manage(TokenService::new(&jwt_secret))
        .manage(db_config)
        .register(
            "/api",
            catchers![
                bad_request,
                unauthorized,
                not_found,
                unprocessable,
                internal_error
            ],
        )
        .mount(
            "/api",
            routes![
                signup,
                login,
                profile,
                list_jobs,
                get_job,
                create_job,
                employer_jobs,
                update_job,
                delete_job,
                create_application,
                job_seeker_applications,
                job_applications,
                employer_applications,
                all_applications,
                update_application,
                admin_users,
                admin_jobs,
                admin_stats,
                admin_activity,
                admin_delete_user,
                admin_delete_job,
                create_admin,
                check_admin_exists,
                health,
                preflight,
            ],
        )
        .launch()
        .await?;

    Ok(())
}
