// src/web/handlers/auth_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use super::pool;
use crate::auth::TokenService;
use crate::core::identity::{AccountProfile, IdentityService, SignupFields};
use crate::database::DatabaseConfig;
use crate::web::types::{
    created, service_error, ApiResult, AuthSuccess, CreatedResult, LoginRequest,
};

pub async fn signup_handler(
    request: Json<SignupFields>,
    tokens: &State<TokenService>,
    db: &State<DatabaseConfig>,
) -> CreatedResult<AuthSuccess> {
    let pool = pool(db)?;

    info!(
        "Signup request for {} as {}",
        request.email,
        request.role.as_str()
    );

    let identity = IdentityService::new(pool);
    let account_id = identity.signup(&request).await.map_err(service_error)?;
    let token = tokens.issue(account_id, request.role).map_err(service_error)?;

    created(AuthSuccess {
        token,
        account_id,
        role: request.role,
    })
}

pub async fn login_handler(
    request: Json<LoginRequest>,
    tokens: &State<TokenService>,
    db: &State<DatabaseConfig>,
) -> ApiResult<AuthSuccess> {
    let pool = pool(db)?;

    let identity = IdentityService::new(pool);
    let account_id = identity
        .login(&request.email, &request.password, request.role)
        .await
        .map_err(service_error)?;
    let token = tokens.issue(account_id, request.role).map_err(service_error)?;

    Ok(Json(AuthSuccess {
        token,
        account_id,
        role: request.role,
    }))
}

pub async fn profile_handler(
    account_id: i64,
    db: &State<DatabaseConfig>,
) -> ApiResult<AccountProfile> {
    let pool = pool(db)?;

    let profile = IdentityService::new(pool)
        .get_profile(account_id)
        .await
        .map_err(service_error)?;

    Ok(Json(profile))
}
