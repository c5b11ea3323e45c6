// src/auth.rs
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{Role, ServiceError};

/// Bearer tokens are valid for a fixed seven days from issuance; there is no
/// refresh mechanism.
const TOKEN_VALIDITY_DAYS: i64 = 7;

/// Claims embedded in the bearer token: the account id and its role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies the opaque bearer tokens. Managed as Rocket state;
/// callers only see the issue/verify contract.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, account_id: i64, role: Role) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_id,
            role,
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_VALIDITY_DAYS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("token signing failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AuthError::TokenVerificationFailed)
    }
}

/// One-way salted password hash (Argon2id, PHC string format)
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a password against a stored hash. Any parse or verify failure is a
/// plain mismatch; nothing about the stored hash is revealed.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenVerificationFailed,
    NotAuthorized,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Authorization token required",
            AuthError::InvalidToken => "Invalid authorization token format",
            AuthError::TokenVerificationFailed => "Token verification failed",
            AuthError::NotAuthorized => "Not authorized for this operation",
        }
    }
}

/// Request guard: any authenticated account
pub struct AuthenticatedUser {
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn account_id(&self) -> i64 {
        self.claims.sub
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn is_admin(&self) -> bool {
        self.claims.role == Role::Admin
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let tokens = match req.guard::<&State<TokenService>>().await {
            Outcome::Success(tokens) => tokens,
            Outcome::Error((status, _)) => {
                return Outcome::Error((status, AuthError::TokenVerificationFailed))
            }
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let token = match req.headers().get_one("Authorization") {
            Some(header) if header.starts_with("Bearer ") => &header[7..],
            Some(_) => {
                warn!("Invalid Authorization header format");
                return Outcome::Error((Status::Unauthorized, AuthError::InvalidToken));
            }
            None => {
                return Outcome::Error((Status::Unauthorized, AuthError::MissingToken));
            }
        };

        match tokens.verify(token) {
            Ok(claims) => Outcome::Success(AuthenticatedUser { claims }),
            Err(e) => {
                warn!("Token verification failed");
                Outcome::Error((Status::Unauthorized, e))
            }
        }
    }
}

/// Request guard: authenticated Admin account
pub struct AdminUser {
    pub claims: Claims,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(req).await {
            Outcome::Success(user) if user.is_admin() => Outcome::Success(AdminUser {
                claims: user.claims,
            }),
            Outcome::Success(_) => {
                Outcome::Error((Status::Unauthorized, AuthError::NotAuthorized))
            }
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}

/// Guard that succeeds with or without credentials; used where the first-run
/// bootstrap path must remain reachable.
pub struct OptionalAuth {
    pub user: Option<AuthenticatedUser>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OptionalAuth {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(req).await {
            Outcome::Success(user) => Outcome::Success(OptionalAuth { user: Some(user) }),
            _ => Outcome::Success(OptionalAuth { user: None }),
        }
    }
}
