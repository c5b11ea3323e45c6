// src/core/identity.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use super::{is_unique_violation, require, ServiceError};
use crate::auth::{hash_password, verify_password};

/// Account role. Stored in `users.user_type` with the platform's original
/// spellings, which also appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    #[serde(rename = "Job Seeker")]
    #[sqlx(rename = "Job Seeker")]
    JobSeeker,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::JobSeeker => "Job Seeker",
            Role::Employer => "Employer",
            Role::Admin => "Admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub email: String,
    #[sqlx(rename = "user_type")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerProfile {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub phone: String,
    pub skills: Option<String>,
    pub disability_info: Option<String>,
    pub resume_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployerProfile {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub company_name: String,
    pub company_size: Option<String>,
    pub industry: Option<String>,
}

/// Role-specific profile attached 1:1 to a non-admin account
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Profile {
    JobSeeker(JobSeekerProfile),
    Employer(EmployerProfile),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub profile: Option<Profile>,
}

/// Signup payload: common account fields plus the union of the role-specific
/// profile fields. Which ones are required depends on the chosen role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupFields {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub skills: Option<String>,
    pub disability_info: Option<String>,
    pub company_name: Option<String>,
    pub company_size: Option<String>,
    pub industry: Option<String>,
}

pub struct IdentityService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> IdentityService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an account and its role-specific profile in one transaction.
    /// A failed profile insert rolls the account insert back; no orphan
    /// account is ever visible. Returns the new account id.
    pub async fn signup(&self, fields: &SignupFields) -> Result<i64, ServiceError> {
        require(Some(fields.email.as_str()), "email")?;
        require(Some(fields.password.as_str()), "password")?;
        let full_name = require(fields.full_name.as_deref(), "fullName")?;

        match fields.role {
            Role::JobSeeker => {
                require(fields.phone.as_deref(), "phone")?;
            }
            Role::Employer => {
                require(fields.company_name.as_deref(), "companyName")?;
            }
            Role::Admin => {
                return Err(ServiceError::Validation(
                    "Admin accounts are created through the admin bootstrap".to_string(),
                ));
            }
        }

        let password_hash = hash_password(&fields.password)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, user_type, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&fields.email)
        .bind(&password_hash)
        .bind(fields.role)
        .bind(now)
        .execute(&mut *tx)
        .await;

        let account_id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => return Err(ServiceError::DuplicateEmail),
            Err(e) => return Err(e.into()),
        };

        if fields.role == Role::JobSeeker {
            sqlx::query(
                r#"
                INSERT INTO job_seekers (user_id, full_name, phone, skills, disability_info)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(account_id)
            .bind(full_name)
            .bind(fields.phone.as_deref().unwrap_or_default())
            .bind(fields.skills.as_deref())
            .bind(fields.disability_info.as_deref())
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO employers (user_id, full_name, company_name, company_size, industry)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(account_id)
            .bind(full_name)
            .bind(fields.company_name.as_deref().unwrap_or_default())
            .bind(fields.company_size.as_deref())
            .bind(fields.industry.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "Created {} account {} for {}",
            fields.role.as_str(),
            account_id,
            fields.email
        );
        Ok(account_id)
    }

    /// Authenticate by (email, role). Never reveals whether the email or the
    /// password was wrong.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<i64, ServiceError> {
        let row: Option<(i64, String)> = sqlx::query_as(
            r#"
            SELECT id, password_hash
            FROM users
            WHERE email = ? AND user_type = ?
            "#,
        )
        .bind(email)
        .bind(role)
        .fetch_optional(self.pool)
        .await?;

        let (account_id, password_hash) = row.ok_or(ServiceError::InvalidCredentials)?;

        if !verify_password(password, &password_hash) {
            return Err(ServiceError::InvalidCredentials);
        }

        info!("User {} logged in as {}", email, role.as_str());
        Ok(account_id)
    }

    pub async fn get_account(&self, account_id: i64) -> Result<Account, ServiceError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, user_type, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(account_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(ServiceError::NotFound("User"))
    }

    /// Single dispatch point for the role-specific profile lookup
    pub async fn profile_for(&self, account: &Account) -> Result<Option<Profile>, ServiceError> {
        match account.role {
            Role::JobSeeker => {
                let profile = sqlx::query_as::<_, JobSeekerProfile>(
                    r#"
                    SELECT id, user_id, full_name, phone, skills, disability_info, resume_path
                    FROM job_seekers
                    WHERE user_id = ?
                    "#,
                )
                .bind(account.id)
                .fetch_optional(self.pool)
                .await?;
                Ok(profile.map(Profile::JobSeeker))
            }
            Role::Employer => {
                let profile = sqlx::query_as::<_, EmployerProfile>(
                    r#"
                    SELECT id, user_id, full_name, company_name, company_size, industry
                    FROM employers
                    WHERE user_id = ?
                    "#,
                )
                .bind(account.id)
                .fetch_optional(self.pool)
                .await?;
                Ok(profile.map(Profile::Employer))
            }
            Role::Admin => Ok(None),
        }
    }

    /// Account plus nested profile. A non-admin account without its profile
    /// row is a data-integrity anomaly and is surfaced, not silently null.
    pub async fn get_profile(&self, account_id: i64) -> Result<AccountProfile, ServiceError> {
        let account = self.get_account(account_id).await?;
        let profile = self.profile_for(&account).await?;

        if profile.is_none() && account.role != Role::Admin {
            return Err(ServiceError::ProfileMissing(match account.role {
                Role::JobSeeker => "Job Seeker",
                _ => "Employer",
            }));
        }

        Ok(AccountProfile {
            email: account.email,
            role: account.role,
            created_at: account.created_at,
            profile,
        })
    }

    /// Used only to gate the first-run admin bootstrap
    pub async fn check_admin_exists(&self) -> Result<bool, ServiceError> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE user_type = 'Admin'"#)
                .fetch_one(self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Create an Admin account. Admins carry no profile row; the full name is
    /// required input but the schema keeps no name column for admins.
    pub async fn create_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<i64, ServiceError> {
        require(Some(email), "email")?;
        require(Some(password), "password")?;
        require(Some(full_name), "fullName")?;

        let password_hash = hash_password(password)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, user_type, created_at)
            VALUES (?, ?, 'Admin', ?)
            "#,
        )
        .bind(email)
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(self.pool)
        .await;

        match inserted {
            Ok(result) => {
                let admin_id = result.last_insert_rowid();
                info!("Created admin account {} for {}", admin_id, email);
                Ok(admin_id)
            }
            Err(e) if is_unique_violation(&e) => Err(ServiceError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    /// Employer profile id owned by an account, if any. Used by the ownership
    /// checks on mutating listing endpoints.
    pub async fn employer_profile_id(&self, account_id: i64) -> Result<Option<i64>, ServiceError> {
        let id = sqlx::query_scalar(r#"SELECT id FROM employers WHERE user_id = ?"#)
            .bind(account_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(id)
    }

    /// Job seeker profile id owned by an account, if any
    pub async fn job_seeker_profile_id(
        &self,
        account_id: i64,
    ) -> Result<Option<i64>, ServiceError> {
        let id = sqlx::query_scalar(r#"SELECT id FROM job_seekers WHERE user_id = ?"#)
            .bind(account_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::test_pool;

    pub(crate) fn seeker_fields(email: &str) -> SignupFields {
        SignupFields {
            email: email.to_string(),
            password: "hunter2hunter2".to_string(),
            role: Role::JobSeeker,
            full_name: Some("Ana Alves".to_string()),
            phone: Some("+41 79 000 00 00".to_string()),
            skills: Some("Rust, SQL".to_string()),
            disability_info: Some("Screen reader user".to_string()),
            company_name: None,
            company_size: None,
            industry: None,
        }
    }

    pub(crate) fn employer_fields(email: &str) -> SignupFields {
        SignupFields {
            email: email.to_string(),
            password: "hunter2hunter2".to_string(),
            role: Role::Employer,
            full_name: Some("Erik Berg".to_string()),
            phone: None,
            skills: None,
            disability_info: None,
            company_name: Some("Acme".to_string()),
            company_size: Some("11-50".to_string()),
            industry: Some("Software".to_string()),
        }
    }

    #[tokio::test]
    async fn signup_then_login_succeeds() {
        let pool = test_pool().await;
        let identity = IdentityService::new(&pool);

        let account_id = identity.signup(&seeker_fields("ana@example.com")).await.unwrap();
        let logged_in = identity
            .login("ana@example.com", "hunter2hunter2", Role::JobSeeker)
            .await
            .unwrap();

        assert_eq!(account_id, logged_in);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_across_roles() {
        let pool = test_pool().await;
        let identity = IdentityService::new(&pool);

        identity.signup(&seeker_fields("dup@example.com")).await.unwrap();
        let err = identity
            .signup(&employer_fields("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind("dup@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_wrong_role() {
        let pool = test_pool().await;
        let identity = IdentityService::new(&pool);
        identity.signup(&seeker_fields("ana@example.com")).await.unwrap();

        let err = identity
            .login("ana@example.com", "wrong-password", Role::JobSeeker)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));

        // Correct password, wrong role: indistinguishable from a bad password
        let err = identity
            .login("ana@example.com", "hunter2hunter2", Role::Employer)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn signup_requires_role_specific_fields() {
        let pool = test_pool().await;
        let identity = IdentityService::new(&pool);

        let mut fields = seeker_fields("a@example.com");
        fields.phone = None;
        assert!(matches!(
            identity.signup(&fields).await.unwrap_err(),
            ServiceError::Validation(_)
        ));

        let mut fields = employer_fields("b@example.com");
        fields.company_name = Some("   ".to_string());
        assert!(matches!(
            identity.signup(&fields).await.unwrap_err(),
            ServiceError::Validation(_)
        ));

        let mut fields = seeker_fields("c@example.com");
        fields.role = Role::Admin;
        assert!(matches!(
            identity.signup(&fields).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn get_profile_returns_nested_profile() {
        let pool = test_pool().await;
        let identity = IdentityService::new(&pool);

        let account_id = identity
            .signup(&employer_fields("erik@example.com"))
            .await
            .unwrap();
        let profile = identity.get_profile(account_id).await.unwrap();

        assert_eq!(profile.role, Role::Employer);
        match profile.profile {
            Some(Profile::Employer(p)) => assert_eq!(p.company_name, "Acme"),
            other => panic!("expected employer profile, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn get_profile_surfaces_missing_profile_row() {
        let pool = test_pool().await;
        let identity = IdentityService::new(&pool);

        let account_id = identity.signup(&seeker_fields("ana@example.com")).await.unwrap();

        // Simulate the data-integrity anomaly
        sqlx::query("DELETE FROM job_seekers WHERE user_id = ?")
            .bind(account_id)
            .execute(&pool)
            .await
            .unwrap();

        let err = identity.get_profile(account_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::ProfileMissing(_)));

        let err = identity.get_profile(9999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn admin_bootstrap_round_trip() {
        let pool = test_pool().await;
        let identity = IdentityService::new(&pool);

        assert!(!identity.check_admin_exists().await.unwrap());

        let admin_id = identity
            .create_admin("admin@platform.com", "s3cret-pass", "Platform Admin")
            .await
            .unwrap();
        assert!(identity.check_admin_exists().await.unwrap());

        // Admin accounts have no profile; get_profile must not error
        let profile = identity.get_profile(admin_id).await.unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert!(profile.profile.is_none());

        let err = identity
            .create_admin("admin@platform.com", "another", "Second Admin")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail));
    }
}
