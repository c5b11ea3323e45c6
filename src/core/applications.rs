// src/core/applications.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use super::{is_foreign_key_violation, is_unique_violation, ServiceError};

/// Application status. Any status is reachable from any other; employers may
/// re-open a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(ApplicationStatus::Pending),
            "Accepted" => Some(ApplicationStatus::Accepted),
            "Rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub job_seeker_id: i64,
    pub job_id: i64,
    pub status: String,
    pub applied_at: DateTime<Utc>,
}

/// Job seeker's view: their application plus the listing and company
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SeekerApplication {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub location: String,
    pub employment_type: String,
    pub salary: Option<String>,
    pub company_name: String,
}

/// Employer's per-listing view: applicant contact, skills, accessibility info
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicant {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    pub full_name: String,
    pub phone: String,
    pub skills: Option<String>,
    pub disability_info: Option<String>,
    pub email: String,
}

/// Employer's cross-listing view; adds the listing title
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployerApplication {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub full_name: String,
    pub phone: String,
    pub skills: Option<String>,
    pub disability_info: Option<String>,
    pub email: String,
}

/// Admin view across the whole platform
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminApplication {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub job_seeker_name: String,
    pub company_name: String,
}

const APPLICATION_COLUMNS: &str = r#"
    applications.id AS id,
    applications.job_seeker_id AS job_seeker_id,
    applications.job_id AS job_id,
    applications.status AS status,
    applications.applied_at AS applied_at
"#;

pub struct ApplicationService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ApplicationService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Submit an application. Duplicate detection rides on the
    /// (job_seeker_id, job_id) uniqueness constraint, so two concurrent
    /// identical submissions still converge to a single row.
    pub async fn apply(
        &self,
        job_seeker_id: i64,
        job_id: i64,
    ) -> Result<Application, ServiceError> {
        let now = Utc::now();

        let inserted = sqlx::query(
            r#"
            INSERT INTO applications (job_seeker_id, job_id, status, applied_at)
            VALUES (?, ?, 'Pending', ?)
            "#,
        )
        .bind(job_seeker_id)
        .bind(job_id)
        .bind(now)
        .execute(self.pool)
        .await;

        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => return Err(ServiceError::DuplicateApplication),
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(ServiceError::Validation(
                    "Job seeker or job not found".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Job seeker {} applied to job {} (application {})",
            job_seeker_id, job_id, id
        );

        Ok(Application {
            id,
            job_seeker_id,
            job_id,
            status: ApplicationStatus::Pending.as_str().to_string(),
            applied_at: now,
        })
    }

    /// Move an application to any of the three statuses, in any direction
    pub async fn set_status(
        &self,
        application_id: i64,
        status: &str,
    ) -> Result<Application, ServiceError> {
        let status = ApplicationStatus::parse(status)
            .ok_or_else(|| ServiceError::Validation("Invalid status".to_string()))?;

        let result = sqlx::query("UPDATE applications SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(application_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Application"));
        }

        info!("Application {} set to {}", application_id, status.as_str());

        sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE applications.id = ?",
            APPLICATION_COLUMNS
        ))
        .bind(application_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(ServiceError::NotFound("Application"))
    }

    /// Applications of one job seeker with listing and company, newest first
    pub async fn list_for_job_seeker(
        &self,
        job_seeker_id: i64,
    ) -> Result<Vec<SeekerApplication>, ServiceError> {
        let applications = sqlx::query_as::<_, SeekerApplication>(&format!(
            r#"
            SELECT {},
                   jobs.title AS job_title,
                   jobs.location AS location,
                   jobs.employment_type AS employment_type,
                   jobs.salary AS salary,
                   employers.company_name AS company_name
            FROM applications
            JOIN jobs ON applications.job_id = jobs.id
            JOIN employers ON jobs.employer_id = employers.id
            WHERE applications.job_seeker_id = ?
            ORDER BY applications.applied_at DESC
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(job_seeker_id)
        .fetch_all(self.pool)
        .await?;
        Ok(applications)
    }

    /// Applicants for one listing, newest first
    pub async fn list_for_job(&self, job_id: i64) -> Result<Vec<JobApplicant>, ServiceError> {
        let applications = sqlx::query_as::<_, JobApplicant>(&format!(
            r#"
            SELECT {},
                   job_seekers.full_name AS full_name,
                   job_seekers.phone AS phone,
                   job_seekers.skills AS skills,
                   job_seekers.disability_info AS disability_info,
                   users.email AS email
            FROM applications
            JOIN job_seekers ON applications.job_seeker_id = job_seekers.id
            JOIN users ON job_seekers.user_id = users.id
            WHERE applications.job_id = ?
            ORDER BY applications.applied_at DESC
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .fetch_all(self.pool)
        .await?;
        Ok(applications)
    }

    /// Applications across all of an employer's listings, newest first
    pub async fn list_for_employer(
        &self,
        employer_id: i64,
    ) -> Result<Vec<EmployerApplication>, ServiceError> {
        let applications = sqlx::query_as::<_, EmployerApplication>(&format!(
            r#"
            SELECT {},
                   jobs.title AS job_title,
                   job_seekers.full_name AS full_name,
                   job_seekers.phone AS phone,
                   job_seekers.skills AS skills,
                   job_seekers.disability_info AS disability_info,
                   users.email AS email
            FROM applications
            JOIN jobs ON applications.job_id = jobs.id
            JOIN job_seekers ON applications.job_seeker_id = job_seekers.id
            JOIN users ON job_seekers.user_id = users.id
            WHERE jobs.employer_id = ?
            ORDER BY applications.applied_at DESC
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(employer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(applications)
    }

    /// Platform-wide application feed for the admin view, newest first
    pub async fn list_all(&self) -> Result<Vec<AdminApplication>, ServiceError> {
        let applications = sqlx::query_as::<_, AdminApplication>(&format!(
            r#"
            SELECT {},
                   jobs.title AS job_title,
                   job_seekers.full_name AS job_seeker_name,
                   employers.company_name AS company_name
            FROM applications
            JOIN jobs ON applications.job_id = jobs.id
            JOIN job_seekers ON applications.job_seeker_id = job_seekers.id
            JOIN employers ON jobs.employer_id = employers.id
            ORDER BY applications.applied_at DESC
            "#,
            APPLICATION_COLUMNS
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(applications)
    }

    /// Account owning the listing an application targets, for access checks
    pub async fn listing_owner_account(
        &self,
        application_id: i64,
    ) -> Result<Option<i64>, ServiceError> {
        let owner = sqlx::query_scalar(
            r#"
            SELECT employers.user_id
            FROM applications
            JOIN jobs ON applications.job_id = jobs.id
            JOIN employers ON jobs.employer_id = employers.id
            WHERE applications.id = ?
            "#,
        )
        .bind(application_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::tests::{employer_fields, seeker_fields};
    use crate::core::identity::IdentityService;
    use crate::core::listings::tests::{job_fields, seed_employer, seed_seeker};
    use crate::core::listings::ListingService;
    use crate::database::test_pool;

    #[tokio::test]
    async fn duplicate_apply_leaves_exactly_one_row() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let seeker_id = seed_seeker(&pool, "ana@example.com").await;
        let job = ListingService::new(&pool)
            .create(employer_id, &job_fields("Backend Engineer"))
            .await
            .unwrap();

        let applications = ApplicationService::new(&pool);
        applications.apply(seeker_id, job.id).await.unwrap();
        let err = applications.apply(seeker_id, job.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateApplication));

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE job_seeker_id = ? AND job_id = ?",
        )
        .bind(seeker_id)
        .bind(job.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn concurrent_duplicate_applies_converge_to_one_row() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let seeker_id = seed_seeker(&pool, "ana@example.com").await;
        let job = ListingService::new(&pool)
            .create(employer_id, &job_fields("Backend Engineer"))
            .await
            .unwrap();

        let applications = ApplicationService::new(&pool);
        let (first, second) = tokio::join!(
            applications.apply(seeker_id, job.id),
            applications.apply(seeker_id, job.id)
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for result in [first, second] {
            if let Err(e) = result {
                assert!(matches!(e, ServiceError::DuplicateApplication));
            }
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn apply_rejects_unknown_seeker_or_job() {
        let pool = test_pool().await;
        let applications = ApplicationService::new(&pool);

        let err = applications.apply(123, 456).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn set_status_validates_and_moves_in_any_direction() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let seeker_id = seed_seeker(&pool, "ana@example.com").await;
        let job = ListingService::new(&pool)
            .create(employer_id, &job_fields("Backend Engineer"))
            .await
            .unwrap();

        let applications = ApplicationService::new(&pool);
        let application = applications.apply(seeker_id, job.id).await.unwrap();

        let err = applications
            .set_status(application.id, "Shortlisted")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let accepted = applications
            .set_status(application.id, "Accepted")
            .await
            .unwrap();
        assert_eq!(accepted.status, "Accepted");

        // Decisions can be re-opened
        let reopened = applications
            .set_status(application.id, "Pending")
            .await
            .unwrap();
        assert_eq!(reopened.status, "Pending");

        let err = applications.set_status(9999, "Accepted").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_the_job_cascades_to_applications() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let seeker_id = seed_seeker(&pool, "ana@example.com").await;
        let listings = ListingService::new(&pool);
        let job = listings
            .create(employer_id, &job_fields("Backend Engineer"))
            .await
            .unwrap();

        let applications = ApplicationService::new(&pool);
        applications.apply(seeker_id, job.id).await.unwrap();

        listings.delete(job.id).await.unwrap();

        assert!(applications
            .list_for_job_seeker(seeker_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn end_to_end_hiring_flow() {
        let pool = test_pool().await;
        let identity = IdentityService::new(&pool);
        let listings = ListingService::new(&pool);
        let applications = ApplicationService::new(&pool);

        // Employer "Acme" signs up and posts a listing
        let acme_account = identity
            .signup(&employer_fields("hr@acme.example.com"))
            .await
            .unwrap();
        let acme = identity
            .employer_profile_id(acme_account)
            .await
            .unwrap()
            .unwrap();
        let job = listings
            .create(acme, &job_fields("Backend Engineer"))
            .await
            .unwrap();

        let board = listings.list_active().await.unwrap();
        assert!(board.iter().any(|j| j.job.id == job.id));

        // Job seeker "Ana" signs up and applies
        let ana_account = identity.signup(&seeker_fields("ana@example.com")).await.unwrap();
        let ana = identity
            .job_seeker_profile_id(ana_account)
            .await
            .unwrap()
            .unwrap();
        let application = applications.apply(ana, job.id).await.unwrap();
        assert_eq!(application.status, "Pending");

        // The employer accepts
        applications
            .set_status(application.id, "Accepted")
            .await
            .unwrap();

        let inbox = applications.list_for_employer(acme).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].application.status, "Accepted");
        assert_eq!(inbox[0].job_title, "Backend Engineer");
        assert_eq!(inbox[0].full_name, "Ana Alves");

        let mine = applications.list_for_job_seeker(ana).await.unwrap();
        assert_eq!(mine[0].company_name, "Acme");
    }
}
