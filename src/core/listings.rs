// src/core/listings.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use super::{is_foreign_key_violation, require, ServiceError};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub employer_id: i64,
    pub title: String,
    pub location: String,
    pub employment_type: String,
    pub salary: Option<String>,
    pub description: String,
    pub accessibility_features: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Listing joined with the employer display fields for the public board
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub company_name: String,
    pub employer_name: String,
}

/// Single-listing view; also carries the employer's industry
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub company_name: String,
    pub employer_name: String,
    pub industry: Option<String>,
}

/// Employer-dashboard view with the per-listing applicant count
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployerJob {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub applicant_count: i64,
}

/// Mutable listing fields. Create and update share this shape; update is a
/// full replace.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFields {
    pub title: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub accessibility_features: Option<String>,
    pub status: Option<String>,
}

const JOB_COLUMNS: &str = r#"
    jobs.id AS id,
    jobs.employer_id AS employer_id,
    jobs.title AS title,
    jobs.location AS location,
    jobs.employment_type AS employment_type,
    jobs.salary AS salary,
    jobs.description AS description,
    jobs.accessibility_features AS accessibility_features,
    jobs.status AS status,
    jobs.created_at AS created_at
"#;

pub struct ListingService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ListingService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    fn validate(fields: &JobFields) -> Result<(), ServiceError> {
        require(fields.title.as_deref(), "title")?;
        require(fields.location.as_deref(), "location")?;
        require(fields.employment_type.as_deref(), "employmentType")?;
        require(fields.description.as_deref(), "description")?;
        require(fields.accessibility_features.as_deref(), "accessibilityFeatures")?;
        Ok(())
    }

    /// Publish a listing for an employer. Status defaults to Active.
    pub async fn create(
        &self,
        employer_id: i64,
        fields: &JobFields,
    ) -> Result<Job, ServiceError> {
        Self::validate(fields)?;

        let status = fields.status.as_deref().unwrap_or("Active");
        let now = Utc::now();

        let inserted = sqlx::query(
            r#"
            INSERT INTO jobs
                (employer_id, title, location, employment_type, salary,
                 description, accessibility_features, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employer_id)
        .bind(fields.title.as_deref())
        .bind(fields.location.as_deref())
        .bind(fields.employment_type.as_deref())
        .bind(fields.salary.as_deref())
        .bind(fields.description.as_deref())
        .bind(fields.accessibility_features.as_deref())
        .bind(status)
        .bind(now)
        .execute(self.pool)
        .await;

        let job_id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(ServiceError::Validation(
                    "Employer profile not found".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        info!("Employer {} posted job {} ({})", employer_id, job_id, status);

        Ok(Job {
            id: job_id,
            employer_id,
            title: fields.title.clone().unwrap_or_default(),
            location: fields.location.clone().unwrap_or_default(),
            employment_type: fields.employment_type.clone().unwrap_or_default(),
            salary: fields.salary.clone(),
            description: fields.description.clone().unwrap_or_default(),
            accessibility_features: fields.accessibility_features.clone().unwrap_or_default(),
            status: status.to_string(),
            created_at: now,
        })
    }

    /// Full replace of the mutable fields
    pub async fn update(&self, job_id: i64, fields: &JobFields) -> Result<Job, ServiceError> {
        Self::validate(fields)?;

        let status = fields.status.as_deref().unwrap_or("Active");

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET title = ?, location = ?, employment_type = ?, salary = ?,
                description = ?, accessibility_features = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.title.as_deref())
        .bind(fields.location.as_deref())
        .bind(fields.employment_type.as_deref())
        .bind(fields.salary.as_deref())
        .bind(fields.description.as_deref())
        .bind(fields.accessibility_features.as_deref())
        .bind(status)
        .bind(job_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Job"));
        }

        self.fetch(job_id)
            .await?
            .ok_or(ServiceError::NotFound("Job"))
    }

    /// Delete a listing; its applications cascade via the foreign key
    pub async fn delete(&self, job_id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(job_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Job"));
        }

        info!("Deleted job {}", job_id);
        Ok(())
    }

    async fn fetch(&self, job_id: i64) -> Result<Option<Job>, ServiceError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE jobs.id = ?",
            JOB_COLUMNS
        ))
        .bind(job_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(job)
    }

    /// Active listings for the public board, newest first
    pub async fn list_active(&self) -> Result<Vec<JobListing>, ServiceError> {
        let jobs = sqlx::query_as::<_, JobListing>(&format!(
            r#"
            SELECT {},
                   employers.company_name AS company_name,
                   employers.full_name AS employer_name
            FROM jobs
            JOIN employers ON jobs.employer_id = employers.id
            WHERE jobs.status = 'Active'
            ORDER BY jobs.created_at DESC
            "#,
            JOB_COLUMNS
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(jobs)
    }

    pub async fn get(&self, job_id: i64) -> Result<JobDetails, ServiceError> {
        sqlx::query_as::<_, JobDetails>(&format!(
            r#"
            SELECT {},
                   employers.company_name AS company_name,
                   employers.full_name AS employer_name,
                   employers.industry AS industry
            FROM jobs
            JOIN employers ON jobs.employer_id = employers.id
            WHERE jobs.id = ?
            "#,
            JOB_COLUMNS
        ))
        .bind(job_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(ServiceError::NotFound("Job"))
    }

    /// Employer dashboard: every listing with its applicant count
    pub async fn list_by_employer(
        &self,
        employer_id: i64,
    ) -> Result<Vec<EmployerJob>, ServiceError> {
        let jobs = sqlx::query_as::<_, EmployerJob>(&format!(
            r#"
            SELECT {},
                   COUNT(applications.id) AS applicant_count
            FROM jobs
            LEFT JOIN applications ON jobs.id = applications.job_id
            WHERE jobs.employer_id = ?
            GROUP BY jobs.id
            ORDER BY jobs.created_at DESC
            "#,
            JOB_COLUMNS
        ))
        .bind(employer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(jobs)
    }

    /// Account that owns a listing, for the mutating-endpoint access checks
    pub async fn owner_account(&self, job_id: i64) -> Result<Option<i64>, ServiceError> {
        let owner = sqlx::query_scalar(
            r#"
            SELECT employers.user_id
            FROM jobs
            JOIN employers ON jobs.employer_id = employers.id
            WHERE jobs.id = ?
            "#,
        )
        .bind(job_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(owner)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::applications::ApplicationService;
    use crate::core::identity::tests::{employer_fields, seeker_fields};
    use crate::core::identity::IdentityService;
    use crate::database::test_pool;

    pub(crate) fn job_fields(title: &str) -> JobFields {
        JobFields {
            title: Some(title.to_string()),
            location: Some("Remote".to_string()),
            employment_type: Some("Full-time".to_string()),
            salary: Some("90-110k".to_string()),
            description: Some("Build and run backend services".to_string()),
            accessibility_features: Some("Flexible hours, remote-first".to_string()),
            status: None,
        }
    }

    pub(crate) async fn seed_employer(pool: &SqlitePool, email: &str) -> i64 {
        let identity = IdentityService::new(pool);
        let account_id = identity.signup(&employer_fields(email)).await.unwrap();
        identity
            .employer_profile_id(account_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub(crate) async fn seed_seeker(pool: &SqlitePool, email: &str) -> i64 {
        let identity = IdentityService::new(pool);
        let account_id = identity.signup(&seeker_fields(email)).await.unwrap();
        identity
            .job_seeker_profile_id(account_id)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn create_defaults_to_active_and_appears_on_board() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let listings = ListingService::new(&pool);

        let job = listings
            .create(employer_id, &job_fields("Backend Engineer"))
            .await
            .unwrap();
        assert_eq!(job.status, "Active");

        let board = listings.list_active().await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].job.title, "Backend Engineer");
        assert_eq!(board[0].company_name, "Acme");
    }

    #[tokio::test]
    async fn create_rejects_missing_fields_and_unknown_employer() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let listings = ListingService::new(&pool);

        let mut fields = job_fields("Backend Engineer");
        fields.accessibility_features = None;
        assert!(matches!(
            listings.create(employer_id, &fields).await.unwrap_err(),
            ServiceError::Validation(_)
        ));

        assert!(matches!(
            listings
                .create(9999, &job_fields("Ghost Job"))
                .await
                .unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn update_replaces_fields_and_closed_jobs_leave_the_board() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let listings = ListingService::new(&pool);

        let job = listings
            .create(employer_id, &job_fields("Backend Engineer"))
            .await
            .unwrap();

        let mut fields = job_fields("Senior Backend Engineer");
        fields.status = Some("Closed".to_string());
        let updated = listings.update(job.id, &fields).await.unwrap();
        assert_eq!(updated.title, "Senior Backend Engineer");
        assert_eq!(updated.status, "Closed");

        assert!(listings.list_active().await.unwrap().is_empty());

        assert!(matches!(
            listings.update(9999, &job_fields("Nope")).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            listings.delete(9999).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn get_includes_employer_display_fields() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let listings = ListingService::new(&pool);

        let job = listings
            .create(employer_id, &job_fields("Backend Engineer"))
            .await
            .unwrap();

        let details = listings.get(job.id).await.unwrap();
        assert_eq!(details.company_name, "Acme");
        assert_eq!(details.industry.as_deref(), Some("Software"));

        assert!(matches!(
            listings.get(9999).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn applicant_counts_cover_zero_one_and_many() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let listings = ListingService::new(&pool);
        let applications = ApplicationService::new(&pool);

        let quiet = listings
            .create(employer_id, &job_fields("Quiet Role"))
            .await
            .unwrap();
        let busy = listings
            .create(employer_id, &job_fields("Busy Role"))
            .await
            .unwrap();
        let single = listings
            .create(employer_id, &job_fields("Single Role"))
            .await
            .unwrap();

        let first = seed_seeker(&pool, "one@example.com").await;
        let second = seed_seeker(&pool, "two@example.com").await;
        let third = seed_seeker(&pool, "three@example.com").await;

        applications.apply(first, busy.id).await.unwrap();
        applications.apply(second, busy.id).await.unwrap();
        applications.apply(third, busy.id).await.unwrap();
        applications.apply(first, single.id).await.unwrap();

        let dashboard = listings.list_by_employer(employer_id).await.unwrap();
        let count_for = |id: i64| {
            dashboard
                .iter()
                .find(|j| j.job.id == id)
                .map(|j| j.applicant_count)
                .unwrap()
        };

        assert_eq!(count_for(quiet.id), 0);
        assert_eq!(count_for(single.id), 1);
        assert_eq!(count_for(busy.id), 3);
    }
}
