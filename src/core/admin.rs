// src/core/admin.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use super::identity::Role;
use super::listings::Job;
use super::ServiceError;

/// Dashboard counters. Each count is an independent read; the snapshot is
/// not atomic across counts under concurrent writes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: i64,
    pub job_seekers: i64,
    pub employers: i64,
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub total_applications: i64,
    pub pending_applications: i64,
    pub accepted_applications: i64,
    pub rejected_applications: i64,
}

/// One row of the admin activity feed
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub user_name: String,
    pub job_title: String,
    pub company_name: String,
}

/// Account row for the admin user list, with the display name resolved
/// from whichever profile the account owns
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRow {
    pub id: i64,
    pub email: String,
    #[sqlx(rename = "user_type")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub company_name: Option<String>,
}

/// Admin overview of a listing: employer display fields plus applicant count
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminJob {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub company_name: String,
    pub employer_name: String,
    pub applicant_count: i64,
}

pub struct AdminService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdminService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    async fn count(&self, query: &str) -> Result<i64, ServiceError> {
        Ok(sqlx::query_scalar(query).fetch_one(self.pool).await?)
    }

    pub async fn stats(&self) -> Result<PlatformStats, ServiceError> {
        Ok(PlatformStats {
            total_users: self.count("SELECT COUNT(*) FROM users").await?,
            job_seekers: self
                .count("SELECT COUNT(*) FROM users WHERE user_type = 'Job Seeker'")
                .await?,
            employers: self
                .count("SELECT COUNT(*) FROM users WHERE user_type = 'Employer'")
                .await?,
            total_jobs: self.count("SELECT COUNT(*) FROM jobs").await?,
            active_jobs: self
                .count("SELECT COUNT(*) FROM jobs WHERE status = 'Active'")
                .await?,
            total_applications: self.count("SELECT COUNT(*) FROM applications").await?,
            pending_applications: self
                .count("SELECT COUNT(*) FROM applications WHERE status = 'Pending'")
                .await?,
            accepted_applications: self
                .count("SELECT COUNT(*) FROM applications WHERE status = 'Accepted'")
                .await?,
            rejected_applications: self
                .count("SELECT COUNT(*) FROM applications WHERE status = 'Rejected'")
                .await?,
        })
    }

    /// Most recent applications with the names needed by the feed
    pub async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityEntry>, ServiceError> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT 'application' AS activity_type,
                   applications.id AS id,
                   applications.applied_at AS timestamp,
                   job_seekers.full_name AS user_name,
                   jobs.title AS job_title,
                   employers.company_name AS company_name
            FROM applications
            JOIN job_seekers ON applications.job_seeker_id = job_seekers.id
            JOIN jobs ON applications.job_id = jobs.id
            JOIN employers ON jobs.employer_id = employers.id
            ORDER BY applications.applied_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }

    /// Every account with its resolved display name and company
    pub async fn list_users(&self) -> Result<Vec<AdminUserRow>, ServiceError> {
        let users = sqlx::query_as::<_, AdminUserRow>(
            r#"
            SELECT users.id AS id,
                   users.email AS email,
                   users.user_type AS user_type,
                   users.created_at AS created_at,
                   COALESCE(CASE
                       WHEN users.user_type = 'Job Seeker' THEN job_seekers.full_name
                       WHEN users.user_type = 'Employer' THEN employers.full_name
                       ELSE 'Admin'
                   END, '') AS name,
                   CASE
                       WHEN users.user_type = 'Employer' THEN employers.company_name
                       ELSE NULL
                   END AS company_name
            FROM users
            LEFT JOIN job_seekers ON users.id = job_seekers.user_id
            LEFT JOIN employers ON users.id = employers.user_id
            ORDER BY users.created_at DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// Every listing with employer display fields and applicant counts
    pub async fn list_jobs(&self) -> Result<Vec<AdminJob>, ServiceError> {
        let jobs = sqlx::query_as::<_, AdminJob>(
            r#"
            SELECT jobs.id AS id,
                   jobs.employer_id AS employer_id,
                   jobs.title AS title,
                   jobs.location AS location,
                   jobs.employment_type AS employment_type,
                   jobs.salary AS salary,
                   jobs.description AS description,
                   jobs.accessibility_features AS accessibility_features,
                   jobs.status AS status,
                   jobs.created_at AS created_at,
                   employers.company_name AS company_name,
                   employers.full_name AS employer_name,
                   COUNT(applications.id) AS applicant_count
            FROM jobs
            JOIN employers ON jobs.employer_id = employers.id
            LEFT JOIN applications ON jobs.id = applications.job_id
            GROUP BY jobs.id
            ORDER BY jobs.created_at DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(jobs)
    }

    /// Hard delete of an account. The profile, and through it any listings
    /// and applications, go with it via the foreign-key cascade.
    pub async fn delete_account(&self, account_id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(account_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("User"));
        }

        info!("Deleted account {}", account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::applications::ApplicationService;
    use crate::core::identity::IdentityService;
    use crate::core::listings::tests::{job_fields, seed_employer, seed_seeker};
    use crate::core::listings::ListingService;
    use crate::database::test_pool;

    async fn seed_platform(pool: &SqlitePool) -> (i64, i64, i64) {
        let employer_id = seed_employer(pool, "acme@example.com").await;
        let seeker_id = seed_seeker(pool, "ana@example.com").await;
        let job = ListingService::new(pool)
            .create(employer_id, &job_fields("Backend Engineer"))
            .await
            .unwrap();
        (employer_id, seeker_id, job.id)
    }

    #[tokio::test]
    async fn stats_reflect_the_platform_state() {
        let pool = test_pool().await;
        let (_, seeker_id, job_id) = seed_platform(&pool).await;

        let applications = ApplicationService::new(&pool);
        let application = applications.apply(seeker_id, job_id).await.unwrap();
        applications
            .set_status(application.id, "Accepted")
            .await
            .unwrap();

        let stats = AdminService::new(&pool).stats().await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.job_seekers, 1);
        assert_eq!(stats.employers, 1);
        assert_eq!(stats.total_jobs, 1);
        assert_eq!(stats.active_jobs, 1);
        assert_eq!(stats.total_applications, 1);
        assert_eq!(stats.pending_applications, 0);
        assert_eq!(stats.accepted_applications, 1);
        assert_eq!(stats.rejected_applications, 0);
    }

    #[tokio::test]
    async fn recent_activity_is_newest_first_and_capped() {
        let pool = test_pool().await;
        let employer_id = seed_employer(&pool, "acme@example.com").await;
        let job = ListingService::new(&pool)
            .create(employer_id, &job_fields("Backend Engineer"))
            .await
            .unwrap();

        let applications = ApplicationService::new(&pool);
        let mut last_seeker = 0;
        for i in 0..3 {
            let seeker = seed_seeker(&pool, &format!("seeker{}@example.com", i)).await;
            applications.apply(seeker, job.id).await.unwrap();
            last_seeker = seeker;
        }

        let admin = AdminService::new(&pool);
        let feed = admin.recent_activity(2).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].activity_type, "application");
        assert_eq!(feed[0].job_title, "Backend Engineer");
        assert!(feed[0].timestamp >= feed[1].timestamp);

        // The newest application is the last seeker's
        let all = admin.recent_activity(10).await.unwrap();
        assert_eq!(all.len(), 3);
        let newest: i64 =
            sqlx::query_scalar("SELECT id FROM applications WHERE job_seeker_id = ?")
                .bind(last_seeker)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(all[0].id, newest);
    }

    #[tokio::test]
    async fn list_users_resolves_names_per_role() {
        let pool = test_pool().await;
        seed_platform(&pool).await;
        let identity = IdentityService::new(&pool);
        identity
            .create_admin("admin@platform.com", "s3cret-pass", "Platform Admin")
            .await
            .unwrap();

        let users = AdminService::new(&pool).list_users().await.unwrap();
        assert_eq!(users.len(), 3);

        let by_email = |email: &str| users.iter().find(|u| u.email == email).unwrap();
        assert_eq!(by_email("ana@example.com").name, "Ana Alves");
        let acme = by_email("acme@example.com");
        assert_eq!(acme.name, "Erik Berg");
        assert_eq!(acme.company_name.as_deref(), Some("Acme"));
        assert_eq!(by_email("admin@platform.com").name, "Admin");
    }

    #[tokio::test]
    async fn list_jobs_includes_counts_and_employer_fields() {
        let pool = test_pool().await;
        let (_, seeker_id, job_id) = seed_platform(&pool).await;
        ApplicationService::new(&pool)
            .apply(seeker_id, job_id)
            .await
            .unwrap();

        let jobs = AdminService::new(&pool).list_jobs().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company_name, "Acme");
        assert_eq!(jobs[0].applicant_count, 1);
    }

    #[tokio::test]
    async fn deleting_an_employer_account_cascades_to_listings_and_applications() {
        let pool = test_pool().await;
        let (employer_id, seeker_id, job_id) = seed_platform(&pool).await;
        ApplicationService::new(&pool)
            .apply(seeker_id, job_id)
            .await
            .unwrap();

        let account_id: i64 = sqlx::query_scalar("SELECT user_id FROM employers WHERE id = ?")
            .bind(employer_id)
            .fetch_one(&pool)
            .await
            .unwrap();

        let admin = AdminService::new(&pool);
        admin.delete_account(account_id).await.unwrap();

        let jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&pool)
            .await
            .unwrap();
        let applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(jobs, 0);
        assert_eq!(applications, 0);

        assert!(matches!(
            admin.delete_account(account_id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn deleting_a_job_seeker_account_cascades_to_applications() {
        let pool = test_pool().await;
        let (_, seeker_id, job_id) = seed_platform(&pool).await;
        ApplicationService::new(&pool)
            .apply(seeker_id, job_id)
            .await
            .unwrap();

        let account_id: i64 = sqlx::query_scalar("SELECT user_id FROM job_seekers WHERE id = ?")
            .bind(seeker_id)
            .fetch_one(&pool)
            .await
            .unwrap();

        AdminService::new(&pool).delete_account(account_id).await.unwrap();

        let applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(applications, 0);

        // The listing itself survives
        let jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(jobs, 1);
    }
}
