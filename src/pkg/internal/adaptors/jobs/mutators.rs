use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::pkg::internal::adaptors::jobs::selectors::{JOB_COLUMNS, JobSelector};
use crate::pkg::internal::adaptors::jobs::spec::{JobEntry, JobUpdate, NewJob};
use crate::prelude::Result;

pub struct JobMutator<'a> {
    pool: &'a mut SqliteConnection,
}

impl<'a> JobMutator<'a> {
    pub fn new(pool: &'a mut SqliteConnection) -> Self {
        JobMutator { pool }
    }

    pub async fn create(&mut self, job: NewJob) -> Result<JobEntry> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            r#"
            INSERT INTO jobs (id, title, company, description, location, "type", user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.description)
        .bind(&job.location)
        .bind(job.job_type)
        .bind(job.user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.pool)
        .await?;
        tracing::info!("job {} created by {}", row.id, row.user_id);
        Ok(row)
    }

    /// Returns `None` both when the job does not exist and when `caller`
    /// does not own it.
    pub async fn update(
        &mut self,
        id: Uuid,
        job: JobUpdate,
        caller: Uuid,
    ) -> Result<Option<JobEntry>> {
        let existing = match JobSelector::new(&mut *self.pool).get_by_id(id).await? {
            Some(existing) if existing.user_id == caller => existing,
            _ => {
                tracing::debug!("update of job {} refused for {}", id, caller);
                return Ok(None);
            }
        };

        let updated_at = Utc::now().max(existing.created_at);
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE jobs SET updated_at = ");
        qb.push_bind(updated_at);

        if let Some(title) = job.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(company) = job.company {
            qb.push(", company = ").push_bind(company);
        }
        if let Some(description) = job.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(location) = job.location {
            qb.push(", location = ").push_bind(location);
        }
        if let Some(job_type) = job.job_type {
            qb.push(r#", "type" = "#).push_bind(job_type);
        }

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(caller)
            .push(format!(" RETURNING {JOB_COLUMNS}"));

        let row = qb
            .build_query_as::<JobEntry>()
            .fetch_optional(&mut *self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete(&mut self, id: Uuid, caller: Uuid) -> Result<bool> {
        match JobSelector::new(&mut *self.pool).get_by_id(id).await? {
            Some(existing) if existing.user_id == caller => {}
            _ => {
                tracing::debug!("delete of job {} refused for {}", id, caller);
                return Ok(false);
            }
        }

        let result = sqlx::query("DELETE FROM jobs WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(caller)
            .execute(&mut *self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;
    use uuid::Uuid;

    use crate::{
        pkg::{
            internal::adaptors::jobs::{
                mutators::JobMutator,
                selectors::JobSelector,
                spec::{JobEntry, JobFilters, JobType, JobUpdate, NewJob},
            },
            server::state::AppState,
        },
        prelude::Result,
    };

    fn new_job(title: &str, description: &str, job_type: JobType, owner: Uuid) -> NewJob {
        NewJob {
            title: title.into(),
            company: "Acme".into(),
            description: description.into(),
            location: "San Francisco, CA".into(),
            job_type,
            user_id: owner,
        }
    }

    fn ids(jobs: Vec<JobEntry>) -> Vec<Uuid> {
        jobs.into_iter().map(|j| j.id).collect()
    }

    #[traced_test]
    #[tokio::test]
    async fn test_create_binds_owner() -> Result<()> {
        let state = AppState::ephemeral().await?;
        let mut conn = state.db_pool.acquire().await?;
        let owner = Uuid::new_v4();

        let job = JobMutator::new(&mut conn)
            .create(new_job("Engineer", "Write Rust", JobType::FullTime, owner))
            .await?;
        assert_eq!(job.user_id, owner);
        assert_eq!(job.created_at, job.updated_at);

        let fetched = JobSelector::new(&mut conn).get_by_id(job.id).await?;
        assert_eq!(fetched.map(|j| j.user_id), Some(owner));
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn test_get_by_id_is_idempotent() -> Result<()> {
        let state = AppState::ephemeral().await?;
        let mut conn = state.db_pool.acquire().await?;
        let job = JobMutator::new(&mut conn)
            .create(new_job("Engineer", "Write Rust", JobType::Contract, Uuid::new_v4()))
            .await?;

        let first = JobSelector::new(&mut conn).get_by_id(job.id).await?;
        let second = JobSelector::new(&mut conn).get_by_id(job.id).await?;
        assert_eq!(first, second);
        assert_eq!(first, Some(job));
        assert_eq!(JobSelector::new(&mut conn).get_by_id(Uuid::new_v4()).await?, None);
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn test_update_by_owner_refreshes_timestamp() -> Result<()> {
        let state = AppState::ephemeral().await?;
        let mut conn = state.db_pool.acquire().await?;
        let owner = Uuid::new_v4();
        let job = JobMutator::new(&mut conn)
            .create(new_job("Engineer", "Write Rust", JobType::FullTime, owner))
            .await?;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let updated = JobMutator::new(&mut conn)
            .update(
                job.id,
                JobUpdate {
                    title: Some("Staff Engineer".into()),
                    job_type: Some(JobType::Contract),
                    ..Default::default()
                },
                owner,
            )
            .await?
            .expect("owner update should succeed");

        assert_eq!(updated.title, "Staff Engineer");
        assert_eq!(updated.job_type, JobType::Contract);
        assert_eq!(updated.company, job.company);
        assert_eq!(updated.user_id, owner);
        assert_eq!(updated.created_at, job.created_at);
        assert!(updated.updated_at > job.updated_at);

        let reread = JobSelector::new(&mut conn).get_by_id(job.id).await?;
        assert_eq!(reread, Some(updated.clone()));

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let again = JobMutator::new(&mut conn)
            .update(job.id, JobUpdate::default(), owner)
            .await?
            .expect("empty owner update should still apply");
        assert!(again.updated_at > updated.updated_at);
        assert_eq!(again.title, "Staff Engineer");
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn test_update_by_non_owner_leaves_row_unchanged() -> Result<()> {
        let state = AppState::ephemeral().await?;
        let mut conn = state.db_pool.acquire().await?;
        let job = JobMutator::new(&mut conn)
            .create(new_job("Engineer", "Write Rust", JobType::FullTime, Uuid::new_v4()))
            .await?;

        let outcome = JobMutator::new(&mut conn)
            .update(
                job.id,
                JobUpdate {
                    title: Some("Hijacked".into()),
                    ..Default::default()
                },
                Uuid::new_v4(),
            )
            .await?;
        assert!(outcome.is_none());

        let missing = JobMutator::new(&mut conn)
            .update(Uuid::new_v4(), JobUpdate::default(), job.user_id)
            .await?;
        assert!(missing.is_none());

        let reread = JobSelector::new(&mut conn).get_by_id(job.id).await?;
        assert_eq!(reread, Some(job));
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn test_ownership_scenario() -> Result<()> {
        let state = AppState::ephemeral().await?;
        let mut conn = state.db_pool.acquire().await?;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let job1 = JobMutator::new(&mut conn)
            .create(new_job("Engineer", "first", JobType::FullTime, a))
            .await?;
        let job2 = JobMutator::new(&mut conn)
            .create(new_job("Designer", "second", JobType::PartTime, a))
            .await?;
        JobMutator::new(&mut conn)
            .create(new_job("Manager", "third", JobType::Contract, b))
            .await?;

        let owned = JobSelector::new(&mut conn).get_by_user_id(a).await?;
        assert_eq!(ids(owned), vec![job1.id, job2.id]);

        assert!(!JobMutator::new(&mut conn).delete(job1.id, b).await?);
        assert!(JobSelector::new(&mut conn).get_by_id(job1.id).await?.is_some());

        assert!(JobMutator::new(&mut conn).delete(job1.id, a).await?);
        assert!(JobSelector::new(&mut conn).get_by_id(job1.id).await?.is_none());
        assert!(!JobMutator::new(&mut conn).delete(job1.id, a).await?);
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn test_filters_compose() -> Result<()> {
        let state = AppState::ephemeral().await?;
        let mut conn = state.db_pool.acquire().await?;
        let owner = Uuid::new_v4();

        let full_time = JobMutator::new(&mut conn)
            .create(new_job("Engineer", "Backend work", JobType::FullTime, owner))
            .await?;
        let contract = JobMutator::new(&mut conn)
            .create(NewJob {
                location: "Remote".into(),
                ..new_job("Designer", "Looking for an Engineer mindset", JobType::Contract, owner)
            })
            .await?;
        let part_time = JobMutator::new(&mut conn)
            .create(new_job("Writer", "Docs", JobType::PartTime, owner))
            .await?;
        let full_time_2 = JobMutator::new(&mut conn)
            .create(NewJob {
                company: "Engineering Co".into(),
                ..new_job("Analyst", "Numbers", JobType::FullTime, owner)
            })
            .await?;

        let mut selector = JobSelector::new(&mut conn);

        let all = selector.get_all(&JobFilters::default()).await?;
        assert_eq!(ids(all), vec![full_time.id, contract.id, part_time.id, full_time_2.id]);

        let by_type = selector
            .get_all(&JobFilters {
                job_type: Some(JobType::FullTime),
                ..Default::default()
            })
            .await?;
        assert_eq!(ids(by_type), vec![full_time.id, full_time_2.id]);

        // contract matches only through its description, full_time_2 only through its company
        let by_search = selector
            .get_all(&JobFilters {
                search: Some("Engineer".into()),
                ..Default::default()
            })
            .await?;
        assert_eq!(ids(by_search), vec![full_time.id, contract.id, full_time_2.id]);

        let combined = selector
            .get_all(&JobFilters {
                search: Some("Engineer".into()),
                location: Some("Remote".into()),
                job_type: Some(JobType::Contract),
            })
            .await?;
        assert_eq!(ids(combined), vec![contract.id]);

        let lowercase = selector
            .get_all(&JobFilters {
                location: Some("remote".into()),
                ..Default::default()
            })
            .await?;
        assert!(lowercase.is_empty());

        let empty_strings = selector
            .get_all(&JobFilters {
                location: Some(String::new()),
                search: Some(String::new()),
                job_type: None,
            })
            .await?;
        assert_eq!(empty_strings.len(), 4);
        Ok(())
    }
}
