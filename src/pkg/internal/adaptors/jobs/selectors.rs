use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{
    pkg::internal::adaptors::jobs::spec::{JobEntry, JobFilters},
    prelude::Result,
};

pub(crate) const JOB_COLUMNS: &str =
    r#"id, title, company, description, location, "type", user_id, created_at, updated_at"#;

const ORDERING: &str = " ORDER BY created_at ASC, rowid ASC";

pub struct JobSelector<'a> {
    pool: &'a mut SqliteConnection,
}

impl<'a> JobSelector<'a> {
    pub fn new(pool: &'a mut SqliteConnection) -> Self {
        JobSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_all(&mut self, filters: &JobFilters) -> Result<Vec<JobEntry>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
        if filters.is_empty() {
            tracing::debug!("listing all jobs");
        }
        let mut separator = " WHERE ";

        // instr() keeps substring matching case-sensitive and treats % and _ literally
        if let Some(location) = filters.location.as_deref().filter(|v| !v.is_empty()) {
            qb.push(separator)
                .push("instr(location, ")
                .push_bind(location.to_string())
                .push(") > 0");
            separator = " AND ";
        }
        if let Some(job_type) = filters.job_type {
            qb.push(separator).push(r#""type" = "#).push_bind(job_type);
            separator = " AND ";
        }
        if let Some(search) = filters.search.as_deref().filter(|v| !v.is_empty()) {
            qb.push(separator)
                .push("(instr(title, ")
                .push_bind(search.to_string())
                .push(") > 0 OR instr(company, ")
                .push_bind(search.to_string())
                .push(") > 0 OR instr(description, ")
                .push_bind(search.to_string())
                .push(") > 0)");
        }
        qb.push(ORDERING);

        let rows = qb
            .build_query_as::<JobEntry>()
            .fetch_all(&mut *self.pool)
            .await?;
        tracing::debug!("{} jobs matched {:?}", rows.len(), filters);
        Ok(rows)
    }

    pub async fn get_by_user_id(&mut self, user_id: Uuid) -> Result<Vec<JobEntry>> {
        let rows = sqlx::query_as::<_, JobEntry>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE user_id = ?{ORDERING}"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }
}
