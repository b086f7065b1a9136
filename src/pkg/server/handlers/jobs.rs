use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    pkg::{
        internal::{
            adaptors::jobs::{
                mutators::JobMutator,
                selectors::JobSelector,
                spec::{JobEntry, JobFilters, JobType, JobUpdate, NewJob},
            },
            auth::Caller,
        },
        server::state::{AppState, GetTxn},
    },
    prelude::{Error, Result, invalid_fields},
};

/// Body and query extractors whose rejections use the crate's error body.
type JsonInput<T> = WithRejection<Json<T>, Error>;
type QueryInput<T> = WithRejection<Query<T>, Error>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateJobInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[serde(rename = "type", default)]
    pub job_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateJobInput {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub location: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobIdInput {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFiltersInput {
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub search: Option<String>,
}

fn parse_id(raw: &str, fields: &mut Vec<String>) -> Option<Uuid> {
    raw.parse::<Uuid>()
        .map_err(|_| fields.push("id".to_string()))
        .ok()
}

fn parse_type(raw: &str, fields: &mut Vec<String>) -> Option<JobType> {
    raw.parse::<JobType>()
        .map_err(|_| fields.push("type".to_string()))
        .ok()
}

fn reject(mut fields: Vec<String>) -> Error {
    fields.sort();
    fields.dedup();
    tracing::debug!("rejected input fields: {:?}", &fields);
    Error::BadInput(fields)
}

impl CreateJobInput {
    pub fn into_new_job(self, owner: Uuid) -> Result<NewJob> {
        let mut fields = invalid_fields(self.validate());
        let job_type = parse_type(&self.job_type, &mut fields);
        match job_type {
            Some(job_type) if fields.is_empty() => Ok(NewJob {
                title: self.title,
                company: self.company,
                description: self.description,
                location: self.location,
                job_type,
                user_id: owner,
            }),
            _ => Err(reject(fields)),
        }
    }
}

impl UpdateJobInput {
    pub fn into_update(self) -> Result<(Uuid, JobUpdate)> {
        let mut fields = invalid_fields(self.validate());
        let id = parse_id(&self.id, &mut fields);
        let job_type = match self.job_type.as_deref() {
            Some(raw) => parse_type(raw, &mut fields),
            None => None,
        };
        match id {
            Some(id) if fields.is_empty() => Ok((
                id,
                JobUpdate {
                    title: self.title,
                    company: self.company,
                    description: self.description,
                    location: self.location,
                    job_type,
                },
            )),
            _ => Err(reject(fields)),
        }
    }
}

impl JobIdInput {
    pub fn parse(&self) -> Result<Uuid> {
        let mut fields = Vec::new();
        parse_id(&self.id, &mut fields).ok_or_else(|| reject(fields))
    }
}

impl JobFiltersInput {
    pub fn into_filters(self) -> Result<JobFilters> {
        let mut fields = Vec::new();
        let job_type = match self.job_type.as_deref() {
            None | Some("") => None,
            Some(raw) => parse_type(raw, &mut fields),
        };
        if !fields.is_empty() {
            return Err(reject(fields));
        }
        Ok(JobFilters {
            location: self.location,
            job_type,
            search: self.search,
        }
        .normalized())
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Arc<Caller>>,
    WithRejection(Json(input), _): JsonInput<CreateJobInput>,
) -> Result<Json<JobEntry>> {
    let job = input.into_new_job(caller.id)?;
    let mut tx = state.db_pool.begin_write_txn().await?;
    let created = JobMutator::new(&mut *tx).create(job).await?;
    tx.commit().await?;
    Ok(Json(created))
}

pub async fn get_all(
    State(state): State<AppState>,
    WithRejection(Query(input), _): QueryInput<JobFiltersInput>,
) -> Result<Json<Vec<JobEntry>>> {
    let filters = input.into_filters()?;
    let mut conn = state.db_pool.acquire().await?;
    let jobs = JobSelector::new(&mut *conn).get_all(&filters).await?;
    Ok(Json(jobs))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    WithRejection(Query(input), _): QueryInput<JobIdInput>,
) -> Result<Json<Option<JobEntry>>> {
    let id = input.parse()?;
    let mut conn = state.db_pool.acquire().await?;
    let job = JobSelector::new(&mut *conn).get_by_id(id).await?;
    Ok(Json(job))
}

pub async fn get_my_jobs(
    State(state): State<AppState>,
    Extension(caller): Extension<Arc<Caller>>,
) -> Result<Json<Vec<JobEntry>>> {
    let mut conn = state.db_pool.acquire().await?;
    let jobs = JobSelector::new(&mut *conn).get_by_user_id(caller.id).await?;
    Ok(Json(jobs))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<Arc<Caller>>,
    WithRejection(Json(input), _): JsonInput<UpdateJobInput>,
) -> Result<Json<Option<JobEntry>>> {
    let (id, updates) = input.into_update()?;
    let mut tx = state.db_pool.begin_write_txn().await?;
    let updated = JobMutator::new(&mut *tx).update(id, updates, caller.id).await?;
    tx.commit().await?;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Arc<Caller>>,
    WithRejection(Json(input), _): JsonInput<JobIdInput>,
) -> Result<Json<bool>> {
    let id = input.parse()?;
    let mut tx = state.db_pool.begin_write_txn().await?;
    let deleted = JobMutator::new(&mut *tx).delete(id, caller.id).await?;
    tx.commit().await?;
    if deleted {
        tracing::info!("job {} deleted by {}", id, caller.id);
    }
    Ok(Json(deleted))
}
