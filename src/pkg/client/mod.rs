pub mod filters;
pub mod form;

use std::future::Future;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    pkg::{
        internal::{
            adaptors::jobs::spec::{JobEntry, JobFilters},
            auth::Caller,
        },
        server::handlers::jobs::{CreateJobInput, JobIdInput, UpdateJobInput},
    },
    prelude::{Error, Result},
};

/// Anything that can answer a filtered listing query.
pub trait JobSource: Send + Sync + 'static {
    fn fetch(&self, filters: JobFilters) -> impl Future<Output = Result<Vec<JobEntry>>> + Send;
}

#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RpcClient {
    pub fn new(base_url: &str) -> Self {
        RpcClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn call(&self, method: Method, procedure: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}/rpc/{}", self.base_url, procedure));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<O: DeserializeOwned>(builder: RequestBuilder) -> Result<O> {
        let response: Response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            tracing::debug!("procedure failed with {}: {}", status, &body);
            return Err(Error::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<O>().await?)
    }

    pub async fn get_all(&self, filters: &JobFilters) -> Result<Vec<JobEntry>> {
        Self::send(self.call(Method::GET, "jobs.getAll").query(filters)).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<JobEntry>> {
        let input = JobIdInput { id: id.to_string() };
        Self::send(self.call(Method::GET, "jobs.getById").query(&input)).await
    }

    pub async fn get_my_jobs(&self) -> Result<Vec<JobEntry>> {
        Self::send(self.call(Method::GET, "jobs.getMyJobs")).await
    }

    pub async fn create(&self, input: &CreateJobInput) -> Result<JobEntry> {
        Self::send(self.call(Method::POST, "jobs.create").json(input)).await
    }

    pub async fn update(&self, input: &UpdateJobInput) -> Result<Option<JobEntry>> {
        Self::send(self.call(Method::POST, "jobs.update").json(input)).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let input = JobIdInput { id: id.to_string() };
        Self::send(self.call(Method::POST, "jobs.delete").json(&input)).await
    }

    pub async fn get_user(&self) -> Result<Caller> {
        Self::send(self.call(Method::GET, "auth.getUser")).await
    }
}

impl JobSource for RpcClient {
    async fn fetch(&self, filters: JobFilters) -> Result<Vec<JobEntry>> {
        self.get_all(&filters).await
    }
}
