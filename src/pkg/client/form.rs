use std::collections::BTreeMap;

use crate::{
    pkg::{
        internal::adaptors::jobs::spec::{JobEntry, JobType},
        server::handlers::jobs::{CreateJobInput, UpdateJobInput},
    },
    prelude::{Error, Result},
};

/// Editable job fields as held by a create or edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobForm {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub job_type: Option<JobType>,
}

impl JobForm {
    pub fn from_job(job: &JobEntry) -> Self {
        JobForm {
            title: job.title.clone(),
            company: job.company.clone(),
            description: job.description.clone(),
            location: job.location.clone(),
            job_type: Some(job.job_type),
        }
    }

    /// Field name to message for every field that would be rejected.
    pub fn validate(&self) -> BTreeMap<&'static str, &'static str> {
        let mut errors = BTreeMap::new();
        if self.title.trim().is_empty() {
            errors.insert("title", "Job title is required");
        }
        if self.company.trim().is_empty() {
            errors.insert("company", "Company name is required");
        }
        if self.description.trim().is_empty() {
            errors.insert("description", "Job description is required");
        }
        if self.location.trim().is_empty() {
            errors.insert("location", "Location is required");
        }
        if self.job_type.is_none() {
            errors.insert("type", "Job type is required");
        }
        errors
    }

    fn checked(&self) -> Result<JobType> {
        let errors = self.validate();
        match self.job_type {
            Some(job_type) if errors.is_empty() => Ok(job_type),
            _ => Err(Error::BadInput(
                errors.into_keys().map(String::from).collect(),
            )),
        }
    }

    pub fn to_create(&self) -> Result<CreateJobInput> {
        let job_type = self.checked()?;
        Ok(CreateJobInput {
            title: self.title.trim().to_string(),
            company: self.company.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            job_type: job_type.to_string(),
        })
    }

    /// Update carrying only the fields that differ from `original`.
    pub fn to_update(&self, original: &JobEntry) -> Result<UpdateJobInput> {
        let job_type = self.checked()?;
        let changed = |edited: &str, current: &str| {
            let edited = edited.trim();
            (edited != current).then(|| edited.to_string())
        };
        Ok(UpdateJobInput {
            id: original.id.to_string(),
            title: changed(&self.title, &original.title),
            company: changed(&self.company, &original.company),
            description: changed(&self.description, &original.description),
            location: changed(&self.location, &original.location),
            job_type: (job_type != original.job_type).then(|| job_type.to_string()),
        })
    }
}
