use clap::Args;
use uuid::Uuid;

use super::Remote;
use crate::{
    conf::Settings,
    pkg::{
        client::form::JobForm,
        internal::adaptors::jobs::spec::{JobEntry, JobType},
    },
    prelude::{Error, Result},
};

pub fn parse_job_type(raw: &str) -> std::result::Result<JobType, String> {
    raw.parse::<JobType>()
        .map_err(|_| "expected one of Full-Time, Part-Time, Contract".to_string())
}

#[derive(Args, Debug)]
pub struct PostArgs {
    #[command(flatten)]
    pub remote: Remote,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub company: String,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub location: String,
    #[arg(long = "type", value_parser = parse_job_type)]
    pub job_type: JobType,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    #[command(flatten)]
    pub remote: Remote,
    pub id: Uuid,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long = "type", value_parser = parse_job_type)]
    pub job_type: Option<JobType>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub remote: Remote,
    pub id: Uuid,
}

pub fn print_job(job: &JobEntry) {
    println!(
        "{}  {} at {} ({}, {})  posted {}",
        job.id,
        job.title,
        job.company,
        job.location,
        job.job_type,
        job.created_at.format("%Y-%m-%d")
    );
}

fn report_rejection(error: Error) -> Result<()> {
    match error {
        Error::BadInput(fields) => {
            eprintln!("please fill in: {}", fields.join(", "));
            Ok(())
        }
        other => Err(other),
    }
}

pub async fn post(args: PostArgs, settings: &Settings) -> Result<()> {
    let form = JobForm {
        title: args.title,
        company: args.company,
        description: args.description,
        location: args.location,
        job_type: Some(args.job_type),
    };
    let input = match form.to_create() {
        Ok(input) => input,
        Err(e) => return report_rejection(e),
    };
    let job = args.remote.client(settings).create(&input).await?;
    print_job(&job);
    Ok(())
}

pub async fn edit(args: EditArgs, settings: &Settings) -> Result<()> {
    let client = args.remote.client(settings);
    let Some(original) = client.get_by_id(args.id).await? else {
        eprintln!("job {} not found", args.id);
        return Ok(());
    };
    if client.get_user().await?.id != original.user_id {
        eprintln!("you don't have permission to edit this job posting");
        return Ok(());
    }

    let mut form = JobForm::from_job(&original);
    if let Some(title) = args.title {
        form.title = title;
    }
    if let Some(company) = args.company {
        form.company = company;
    }
    if let Some(description) = args.description {
        form.description = description;
    }
    if let Some(location) = args.location {
        form.location = location;
    }
    if let Some(job_type) = args.job_type {
        form.job_type = Some(job_type);
    }
    let input = match form.to_update(&original) {
        Ok(input) => input,
        Err(e) => return report_rejection(e),
    };
    match client.update(&input).await? {
        Some(job) => print_job(&job),
        None => eprintln!("job {} not found", args.id),
    }
    Ok(())
}

pub async fn remove(args: RemoveArgs, settings: &Settings) -> Result<()> {
    if args.remote.client(settings).delete(args.id).await? {
        println!("deleted {}", args.id);
    } else {
        eprintln!("job {} not found", args.id);
    }
    Ok(())
}
