use std::{sync::Arc, time::Duration};

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{
    Remote,
    postings::{parse_job_type, print_job},
};
use crate::{
    conf::Settings,
    pkg::{
        client::{
            RpcClient,
            filters::{FilterDispatcher, FilterSnapshot},
        },
        internal::adaptors::jobs::spec::{JobFilters, JobType},
    },
    prelude::Result,
};

#[derive(Args, Debug)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub remote: Remote,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long = "type", value_parser = parse_job_type)]
    pub job_type: Option<JobType>,
    #[arg(long)]
    pub search: Option<String>,
    /// Only jobs posted by the token's owner
    #[arg(long)]
    pub mine: bool,
    /// Read `location=`, `type=`, `search=` and `clear` edits from stdin
    #[arg(long)]
    pub interactive: bool,
}

#[derive(Debug, PartialEq)]
enum Edit {
    Location(String),
    Search(String),
    Type(Option<JobType>),
    Clear,
}

fn parse_edit(line: &str) -> Option<Edit> {
    let line = line.trim();
    if line == "clear" {
        return Some(Edit::Clear);
    }
    let (key, value) = line.split_once('=')?;
    match key.trim() {
        "location" => Some(Edit::Location(value.to_string())),
        "search" => Some(Edit::Search(value.to_string())),
        "type" if value.is_empty() => Some(Edit::Type(None)),
        "type" => value.parse::<JobType>().ok().map(|t| Edit::Type(Some(t))),
        _ => None,
    }
}

fn print_snapshot(snapshot: &FilterSnapshot) {
    println!("-- {} jobs for {:?}", snapshot.jobs.len(), &snapshot.filters);
    snapshot.jobs.iter().for_each(print_job);
}

pub async fn run(args: BrowseArgs, settings: &Settings) -> Result<()> {
    let client = args.remote.client(settings);
    if args.mine {
        client.get_my_jobs().await?.iter().for_each(print_job);
        return Ok(());
    }
    let filters = JobFilters {
        location: args.location,
        job_type: args.job_type,
        search: args.search,
    }
    .normalized();
    if !args.interactive {
        client.get_all(&filters).await?.iter().for_each(print_job);
        return Ok(());
    }
    interactive(
        client,
        filters,
        Duration::from_millis(settings.filter_debounce_ms),
    )
    .await
}

async fn interactive(client: RpcClient, initial: JobFilters, debounce: Duration) -> Result<()> {
    let mut dispatcher = FilterDispatcher::new(Arc::new(client), debounce);
    let mut rx = dispatcher.subscribe();
    if let Some(location) = &initial.location {
        dispatcher.set_location(location);
    }
    if let Some(search) = &initial.search {
        dispatcher.set_search(search);
    }
    dispatcher.set_type(initial.job_type);
    let mut last = dispatcher.refresh();
    let mut printed = 0;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => match parse_edit(&line) {
                    Some(Edit::Location(v)) => last = dispatcher.set_location(&v),
                    Some(Edit::Search(v)) => last = dispatcher.set_search(&v),
                    Some(Edit::Type(t)) => last = dispatcher.set_type(t),
                    Some(Edit::Clear) => last = dispatcher.clear(),
                    None => eprintln!("unrecognized edit: {}", line),
                },
                None => break,
            },
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                printed = snapshot.generation;
                print_snapshot(&snapshot);
            }
        }
    }

    if printed < last {
        let wait = debounce + Duration::from_secs(5);
        if let Ok(Ok(snapshot)) =
            tokio::time::timeout(wait, rx.wait_for(|s| s.generation >= last)).await
        {
            print_snapshot(&snapshot.clone());
        }
    }
    Ok(())
}
