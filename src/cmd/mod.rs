use clap::{Args, Parser, Subcommand};

use crate::{
    conf::{Settings, settings},
    pkg::{client::RpcClient, server::listen},
    prelude::Result,
};

mod browse;
mod migrate;
mod postings;

#[derive(Parser)]
#[command(about = "job board service and client")]
struct Cmd {
    #[command(subcommand)]
    command: Option<SubCommandType>,
}

#[derive(Subcommand)]
enum SubCommandType {
    Listen,
    Migrate,
    /// List jobs from a running server
    Browse(browse::BrowseArgs),
    /// Post a new job
    Post(postings::PostArgs),
    /// Edit one of your jobs
    Edit(postings::EditArgs),
    /// Delete one of your jobs
    Remove(postings::RemoveArgs),
    /// Show the identity bound to a token
    Whoami(Remote),
}

/// Where to reach the server and who to call it as.
#[derive(Args, Debug, Clone)]
pub struct Remote {
    /// Defaults to BASE_URL
    #[arg(long)]
    pub base_url: Option<String>,
    /// Bearer token issued by the identity provider
    #[arg(long)]
    pub token: Option<String>,
}

impl Remote {
    pub fn client(&self, conf: &Settings) -> RpcClient {
        let client = RpcClient::new(self.base_url.as_deref().unwrap_or(&conf.base_url));
        match &self.token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        }
    }
}

pub async fn run() -> Result<()> {
    let args = Cmd::parse();
    match args.command {
        Some(SubCommandType::Listen) => {
            listen(&settings).await?;
        }
        Some(SubCommandType::Migrate) => {
            migrate::apply(&settings).await?;
        }
        Some(SubCommandType::Browse(args)) => {
            browse::run(args, &settings).await?;
        }
        Some(SubCommandType::Post(args)) => {
            postings::post(args, &settings).await?;
        }
        Some(SubCommandType::Edit(args)) => {
            postings::edit(args, &settings).await?;
        }
        Some(SubCommandType::Remove(args)) => {
            postings::remove(args, &settings).await?;
        }
        Some(SubCommandType::Whoami(remote)) => {
            let caller = remote.client(&settings).get_user().await?;
            println!("{} {}", caller.id, caller.email.unwrap_or_default());
        }
        None => {
            tracing::error!("no subcommand passed");
        }
    }
    Ok(())
}
