use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::activity::DEFAULT_WINDOW_DAYS;
use crate::auth::Token;
use crate::error;
use crate::models::RepoKey;
use crate::providers::github::{GitHubProvider, PollOptions, DEFAULT_API_URL};
use crate::query::{QueryOrchestrator, RepoView};
use crate::report::DashboardReport;

const DEFAULT_REPOSITORY: &str = "Term-5-CSD-ESC-Ascenda-BNB/web";

#[derive(Parser)]
#[command(name = "commitlens")]
#[command(author, version, about = "Commit activity insights for GitHub repositories", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// GitHub API token (optional, raises the rate limit)
    #[arg(short, long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Attempts while GitHub is still computing statistics
    #[arg(long, global = true, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// Delay between attempts, in milliseconds
    #[arg(long, global = true, default_value_t = 2000)]
    retry_delay_ms: u64,

    /// Number of days of activity to report
    #[arg(short, long, global = true, default_value_t = DEFAULT_WINDOW_DAYS)]
    window_days: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily commit counts for a repository
    Activity {
        /// Repository as "owner/repo"
        repo: RepoKey,
    },
    /// Contributors of a repository (first 100)
    Contributors {
        /// Repository as "owner/repo"
        repo: RepoKey,
    },
    /// Activity and contributors together, each with its own status
    Dashboard {
        /// Repository as "owner/repo"
        #[arg(default_value = DEFAULT_REPOSITORY)]
        repo: RepoKey,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let orchestrator = Arc::new(self.orchestrator()?);

        let json_output = match &self.command {
            Commands::Activity { repo } => {
                info!("Collecting commit activity for repository: {repo}");
                let series = orchestrator.commit_activity(repo).await?;
                self.to_json(&*series)?
            }
            Commands::Contributors { repo } => {
                info!("Collecting contributors for repository: {repo}");
                let contributors = orchestrator.contributors(repo).await?;
                self.to_json(&*contributors)?
            }
            Commands::Dashboard { repo } => {
                info!("Collecting dashboard for repository: {repo}");
                let view = RepoView::new(Arc::clone(&orchestrator));
                view.select(repo.clone());
                view.settle().await;

                let report = DashboardReport::new(view.snapshot(), orchestrator.window_days());
                self.to_json(&report)?
            }
        };

        self.write_output(&json_output)?;

        Ok(())
    }

    fn write_output(&self, json_output: &str) -> error::Result<()> {
        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Insights written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }

    fn orchestrator(&self) -> Result<QueryOrchestrator> {
        let retry_delay = Duration::from_millis(self.retry_delay_ms);
        let poll = PollOptions::new(self.max_attempts, retry_delay)?;
        let token = Token::from_optional(self.token.as_deref());
        let provider = GitHubProvider::new(&self.api_url, token, poll)?;

        Ok(QueryOrchestrator::new(Arc::new(provider), self.window_days))
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> error::Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}
