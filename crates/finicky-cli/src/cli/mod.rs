//! CLI for the Finicky URL routing daemon.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use finicky_core::config;
use finicky_core::dispatch::DaemonContext;
use finicky_core::policy::PolicySearch;
use std::path::PathBuf;

use commands::{run_check, run_daemon, run_resolve, run_test_url};

/// Top-level CLI for the Finicky URL routing daemon.
#[derive(Debug, Parser)]
#[command(name = "finicky")]
#[command(about = "Finicky: route URLs to the right browser with a scriptable policy", long_about = None)]
pub struct Cli {
    /// Policy script to use instead of searching for `.finicky.js`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Simple JSON policy to use instead of searching for `.finicky.json`.
    #[arg(long, global = true, value_name = "PATH")]
    pub simple_config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Handle URLs from the command line and stdin until idle.
    Run {
        /// URLs to open, handled in order before anything read from stdin.
        urls: Vec<String>,
        /// Do not read further events from stdin.
        #[arg(long)]
        no_stdin: bool,
    },

    /// Load, merge and validate the policy without opening anything.
    Check,

    /// Show which browser a URL would open in, without launching it.
    TestUrl {
        url: String,
        /// Process id reported to the policy as the opener.
        #[arg(long, default_value = "0", value_name = "N")]
        pid: i32,
    },

    /// Expand a shortened URL using the built-in shortener list.
    Resolve { url: String },
}

impl Cli {
    fn policy_search(&self) -> Result<PolicySearch> {
        if self.config.is_some() || self.simple_config.is_some() {
            Ok(PolicySearch::explicit(
                self.config.clone(),
                self.simple_config.clone(),
            ))
        } else {
            PolicySearch::from_env()
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_default()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Resolve { ref url } => run_resolve(&cfg, url).await?,
            CliCommand::Run { ref urls, no_stdin } => {
                let ctx = DaemonContext::system(cfg, cli.policy_search()?);
                run_daemon(ctx, urls.clone(), !no_stdin).await?;
            }
            CliCommand::Check => {
                let ctx = DaemonContext::system(cfg, cli.policy_search()?);
                run_check(ctx).await?;
            }
            CliCommand::TestUrl { ref url, pid } => {
                let ctx = DaemonContext::system(cfg, cli.policy_search()?);
                run_test_url(ctx, url, pid).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
