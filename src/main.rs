use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{error, info};

use crate::cgc::client::HttpApi;
use crate::config::{Config, PlatformArgs};
use crate::container::launch::ProcessLauncher;

mod cgc;
mod config;
mod container;
mod download;
mod payload;
mod request;
mod syncr;

/// Result file every subcommand leaves in the working directory
pub const OUTPUT_FILE: &str = "output.json";

/// Directory shared with the containers; every file this tool reads or writes lives here
pub struct WorkingDirectory {
    pub path: PathBuf,
}

/// Run PCAWG caller tasks on the Cancer Genomics Cloud
#[derive(Parser)]
#[command(name = "cgc-task", author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    platform: PlatformArgs,
    /// Working directory mounted into containers [default: current directory]
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a task through syncr, wait for it and collect its outputs
    Submit {
        /// Task message as JSON, or @path to a file holding it
        task: String,
    },
    /// Download task output files into the working directory
    Download {
        /// Task message as JSON, or @path to a file holding it
        task: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => ExitCode::from(exit_status(code)),
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<i32> {
    let wd = working_directory(args.work_dir)?;
    let config = Config::from(args.platform);
    info!("Working directory: {}", wd.path.display());

    match args.command {
        Command::Submit { task } => match HttpApi::new(&config.api_endpoint, &config.auth_token, config.api_timeout) {
            Ok(api) => Ok(syncr::submit_and_report(&task, &config, &ProcessLauncher, &api, &wd).await),
            Err(err) => Ok(syncr::report_failure(&err.context("Can't build API client"), &wd)),
        },
        Command::Download { task } => download::download(&task, &config, &ProcessLauncher, &wd).await,
    }
}

/// Containers need an absolute host path to mount
fn working_directory(dir: Option<PathBuf>) -> anyhow::Result<WorkingDirectory> {
    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Can't read current directory")?,
    };
    let path = dir
        .canonicalize()
        .with_context(|| format!("Can't resolve working directory {}", dir.display()))?;
    Ok(WorkingDirectory { path })
}

/// Codes outside the portable range collapse to a generic failure
fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
