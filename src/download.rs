//! Bulk download of platform files into the working directory
//!
//! One container run per file, one at a time. A failed download does not stop the rest.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use log::{error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::container::command::{ContainerCommand, ContainerRun};
use crate::container::launch::Launcher;
use crate::request::input::{InputError, TaskInput};
use crate::request::message::Message;
use crate::request::read::read_task_argument;
use crate::request::schema::load_schema;
use crate::{WorkingDirectory, OUTPUT_FILE};

/// Input field listing the files to fetch
const OUTPUTS_FIELD: &str = "cgc_task_outputs";
/// The working directory as seen inside the download container
const CONTAINER_DATA_DIR: &str = "/data";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("no download image configured (--download-image / CGC_DOWNLOAD_IMAGE)")]
    MissingImage,
    #[error("can't launch {command}: {source}")]
    Launch { command: String, source: io::Error },
    #[error("{command} exited with status {code:?}")]
    Exit { command: String, code: Option<i32> },
}

impl DownloadError {
    fn process_code(&self) -> Option<i32> {
        match self {
            DownloadError::Exit { code, .. } => *code,
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoteFile {
    path: String,
}

/// Either a list of file descriptors or the `{name: descriptor}` mapping `submit` writes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteFiles {
    List(Vec<RemoteFile>),
    Named(BTreeMap<String, RemoteFile>),
}

/// Platform ids of the files to download, in list order or key order for the mapping form
pub fn remote_file_ids(input: &TaskInput) -> Result<Vec<String>, InputError> {
    let value = input
        .get(OUTPUTS_FIELD)
        .ok_or_else(|| InputError::MissingField(OUTPUTS_FIELD.to_string()))?;
    let files = RemoteFiles::deserialize(value).map_err(|err| InputError::InvalidField {
        field: OUTPUTS_FIELD.to_string(),
        reason: err.to_string(),
    })?;
    let ids = match files {
        RemoteFiles::List(files) => files.into_iter().map(|f| f.path).collect(),
        RemoteFiles::Named(files) => files.into_values().map(|f| f.path).collect(),
    };
    Ok(ids)
}

/// `output.json` of a download: just where the files went
#[derive(Debug, Serialize)]
pub struct DownloadRecord {
    pub output_dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct Download {
    pub attempted: usize,
    pub failures: Vec<DownloadError>,
}

impl Download {
    /// 0 on success, else the first non-zero download exit code, else 1
    pub fn exit_code(&self) -> i32 {
        if self.failures.is_empty() {
            return 0;
        }
        self.failures
            .iter()
            .find_map(DownloadError::process_code)
            .filter(|code| *code != 0)
            .unwrap_or(1)
    }
}

pub fn download_command(config: &Config, image: &str, wd: &WorkingDirectory, file_id: &str) -> ContainerCommand {
    ContainerRun::new(image)
        .remove()
        .envs(config.forwarded_env())
        .volume(&wd.path, CONTAINER_DATA_DIR)
        .arg("download")
        .arg("--id")
        .arg(file_id)
        .arg("--output-dir")
        .arg(CONTAINER_DATA_DIR)
        .command(&config.container_runtime)
}

/// Pull the download image, then fetch every file in turn
///
/// Only a failed pull stops early. The caller still writes `output.json` in that case.
pub async fn download_all(
    file_ids: &[String],
    config: &Config,
    launcher: &dyn Launcher,
    wd: &WorkingDirectory,
) -> Result<Download, DownloadError> {
    let image = config.download_image.as_deref().ok_or(DownloadError::MissingImage)?;
    run(launcher, &ContainerCommand::pull(&config.container_runtime, image)).await?;

    let mut download = Download::default();
    for file_id in file_ids {
        info!("Downloading {file_id} to {}", wd.path.display());
        download.attempted += 1;
        let command = download_command(config, image, wd, file_id);
        if let Err(err) = run(launcher, &command).await {
            error!("{err}");
            download.failures.push(err);
        }
    }

    info!("Downloaded {} of {} files", download.attempted - download.failures.len(), file_ids.len());
    Ok(download)
}

async fn run(launcher: &dyn Launcher, command: &ContainerCommand) -> Result<(), DownloadError> {
    let outcome = launcher
        .launch(command)
        .await
        .map_err(|source| DownloadError::Launch { command: command.to_string(), source })?;
    outcome.echo();
    match outcome.success() {
        true => Ok(()),
        false => Err(DownloadError::Exit { command: command.to_string(), code: outcome.code }),
    }
}

/// Write `output.json` pointing at the working directory
pub fn write_output(wd: &WorkingDirectory) -> anyhow::Result<()> {
    let out_path = wd.path.join(OUTPUT_FILE);
    info!("Writing download result to {}", out_path.display());
    let record = DownloadRecord { output_dir: wd.path.clone() };
    fs::write(&out_path, serde_json::to_string(&record)?)
        .with_context(|| format!("Can't write {}", out_path.display()))
}

/// Download every file named in the positional task argument; returns the exit code
///
/// `output.json` is written whatever happens, including when the message itself is unusable.
pub async fn download(argument: &str, config: &Config, launcher: &dyn Launcher, wd: &WorkingDirectory) -> anyhow::Result<i32> {
    let code = match requested_ids(argument) {
        Ok(file_ids) => match download_all(&file_ids, config, launcher, wd).await {
            Ok(download) => download.exit_code(),
            Err(err) => {
                error!("{err}");
                err.process_code().filter(|code| *code != 0).unwrap_or(1)
            }
        },
        Err(err) => {
            error!("{err:#}");
            1
        }
    };
    write_output(wd)?;
    Ok(code)
}

fn requested_ids(argument: &str) -> anyhow::Result<Vec<String>> {
    let schema = load_schema()?;
    let message = Message { content: read_task_argument(argument)?, compiled_schema: &schema };
    let task = message.read()?;
    Ok(remote_file_ids(&task.input)?)
}
