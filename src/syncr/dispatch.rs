use std::fs;
use std::io;
use std::path::PathBuf;

use log::{error, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::cgc::client::{ApiError, PlatformApi};
use crate::config::Config;
use crate::container::command::{ContainerCommand, ContainerRun};
use crate::container::launch::Launcher;
use crate::syncr::result::ResultRecord;
use crate::syncr::task::SubmissionRecord;
use crate::WorkingDirectory;

/// syncr writes the submitted task's id here once the task is done
pub const TASK_INFO_FILE: &str = "_task_info";
/// The working directory as seen inside the syncr container
const CONTAINER_WORKDIR: &str = "/workdir";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("can't write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("can't serialise task description: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("can't serialise task result: {0}")]
    Json(#[source] serde_json::Error),
    #[error("can't launch {command}: {source}")]
    Launch { command: String, source: io::Error },
    #[error("{command} exited with status {code}")]
    Exit { command: String, code: i32 },
    #[error("{command} was terminated by a signal")]
    Terminated { command: String },
    #[error("{0} was not written by syncr")]
    TaskInfoMissing(PathBuf),
    #[error("can't read {path}: {reason}")]
    TaskInfo { path: PathBuf, reason: String },
    #[error("can't collect details of task {task_id}: {source}")]
    Api { task_id: String, source: ApiError },
}

impl DispatchError {
    /// The failing process's own exit code, when this error carries one
    pub fn process_code(&self) -> Option<i32> {
        match self {
            DispatchError::Exit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Side effect file contents; syncr may write more than the id
#[derive(Debug, Deserialize)]
struct TaskInfo {
    id: Option<String>,
}

/// What a dispatch produced, including every failure met after syncr was launched
#[derive(Debug)]
pub struct Dispatch {
    pub result: ResultRecord,
    pub failures: Vec<DispatchError>,
}

impl Dispatch {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// 0 on success, else the first non-zero process exit code, else 1
    pub fn exit_code(&self) -> i32 {
        if self.succeeded() {
            return 0;
        }
        self.failures
            .iter()
            .find_map(DispatchError::process_code)
            .filter(|code| *code != 0)
            .unwrap_or(1)
    }
}

/// The syncr invocation for a working directory
pub fn syncr_command(config: &Config, wd: &WorkingDirectory) -> ContainerCommand {
    ContainerRun::new(&config.syncr_image)
        .remove()
        .envs(config.forwarded_env())
        .volume(&wd.path, CONTAINER_WORKDIR)
        .workdir(CONTAINER_WORKDIR)
        .arg("sbg_task")
        .command(&config.container_runtime)
}

/// Submit a task through syncr and collect its result
///
/// Writes the task description, runs syncr until it exits, reads back the task id and asks the
/// platform for the task's outputs. `output.json` is written whatever happens after launch; only
/// failures before launch are returned as `Err`.
pub async fn dispatch(
    record: &SubmissionRecord,
    config: &Config,
    launcher: &dyn Launcher,
    api: &dyn PlatformApi,
    wd: &WorkingDirectory,
) -> Result<Dispatch, DispatchError> {
    record.write(wd)?;
    if let Some(hash) = record.input_hash() {
        info!("Submitting task with input fingerprint {hash}");
    }

    let mut failures: Vec<DispatchError> = Vec::new();
    let command = syncr_command(config, wd);
    let launched = match launcher.launch(&command).await {
        Ok(outcome) => {
            outcome.echo();
            match outcome.code {
                Some(0) => info!("syncr finished"),
                Some(code) => failures.push(DispatchError::Exit { command: command.to_string(), code }),
                None => failures.push(DispatchError::Terminated { command: command.to_string() }),
            }
            true
        }
        Err(source) => {
            failures.push(DispatchError::Launch { command: command.to_string(), source });
            false
        }
    };

    let mut result = ResultRecord::default();
    // a task info file is only syncr's when syncr actually ran
    let task_info = if launched { read_task_info(wd) } else { Ok(None) };
    match task_info {
        Ok(Some(task_id)) => {
            info!("Platform task id: {task_id}");
            result = ResultRecord::for_task(&task_id);
            match api.task(&task_id).await {
                Ok(task) => result.collect(&task),
                Err(source) => failures.push(DispatchError::Api { task_id, source }),
            }
        }
        Ok(None) if launched => warn!("{TASK_INFO_FILE} has no task id"),
        Ok(None) => {}
        Err(err) => failures.push(err),
    }

    if let Err(err) = result.write(wd) {
        failures.push(err);
    }
    for failure in &failures {
        error!("{failure}");
    }

    Ok(Dispatch { result, failures })
}

fn read_task_info(wd: &WorkingDirectory) -> Result<Option<String>, DispatchError> {
    let path = wd.path.join(TASK_INFO_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(DispatchError::TaskInfoMissing(path)),
        Err(err) => return Err(DispatchError::TaskInfo { path, reason: err.to_string() }),
    };
    let info: Option<TaskInfo> = serde_yaml::from_str(&content)
        .map_err(|err| DispatchError::TaskInfo { path: path.clone(), reason: err.to_string() })?;
    Ok(info.and_then(|info| info.id))
}
