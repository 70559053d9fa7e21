use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cgc::client::{ApiError, PlatformApi};
use crate::payload::app::{self, Source};
use crate::request::file_ref::FileRef;
use crate::request::input::{InputError, TaskInput};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unknown application '{0}'")]
    UnknownApp(String),
    #[error("no output of task {task_id} has a name ending in '{suffix}'")]
    UpstreamOutputNotFound { task_id: String, suffix: String },
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileClass {
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileParam {
    pub class: FileClass,
    pub path: String,
    pub name: String,
}

impl From<FileRef> for FileParam {
    fn from(file: FileRef) -> Self {
        FileParam { class: FileClass::File, path: file.id, name: file.name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    File(FileParam),
    Text(String),
}

/// Parameters of one application, keyed by the names the application declares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppPayload {
    params: BTreeMap<String, ParamValue>,
}

impl AppPayload {
    /// Resolve `input` against the parameter table of `app_name`
    ///
    /// `api` is only queried for parameters taken from an upstream task's outputs, looked up in
    /// `project`.
    pub async fn build(input: &TaskInput, app_name: &str, project: &str, api: &dyn PlatformApi) -> Result<AppPayload, PayloadError> {
        let spec = app::lookup(app_name).ok_or_else(|| PayloadError::UnknownApp(app_name.to_string()))?;
        info!("Building {} parameters for {}", spec.fields.len(), spec.name);

        let mut params = BTreeMap::new();
        for field in spec.fields {
            let value = match field.source {
                Source::DonorId => ParamValue::Text(input.require_str("donor_id")?.to_string()),
                Source::File(from) => {
                    let file = input.file_ref(from)?;
                    if file.id.is_empty() {
                        warn!("No file given for {}, submitting an empty reference", field.target);
                    }
                    ParamValue::File(file.into())
                }
                Source::UpstreamOutput { task_field, suffix } => {
                    let task_id = input.require_str(task_field)?;
                    ParamValue::File(upstream_output(api, project, task_id, suffix).await?.into())
                }
            };
            params.insert(field.target.to_string(), value);
        }

        Ok(AppPayload { params })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.params.iter()
    }
}

impl FromIterator<(String, ParamValue)> for AppPayload {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        AppPayload { params: iter.into_iter().collect() }
    }
}

/// First file produced by `task_id` whose name ends in `suffix`
async fn upstream_output(api: &dyn PlatformApi, project: &str, task_id: &str, suffix: &str) -> Result<FileRef, PayloadError> {
    let files = api.files_from_task(project, task_id).await?;
    let file = files
        .into_iter()
        .find(|file| file.name.ends_with(suffix))
        .ok_or_else(|| PayloadError::UpstreamOutputNotFound {
            task_id: task_id.to_string(),
            suffix: suffix.to_string(),
        })?;
    info!("Using {} ({}) from task {task_id}", file.name, file.id);
    Ok(FileRef { id: file.id, name: file.name })
}
