use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cgc::model::PlatformTask;
use crate::syncr::dispatch::DispatchError;
use crate::{WorkingDirectory, OUTPUT_FILE};

/// Contents of `output.json` after a submission
///
/// Written on every path. Fields stay empty when the platform task id or its details could not
/// be obtained.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultRecord {
    #[serde(rename = "cgc_task_id")]
    pub task_id: Option<String>,
    #[serde(rename = "cgc_task_outputs")]
    pub outputs: BTreeMap<String, OutputFile>,
    #[serde(rename = "cgc_task_details")]
    pub details: ExecutionDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub name: String,
    pub path: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_instance: Option<bool>,
}

impl ResultRecord {
    pub fn for_task(task_id: &str) -> ResultRecord {
        ResultRecord { task_id: Some(task_id.to_string()), ..ResultRecord::default() }
    }

    /// Fill outputs and execution details from the finished platform task
    ///
    /// Only outputs of class `File` are kept; lists, directories and plain values are skipped.
    pub fn collect(&mut self, task: &PlatformTask) {
        for (name, value) in &task.outputs {
            if value.get("class").and_then(Value::as_str) != Some("File") {
                continue;
            }
            match serde_json::from_value::<OutputFile>(value.clone()) {
                Ok(file) => {
                    self.outputs.insert(name.clone(), file);
                }
                Err(err) => warn!("Skipping malformed file output {name}: {err}"),
            }
        }

        self.details = ExecutionDetails {
            start_time: task.start_time,
            executed_by: task.executed_by.clone(),
            instance_type: task.execution_settings.as_ref().and_then(|s| s.instance_type.clone()),
            execution_duration: task.execution_status.as_ref().and_then(|s| s.execution_duration),
            price: task.price.as_ref().map(|p| p.amount.clone()),
            spot_instance: task.use_interruptible_instances,
        };
        info!("Collected {} file outputs of task {}", self.outputs.len(), task.id);
    }

    pub fn write(&self, wd: &WorkingDirectory) -> Result<PathBuf, DispatchError> {
        let out_path = wd.path.join(OUTPUT_FILE);
        info!("Writing task result to {}", out_path.display());
        let json = serde_json::to_string(self).map_err(DispatchError::Json)?;
        fs::write(&out_path, json).map_err(|source| DispatchError::Write { path: out_path.clone(), source })?;
        Ok(out_path)
    }
}
