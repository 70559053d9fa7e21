use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::info;
use serde::Serialize;

use crate::payload::build::AppPayload;
use crate::request::input::SubmissionFields;
use crate::syncr::dispatch::DispatchError;
use crate::WorkingDirectory;

/// syncr reads its task description from this file in its working directory
pub const TASK_FILE: &str = "task.yaml";

/// Task description handed to syncr
///
/// `meta` is a list of single-entry mappings, the layout syncr copies onto the platform task as
/// metadata. Written once and never read back.
#[derive(Debug, Serialize)]
pub struct SubmissionRecord {
    pub probing_interval: u64,
    pub meta: Vec<BTreeMap<&'static str, String>>,
    pub task: TaskSpec,
}

#[derive(Debug, Serialize)]
pub struct TaskSpec {
    pub project: String,
    pub app: String,
    pub execution_settings: InstanceSettings,
    pub use_interruptible_instances: bool,
    pub inputs: AppPayload,
}

#[derive(Debug, Serialize)]
pub struct InstanceSettings {
    pub instance_type: String,
}

impl SubmissionRecord {
    pub fn new(fields: &SubmissionFields, inputs: AppPayload, probing_interval: u64) -> Result<SubmissionRecord, serde_json::Error> {
        let input_hash = inputs.fingerprint()?;
        info!("Input fingerprint of {}: {input_hash}", fields.app);

        let meta = [
            ("study", fields.study.clone()),
            ("donor_id", fields.donor_id.clone()),
            ("app_name", fields.app.name.clone()),
            ("app_rev", fields.app.revision.clone()),
            ("input_hash", input_hash),
        ]
        .into_iter()
        .map(|(key, value)| BTreeMap::from([(key, value)]))
        .collect();

        Ok(SubmissionRecord {
            probing_interval,
            meta,
            task: TaskSpec {
                project: fields.project.clone(),
                app: format!("{}/{}", fields.project, fields.app),
                execution_settings: InstanceSettings { instance_type: fields.instance_type.clone() },
                use_interruptible_instances: fields.use_spot,
                inputs,
            },
        })
    }

    pub fn input_hash(&self) -> Option<&str> {
        self.meta.iter().find_map(|tag| tag.get("input_hash")).map(String::as_str)
    }

    /// Write the record as YAML to the working directory
    pub fn write(&self, wd: &WorkingDirectory) -> Result<PathBuf, DispatchError> {
        let out_path = wd.path.join(TASK_FILE);
        info!("Writing task description to {}", out_path.display());
        let yaml = serde_yaml::to_string(self)?;
        fs::write(&out_path, yaml).map_err(|source| DispatchError::Write { path: out_path.clone(), source })?;
        Ok(out_path)
    }
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;

    use crate::payload::build::{FileParam, ParamValue};
    use crate::request::file_ref::FileRef;

    use super::*;

    fn fields() -> SubmissionFields {
        SubmissionFields {
            project: "pcawg/sv-calling".to_string(),
            study: "PCAWG".to_string(),
            donor_id: "DO1234".to_string(),
            app: "pcawg-sanger-caller/2".parse().unwrap(),
            instance_type: "r4.8xlarge".to_string(),
            use_spot: false,
        }
    }

    fn payload() -> AppPayload {
        [("tumor".to_string(), ParamValue::File(FileParam::from(FileRef::parse("cgc://t1|tumor.bam"))))]
            .into_iter()
            .collect()
    }

    #[test]
    fn assembles_task_and_meta() {
        let record = SubmissionRecord::new(&fields(), payload(), 300).unwrap();
        assert_eq!(record.task.app, "pcawg/sv-calling/pcawg-sanger-caller/2");
        assert_eq!(record.meta.len(), 5);
        assert_eq!(record.meta[2].get("app_name").map(String::as_str), Some("pcawg-sanger-caller"));
        assert_eq!(record.input_hash(), Some(payload().fingerprint().unwrap().as_str()));
    }

    #[test]
    fn writes_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let wd = WorkingDirectory { path: dir.path().to_path_buf() };
        let record = SubmissionRecord::new(&fields(), payload(), 120).unwrap();

        let path = record.write(&wd).unwrap();

        let yaml: Value = serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(yaml["probing_interval"], Value::from(120));
        assert_eq!(yaml["task"]["execution_settings"]["instance_type"], Value::from("r4.8xlarge"));
        assert_eq!(yaml["task"]["use_interruptible_instances"], Value::from(false));
        assert_eq!(yaml["task"]["inputs"]["tumor"]["class"], Value::from("File"));
        assert_eq!(yaml["task"]["inputs"]["tumor"]["path"], Value::from("t1"));
        assert_eq!(yaml["meta"][0]["study"], Value::from("PCAWG"));
    }
}
