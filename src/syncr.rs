//! Submit a task to the platform through the syncr container and collect its result
//!
//! syncr does the actual submission and polls the task until it finishes; this module only
//! prepares its input and reads back what it leaves in the working directory.

/// Task description written for syncr (`task.yaml`)
pub mod task;
/// Run syncr and read back the task id
pub mod dispatch;
/// Task outputs and execution details written to `output.json`
pub mod result;

use anyhow::Context;
use log::{error, info, warn};

use crate::cgc::client::PlatformApi;
use crate::config::Config;
use crate::container::launch::Launcher;
use crate::payload::build::AppPayload;
use crate::request::message::Message;
use crate::request::read::read_task_argument;
use crate::request::schema::load_schema;
use crate::syncr::dispatch::{dispatch, Dispatch};
use crate::syncr::result::ResultRecord;
use crate::syncr::task::SubmissionRecord;
use crate::WorkingDirectory;

/// Turn the positional task argument into a submitted and finished platform task
///
/// Errors are failures before syncr was launched; everything after is reported in [`Dispatch`].
pub async fn submit(
    argument: &str,
    config: &Config,
    launcher: &dyn Launcher,
    api: &dyn PlatformApi,
    wd: &WorkingDirectory,
) -> anyhow::Result<Dispatch> {
    let schema = load_schema()?;
    let message = Message { content: read_task_argument(argument)?, compiled_schema: &schema };
    let task = message.read()?;

    let fields = task.input.submission_fields()?;
    info!("Preparing {} for donor {} in {}", fields.app, fields.donor_id, fields.project);
    let payload = AppPayload::build(&task.input, &fields.app.name, &fields.project, api).await?;
    let record = SubmissionRecord::new(&fields, payload, config.probing_interval)
        .context("Can't fingerprint task inputs")?;

    Ok(dispatch(&record, config, launcher, api, wd).await?)
}

/// [`submit`], reduced to the process exit code; `output.json` exists on every path
pub async fn submit_and_report(
    argument: &str,
    config: &Config,
    launcher: &dyn Launcher,
    api: &dyn PlatformApi,
    wd: &WorkingDirectory,
) -> i32 {
    match submit(argument, config, launcher, api, wd).await {
        Ok(dispatch) => dispatch.exit_code(),
        Err(err) => report_failure(&err, wd),
    }
}

/// Log a failure met before syncr was launched and leave an empty result behind
pub fn report_failure(err: &anyhow::Error, wd: &WorkingDirectory) -> i32 {
    error!("{err:#}");
    if let Err(write_err) = ResultRecord::default().write(wd) {
        warn!("{write_err}");
    }
    1
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{json, Value};

    use crate::cgc::model::{PlatformFile, PlatformTask};
    use crate::config::tests::test_config;
    use crate::container::launch::fake::{exited, ScriptedLauncher};
    use crate::payload::build::tests::FakeApi;
    use crate::payload::build::PayloadError;
    use crate::request::input::InputError;
    use crate::syncr::dispatch::TASK_INFO_FILE;

    use super::*;

    fn dkfz_task() -> String {
        json!({
            "input": {
                "cgc_project": "pcawg/sv",
                "study": "PCAWG",
                "donor_id": "DO1234",
                "app": "pcawg-dkfz-caller/5",
                "instance_type": "c4.8xlarge",
                "use_spot": true,
                "delly_task_id": "delly-1",
                "tumor-bam": "cgc://t1|tumor.bam",
                "normal-bam": "cgc://n1|normal.bam",
                "reference-gz": "cgc://r1|genome.fa.gz"
            }
        })
        .to_string()
    }

    fn api() -> FakeApi {
        FakeApi {
            files: vec![PlatformFile { id: "b1".into(), name: "DO1234.somatic.sv.bedpe.txt".into() }],
            task: Some(PlatformTask { id: "task-123".into(), ..PlatformTask::default() }),
            ..FakeApi::default()
        }
    }

    #[tokio::test]
    async fn submits_dkfz_with_resolved_bedpe() {
        let dir = tempfile::tempdir().unwrap();
        let wd = WorkingDirectory { path: dir.path().to_path_buf() };
        let info_path = dir.path().join(TASK_INFO_FILE);
        let launcher = ScriptedLauncher::new(move |_, _| {
            fs::write(&info_path, "id: task-123\n").unwrap();
            exited(0)
        });

        let dispatch = submit(&dkfz_task(), &test_config(), &launcher, &api(), &wd).await.unwrap();

        assert_eq!(dispatch.exit_code(), 0);
        assert_eq!(dispatch.result.task_id.as_deref(), Some("task-123"));
        let yaml: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(dir.path().join("task.yaml")).unwrap()).unwrap();
        assert_eq!(yaml["task"]["app"], serde_yaml::Value::from("pcawg/sv/pcawg-dkfz-caller/5"));
        assert_eq!(yaml["task"]["inputs"]["delly-bedpe"]["path"], serde_yaml::Value::from("b1"));
        assert_eq!(yaml["task"]["inputs"]["run-id"], serde_yaml::Value::from("DO1234"));
    }

    #[tokio::test]
    async fn unknown_app_never_launches() {
        let dir = tempfile::tempdir().unwrap();
        let wd = WorkingDirectory { path: dir.path().to_path_buf() };
        let launcher = ScriptedLauncher::new(|_, _| exited(0));
        let task = dkfz_task().replace("pcawg-dkfz-caller/5", "pcawg-broad-caller/1");

        let err = submit(&task, &test_config(), &launcher, &api(), &wd).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<PayloadError>(), Some(PayloadError::UnknownApp(_))));
        assert!(launcher.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_required_field_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let wd = WorkingDirectory { path: dir.path().to_path_buf() };
        let launcher = ScriptedLauncher::new(|_, _| exited(0));
        let mut task: Value = serde_json::from_str(&dkfz_task()).unwrap();
        task["input"].as_object_mut().unwrap().remove("instance_type");

        let err = submit(&task.to_string(), &test_config(), &launcher, &api(), &wd).await.unwrap_err();

        assert_eq!(err.downcast_ref::<InputError>(), Some(&InputError::MissingField("instance_type".into())));
        assert!(launcher.calls().is_empty());
    }

    fn output(dir: &std::path::Path) -> Value {
        serde_json::from_str(&fs::read_to_string(dir.join(crate::OUTPUT_FILE)).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn unknown_app_leaves_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let wd = WorkingDirectory { path: dir.path().to_path_buf() };
        let launcher = ScriptedLauncher::new(|_, _| exited(0));
        let task = dkfz_task().replace("pcawg-dkfz-caller/5", "pcawg-broad-caller/1");

        let code = submit_and_report(&task, &test_config(), &launcher, &api(), &wd).await;

        assert_eq!(code, 1);
        assert!(launcher.calls().is_empty());
        assert_eq!(
            output(dir.path()),
            json!({ "cgc_task_id": null, "cgc_task_outputs": {}, "cgc_task_details": {} })
        );
    }

    #[tokio::test]
    async fn reported_exit_code_follows_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let wd = WorkingDirectory { path: dir.path().to_path_buf() };
        let launcher = ScriptedLauncher::new(|_, _| exited(7));

        let code = submit_and_report(&dkfz_task(), &test_config(), &launcher, &api(), &wd).await;

        assert_eq!(code, 7);
        assert_eq!(output(dir.path())["cgc_task_id"], Value::Null);
    }

    #[test]
    fn client_failure_leaves_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let wd = WorkingDirectory { path: dir.path().to_path_buf() };

        assert_eq!(report_failure(&anyhow::anyhow!("no TLS backend"), &wd), 1);
        assert_eq!(output(dir.path())["cgc_task_outputs"], json!({}));
    }
}
