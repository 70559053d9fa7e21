use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use log::info;
use tokio::process::Command;

use crate::container::command::ContainerCommand;

/// Exit status and fully captured output streams of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Pass the captured streams through to this process's own stdout and stderr
    pub fn echo(&self) {
        print!("{}", self.stdout);
        eprint!("{}", self.stderr);
    }
}

/// Runs a command to completion
///
/// There is no timeout: a process that never exits blocks the caller forever.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, command: &ContainerCommand) -> io::Result<ProcessOutcome>;
}

pub struct ProcessLauncher;

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, command: &ContainerCommand) -> io::Result<ProcessOutcome> {
        info!("Running {command}");
        let output = Command::new(&command.program)
            .args(&command.args)
            .envs(command.envs.iter().map(|(name, value)| (name, value)))
            .stdin(Stdio::null())
            .output()
            .await?;

        let outcome = ProcessOutcome {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        info!("{} exited with {}", command.program.display(), output.status);
        Ok(outcome)
    }
}
