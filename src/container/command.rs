use std::fmt;
use std::path::{Path, PathBuf};

/// A fully resolved command line for the container runtime
///
/// `envs` are set on the runtime process only. Containers receive them through `-e NAME`
/// arguments, so values never appear on the command line.
#[derive(Clone, PartialEq, Eq)]
pub struct ContainerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl ContainerCommand {
    pub fn pull(runtime: &Path, image: &str) -> ContainerCommand {
        ContainerCommand {
            program: runtime.to_path_buf(),
            args: vec!["pull".to_string(), image.to_string()],
            envs: Vec::new(),
        }
    }
}

impl fmt::Display for ContainerCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContainerCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let env_names: Vec<&str> = self.envs.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("ContainerCommand")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("envs", &env_names)
            .finish()
    }
}

/// Builder for `<runtime> run [options] <image> [args]`
#[derive(Clone, Default)]
pub struct ContainerRun {
    image: String,
    remove: bool,
    envs: Vec<(String, String)>,
    volumes: Vec<(PathBuf, String)>,
    workdir: Option<String>,
    args: Vec<String>,
}

impl ContainerRun {
    pub fn new(image: &str) -> ContainerRun {
        ContainerRun { image: image.to_string(), ..ContainerRun::default() }
    }

    /// Remove the container once it exits
    pub fn remove(mut self) -> Self {
        self.remove = true;
        self
    }

    pub fn env(mut self, name: &str, value: &str) -> Self {
        self.envs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn envs(self, envs: Vec<(String, String)>) -> Self {
        envs.iter().fold(self, |run, (name, value)| run.env(name, value))
    }

    pub fn volume(mut self, host: &Path, container: &str) -> Self {
        self.volumes.push((host.to_path_buf(), container.to_string()));
        self
    }

    pub fn workdir(mut self, dir: &str) -> Self {
        self.workdir = Some(dir.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn command(self, runtime: &Path) -> ContainerCommand {
        let mut args = vec!["run".to_string()];
        if self.remove {
            args.push("--rm".to_string());
        }
        for (name, _) in &self.envs {
            args.push("-e".to_string());
            args.push(name.clone());
        }
        for (host, container) in &self.volumes {
            args.push("-v".to_string());
            args.push(format!("{}:{}", host.display(), container));
        }
        if let Some(dir) = self.workdir {
            args.push("--workdir".to_string());
            args.push(dir);
        }
        args.push(self.image);
        args.extend(self.args);

        ContainerCommand { program: runtime.to_path_buf(), args, envs: self.envs }
    }
}
