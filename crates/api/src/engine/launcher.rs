//! Fire-and-forget launch of the external generation worker.
//!
//! The worker has no return channel to this process: it reports progress
//! only by rewriting the job's `meta.json`. A background task drains its
//! output into the log and reaps it when it exits.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use flowgen_core::types::JobId;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::config::WorkerConfig;

/// Everything the worker needs to run one job.
#[derive(Clone)]
pub struct LaunchRequest {
    pub job_id: JobId,
    pub prompts_file: PathBuf,
    pub output_dir: PathBuf,
    pub meta_path: PathBuf,
    pub max_tabs: u32,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for LaunchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchRequest")
            .field("job_id", &self.job_id)
            .field("prompts_file", &self.prompts_file)
            .field("output_dir", &self.output_dir)
            .field("meta_path", &self.meta_path)
            .field("max_tabs", &self.max_tabs)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Errors that can occur while starting the worker.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Failed to spawn worker '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker exited before its pid could be read")]
    MissingPid,

    #[error("No async runtime available to supervise the worker")]
    NoRuntime,
}

/// Starts the worker for an admitted job.
///
/// Implementations must return as soon as the process is running; the
/// caller never waits for the job itself.
pub trait WorkerLauncher: Send + Sync {
    /// Start the worker and return its process id.
    fn launch(&self, request: &LaunchRequest) -> Result<u32, LaunchError>;
}

/// Launches the worker as a child process described by [`WorkerConfig`].
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    config: WorkerConfig,
}

impl ProcessLauncher {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Full argument list passed to [`WorkerConfig::program`].
    ///
    /// The password is not part of it; it travels in `GEMINI_PASSWORD` so it
    /// does not show up in process listings.
    pub fn arguments(&self, request: &LaunchRequest) -> Vec<String> {
        let mut args = self.config.program_args.clone();
        args.push(self.config.script.clone());
        args.push(format!("--promptFile={}", request.prompts_file.display()));
        args.push(format!("--outputDir={}", request.output_dir.display()));
        args.push(format!("--jobMeta={}", request.meta_path.display()));
        args.push(format!("--maxTabs={}", request.max_tabs));
        if let Some(email) = &request.email {
            args.push(format!("--email={email}"));
        }
        args.push(format!("--headless={}", self.config.headless));
        args
    }

    /// The configured command, ready to spawn.
    pub fn command(&self, request: &LaunchRequest) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(self.arguments(request))
            .current_dir(&self.config.workdir)
            .env("HEADLESS", self.config.headless.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        if let Some(password) = &request.password {
            cmd.env("GEMINI_PASSWORD", password);
        }
        cmd
    }
}

impl WorkerLauncher for ProcessLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<u32, LaunchError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| LaunchError::NoRuntime)?;

        let child = self
            .command(request)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;
        let pid = child.id().ok_or(LaunchError::MissingPid)?;

        tracing::info!(job_id = %request.job_id, pid, "Worker launched");
        runtime.spawn(supervise(request.job_id.clone(), pid, child));
        Ok(pid)
    }
}

/// Drain the worker's output into the log and reap it on exit.
async fn supervise(job_id: JobId, pid: u32, mut child: Child) {
    let stdout = child.stdout.take().map(|out| {
        tokio::spawn(forward_lines(job_id.clone(), "stdout", out))
    });
    let stderr = child.stderr.take().map(|err| {
        tokio::spawn(forward_lines(job_id.clone(), "stderr", err))
    });

    match child.wait().await {
        Ok(status) if status.success() => {
            tracing::info!(job_id = %job_id, pid, "Worker exited");
        }
        Ok(status) => {
            tracing::warn!(job_id = %job_id, pid, exit_code = ?status.code(), "Worker exited with failure");
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, pid, error = %e, "Failed to wait for worker");
        }
    }

    for task in [stdout, stderr].into_iter().flatten() {
        let _ = task.await;
    }
}

/// Log every line read from `stream` until EOF.
async fn forward_lines<R: AsyncRead + Unpin>(job_id: JobId, stream: &'static str, reader: R) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                tracing::debug!(job_id = %job_id, stream, "{line}");
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(job_id = %job_id, stream, error = %e, "Stopped reading worker output");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;

    fn request(email: Option<&str>, password: Option<&str>) -> LaunchRequest {
        LaunchRequest {
            job_id: JobId::parse("job1").unwrap(),
            prompts_file: PathBuf::from("/p/prompts_1.txt"),
            output_dir: PathBuf::from("/o/job1"),
            meta_path: PathBuf::from("/j/job1/meta.json"),
            max_tabs: 7,
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn arguments_follow_worker_contract() {
        let launcher = ProcessLauncher::new(WorkerConfig::default());
        let args = launcher.arguments(&request(Some("a@b.test"), Some("hunter2")));
        assert_eq!(
            args,
            vec![
                "-a",
                "node",
                "generate_login_incognito.js",
                "--promptFile=/p/prompts_1.txt",
                "--outputDir=/o/job1",
                "--jobMeta=/j/job1/meta.json",
                "--maxTabs=7",
                "--email=a@b.test",
                "--headless=false",
            ]
        );
        assert!(args.iter().all(|a| !a.contains("hunter2")));
    }

    #[test]
    fn email_omitted_when_absent() {
        let launcher = ProcessLauncher::new(WorkerConfig::default());
        let args = launcher.arguments(&request(None, None));
        assert!(args.iter().all(|a| !a.starts_with("--email")));
    }

    #[test]
    fn password_is_passed_through_environment() {
        let launcher = ProcessLauncher::new(WorkerConfig::default());
        let cmd = launcher.command(&request(None, Some("hunter2")));
        let envs: Vec<(&OsStr, Option<&OsStr>)> = cmd.as_std().get_envs().collect();
        assert!(envs.contains(&(OsStr::new("GEMINI_PASSWORD"), Some(OsStr::new("hunter2")))));
        assert!(envs.contains(&(OsStr::new("HEADLESS"), Some(OsStr::new("false")))));
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", request(None, Some("hunter2")));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn launches_real_process_and_returns_pid() {
        let workdir = tempfile::tempdir().unwrap();
        let launcher = ProcessLauncher::new(WorkerConfig {
            program: "sh".into(),
            program_args: vec!["-c".into(), "exit 0".into()],
            script: "worker".into(),
            workdir: workdir.path().to_path_buf(),
            headless: true,
        });
        let pid = launcher.launch(&request(None, None)).unwrap();
        assert!(pid > 0);
    }

    #[test]
    fn launch_outside_runtime_is_an_error() {
        let launcher = ProcessLauncher::new(WorkerConfig::default());
        assert!(matches!(
            launcher.launch(&request(None, None)),
            Err(LaunchError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let launcher = ProcessLauncher::new(WorkerConfig {
            program: "/nonexistent/worker-binary".into(),
            workdir: std::env::temp_dir(),
            ..WorkerConfig::default()
        });
        assert!(matches!(
            launcher.launch(&request(None, None)),
            Err(LaunchError::Spawn { .. })
        ));
    }
}
