use std::path::PathBuf;
use std::str::FromStr;

/// Errors raised while loading [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Identity of this node, stamped into every job record.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Node identifier (default: `vm-unknown`).
    pub node_id: String,
    /// Public base URL, e.g. `http://203.0.113.7:8000`. Empty means "derive
    /// from the request `Host` header".
    pub public_url: String,
}

/// On-disk layout.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// One `<id>/meta.json` per job.
    pub jobs_dir: PathBuf,
    /// One `<id>/` folder of scene artifacts per job, served under `/output`.
    pub output_root: PathBuf,
    /// Decoded prompt files handed to the worker.
    pub prompts_dir: PathBuf,
}

/// How the external worker process is started.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Program to execute (default: `xvfb-run`).
    pub program: String,
    /// Leading arguments before the script (default: `-a node`).
    pub program_args: Vec<String>,
    /// Worker script path, relative to `workdir` (default: `generate_login_incognito.js`).
    pub script: String,
    /// Working directory of the worker (default: `/app`).
    pub workdir: PathBuf,
    /// Whether the worker runs its browser headless (default: `false`).
    pub headless: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "xvfb-run".into(),
            program_args: vec!["-a".into(), "node".into()],
            script: "generate_login_incognito.js".into(),
            workdir: PathBuf::from("/app"),
            headless: false,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults matching the single-VM deployment layout.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Maximum simultaneously admitted jobs (default: `1`).
    pub max_concurrent_jobs: usize,
    /// Bearer key required by job endpoints. `None` disables them.
    pub job_api_key: Option<String>,
    pub node: NodeConfig,
    pub paths: PathsConfig,
    pub worker: WorkerConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                       |
    /// |------------------------|-------------------------------|
    /// | `HOST`                 | `0.0.0.0`                     |
    /// | `PORT`                 | `8000`                        |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                          |
    /// | `MAX_CONCURRENT_JOBS`  | `1`                           |
    /// | `JOB_API_KEY`          | unset                         |
    /// | `NODE_ID`              | `vm-unknown`                  |
    /// | `NODE_PUBLIC_URL`      | empty                         |
    /// | `JOBS_DIR`             | `/app/jobs`                   |
    /// | `OUTPUT_ROOT`          | `/app/output`                 |
    /// | `PROMPTS_DIR`          | `/app/gemini_prompts`         |
    /// | `WORKER_PROGRAM`       | `xvfb-run`                    |
    /// | `WORKER_PROGRAM_ARGS`  | `-a node`                     |
    /// | `WORKER_SCRIPT`        | `generate_login_incognito.js` |
    /// | `WORKER_WORKDIR`       | `/app`                        |
    /// | `WORKER_HEADLESS`      | `false`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = string("HOST", "0.0.0.0");
        let port: u16 = parse(&lookup, "PORT", 8000)?;
        let request_timeout_secs: u64 = parse(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        let max_concurrent_jobs: usize = parse(&lookup, "MAX_CONCURRENT_JOBS", 1)?;
        if max_concurrent_jobs == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_CONCURRENT_JOBS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let job_api_key = lookup("JOB_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let node = NodeConfig {
            node_id: string("NODE_ID", "vm-unknown"),
            public_url: string("NODE_PUBLIC_URL", "").trim_end_matches('/').to_string(),
        };

        let paths = PathsConfig {
            jobs_dir: string("JOBS_DIR", "/app/jobs").into(),
            output_root: string("OUTPUT_ROOT", "/app/output").into(),
            prompts_dir: string("PROMPTS_DIR", "/app/gemini_prompts").into(),
        };

        let defaults = WorkerConfig::default();
        let worker = WorkerConfig {
            program: lookup("WORKER_PROGRAM").unwrap_or(defaults.program),
            program_args: lookup("WORKER_PROGRAM_ARGS")
                .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.program_args),
            script: lookup("WORKER_SCRIPT").unwrap_or(defaults.script),
            workdir: lookup("WORKER_WORKDIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.workdir),
            headless: parse(&lookup, "WORKER_HEADLESS", defaults.headless)?,
        };

        Ok(Self {
            host,
            port,
            request_timeout_secs,
            max_concurrent_jobs,
            job_api_key,
            node,
            paths,
            worker,
        })
    }
}

/// Parse `key` with [`FromStr`], falling back to `default` when unset.
fn parse<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
