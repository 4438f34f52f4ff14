#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use base64::Engine as _;
use http_body_util::BodyExt;
use tower::ServiceExt;

use flowgen_api::config::{NodeConfig, PathsConfig, ServerConfig, WorkerConfig};
use flowgen_api::engine::dispatcher::JobDispatcher;
use flowgen_api::engine::launcher::{LaunchError, LaunchRequest, WorkerLauncher};
use flowgen_api::router::build_app_router;
use flowgen_api::state::AppState;
use flowgen_core::gate::ConcurrencyGate;
use flowgen_store::JobStore;

/// Key the test server expects on job endpoints.
pub const TEST_KEY: &str = "test-job-key";

/// Fake pid returned by [`FakeLauncher`].
pub const FAKE_PID: u32 = 31337;

/// Launcher that records requests instead of starting processes.
#[derive(Default)]
pub struct FakeLauncher {
    pub fail: bool,
    pub launched: Mutex<Vec<LaunchRequest>>,
}

impl WorkerLauncher for FakeLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<u32, LaunchError> {
        if self.fail {
            return Err(LaunchError::Spawn {
                program: "fake-worker".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"),
            });
        }
        self.launched.lock().unwrap().push(request.clone());
        Ok(FAKE_PID)
    }
}

/// A running test application plus handles to inspect its side effects.
pub struct TestApp {
    pub root: tempfile::TempDir,
    pub config: ServerConfig,
    pub launcher: Arc<FakeLauncher>,
    pub router: Router,
}

impl TestApp {
    pub fn jobs_dir(&self) -> &Path {
        &self.config.paths.jobs_dir
    }

    pub fn output_root(&self) -> &Path {
        &self.config.paths.output_root
    }

    pub fn output_dir(&self, job_id: &str) -> PathBuf {
        self.output_root().join(job_id)
    }

    pub fn meta_path(&self, job_id: &str) -> PathBuf {
        self.jobs_dir().join(job_id).join("meta.json")
    }

    /// Write a scene artifact into a job's output folder.
    pub fn write_scene(&self, job_id: &str, name: &str) {
        let dir = self.output_dir(job_id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), name.as_bytes()).unwrap();
    }

    /// Rewrite a job record the way the worker does when it finishes.
    pub fn finish_job(&self, job_id: &str, status: &str) {
        let path = self.meta_path(job_id);
        let mut meta: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        meta["status"] = status.into();
        meta["finished_at"] = "2026-01-01T00:00:00Z".into();
        meta["reason"] = "all tabs closed".into();
        std::fs::write(&path, serde_json::to_string_pretty(&meta).unwrap()).unwrap();
    }

    pub fn launched(&self) -> Vec<LaunchRequest> {
        self.launcher.launched.lock().unwrap().clone()
    }
}

/// Build a test `ServerConfig` rooted in `root`.
pub fn test_config(root: &Path, capacity: usize, job_api_key: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        max_concurrent_jobs: capacity,
        job_api_key: job_api_key.map(str::to_string),
        node: NodeConfig {
            node_id: "vm-test".to_string(),
            public_url: "http://node.test:8000".to_string(),
        },
        paths: PathsConfig {
            jobs_dir: root.join("jobs"),
            output_root: root.join("output"),
            prompts_dir: root.join("prompts"),
        },
        worker: WorkerConfig::default(),
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app_with(capacity: usize, job_api_key: Option<&str>, fail_launch: bool) -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), capacity, job_api_key);
    std::fs::create_dir_all(&config.paths.output_root).unwrap();

    let launcher = Arc::new(FakeLauncher {
        fail: fail_launch,
        ..Default::default()
    });
    let dispatcher = JobDispatcher::new(
        ConcurrencyGate::new(config.max_concurrent_jobs),
        JobStore::open(&config.paths.jobs_dir).unwrap(),
        launcher.clone(),
        config.paths.clone(),
        config.node.clone(),
    );
    let state = AppState {
        config: Arc::new(config.clone()),
        dispatcher: Arc::new(dispatcher),
    };
    let router = build_app_router(state, &config);

    TestApp {
        root,
        config,
        launcher,
        router,
    }
}

/// Default test app: capacity 1, key configured, launches succeed.
pub fn build_test_app() -> TestApp {
    build_test_app_with(1, Some(TEST_KEY), false)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

/// Unauthenticated GET.
pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// GET with the test job key.
pub async fn get_auth(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {TEST_KEY}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST a JSON body with the test job key.
pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {TEST_KEY}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Assert a 200 response and return its JSON body.
pub async fn ok_json(response: Response<Body>) -> serde_json::Value {
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

pub fn encode_prompts(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

/// Submit `text` as a prompt file and return the new job id.
pub async fn submit(app: &TestApp, text: &str) -> String {
    let json = ok_json(
        post_json(
            app,
            "/generate-video",
            serde_json::json!({ "prompts_base64": encode_prompts(text) }),
        )
        .await,
    )
    .await;
    assert_eq!(json["status"], "pending_job", "unexpected submission: {json}");
    json["job_id"].as_str().unwrap().to_string()
}
