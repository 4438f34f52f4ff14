use std::net::SocketAddr;
use std::sync::Arc;

use flowgen_core::gate::ConcurrencyGate;
use flowgen_store::JobStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowgen_api::config::ServerConfig;
use flowgen_api::engine::dispatcher::JobDispatcher;
use flowgen_api::engine::launcher::ProcessLauncher;
use flowgen_api::router::build_app_router;
use flowgen_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flowgen_api=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid server configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        host = %config.host,
        port = config.port,
        node_id = %config.node.node_id,
        max_concurrent_jobs = config.max_concurrent_jobs,
        "Loaded server configuration",
    );
    if config.job_api_key.is_none() {
        tracing::warn!("JOB_API_KEY is not set, job endpoints will refuse every request");
    }

    // --- Directories ---
    for dir in [&config.paths.output_root, &config.paths.prompts_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::error!(path = %dir.display(), error = %e, "Failed to create directory");
            std::process::exit(1);
        }
    }

    // --- Job store ---
    let store = match JobStore::open(&config.paths.jobs_dir) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open job store");
            std::process::exit(1);
        }
    };
    tracing::info!(jobs_dir = %store.root().display(), "Job store opened");

    // --- Dispatcher ---
    let dispatcher = JobDispatcher::new(
        ConcurrencyGate::new(config.max_concurrent_jobs),
        store,
        Arc::new(ProcessLauncher::new(config.worker.clone())),
        config.paths.clone(),
        config.node.clone(),
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        dispatcher: Arc::new(dispatcher),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = match config.host.parse() {
        Ok(ip) => SocketAddr::new(ip, config.port),
        Err(e) => {
            tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // Workers are detached; they keep running and keep rewriting their records.
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
