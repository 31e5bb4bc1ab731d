//! Voice gateway entry point. Grounded on the teacher's `server::main`
//! composition order (load config, init tracing, init metrics, build
//! state, build router, serve with graceful shutdown) and its
//! `shutdown_signal` ctrl_c/SIGTERM handling.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use voice_gateway_config::{RepositoryBackend, Settings, load_settings};
use voice_gateway_model::ModelStreamConfig;
use voice_gateway_repository::{InMemoryTaskRepository, ScyllaClient, ScyllaConfig, ScyllaTaskRepository, TaskRepository};
use voice_gateway_server::auth::JwtValidator;
use voice_gateway_server::http::create_router;
use voice_gateway_server::metrics::init_metrics;
use voice_gateway_server::supervisor::GatewaySupervisor;
use voice_gateway_server::websocket::WebSocketHandlerState;
use voice_gateway_tools::{ToolRegistry, builtin};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("GATEWAY_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting voice gateway");

    let metrics_handle = init_metrics();
    tracing::info!("initialized Prometheus metrics at /metrics");

    let repository: Arc<dyn TaskRepository> = match settings.repository.backend {
        RepositoryBackend::Memory => {
            tracing::info!("using in-memory task repository");
            Arc::new(InMemoryTaskRepository::new())
        }
        RepositoryBackend::Scylla => {
            tracing::info!(hosts = ?settings.repository.scylla_hosts, "connecting to ScyllaDB task repository");
            let client = ScyllaClient::connect(ScyllaConfig {
                hosts: settings.repository.scylla_hosts.clone(),
                keyspace: settings.repository.keyspace.clone(),
                replication_factor: settings.repository.replication_factor,
            })
            .await?;
            client.ensure_schema().await?;
            Arc::new(ScyllaTaskRepository::new(client))
        }
    };

    let tool_registry = Arc::new(ToolRegistry::new());
    builtin::register_all(&tool_registry, repository)?;
    tracing::info!(count = tool_registry.list().len(), "registered builtin tools");

    let supervisor = Arc::new(GatewaySupervisor::new(
        tool_registry,
        settings.model.max_concurrent_streams,
        Duration::from_secs(settings.server.shutdown_grace_secs),
    ));

    let ws_state = Arc::new(WebSocketHandlerState {
        supervisor: supervisor.clone(),
        validator: Arc::new(JwtValidator::new(settings.identity.clone())),
        model_config: ModelStreamConfig { endpoint: settings.model.endpoint.clone() },
    });

    spawn_idle_sweeper(supervisor.clone(), Duration::from_secs(settings.model.idle_timeout_secs));

    let app = create_router(ws_state, metrics_handle, &settings.server.cors_origins);

    let addr: SocketAddr = settings.server.bind_addr.parse()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(supervisor))
        .await?;

    tracing::info!("gateway shutdown complete");
    Ok(())
}

fn spawn_idle_sweeper(supervisor: Arc<GatewaySupervisor>, idle_timeout: Duration) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(30));
        loop {
            tick.tick().await;
            supervisor.sweep_idle(idle_timeout);
        }
    });
}

async fn shutdown_signal(supervisor: Arc<GatewaySupervisor>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, initiating graceful shutdown"),
    }

    supervisor.shutdown().await;
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.observability.log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);

    if settings.observability.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
