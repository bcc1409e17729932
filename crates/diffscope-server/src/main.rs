//! Diffscope HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use diffscope::config::Config;
use diffscope::github::GithubClient;
use diffscope::pipeline::{PipelineHandler, PipelineService};
use diffscope::queue::TaskQueue;
use diffscope_server::gateway::{HandlerState, create_router_with_state};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "Diffscope starting"
    );

    let webhook_secret = config.webhook_secret.clone();
    let github_token = config.github_token.clone();
    let queue_capacity = config.queue_capacity;

    let pipeline = Arc::new(PipelineService::new(config));
    let github = Arc::new(GithubClient::new(reqwest::Client::new(), github_token));

    let handler = Arc::new(PipelineHandler::new(pipeline.clone(), github));
    let queue = Arc::new(TaskQueue::start(queue_capacity, handler));

    let state = HandlerState::new(pipeline, queue.clone(), webhook_secret);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let the in-flight task finish before exiting.
    queue.stop().await;

    tracing::info!("Diffscope shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
