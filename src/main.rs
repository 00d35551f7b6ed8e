use std::env;
use tracing::info;

mod auth;
mod config;
mod error;
mod image_match;
mod locks;
mod secret_string;
mod state;
mod webhook;
mod webserver;
mod workload;

#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    info!("Starting kube-autoredeploy {}", env!("CARGO_PKG_VERSION"));

    let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.yaml".to_string());
    let config = config::load_config(&config_path)?;
    let port = config.webserver.port;

    let client = create_client().await?;
    info!(
        "Watching for pushes matching {} workloads in namespace {}",
        config.kubernetes.auto_deploy_label, config.kubernetes.namespace
    );
    let state = state::AppState::new(client, config);

    let app = webserver::create_app(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting webserver on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn create_client() -> anyhow::Result<kube::Client> {
    info!("Initializing K8s client");
    let client = kube::Client::try_default().await?;
    let api_server_info = client.apiserver_version().await?;
    info!(
        "Connected to namespace {}, Kubernetes API server with version {}.{}",
        client.default_namespace(),
        api_server_info.major,
        api_server_info.minor
    );
    Ok(client)
}
