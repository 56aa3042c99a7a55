use clap::Parser;
use snipvault::config::{Cli, Config};
use snipvault::handler::AppState;
use snipvault::unpack_error;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("snipvault.svc starting");

    let cfg = Config::resolve(&args).unwrap_or_else(|e| {
        tracing::error!(error = %format!("{e:#}"), "failed to load config");
        std::process::exit(1);
    });

    let state = AppState::new(cfg.clone());

    // Refuse to start on top of a backing file we cannot parse.
    match state.store.load().await {
        Ok(snippets) => tracing::info!(
            path = ?state.store.path(),
            count = snippets.len(),
            "backing file loaded"
        ),
        Err(e) => {
            tracing::error!(error = %unpack_error(&e), path = ?state.store.path(), "failed to load backing file");
            std::process::exit(1);
        }
    }

    let address = cfg.app.address();
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    let cancellation_token = CancellationToken::new();
    let ctrl_c_token = cancellation_token.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "unable to listen for ctrl+c");
            return;
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
        ctrl_c_token.cancel();
    });

    tracing::info!(
        ttl_seconds = cfg.app.ttl_seconds,
        assets = ?cfg.app.assets_dir,
        "snipvault.svc running on http://{}",
        &address
    );
    if let Err(err) = snipvault::serve(listener, state, cancellation_token).await {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }

    tracing::info!("snipvault.svc going off, graceful shutdown complete");
}
