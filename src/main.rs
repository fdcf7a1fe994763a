use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lexcita::api::api_router;
use lexcita::app_state::AppState;
use lexcita::config;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let data_dir = config::app_data_dir();
    let media_dir = config::media_dir();
    for dir in [&data_dir, &media_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::error!(?dir, error = %e, "Cannot create data directory");
            std::process::exit(1);
        }
    }

    let state = Arc::new(AppState::new());

    // Open once up front so migrations run (and failures surface) before
    // the server accepts traffic.
    if let Err(e) = state.open_db() {
        tracing::error!(error = %e, "Database initialization failed");
        std::process::exit(1);
    }

    let app = api_router(state);
    let addr = config::bind_addr();

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Cannot bind listener");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "Listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
