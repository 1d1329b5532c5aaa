use std::sync::Arc;

use pdf2docx_core::Settings;
use pdf2docx_mupdf::{MupdfBackend, MupdfConverter};
use pdf2docx_web::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::load();
    let bind_addr = settings.bind_addr;

    let state = Arc::new(AppState::new(
        settings,
        Arc::new(MupdfConverter::new()),
        Arc::new(MupdfBackend::new()),
    )?);
    tracing::info!(
        upload_dir = %state.storage.upload_dir().display(),
        converted_dir = %state.storage.converted_dir().display(),
        removal_delay_secs = state.settings.removal_delay.as_secs(),
        "storage ready"
    );

    let app = pdf2docx_web::router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on http://{bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let cancelled = state.removals.cancel_all();
    tracing::info!(cancelled, "shut down; pending removals dropped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
