use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use lead_intake::channels::create_transport;
use lead_intake::config::AppConfig;
use lead_intake::llm::create_provider;
use lead_intake::logging::init_tracing;
use lead_intake::pipeline::{Classifier, LeadProcessor, Notifier, Recorder};
use lead_intake::server::{AppState, app_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // A missing .env is fine; the process environment is enough.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let _log_guard = init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.listen_addr,
        model = %config.llm.model,
        transport = config.mail.transport.as_str(),
        log_path = %config.log_path.display(),
        "Starting lead intake"
    );
    if config.llm.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, every lead will use the fallback verdict");
    }

    // ── Pipeline ────────────────────────────────────────────────────────
    let llm = create_provider(&config.llm)?;
    let transport = create_transport(&config.mail)?;
    if !transport.is_configured() {
        tracing::warn!(
            transport = transport.name(),
            "Mail transport has no credentials, auto-replies will fail"
        );
    }

    let processor = LeadProcessor::new(
        Classifier::new(llm, config.fallback),
        Notifier::new(transport, config.sender.clone()),
        Recorder::new(config.log_path.clone()),
    );

    let state = AppState {
        processor: Arc::new(processor),
        api_key: config.mail.displayable_api_key(),
        diagnostic_recipient: config.diagnostic_recipient.clone(),
    };

    // ── HTTP server ─────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Listening for contact forms on /webhook");

    axum::serve(listener, app_routes(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
