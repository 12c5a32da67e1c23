mod config;
mod state;
mod error;
pub mod directory;
pub mod verifier;
mod verifier_http;
mod routes_providers;
mod routes_callback;
mod routes_auth;
mod routes_reputation;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::{get, post}, Router};
use identity::FileBackedStorage;
use reputation::ReputationCalculator;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::directory::StaticDirectory;
use crate::state::{AppState, SharedState};
use crate::verifier::{MockVerifier, ProofVerifier};
use crate::verifier_http::HttpVerifier;

const CHALLENGE_PRUNE_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = GatewayConfig::from_env()?;
    let calculator = ReputationCalculator::with_weights(cfg.load_weights()?);

    // --- Session storage (startup load happens in AppState::new) ---
    let storage = FileBackedStorage::new(&cfg.session_path)
        .with_context(|| format!("Failed to open session store {}", cfg.session_path.display()))?;

    // --- Proof verifier ---
    let verifier: Arc<dyn ProofVerifier> = match &cfg.verifier_url {
        Some(url) => {
            let v = HttpVerifier::new(url.clone());
            if let Err(e) = v.ping().await {
                warn!(error = ?e, url = %url, "verifier not reachable at startup");
            }
            Arc::new(v)
        }
        None => {
            info!("VERIFIER_URL not set, using mock verifier");
            Arc::new(MockVerifier::new(cfg.public_origin.clone()))
        }
    };

    let app_state = Arc::new(AppState::new(
        cfg.clone(),
        Box::new(storage),
        Arc::new(StaticDirectory::default()),
        verifier,
        calculator,
    )?);

    if let Some(user) = app_state.current_user().await {
        info!(address = %user.address, "restored session");
    }

    let shared_for_pruner = app_state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(CHALLENGE_PRUNE_EVERY);
        loop {
            tick.tick().await;
            shared_for_pruner.challenges.lock().await.prune();
        }
    });

    let app = router(app_state);

    let addr = &cfg.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, verifier = %cfg.verifier_url.as_deref().unwrap_or("mock"), "gateway listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn router(state: SharedState) -> Router {
    let mut app: Router<SharedState> = Router::new();
    if state.config.verifier_url.is_none() {
        app = app.route("/mock/verify", get(crate::routes_callback::get_mock_verify));
    }
    app
        .route("/api/health", get(|| async { "ok" }))
        .route("/api/providers", get(crate::routes_providers::get_providers))
        .route("/api/verifier", get(crate::routes_providers::get_verifier))
        .route("/api/verifications", post(crate::routes_providers::post_verification))
        .route("/api/reclaim/callback", post(crate::routes_callback::post_callback))
        .route("/api/auth/email/code", post(crate::routes_auth::post_email_code))
        .route("/api/auth/email/verify", post(crate::routes_auth::post_email_verify))
        .route("/api/auth/logout", post(crate::routes_auth::post_logout))
        .route("/api/auth/session", get(crate::routes_auth::get_session))
        .route("/api/reputation", get(crate::routes_reputation::get_reputation))
        .route("/api/reputation/compute", post(crate::routes_reputation::post_compute))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
