use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::{error, info};

use crate::directory::ProviderInfo;
use crate::error::{fail, ApiResult};
use crate::state::SharedState;
use crate::verifier::{VerificationRequest, VerificationSession, VerifierInfo};

#[derive(Deserialize)]
pub struct StartVerificationReq {
    pub provider_id: String,
}

pub async fn get_providers(State(st): State<SharedState>) -> ApiResult<Json<Vec<ProviderInfo>>> {
    let providers = st.directory.list().await.map_err(|e| {
        error!(error = ?e, "provider directory failed");
        fail(StatusCode::BAD_GATEWAY, "Failed to load providers")
    })?;
    Ok(Json(providers))
}

pub async fn post_verification(
    State(st): State<SharedState>,
    Json(req): Json<StartVerificationReq>,
) -> ApiResult<Json<VerificationSession>> {
    let provider = st.directory.find(&req.provider_id).await.map_err(|e| {
        error!(error = ?e, "provider directory failed");
        fail(StatusCode::BAD_GATEWAY, "Failed to load providers")
    })?;
    let Some(provider) = provider else {
        return Err(fail(StatusCode::NOT_FOUND, "Unknown provider"));
    };

    let cfg = &st.config;
    let request = VerificationRequest::for_provider(&provider.id, &cfg.app_id, &cfg.network, &cfg.callback_url());

    let session = st.verifier.start_verification(&request).await.map_err(|e| {
        error!(error = ?e, provider = %provider.id, "starting verification failed");
        fail(StatusCode::BAD_GATEWAY, "Failed to start verification")
    })?;

    info!(provider = %provider.id, request_id = %session.request_id, "verification started");
    Ok(Json(session))
}

pub async fn get_verifier(State(st): State<SharedState>) -> Json<VerifierInfo> {
    Json(st.verifier.info())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing;

    #[tokio::test]
    async fn test_lists_providers() {
        let Json(providers) = get_providers(State(testing::state())).await.unwrap();
        let ids: Vec<_> = providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["github", "twitter"]);
    }

    #[tokio::test]
    async fn test_start_verification_returns_redirect() {
        let req = StartVerificationReq { provider_id: "GitHub".to_string() };
        let Json(session) = post_verification(State(testing::state()), Json(req)).await.unwrap();
        assert!(session.url.contains("provider=github"));
        assert!(session.url.contains(&session.request_id.to_string()));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_404() {
        let req = StartVerificationReq { provider_id: "myspace".to_string() };
        let err = post_verification(State(testing::state()), Json(req)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
