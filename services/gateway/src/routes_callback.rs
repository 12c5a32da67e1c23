use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use hmac::{Hmac, Mac};
use reputation::VerifiedAccountRecord;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, info, warn};

use crate::error::{fail, ApiResult};
use crate::state::SharedState;

pub const SIGNATURE_HEADER: &str = "x-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackReq {
    #[serde(alias = "proof_id")]
    pub proof_id: String,
}

#[derive(Debug, Serialize)]
pub struct CallbackResp {
    pub success: bool,
    pub attached: bool,
    pub record: VerifiedAccountRecord,
}

fn signature_matches(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Proof-verification callback. Attaches the verified record to the
/// logged-in user. Every verifier failure is reported as the same 500.
pub async fn post_callback(
    State(st): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<CallbackResp>> {
    if let Some(secret) = &st.config.callback_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Missing signature"))?;
        if !signature_matches(secret, &body, signature) {
            warn!("callback signature mismatch");
            return Err(fail(StatusCode::UNAUTHORIZED, "Invalid signature"));
        }
    }

    let req: CallbackReq = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "malformed callback body");
        fail(StatusCode::BAD_REQUEST, "Invalid callback body")
    })?;

    attach_verified(&st, &req.proof_id).await.map(Json)
}

#[derive(Deserialize)]
pub struct MockVerifyQuery {
    pub provider: String,
    pub request_id: String,
}

/// Landing page for mock-mode redirect URLs. Completes the verification
/// as if the proof service had called back with `<provider>:<request_id>`.
pub async fn get_mock_verify(
    State(st): State<SharedState>,
    Query(q): Query<MockVerifyQuery>,
) -> ApiResult<Json<CallbackResp>> {
    let proof_id = format!("{}:{}", q.provider, q.request_id);
    attach_verified(&st, &proof_id).await.map(Json)
}

async fn attach_verified(st: &SharedState, proof_id: &str) -> ApiResult<CallbackResp> {
    let user = st
        .current_user()
        .await
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Not logged in"))?;

    let record = st.verifier.verify_proof(proof_id).await.map_err(|e| {
        error!(error = ?e, proof_id = %proof_id, "Error processing verification callback");
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Error processing verification")
    })?;

    let attached = st.attach_proof(&user.address, proof_id, record.clone()).await;
    if attached {
        info!(proof_id = %proof_id, provider = %record.provider_id(), address = %user.address, "proof attached");
    } else {
        info!(proof_id = %proof_id, "proof already attached");
    }

    Ok(CallbackResp { success: true, attached, record })
}
