use axum::{extract::State, http::StatusCode, Json};
use reputation::{ReputationMetrics, VerifiedAccountRecord};
use serde::Deserialize;

use crate::error::{fail, ApiResult};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ComputeReq {
    #[serde(default)]
    pub records: Vec<VerifiedAccountRecord>,
}

/// Score the logged-in user's attached proofs.
pub async fn get_reputation(State(st): State<SharedState>) -> ApiResult<Json<ReputationMetrics>> {
    let user = st
        .current_user()
        .await
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Not logged in"))?;
    let records = st.records_for(&user.address).await;
    Ok(Json(st.calculator.compute(&records)))
}

/// Score an arbitrary record list.
pub async fn post_compute(
    State(st): State<SharedState>,
    Json(req): Json<ComputeReq>,
) -> Json<ReputationMetrics> {
    Json(st.calculator.compute(&req.records))
}
