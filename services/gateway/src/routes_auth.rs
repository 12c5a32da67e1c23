use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use identity::{normalize_email, AuthUser, IdentityError, MetaAccount};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{fail, ApiResult};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct EmailCodeReq {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct EmailCodeResp {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct EmailVerifyReq {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResp {
    pub user: AuthUser,
    pub account: MetaAccount,
}

#[derive(Debug, Serialize)]
pub struct SessionResp {
    pub user: Option<AuthUser>,
    pub is_authenticated: bool,
}

/// Issue a login code. There is no mail delivery; the code goes to the
/// debug log.
pub async fn post_email_code(
    State(st): State<SharedState>,
    Json(req): Json<EmailCodeReq>,
) -> ApiResult<(StatusCode, Json<EmailCodeResp>)> {
    let email = normalize_email(&req.email)
        .map_err(|_| fail(StatusCode::BAD_REQUEST, "Please enter a valid email address"))?;
    let code = st
        .challenges
        .lock()
        .await
        .issue(&email)
        .map_err(|_| fail(StatusCode::BAD_REQUEST, "Please enter a valid email address"))?;

    debug!(email = %email, code = %code, "login code issued");

    let ttl = chrono::Duration::from_std(st.config.login_code_ttl).unwrap_or(chrono::Duration::zero());
    Ok((
        StatusCode::ACCEPTED,
        Json(EmailCodeResp {
            email,
            expires_at: Utc::now() + ttl,
        }),
    ))
}

pub async fn post_email_verify(
    State(st): State<SharedState>,
    Json(req): Json<EmailVerifyReq>,
) -> ApiResult<Json<LoginResp>> {
    st.challenges
        .lock()
        .await
        .verify(&req.email, &req.code)
        .map_err(|e| match e {
            IdentityError::InvalidEmail(_) => fail(StatusCode::BAD_REQUEST, "Please enter a valid email address"),
            _ => fail(StatusCode::UNAUTHORIZED, "Invalid or expired verification code"),
        })?;

    let account = st.account_for(&req.email).await.map_err(|e| {
        error!(error = %e, "meta account creation failed");
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to complete login")
    })?;

    let address = account.address.clone();
    let user = st
        .with_session(move |session| session.login(&address))
        .await
        .map_err(|e| {
            error!(error = %e, "session task panicked");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to complete login")
        })?
        .map_err(|e| {
            error!(error = %e, "saving session failed");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to complete login")
        })?;

    info!(address = %user.address, "logged in");
    Ok(Json(LoginResp { user, account }))
}

pub async fn post_logout(State(st): State<SharedState>) -> ApiResult<StatusCode> {
    st.with_session(|session| session.logout())
        .await
        .map_err(|e| {
            error!(error = %e, "session task panicked");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log out")
        })?
        .map_err(|e| {
            warn!(error = %e, "deleting session failed");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log out")
        })?;

    info!("logged out");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session(State(st): State<SharedState>) -> Json<SessionResp> {
    let user = st.current_user().await;
    Json(SessionResp {
        is_authenticated: user.is_some(),
        user,
    })
}
