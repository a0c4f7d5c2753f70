//! services/tracker/src/web/auth.rs
//!
//! Authentication endpoints. The tracker keeps a single persisted session: logging
//! in replaces whoever was logged in before. The client that logged in holds the
//! session id in a cookie; nobody else is let in.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use production_tracker_core::User;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::web::middleware::{
    clear_session_cookie, issue_session_cookie, public, reject, session_cookie,
};
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Log in with a username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = User),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (user, token) = state
        .service
        .login_with_token(&req.username, &req.password)
        .await
        .map_err(reject)?;
    let cookie = issue_session_cookie(&token, state.config.secure_cookies);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(public(user)),
    ))
}

/// POST /auth/logout - Clear the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logout successful"),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let no_session = || (StatusCode::UNAUTHORIZED, "No session found".to_string());
    let token = session_cookie(&headers).ok_or_else(no_session)?;
    state.service.session_for(token).await.ok_or_else(no_session)?;

    state.service.logout().await.map_err(reject)?;
    info!("Session cleared");
    let cookie = clear_session_cookie(state.config.secure_cookies);
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// GET /auth/session - The user currently logged in
#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Nobody is logged in")
    )
)]
pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(token) = session_cookie(&headers) else {
        return Err((StatusCode::UNAUTHORIZED, "Not logged in".to_string()));
    };
    state
        .service
        .session_for(token)
        .await
        .map(|user| Json(public(user)))
        .ok_or((StatusCode::UNAUTHORIZED, "Not logged in".to_string()))
}
