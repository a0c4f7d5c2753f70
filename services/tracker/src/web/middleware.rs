//! services/tracker/src/web/middleware.rs
//!
//! Session middleware for protecting routes, and the error mapping shared by handlers.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use production_tracker_core::actions::{has_permission, ActionError};
use production_tracker_core::{Role, User};
use std::sync::Arc;
use tracing::error;

use crate::web::state::AppState;

const SESSION_COOKIE_DAYS: i64 = 30;

/// The session id sent in the request's `session` cookie.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

/// `Set-Cookie` value carrying a session id.
pub fn issue_session_cookie(token: &str, secure: bool) -> String {
    format!(
        "session={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
        token,
        if secure { " Secure;" } else { "" },
        chrono::Duration::days(SESSION_COOKIE_DAYS).num_seconds()
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    format!(
        "session=; HttpOnly;{} SameSite=Lax; Path=/; Max-Age=0",
        if secure { " Secure;" } else { "" }
    )
}

/// Middleware that validates the session cookie and loads the session user.
///
/// If the cookie carries the id issued at login, inserts the `User` into request
/// extensions for handlers to use. Otherwise returns 401 Unauthorized.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_cookie(req.headers())
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();
    let user = state
        .service
        .session_for(&token)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Rejects the request with 403 unless the user holds one of `roles`.
pub fn require_role(user: &User, roles: &[Role]) -> Result<(), (StatusCode, String)> {
    if has_permission(Some(user), roles) {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            format!("Role '{}' may not access this resource", user.role.as_str()),
        ))
    }
}

/// Maps a business-rule failure to an HTTP status and message.
pub fn reject(e: ActionError) -> (StatusCode, String) {
    let status = match &e {
        ActionError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ActionError::PermissionDenied { .. } | ActionError::WrongDepartment(_) => {
            StatusCode::FORBIDDEN
        }
        ActionError::EntryNotFound(_)
        | ActionError::OffDayNotFound(_)
        | ActionError::UserNotFound(_) => StatusCode::NOT_FOUND,
        ActionError::DuplicateOffDay(_)
        | ActionError::DuplicateUsername(_)
        | ActionError::LastAdmin => StatusCode::CONFLICT,
        ActionError::Storage(inner) => {
            error!("Storage failure while handling request: {}", inner);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to access storage".to_string(),
            );
        }
        _ => StatusCode::BAD_REQUEST,
    };
    (status, e.to_string())
}

/// Strips the password before a user leaves the server.
pub fn public(user: User) -> User {
    User {
        password: None,
        ..user
    }
}
