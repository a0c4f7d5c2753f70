pub mod auth;
pub mod events;
pub mod middleware;
pub mod protocol;
pub mod reports;
pub mod rest;
pub mod state;

pub use events::events_handler;
pub use middleware::require_session;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

use self::state::AppState;

/// Builds the API routes. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/session", get(auth::session_handler));

    // Protected routes (someone must be logged in)
    let protected_routes = Router::new()
        .route("/production", get(rest::list_production_handler))
        .route("/production/plans", post(rest::create_plan_handler))
        .route("/production/{id}/actual", post(rest::record_actual_handler))
        .route(
            "/production/{id}",
            patch(rest::edit_entry_handler).delete(rest::delete_entry_handler),
        )
        .route(
            "/off-days",
            get(rest::list_off_days_handler).post(rest::add_off_day_handler),
        )
        .route("/off-days/{id}", delete(rest::remove_off_day_handler))
        .route(
            "/users",
            get(rest::list_users_handler).post(rest::add_user_handler),
        )
        .route("/users/{id}", delete(rest::delete_user_handler))
        .route("/me/password", post(rest::change_password_handler))
        .route("/me/avatar", put(rest::update_avatar_handler))
        .route("/logs", get(rest::list_logs_handler))
        .route("/analytics/monthly", get(reports::monthly_handler))
        .route("/analytics/daily", get(reports::daily_handler))
        .route("/analytics/processes", get(reports::processes_handler))
        .route("/analytics/stats", get(reports::stats_handler))
        .route("/analytics/trend/monthly", get(reports::monthly_trend_handler))
        .route("/analytics/trend/daily", get(reports::daily_trend_handler))
        .route("/analytics/products", get(reports::top_products_handler))
        .route("/sync", post(rest::sync_handler))
        .route(
            "/remote",
            get(rest::remote_status_handler).put(rest::update_remote_handler),
        )
        .route("/events", get(events_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_session,
        ));

    // Avatars arrive as data URIs.
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(app_state)
}
