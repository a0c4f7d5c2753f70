//! services/tracker/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition of the OpenAPI document.

use crate::web::middleware::{public, reject, require_role};
use crate::web::state::AppState;
use crate::web::{auth, reports};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use production_tracker_core::actions::{ActualRequest, EntryPatch, NewUser, PlanRequest};
use production_tracker_core::analytics::{
    AnalyticsFilter, DailyGroup, DailyTrend, MonthlySummary, MonthlyTrend, ProcessMetric,
    ProcessTotals, ProductTotals,
};
use production_tracker_core::domain::{
    ActivityLog, Category, Collection, DashboardStats, OffDay, ProcessType, ProductionEntry,
    Role, Unit, User,
};
use production_tracker_core::events::NotificationLevel;
use production_tracker_core::service::{DeleteOutcome, MirrorStatus};
use production_tracker_core::sync::{CollectionSync, SyncReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        auth::logout_handler,
        auth::session_handler,
        list_production_handler,
        create_plan_handler,
        record_actual_handler,
        edit_entry_handler,
        delete_entry_handler,
        list_off_days_handler,
        add_off_day_handler,
        remove_off_day_handler,
        list_users_handler,
        add_user_handler,
        delete_user_handler,
        change_password_handler,
        update_avatar_handler,
        list_logs_handler,
        sync_handler,
        remote_status_handler,
        update_remote_handler,
        reports::monthly_handler,
        reports::daily_handler,
        reports::processes_handler,
        reports::stats_handler,
        reports::monthly_trend_handler,
        reports::daily_trend_handler,
        reports::top_products_handler,
    ),
    components(
        schemas(
            auth::LoginRequest, User, Role, Category, ProcessType, Unit, ProductionEntry,
            OffDay, ActivityLog, DashboardStats, Collection, PlanRequest, ActualRequest,
            EntryPatch, NewUser, DeleteOutcome, MirrorStatus, SyncReport, CollectionSync,
            OffDayRequest, PasswordRequest, AvatarRequest, RemoteStatus, RemoteUpdate,
            MonthlySummary, ProcessTotals, DailyGroup, ProcessMetric, AnalyticsFilter,
            MonthlyTrend, DailyTrend, ProductTotals
        )
    ),
    tags(
        (name = "Production Tracker API", description = "Production planning, actuals, off-days and users, mirrored to a spreadsheet.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct OffDayRequest {
    pub date: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AvatarRequest {
    pub avatar: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RemoteStatus {
    pub enabled: bool,
    pub url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RemoteUpdate {
    /// `null` or empty clears the saved URL and falls back to the configured one.
    pub url: Option<String>,
}

//=========================================================================================
// Production
//=========================================================================================

/// List production entries, optionally narrowed by department and date range.
#[utoipa::path(
    get,
    path = "/production",
    params(AnalyticsFilter),
    responses(
        (status = 200, description = "Matching entries", body = [ProductionEntry]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_production_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AnalyticsFilter>,
) -> Json<Vec<ProductionEntry>> {
    let mut entries = state.service.get_production_data().await;
    entries.retain(|e| filter.matches(e));
    Json(entries)
}

/// Create a production plan.
#[utoipa::path(
    post,
    path = "/production/plans",
    request_body = PlanRequest,
    responses(
        (status = 201, description = "Plan created", body = ProductionEntry),
        (status = 400, description = "Invalid plan or the date is an off-day"),
        (status = 403, description = "Role may not create plans")
    )
)]
pub async fn create_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<PlanRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entry = state.service.create_plan(&user, req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Record actual output against a plan.
#[utoipa::path(
    post,
    path = "/production/{id}/actual",
    request_body = ActualRequest,
    params(("id" = String, Path, description = "Production entry id")),
    responses(
        (status = 200, description = "Actuals recorded", body = ProductionEntry),
        (status = 400, description = "Invalid quantities or the date is an off-day"),
        (status = 403, description = "Entry belongs to another department"),
        (status = 404, description = "No such entry")
    )
)]
pub async fn record_actual_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(req): Json<ActualRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entry = state
        .service
        .record_actual(&user, &id, req)
        .await
        .map_err(reject)?;
    Ok(Json(entry))
}

#[utoipa::path(
    patch,
    path = "/production/{id}",
    request_body = EntryPatch,
    params(("id" = String, Path, description = "Production entry id")),
    responses(
        (status = 200, description = "Entry updated", body = ProductionEntry),
        (status = 403, description = "Role may not edit records"),
        (status = 404, description = "No such entry")
    )
)]
pub async fn edit_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(patch): Json<EntryPatch>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entry = state
        .service
        .edit_entry(&user, &id, patch)
        .await
        .map_err(reject)?;
    Ok(Json(entry))
}

/// Delete an entry. The remote mirror is awaited unless configured otherwise.
#[utoipa::path(
    delete,
    path = "/production/{id}",
    params(("id" = String, Path, description = "Production entry id")),
    responses(
        (status = 200, description = "Entry deleted", body = DeleteOutcome),
        (status = 403, description = "Role may not delete records"),
        (status = 404, description = "No such entry")
    )
)]
pub async fn delete_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let outcome = state
        .service
        .delete_entry(&user, &id)
        .await
        .map_err(reject)?;
    if outcome.deleted.is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Production entry {id} not found"),
        ));
    }
    Ok(Json(outcome))
}

//=========================================================================================
// Off-days
//=========================================================================================

#[utoipa::path(
    get,
    path = "/off-days",
    responses((status = 200, description = "All off-days", body = [OffDay]))
)]
pub async fn list_off_days_handler(State(state): State<Arc<AppState>>) -> Json<Vec<OffDay>> {
    Json(state.service.get_off_days().await)
}

#[utoipa::path(
    post,
    path = "/off-days",
    request_body = OffDayRequest,
    responses(
        (status = 201, description = "Off-day added", body = OffDay),
        (status = 400, description = "Invalid date"),
        (status = 409, description = "The date is already an off-day")
    )
)]
pub async fn add_off_day_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<OffDayRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let day = state
        .service
        .add_off_day(&user, &req.date, req.description.as_deref())
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(day)))
}

#[utoipa::path(
    delete,
    path = "/off-days/{id}",
    params(("id" = String, Path, description = "Off-day id")),
    responses(
        (status = 200, description = "Off-day removed", body = OffDay),
        (status = 404, description = "No such off-day")
    )
)]
pub async fn remove_off_day_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let day = state
        .service
        .remove_off_day(&user, &id)
        .await
        .map_err(reject)?;
    Ok(Json(day))
}

//=========================================================================================
// Users
//=========================================================================================

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All accounts, without passwords", body = [User]),
        (status = 403, description = "Admins only")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_role(&user, &[Role::Admin])?;
    let users: Vec<User> = state
        .service
        .get_users()
        .await
        .into_iter()
        .map(public)
        .collect();
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 403, description = "Admins only"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn add_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<NewUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let created = state.service.add_user(&user, req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(public(created))))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User removed", body = User),
        (status = 404, description = "No such user"),
        (status = 409, description = "The last administrator cannot be removed")
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let removed = state.service.delete_user(&user, &id).await.map_err(reject)?;
    Ok(Json(public(removed)))
}

#[utoipa::path(
    post,
    path = "/me/password",
    request_body = PasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Mismatch, wrong current password or too short")
    )
)]
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<PasswordRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .service
        .change_password(
            &user,
            &req.current_password,
            &req.new_password,
            &req.confirm_password,
        )
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/me/avatar",
    request_body = AvatarRequest,
    responses((status = 200, description = "Avatar updated", body = User))
)]
pub async fn update_avatar_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<AvatarRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let updated = state
        .service
        .update_avatar(&user, req.avatar)
        .await
        .map_err(reject)?;
    Ok(Json(public(updated)))
}

//=========================================================================================
// Activity log
//=========================================================================================

/// Newest first.
#[utoipa::path(
    get,
    path = "/logs",
    responses(
        (status = 200, description = "Activity log", body = [ActivityLog]),
        (status = 403, description = "Admins and managers only")
    )
)]
pub async fn list_logs_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_role(&user, &[Role::Admin, Role::Manager])?;
    Ok(Json(state.service.get_logs().await))
}

//=========================================================================================
// Remote spreadsheet
//=========================================================================================

/// Pull every collection from the spreadsheet and overwrite the local copies.
#[utoipa::path(
    post,
    path = "/sync",
    responses(
        (status = 200, description = "Per-collection outcome", body = SyncReport),
        (status = 500, description = "A local write failed mid-sync")
    )
)]
pub async fn sync_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = &state.service;
    let events = service.events();
    if !service.is_remote_enabled() {
        events.notify(
            NotificationLevel::Info,
            "DATABASE NOT CONFIGURED. PLEASE SET URL IN USER MANAGEMENT.",
        );
    }
    match service.sync_with_remote().await {
        Ok(report) => {
            if service.is_remote_enabled() {
                events.notify(NotificationLevel::Success, "CLOUD DATA SYNCHRONIZED");
            }
            Ok(Json(report))
        }
        Err(e) => {
            error!("Manual sync failed: {}", e);
            events.notify(NotificationLevel::Error, "SYNC FAILED - CHECK CONNECTION");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/remote",
    responses((status = 200, description = "The active spreadsheet endpoint", body = RemoteStatus))
)]
pub async fn remote_status_handler(State(state): State<Arc<AppState>>) -> Json<RemoteStatus> {
    Json(RemoteStatus {
        enabled: state.service.is_remote_enabled(),
        url: state.service.remote_url(),
    })
}

#[utoipa::path(
    put,
    path = "/remote",
    request_body = RemoteUpdate,
    responses(
        (status = 200, description = "The endpoint now in use", body = RemoteStatus),
        (status = 403, description = "Admins only")
    )
)]
pub async fn update_remote_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<RemoteUpdate>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_role(&user, &[Role::Admin])?;
    let url = state
        .service
        .set_remote_url(req.url.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to save remote endpoint: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save remote endpoint".to_string(),
            )
        })?;
    info!(username = %user.username, enabled = url.is_some(), "Remote endpoint changed");
    Ok(Json(RemoteStatus {
        enabled: url.is_some(),
        url,
    }))
}
