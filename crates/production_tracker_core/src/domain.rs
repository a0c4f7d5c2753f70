//! crates/production_tracker_core/src/domain.rs
//!
//! Defines the core data structures for the production tracker.
//! Field names serialize in camelCase because that is the keyed shape the
//! spreadsheet endpoint speaks and the shape persisted in local storage.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Enumerations
//=========================================================================================

/// The fixed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Planner,
    Operator,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Planner, Role::Operator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Planner => "planner",
            Role::Operator => "operator",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// A production department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    Healthcare,
    Toothpaste,
    Rocksalt,
    Cosmetic,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Healthcare,
        Category::Toothpaste,
        Category::Rocksalt,
        Category::Cosmetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Healthcare => "Healthcare",
            Category::Toothpaste => "Toothpaste",
            Category::Rocksalt => "Rocksalt",
            Category::Cosmetic => "Cosmetic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// A stage of the production line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ProcessType {
    Mixing,
    Encapsulation,
    Filling,
    Sorting,
    Packing,
}

impl ProcessType {
    pub const ALL: [ProcessType; 5] = [
        ProcessType::Mixing,
        ProcessType::Encapsulation,
        ProcessType::Filling,
        ProcessType::Sorting,
        ProcessType::Packing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessType::Mixing => "Mixing",
            ProcessType::Encapsulation => "Encapsulation",
            ProcessType::Filling => "Filling",
            ProcessType::Sorting => "Sorting",
            ProcessType::Packing => "Packing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Unit of measure for plan and actual quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    #[default]
    Kg,
    Pcs,
    Carton,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Kg, Unit::Pcs, Unit::Carton];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "KG",
            Unit::Pcs => "PCS",
            Unit::Carton => "CARTON",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

//=========================================================================================
// Records
//=========================================================================================

/// An account able to log in. The password is kept in plain text; login is a
/// convenience gate, not a security boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Assigned department for operators and planners.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Image reference, usually a data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A plan entry, and once actuals are recorded against it, an actual entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEntry {
    pub id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub category: Category,
    pub process: ProcessType,
    pub product_name: String,
    pub plan_quantity: f64,
    pub actual_quantity: f64,
    pub unit: Unit,
    #[serde(default)]
    pub batch_no: String,
    #[serde(default)]
    pub manpower: f64,
    #[serde(default)]
    pub remark: String,
    pub last_updated_by: String,
    pub updated_at: String,
}

/// A calendar date on which production entry is disallowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OffDay {
    pub id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub description: String,
    pub created_by: String,
}

/// An append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    pub timestamp: String,
    pub user_id: String,
    pub user_name: String,
    pub action: String,
    pub details: String,
}

/// The caller-supplied part of an activity log; id and timestamp are assigned on append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub user_id: String,
    pub user_name: String,
    pub action: LogAction,
    pub details: String,
}

impl NewActivityLog {
    pub fn by(actor: &User, action: LogAction, details: impl Into<String>) -> Self {
        Self {
            user_id: actor.id.clone(),
            user_name: actor.name.clone(),
            action,
            details: details.into(),
        }
    }
}

/// Action tags written into the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    CreatePlan,
    EditRecord,
    RecordActual,
    DeleteRecord,
    AddHoliday,
    DeleteHoliday,
    AddUser,
    DeleteUser,
    ChangePassword,
    UpdateAvatar,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::CreatePlan => "CREATE_PLAN",
            LogAction::EditRecord => "EDIT_RECORD",
            LogAction::RecordActual => "RECORD_ACTUAL",
            LogAction::DeleteRecord => "DELETE_RECORD",
            LogAction::AddHoliday => "ADD_HOLIDAY",
            LogAction::DeleteHoliday => "DELETE_HOLIDAY",
            LogAction::AddUser => "ADD_USER",
            LogAction::DeleteUser => "DELETE_USER",
            LogAction::ChangePassword => "CHANGE_PASSWORD",
            LogAction::UpdateAvatar => "UPDATE_AVATAR",
        }
    }
}

/// Aggregate figures over a set of production entries.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_plan: f64,
    pub total_actual: f64,
    pub avg_efficiency: f64,
    pub total_manpower: f64,
}

//=========================================================================================
// Collections
//=========================================================================================

/// The four record collections held in local storage and mirrored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Production,
    OffDays,
    Logs,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Production,
        Collection::OffDays,
        Collection::Logs,
        Collection::Users,
    ];

    /// The fixed local storage key of this collection.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Collection::Users => keys::USERS,
            Collection::Production => keys::PRODUCTION,
            Collection::OffDays => keys::OFF_DAYS,
            Collection::Logs => keys::LOGS,
        }
    }

    pub fn fetch_action(&self) -> FetchAction {
        match self {
            Collection::Users => FetchAction::GetUsers,
            Collection::Production => FetchAction::GetProduction,
            Collection::OffDays => FetchAction::GetOffDays,
            Collection::Logs => FetchAction::GetLogs,
        }
    }

    pub fn save_action(&self) -> SaveAction {
        match self {
            Collection::Users => SaveAction::SaveUsers,
            Collection::Production => SaveAction::SaveProduction,
            Collection::OffDays => SaveAction::SaveOffDays,
            Collection::Logs => SaveAction::SaveLogs,
        }
    }
}

/// Fixed local storage keys.
pub mod keys {
    pub const USERS: &str = "halagel_users";
    pub const PRODUCTION: &str = "halagel_production";
    pub const OFF_DAYS: &str = "halagel_off_days";
    pub const LOGS: &str = "halagel_activity_logs";
    pub const SESSION: &str = "halagel_current_user_session";
    pub const SESSION_TOKEN: &str = "halagel_session_token";
    pub const REMOTE_URL: &str = "halagel_sheets_api_url";
}

/// Read actions understood by the remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchAction {
    GetProduction,
    GetOffDays,
    GetLogs,
    GetUsers,
}

impl FetchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchAction::GetProduction => "getProduction",
            FetchAction::GetOffDays => "getOffDays",
            FetchAction::GetLogs => "getLogs",
            FetchAction::GetUsers => "getUsers",
        }
    }
}

/// Write actions understood by the remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    SaveProduction,
    SaveUsers,
    SaveOffDays,
    SaveLogs,
}

impl SaveAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveAction::SaveProduction => "saveProduction",
            SaveAction::SaveUsers => "saveUsers",
            SaveAction::SaveOffDays => "saveOffDays",
            SaveAction::SaveLogs => "saveLogs",
        }
    }
}
