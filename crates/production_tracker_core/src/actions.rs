//! crates/production_tracker_core/src/actions.rs
//!
//! User-facing operations and the business rules that guard them.
//!
//! Every rule is checked before anything is written, so a rejected action leaves
//! storage exactly as it was. Activity logging happens after the write and never
//! fails the action.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::clock::db_timestamp;
use crate::domain::{
    Category, LogAction, NewActivityLog, OffDay, ProcessType, ProductionEntry, Role, Unit, User,
};
use crate::events::NotificationLevel;
use crate::ports::PortError;
use crate::seed;
use crate::service::{DeleteOutcome, TrackerService};

pub const MIN_PASSWORD_LENGTH: usize = 6;

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Role '{role}' may not {action}")]
    PermissionDenied {
        role: &'static str,
        action: &'static str,
    },
    #[error("Operators may only record output for their own department ({0})")]
    WrongDepartment(&'static str),
    #[error("Production entry is prohibited on {date} ({description})")]
    OffDay { date: String, description: String },
    #[error("Required field is missing: {0}")]
    MissingField(&'static str),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("Production entry {0} not found")]
    EntryNotFound(String),
    #[error("Date {0} is already marked as an off day")]
    DuplicateOffDay(String),
    #[error("Off day {0} not found")]
    OffDayNotFound(String),
    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error("The last administrator cannot be deleted")]
    LastAdmin,
    #[error("New passwords do not match")]
    PasswordMismatch,
    #[error("Incorrect current password")]
    WrongPassword,
    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),
    #[error(transparent)]
    Storage(#[from] PortError),
}

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub date: String,
    pub category: Category,
    pub process: ProcessType,
    pub product_name: String,
    pub plan_quantity: f64,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActualRequest {
    pub actual_quantity: f64,
    #[serde(default)]
    pub manpower: f64,
    #[serde(default)]
    pub batch_no: String,
    #[serde(default)]
    pub remark: String,
}

/// Fields of an existing entry to overwrite; absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    pub date: Option<String>,
    pub category: Option<Category>,
    pub process: Option<ProcessType>,
    pub product_name: Option<String>,
    pub plan_quantity: Option<f64>,
    pub actual_quantity: Option<f64>,
    pub unit: Option<Unit>,
    pub batch_no: Option<String>,
    pub manpower: Option<f64>,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    pub category: Option<Category>,
    pub password: String,
}

//=========================================================================================
// Rule helpers
//=========================================================================================

pub fn has_permission(user: Option<&User>, roles: &[Role]) -> bool {
    user.is_some_and(|u| roles.contains(&u.role))
}

fn require_role(actor: &User, roles: &[Role], action: &'static str) -> Result<(), ActionError> {
    if roles.contains(&actor.role) {
        Ok(())
    } else {
        Err(ActionError::PermissionDenied {
            role: actor.role.as_str(),
            action,
        })
    }
}

/// Accepts strictly `YYYY-MM-DD` calendar dates.
fn valid_date(raw: &str) -> Result<String, ActionError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ActionError::MissingField("date"));
    }
    let well_formed = raw.len() == 10 && NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok();
    if well_formed {
        Ok(raw.to_string())
    } else {
        Err(ActionError::Invalid {
            field: "date",
            reason: format!("'{raw}' is not a YYYY-MM-DD date"),
        })
    }
}

fn quantity(field: &'static str, value: f64) -> Result<f64, ActionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ActionError::Invalid {
            field,
            reason: "must be a non-negative number".to_string(),
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ActionError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ActionError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}

//=========================================================================================
// Operations
//=========================================================================================

impl TrackerService {
    async fn record(&self, entry: NewActivityLog) {
        if let Err(e) = self.add_log(entry).await {
            error!("Logging error: {}", e);
        }
    }

    /// Rejects dates marked as off-days and tells connected clients why.
    fn reject_off_day(&self, off_days: &[OffDay], date: &str) -> Result<(), ActionError> {
        match off_days.iter().find(|d| d.date == date) {
            Some(day) => {
                self.events.notify(
                    NotificationLevel::Info,
                    format!("HOLIDAY DETECTED: {}", day.description),
                );
                Err(ActionError::OffDay {
                    date: day.date.clone(),
                    description: day.description.clone(),
                })
            }
            None => Ok(()),
        }
    }

    //-------------------------------------------------------------------------------------
    // Session
    //-------------------------------------------------------------------------------------

    /// Checks plain-text credentials against the built-in accounts overlaid with the
    /// stored ones. Usernames compare case-insensitively.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, ActionError> {
        let mut by_name: HashMap<String, User> = seed::initial_users()
            .into_iter()
            .chain(self.get_users().await)
            .map(|u| (u.username.to_lowercase(), u))
            .collect();
        by_name
            .remove(&username.trim().to_lowercase())
            .filter(|u| u.password.as_deref() == Some(password))
            .ok_or(ActionError::InvalidCredentials)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ActionError> {
        let user = self.authenticate(username, password).await?;
        self.set_session(Some(&user)).await?;
        info!(username = %user.username, "User logged in");
        Ok(user)
    }

    /// Logs in and issues the token that identifies the client holding the
    /// session. The previous holder's token stops working first.
    pub async fn login_with_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, String), ActionError> {
        let user = self.authenticate(username, password).await?;
        let token = self.open_session().await?;
        self.set_session(Some(&user)).await?;
        info!(username = %user.username, "User logged in");
        Ok((user, token))
    }

    pub async fn logout(&self) -> Result<(), ActionError> {
        self.set_session(None).await?;
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Production
    //-------------------------------------------------------------------------------------

    pub async fn create_plan(
        &self,
        actor: &User,
        req: PlanRequest,
    ) -> Result<ProductionEntry, ActionError> {
        require_role(
            actor,
            &[Role::Admin, Role::Manager, Role::Planner],
            "create production plans",
        )?;
        let date = valid_date(&req.date)?;
        let product_name = required("productName", &req.product_name)?.to_uppercase();
        let plan_quantity = quantity("planQuantity", req.plan_quantity)?;
        if plan_quantity == 0.0 {
            return Err(ActionError::MissingField("planQuantity"));
        }
        self.reject_off_day(&self.get_off_days().await, &date)?;

        let entry = ProductionEntry {
            id: Uuid::new_v4().to_string(),
            date,
            category: req.category,
            process: req.process,
            product_name,
            plan_quantity,
            actual_quantity: 0.0,
            unit: req.unit,
            batch_no: String::new(),
            manpower: 0.0,
            remark: req.remark.trim().to_uppercase(),
            last_updated_by: actor.id.clone(),
            updated_at: db_timestamp(self.clock()),
        };
        self.update(|entries: &mut Vec<ProductionEntry>| -> Result<_, ActionError> {
            entries.push(entry.clone());
            Ok(())
        })
        .await?;

        self.record(NewActivityLog::by(
            actor,
            LogAction::CreatePlan,
            format!(
                "Created production plan for {} on {}",
                entry.product_name, entry.date
            ),
        ))
        .await;
        self.events
            .notify(NotificationLevel::Success, "PRODUCTION PLAN CREATED");
        Ok(entry)
    }

    /// Records actual output against an existing plan entry.
    pub async fn record_actual(
        &self,
        actor: &User,
        entry_id: &str,
        req: ActualRequest,
    ) -> Result<ProductionEntry, ActionError> {
        let off_days = self.get_off_days().await;
        let updated_at = db_timestamp(self.clock());
        let (updated, _) = self
            .update(|entries: &mut Vec<ProductionEntry>| -> Result<_, ActionError> {
                let entry = entries
                    .iter_mut()
                    .find(|e| e.id == entry_id)
                    .ok_or_else(|| ActionError::EntryNotFound(entry_id.to_string()))?;
                if actor.role == Role::Operator {
                    if let Some(own) = actor.category {
                        if entry.category != own {
                            return Err(ActionError::WrongDepartment(own.as_str()));
                        }
                    }
                }
                let actual_quantity = quantity("actualQuantity", req.actual_quantity)?;
                let manpower = quantity("manpower", req.manpower)?;
                self.reject_off_day(&off_days, &entry.date)?;

                entry.actual_quantity = actual_quantity;
                entry.manpower = manpower;
                entry.batch_no = req.batch_no.trim().to_uppercase();
                entry.remark = req.remark.trim().to_uppercase();
                entry.last_updated_by = actor.id.clone();
                entry.updated_at = updated_at;
                Ok(entry.clone())
            })
            .await?;

        self.record(NewActivityLog::by(
            actor,
            LogAction::RecordActual,
            format!(
                "Updated actuals for {} [{}]: {} units",
                updated.product_name.to_uppercase(),
                updated.category.as_str(),
                updated.actual_quantity
            ),
        ))
        .await;
        self.events
            .notify(NotificationLevel::Success, "ACTUAL PRODUCTION RECORDED");
        Ok(updated)
    }

    pub async fn edit_entry(
        &self,
        actor: &User,
        entry_id: &str,
        patch: EntryPatch,
    ) -> Result<ProductionEntry, ActionError> {
        require_role(actor, &[Role::Admin, Role::Manager], "edit production records")?;
        let off_days = self.get_off_days().await;
        let updated_at = db_timestamp(self.clock());
        let (entry, _) = self
            .update(|entries: &mut Vec<ProductionEntry>| -> Result<_, ActionError> {
                let stored = entries
                    .iter_mut()
                    .find(|e| e.id == entry_id)
                    .ok_or_else(|| ActionError::EntryNotFound(entry_id.to_string()))?;
                let mut entry = stored.clone();
                apply_patch(&mut entry, &patch)?;
                self.reject_off_day(&off_days, &entry.date)?;

                entry.last_updated_by = actor.id.clone();
                entry.updated_at = updated_at;
                *stored = entry.clone();
                Ok(entry)
            })
            .await?;

        self.record(NewActivityLog::by(
            actor,
            LogAction::EditRecord,
            format!("Edited record for {} on {}", entry.product_name, entry.date),
        ))
        .await;
        Ok(entry)
    }

    pub async fn delete_entry(
        &self,
        actor: &User,
        entry_id: &str,
    ) -> Result<DeleteOutcome, ActionError> {
        require_role(actor, &[Role::Admin, Role::Manager], "delete production records")?;
        let outcome = self.delete_production_entry(entry_id).await?;
        if let Some(deleted) = &outcome.deleted {
            self.record(NewActivityLog::by(
                actor,
                LogAction::DeleteRecord,
                format!(
                    "Deleted record: {} ({}) [{}]",
                    deleted.product_name,
                    deleted.date,
                    deleted.category.as_str()
                ),
            ))
            .await;
        }
        Ok(outcome)
    }

    //-------------------------------------------------------------------------------------
    // Off-days
    //-------------------------------------------------------------------------------------

    /// Marks a date as an off-day. Only one off-day may exist per date; the
    /// check runs under the off-day write guard before anything is written.
    pub async fn add_off_day(
        &self,
        actor: &User,
        date: &str,
        description: Option<&str>,
    ) -> Result<OffDay, ActionError> {
        require_role(actor, &[Role::Admin, Role::Manager], "manage off days")?;
        let date = valid_date(date)?;
        let day = OffDay {
            id: Uuid::new_v4().to_string(),
            date,
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or("Scheduled Off")
                .to_string(),
            created_by: actor.id.clone(),
        };
        self.update(|days: &mut Vec<OffDay>| -> Result<_, ActionError> {
            if days.iter().any(|d| d.date == day.date) {
                return Err(ActionError::DuplicateOffDay(day.date.clone()));
            }
            days.push(day.clone());
            days.sort_by(|a, b| a.date.cmp(&b.date));
            Ok(())
        })
        .await?;

        self.record(NewActivityLog::by(
            actor,
            LogAction::AddHoliday,
            format!("Marked {} as off day: {}", day.date, day.description),
        ))
        .await;
        Ok(day)
    }

    pub async fn remove_off_day(&self, actor: &User, id: &str) -> Result<OffDay, ActionError> {
        require_role(actor, &[Role::Admin, Role::Manager], "manage off days")?;
        let (removed, _) = self
            .update(|days: &mut Vec<OffDay>| -> Result<_, ActionError> {
                let index = days
                    .iter()
                    .position(|d| d.id == id)
                    .ok_or_else(|| ActionError::OffDayNotFound(id.to_string()))?;
                Ok(days.remove(index))
            })
            .await?;

        self.record(NewActivityLog::by(
            actor,
            LogAction::DeleteHoliday,
            format!("Removed off day {} ({})", removed.date, removed.description),
        ))
        .await;
        Ok(removed)
    }

    //-------------------------------------------------------------------------------------
    // Users
    //-------------------------------------------------------------------------------------

    pub async fn add_user(&self, actor: &User, new_user: NewUser) -> Result<User, ActionError> {
        require_role(actor, &[Role::Admin], "manage users")?;
        let username = required("username", &new_user.username)?;
        let name = required("name", &new_user.name)?;
        let password = required("password", &new_user.password)?;
        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            username,
            email: new_user.email.trim().to_string(),
            role: new_user.role,
            category: new_user.category,
            password: Some(password),
            avatar: None,
        };
        self.update(|users: &mut Vec<User>| -> Result<_, ActionError> {
            if users
                .iter()
                .any(|u| u.username.eq_ignore_ascii_case(&user.username))
            {
                return Err(ActionError::DuplicateUsername(user.username.clone()));
            }
            users.push(user.clone());
            Ok(())
        })
        .await?;

        self.record(NewActivityLog::by(
            actor,
            LogAction::AddUser,
            format!(
                "Created user: {} [{}] ({})",
                user.name,
                user.role.as_str(),
                user.category.map(|c| c.as_str()).unwrap_or("All Depts")
            ),
        ))
        .await;
        self.events.notify(
            NotificationLevel::Success,
            format!("NEW USER CREATED: {}", user.name.to_uppercase()),
        );
        Ok(user)
    }

    pub async fn delete_user(&self, actor: &User, id: &str) -> Result<User, ActionError> {
        require_role(actor, &[Role::Admin], "manage users")?;
        let (removed, _) = self
            .update(|users: &mut Vec<User>| -> Result<_, ActionError> {
                let index = users
                    .iter()
                    .position(|u| u.id == id)
                    .ok_or_else(|| ActionError::UserNotFound(id.to_string()))?;
                let admins = users.iter().filter(|u| u.role == Role::Admin).count();
                if users[index].role == Role::Admin && admins <= 1 {
                    return Err(ActionError::LastAdmin);
                }
                Ok(users.remove(index))
            })
            .await?;

        self.record(NewActivityLog::by(
            actor,
            LogAction::DeleteUser,
            format!("Removed account: {} (@{})", removed.name, removed.username),
        ))
        .await;
        self.events.notify(
            NotificationLevel::Info,
            format!("USER REMOVED: {}", removed.name.to_uppercase()),
        );
        Ok(removed)
    }

    pub async fn change_password(
        &self,
        actor: &User,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<User, ActionError> {
        if new_password != confirm {
            return Err(ActionError::PasswordMismatch);
        }
        let (user, _) = self
            .update(|users: &mut Vec<User>| -> Result<_, ActionError> {
                let user = record_of(users, actor);
                if user.password.as_deref() != Some(current) {
                    return Err(ActionError::WrongPassword);
                }
                if new_password.chars().count() < MIN_PASSWORD_LENGTH {
                    return Err(ActionError::PasswordTooShort(MIN_PASSWORD_LENGTH));
                }
                user.password = Some(new_password.to_string());
                Ok(user.clone())
            })
            .await?;
        self.set_session(Some(&user)).await?;

        self.record(NewActivityLog::by(
            &user,
            LogAction::ChangePassword,
            "User successfully updated their account password",
        ))
        .await;
        self.events
            .notify(NotificationLevel::Success, "PASSWORD UPDATED SUCCESSFULLY");
        Ok(user)
    }

    pub async fn update_avatar(
        &self,
        actor: &User,
        avatar: Option<String>,
    ) -> Result<User, ActionError> {
        let avatar = avatar.filter(|a| !a.trim().is_empty());
        let (user, _) = self
            .update(|users: &mut Vec<User>| -> Result<_, ActionError> {
                let user = record_of(users, actor);
                user.avatar = avatar;
                Ok(user.clone())
            })
            .await?;
        self.set_session(Some(&user)).await?;

        self.record(NewActivityLog::by(
            &user,
            LogAction::UpdateAvatar,
            "User updated their profile picture",
        ))
        .await;
        Ok(user)
    }
}

/// The stored record of `actor`, added to the list if it is not stored yet.
fn record_of<'a>(users: &'a mut Vec<User>, actor: &User) -> &'a mut User {
    let index = match users.iter().position(|u| u.id == actor.id) {
        Some(index) => index,
        None => {
            users.push(actor.clone());
            users.len() - 1
        }
    };
    &mut users[index]
}

fn apply_patch(entry: &mut ProductionEntry, patch: &EntryPatch) -> Result<(), ActionError> {
    if let Some(date) = &patch.date {
        entry.date = valid_date(date)?;
    }
    if let Some(name) = &patch.product_name {
        entry.product_name = required("productName", name)?.to_uppercase();
    }
    if let Some(plan) = patch.plan_quantity {
        entry.plan_quantity = quantity("planQuantity", plan)?;
    }
    if let Some(actual) = patch.actual_quantity {
        entry.actual_quantity = quantity("actualQuantity", actual)?;
    }
    if let Some(manpower) = patch.manpower {
        entry.manpower = quantity("manpower", manpower)?;
    }
    if let Some(category) = patch.category {
        entry.category = category;
    }
    if let Some(process) = patch.process {
        entry.process = process;
    }
    if let Some(unit) = patch.unit {
        entry.unit = unit;
    }
    if let Some(batch_no) = &patch.batch_no {
        entry.batch_no = batch_no.trim().to_uppercase();
    }
    if let Some(remark) = &patch.remark {
        entry.remark = remark.trim().to_uppercase();
    }
    Ok(())
}
