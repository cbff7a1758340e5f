use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::{
    attendance::AttendanceRecord, audit_log::AuditLogEntry, gamification::GamificationSettings,
    salary_slip::SalarySlip, user::User,
};
use crate::services::{audit::AUDIT_PAGE, dashboard::AdminStats};
use crate::state::AppState;
use crate::store::{GamificationStore, SalaryStore};

#[derive(Serialize, ToSchema)]
pub struct AdminDashboard {
    pub stats: AdminStats,
}

/// Head counts for today
#[utoipa::path(
    get,
    path = "/api/admin/dashboard-data",
    responses((status = 200, description = "Today's counts", body = AdminDashboard)),
    tag = "Admin"
)]
pub async fn dashboard_data(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let stats = state.dashboard.admin_snapshot().await?;
    Ok(HttpResponse::Ok().json(AdminDashboard { stats }))
}

/// All users
#[utoipa::path(
    get,
    path = "/api/admin/employees",
    responses((status = 200, description = "Every user", body = [User])),
    tag = "Admin"
)]
pub async fn list_employees(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.accounts.list_users().await?))
}

/// All attendance records, newest date first
#[utoipa::path(
    get,
    path = "/api/admin/attendance",
    responses((status = 200, description = "Attendance history", body = [AttendanceRecord])),
    tag = "Admin"
)]
pub async fn list_attendance(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.attendance.all().await?))
}

/// All salary slips
#[utoipa::path(
    get,
    path = "/api/admin/salaries",
    responses((status = 200, description = "Every salary slip", body = [SalarySlip])),
    tag = "Admin"
)]
pub async fn list_salaries(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.store.all_salary_slips().await?))
}

/// Current gamification settings
#[utoipa::path(
    get,
    path = "/api/admin/gamification-settings",
    responses((status = 200, description = "Settings, defaults stored on first read", body = GamificationSettings)),
    tag = "Admin"
)]
pub async fn get_gamification_settings(
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let settings = state
        .store
        .settings_or_insert(GamificationSettings::default())
        .await?;
    Ok(HttpResponse::Ok().json(settings))
}

/// Replace the gamification settings
#[utoipa::path(
    put,
    path = "/api/admin/gamification-settings",
    request_body = GamificationSettings,
    responses(
        (status = 200, description = "Stored settings", body = GamificationSettings),
        (status = 400, description = "Malformed settings")
    ),
    tag = "Admin"
)]
pub async fn update_gamification_settings(
    body: web::Json<GamificationSettings>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let settings = state.store.upsert_settings(body.into_inner()).await?;
    state
        .audit
        .record_as_admin("Updated Gamification Settings", "")
        .await;
    Ok(HttpResponse::Ok().json(settings))
}

/// Latest audit entries, newest first
#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    responses((status = 200, description = "Up to 100 entries", body = [AuditLogEntry])),
    tag = "Admin"
)]
pub async fn audit_logs(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.audit.recent(AUDIT_PAGE).await?))
}
