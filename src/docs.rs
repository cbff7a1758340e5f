use crate::api::{
    admin::AdminDashboard,
    ai::{ChatRequest, ChatResponse},
    attendance::MarkAttendance,
    leave_request::{CreateLeave, DecideLeave},
    users::UpdateUserRequest,
};
use crate::auth::handlers::{LoginRequest, SignupRequest};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, GeoLocation},
    audit_log::AuditLogEntry,
    gamification::{Badge, GamificationProgress, GamificationSettings},
    leave_request::{LeaveBalance, LeaveRequest, LeaveStatus},
    role::Role,
    salary_slip::SalarySlip,
    user::{User, UserUpdates},
};
use crate::services::{
    ai::ChatUser,
    dashboard::{AdminStats, EmployeeSnapshot},
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Portal API",
        version = "1.0.0",
        description = r#"
## HR Portal

Backend for an HR dashboard used by admins and employees.

### 🔹 Key Features
- **Accounts**
  - Log in, sign up, view and update profiles
- **Attendance**
  - Daily check-in and check-out with photo and location capture
- **Leave Management**
  - Submit leave requests, approve or reject them
- **Payroll**
  - View salary slips
- **Admin**
  - Daily head counts, audit log, gamification settings, CSV export
- **AI Assistant**
  - Answers questions using the caller's own HR records

### 📦 Response Format
- JSON bodies with camelCase fields
- Errors are `{"message": "..."}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::signup,

        crate::api::users::get_user,
        crate::api::users::update_user,

        crate::api::admin::dashboard_data,
        crate::api::admin::list_employees,
        crate::api::admin::list_attendance,
        crate::api::admin::list_salaries,
        crate::api::admin::get_gamification_settings,
        crate::api::admin::update_gamification_settings,
        crate::api::admin::audit_logs,
        crate::api::export::export_employees,

        crate::api::leave_request::admin_leave_list,
        crate::api::leave_request::decide_leave,
        crate::api::leave_request::employee_leave_list,
        crate::api::leave_request::create_leave,

        crate::api::employee::dashboard_data,
        crate::api::employee::list_salaries,
        crate::api::attendance::mark_attendance,
        crate::api::attendance::list_attendance,

        crate::api::ai::chat
    ),
    components(
        schemas(
            LoginRequest,
            SignupRequest,
            User,
            UserUpdates,
            UpdateUserRequest,
            Role,
            AttendanceRecord,
            AttendanceStatus,
            GeoLocation,
            MarkAttendance,
            SalarySlip,
            LeaveRequest,
            LeaveStatus,
            LeaveBalance,
            CreateLeave,
            DecideLeave,
            Badge,
            GamificationProgress,
            GamificationSettings,
            AuditLogEntry,
            AdminStats,
            AdminDashboard,
            EmployeeSnapshot,
            ChatUser,
            ChatRequest,
            ChatResponse
        )
    ),
    tags(
        (name = "Auth", description = "Login and signup"),
        (name = "Users", description = "User profiles"),
        (name = "Admin", description = "Admin dashboard, exports and settings"),
        (name = "Leave", description = "Leave request workflow"),
        (name = "Attendance", description = "Attendance check-in/check-out"),
        (name = "Employee", description = "Employee self-service"),
        (name = "AI", description = "HR assistant"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for expected in [
            "/api/auth/login",
            "/api/admin/leave-requests/{id}",
            "/api/employees/{id}/attendance",
            "/api/ai/chat",
        ] {
            assert!(paths.iter().any(|p| p == expected), "{expected} missing");
        }
    }
}
