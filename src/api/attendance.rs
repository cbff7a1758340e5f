use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, GeoLocation};
use crate::services::attendance::AttendanceAction;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    /// `check-in` or `check-out`
    #[serde(rename = "type")]
    #[schema(example = "check-in")]
    pub action: String,
    /// Opaque photo payload, usually a data URL
    pub photo: Option<String>,
    pub location: Option<GeoLocation>,
}

/// Check in or check out for today
#[utoipa::path(
    post,
    path = "/api/employees/{id}/attendance",
    params(("id" = u64, Path, description = "Employee (user) id")),
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Today's updated record", body = AttendanceRecord),
        (status = 400, description = "Already checked in/out, not checked in, or unknown action", body = Object, example = json!({
            "message": "You have already checked in today."
        })),
        (status = 404, description = "User not found")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    path: web::Path<u64>,
    body: web::Json<MarkAttendance>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let MarkAttendance {
        action,
        photo,
        location,
    } = body.into_inner();
    let action: AttendanceAction = action.parse()?;

    let record = state
        .attendance
        .mark(path.into_inner(), action, photo, location)
        .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// The employee's attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/employees/{id}/attendance",
    params(("id" = u64, Path, description = "Employee (user) id")),
    responses((status = 200, description = "Attendance records", body = [AttendanceRecord])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    path: web::Path<u64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.attendance.history(path.into_inner()).await?))
}
