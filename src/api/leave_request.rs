use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::leave_request::LeaveRequest;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeave {
    #[schema(example = "2024-07-20", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-07-25", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DecideLeave {
    /// `Approved` or `Rejected`
    #[schema(example = "Approved")]
    pub status: String,
}

/// Every leave request with the requester's name, latest start first
#[utoipa::path(
    get,
    path = "/api/admin/leave-requests",
    responses((status = 200, description = "Leave requests", body = [LeaveRequest])),
    tag = "Leave"
)]
pub async fn admin_leave_list(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.leave.list_for_admin().await?))
}

/// Approve or reject a pending request
#[utoipa::path(
    put,
    path = "/api/admin/leave-requests/{id}",
    params(("id" = u64, Path, description = "Leave request id")),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Decided request", body = LeaveRequest),
        (status = 400, description = "Invalid status or request already decided", body = Object, example = json!({
            "message": "Invalid status."
        })),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn decide_leave(
    path: web::Path<u64>,
    body: web::Json<DecideLeave>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let request = state
        .leave
        .decide(path.into_inner(), &body.status)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// The employee's own leave requests, latest start first
#[utoipa::path(
    get,
    path = "/api/employees/{id}/leave-requests",
    params(("id" = u64, Path, description = "Employee (user) id")),
    responses((status = 200, description = "Leave requests", body = [LeaveRequest])),
    tag = "Leave"
)]
pub async fn employee_leave_list(
    path: web::Path<u64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.leave.list_for_employee(path.into_inner()).await?))
}

/// Submit a leave request; it starts Pending
#[utoipa::path(
    post,
    path = "/api/employees/{id}/leave-requests",
    params(("id" = u64, Path, description = "Employee (user) id")),
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Created request", body = LeaveRequest),
        (status = 404, description = "User not found")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    path: web::Path<u64>,
    body: web::Json<CreateLeave>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let CreateLeave {
        start_date,
        end_date,
        reason,
    } = body.into_inner();

    let request = state
        .leave
        .submit(path.into_inner(), start_date, end_date, reason)
        .await?;
    Ok(HttpResponse::Created().json(request))
}
