use actix_web::{HttpResponse, web};

use crate::error::AppError;
use crate::model::salary_slip::SalarySlip;
use crate::services::dashboard::EmployeeSnapshot;
use crate::state::AppState;
use crate::store::SalaryStore;

/// Today's attendance and gamification progress
#[utoipa::path(
    get,
    path = "/api/employees/{id}/dashboard-data",
    params(("id" = u64, Path, description = "Employee (user) id")),
    responses((status = 200, description = "Employee dashboard", body = EmployeeSnapshot)),
    tag = "Employee"
)]
pub async fn dashboard_data(
    path: web::Path<u64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let snapshot = state.dashboard.employee_snapshot(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// The employee's salary slips
#[utoipa::path(
    get,
    path = "/api/employees/{id}/salaries",
    params(("id" = u64, Path, description = "Employee (user) id")),
    responses((status = 200, description = "Salary slips", body = [SalarySlip])),
    tag = "Employee"
)]
pub async fn list_salaries(
    path: web::Path<u64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let slips = state
        .store
        .salary_slips_for_employee(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(slips))
}
