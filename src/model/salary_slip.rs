use chrono::Month;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 4,
        "employeeId": 2,
        "month": "May",
        "year": 2024,
        "basic": 4000.0,
        "allowances": 1000.0,
        "deductions": 200.0,
        "netSalary": 4800.0
    })
)]
pub struct SalarySlip {
    pub id: u64,
    pub employee_id: u64,
    /// English month name, e.g. "April"
    pub month: String,
    pub year: i32,
    pub basic: f64,
    pub allowances: f64,
    pub deductions: f64,
    /// Stored as issued, not recomputed from the other amounts
    pub net_salary: f64,
}

impl SalarySlip {
    /// (year, month number) for chronological ordering; unknown month names sort first.
    pub fn period(&self) -> (i32, u32) {
        let month = self
            .month
            .parse::<Month>()
            .map(|m| m.number_from_month())
            .unwrap_or(0);
        (self.year, month)
    }
}

#[derive(Debug, Clone)]
pub struct NewSalarySlip {
    pub employee_id: u64,
    pub month: String,
    pub year: i32,
    pub basic: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub net_salary: f64,
}

impl NewSalarySlip {
    pub fn into_slip(self, id: u64) -> SalarySlip {
        SalarySlip {
            id,
            employee_id: self.employee_id,
            month: self.month,
            year: self.year,
            basic: self.basic,
            allowances: self.allowances,
            deductions: self.deductions,
            net_salary: self.net_salary,
        }
    }
}
