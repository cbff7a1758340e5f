use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Only an admin decision can move a request out of Pending.
    pub fn is_decision(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 3,
        "employeeId": 2,
        "employeeName": "Jane Doe",
        "startDate": "2024-07-20",
        "endDate": "2024-07-25",
        "reason": "Family event",
        "status": "Pending"
    })
)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    /// Joined from the users table at read time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
}

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
}

impl NewLeaveRequest {
    pub fn into_request(self, id: u64) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: self.employee_id,
            employee_name: None,
            start_date: self.start_date,
            end_date: self.end_date,
            reason: self.reason,
            status: self.status,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 15)]
    pub annual: u32,
    #[schema(example = 10)]
    pub sick: u32,
}

impl Default for LeaveBalance {
    fn default() -> Self {
        Self {
            annual: 15,
            sick: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_decision_names_parse() {
        assert_eq!("Approved".parse::<LeaveStatus>().unwrap(), LeaveStatus::Approved);
        assert!("approved".parse::<LeaveStatus>().is_err());
        assert!("Cancelled".parse::<LeaveStatus>().is_err());
        assert!(!LeaveStatus::Pending.is_decision());
        assert!(LeaveStatus::Rejected.is_decision());
    }
}
