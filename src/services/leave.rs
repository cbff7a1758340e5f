use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use super::audit::AuditRecorder;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::store::{DecisionOutcome, LeaveStore, Store, StoreError, UserStore};

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid status.")]
    InvalidStatus,

    #[error("Leave request not found.")]
    RequestNotFound,

    #[error("Leave request has already been decided.")]
    AlreadyDecided(LeaveStatus),

    #[error(transparent)]
    Store(#[from] StoreError),
}

const UNKNOWN_EMPLOYEE: &str = "Unknown";

#[derive(Clone)]
pub struct LeaveService {
    store: Arc<dyn Store>,
    audit: AuditRecorder,
}

impl LeaveService {
    pub fn new(store: Arc<dyn Store>, audit: AuditRecorder) -> Self {
        Self { store, audit }
    }

    /// Start/end ordering is not checked here.
    pub async fn submit(
        &self,
        employee_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
    ) -> Result<LeaveRequest, LeaveError> {
        let user = self
            .store
            .user_by_id(employee_id)
            .await?
            .ok_or(LeaveError::UserNotFound)?;

        let request = self
            .store
            .insert_leave_request(NewLeaveRequest {
                employee_id,
                start_date,
                end_date,
                reason,
                status: LeaveStatus::Pending,
            })
            .await?;

        info!(employee_id, request_id = request.id, "Leave request submitted");
        self.audit
            .record(
                &user,
                "Submitted Leave Request",
                format!("From {start_date} to {end_date}"),
            )
            .await;
        Ok(request)
    }

    /// Moves a Pending request to Approved or Rejected. `status` must be one
    /// of those two names exactly; it is validated before the lookup.
    pub async fn decide(&self, request_id: u64, status: &str) -> Result<LeaveRequest, LeaveError> {
        let status = status
            .parse::<LeaveStatus>()
            .ok()
            .filter(|s| s.is_decision())
            .ok_or(LeaveError::InvalidStatus)?;

        let request = match self.store.decide_leave_request(request_id, status).await? {
            DecisionOutcome::Decided(request) => request,
            DecisionOutcome::NotFound => return Err(LeaveError::RequestNotFound),
            DecisionOutcome::AlreadyDecided(current) => {
                info!(request_id, %current, "Leave request already decided");
                return Err(LeaveError::AlreadyDecided(current));
            }
        };

        let name = request.employee_name.as_deref().unwrap_or(UNKNOWN_EMPLOYEE);
        self.audit
            .record_as_admin(&format!("Leave Request {status}"), format!("Request for {name}"))
            .await;
        Ok(request)
    }

    /// Every request, newest start first, with the requester's name.
    pub async fn list_for_admin(&self) -> Result<Vec<LeaveRequest>, StoreError> {
        let mut requests = self.store.all_leave_requests().await?;
        for request in &mut requests {
            request
                .employee_name
                .get_or_insert_with(|| UNKNOWN_EMPLOYEE.to_string());
        }
        Ok(requests)
    }

    pub async fn list_for_employee(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, StoreError> {
        self.store.leave_requests_for_employee(employee_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{role::Role, user::NewUser};
    use crate::store::{AuditStore, memory::MemoryStore};
    use crate::utils::clock::FixedClock;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn setup() -> (Arc<MemoryStore>, LeaveService, u64) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for (name, email, role) in [
            ("Alex Johnson", "admin@example.com", Role::Admin),
            ("Jane Doe", "employee@example.com", Role::Employee),
        ] {
            let user = store
                .insert_user(NewUser {
                    name: name.into(),
                    email: email.into(),
                    password_hash: String::new(),
                    role,
                    team: "T".into(),
                    join_date: day("2022-03-10"),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let audit = AuditRecorder::new(
            store.clone(),
            Arc::new(FixedClock::at("2024-07-01T10:00:00+00:00")),
        );
        let service = LeaveService::new(store.clone(), audit);
        (store, service, ids[1])
    }

    #[actix_web::test]
    async fn submitted_requests_start_pending() {
        let (store, service, jane) = setup().await;

        let request = service
            .submit(jane, day("2024-07-20"), day("2024-07-25"), "Family event".into())
            .await
            .unwrap();
        assert_eq!(request.status, LeaveStatus::Pending);

        let log = store.recent_audit(1).await.unwrap();
        assert_eq!(log[0].action, "Submitted Leave Request");
        assert_eq!(log[0].details, "From 2024-07-20 to 2024-07-25");
    }

    #[actix_web::test]
    async fn unknown_employee_cannot_submit() {
        let (_, service, _) = setup().await;
        let err = service
            .submit(42, day("2024-07-20"), day("2024-07-20"), "x".into())
            .await
            .unwrap_err();
        assert!(matches!(err, LeaveError::UserNotFound));
    }

    #[actix_web::test]
    async fn decision_is_final() {
        let (store, service, jane) = setup().await;
        let request = service
            .submit(jane, day("2024-07-20"), day("2024-07-25"), "Family event".into())
            .await
            .unwrap();

        let decided = service.decide(request.id, "Approved").await.unwrap();
        assert_eq!(decided.status, LeaveStatus::Approved);
        assert_eq!(decided.employee_name.as_deref(), Some("Jane Doe"));

        let log = store.recent_audit(1).await.unwrap();
        assert_eq!(log[0].action, "Leave Request Approved");
        assert_eq!(log[0].details, "Request for Jane Doe");
        assert_eq!(log[0].user_name, "Alex Johnson");

        let err = service.decide(request.id, "Rejected").await.unwrap_err();
        assert!(matches!(err, LeaveError::AlreadyDecided(LeaveStatus::Approved)));
    }

    #[actix_web::test]
    async fn invalid_status_leaves_request_untouched() {
        let (_, service, jane) = setup().await;
        let request = service
            .submit(jane, day("2024-07-20"), day("2024-07-25"), "x".into())
            .await
            .unwrap();

        for bad in ["Pending", "approved", "Cancelled", ""] {
            let err = service.decide(request.id, bad).await.unwrap_err();
            assert!(matches!(err, LeaveError::InvalidStatus), "{bad}");
        }
        // validated before lookup
        let err = service.decide(999, "Maybe").await.unwrap_err();
        assert!(matches!(err, LeaveError::InvalidStatus));

        let listed = service.list_for_employee(jane).await.unwrap();
        assert_eq!(listed[0].status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn unknown_request_is_not_found() {
        let (_, service, _) = setup().await;
        let err = service.decide(999, "Rejected").await.unwrap_err();
        assert!(matches!(err, LeaveError::RequestNotFound));
    }

    #[actix_web::test]
    async fn admin_listing_is_newest_first_with_names() {
        let (store, service, jane) = setup().await;
        service
            .submit(jane, day("2024-05-10"), day("2024-05-12"), "Vacation".into())
            .await
            .unwrap();
        service
            .submit(jane, day("2024-07-20"), day("2024-07-25"), "Family".into())
            .await
            .unwrap();
        // requester no longer exists
        store
            .insert_leave_request(NewLeaveRequest {
                employee_id: 77,
                start_date: day("2024-06-01"),
                end_date: day("2024-06-01"),
                reason: "Ghost".into(),
                status: LeaveStatus::Pending,
            })
            .await
            .unwrap();

        let listed = service.list_for_admin().await.unwrap();
        let reasons: Vec<_> = listed.iter().map(|r| r.reason.as_str()).collect();
        assert_eq!(reasons, ["Family", "Ghost", "Vacation"]);
        assert_eq!(listed[1].employee_name.as_deref(), Some("Unknown"));
        assert_eq!(listed[0].employee_name.as_deref(), Some("Jane Doe"));
    }
}
