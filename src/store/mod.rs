//! Record store abstraction.
//!
//! Services only ever see `dyn Store`; the memory and MySQL backends are
//! interchangeable. Every conditional transition (check-in, check-out, leave
//! decision, unique email insert) is a single atomic store call so callers
//! never have to read-then-write.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, NewAttendance, NewCheckIn},
    audit_log::{AuditLogEntry, NewAuditLog},
    gamification::{GamificationProgress, GamificationSettings},
    leave_request::{LeaveBalance, LeaveRequest, LeaveStatus, NewLeaveRequest},
    role::Role,
    salary_slip::{NewSalarySlip, SalarySlip},
    user::{NewUser, User, UserChanges},
};

pub mod memory;
pub mod mysql;
pub mod seed;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing database cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A unique constraint rejected the write.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("store error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum CheckInOutcome {
    Recorded(AttendanceRecord),
    /// Today's record already has status Present.
    AlreadyPresent,
}

#[derive(Debug)]
pub enum CheckOutOutcome {
    Recorded(AttendanceRecord),
    NotCheckedIn,
    AlreadyCheckedOut,
}

#[derive(Debug)]
pub enum DecisionOutcome {
    Decided(LeaveRequest),
    NotFound,
    AlreadyDecided(LeaveStatus),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken (case-insensitive).
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn user_by_id(&self, id: u64) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Lowest-id user holding `role`.
    async fn first_user_with_role(&self, role: Role) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn count_users(&self) -> StoreResult<u64>;
    async fn count_users_with_role(&self, role: Role) -> StoreResult<u64>;
    /// `Ok(None)` when no user has `id`.
    async fn update_user(&self, id: u64, changes: UserChanges) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>>;
    /// Newest date first, optionally truncated.
    async fn attendance_for_employee(
        &self,
        employee_id: u64,
        limit: Option<usize>,
    ) -> StoreResult<Vec<AttendanceRecord>>;
    /// Newest date first.
    async fn all_attendance(&self) -> StoreResult<Vec<AttendanceRecord>>;
    async fn count_attendance(&self, date: NaiveDate, status: AttendanceStatus)
    -> StoreResult<u64>;
    /// Fails with [`StoreError::Duplicate`] when the employee already has a record that day.
    async fn insert_attendance(&self, record: NewAttendance) -> StoreResult<AttendanceRecord>;
    /// Creates or overwrites the (employee, date) record unless it is already Present.
    async fn record_check_in(&self, entry: NewCheckIn) -> StoreResult<CheckInOutcome>;
    /// Sets check-out on a checked-in record that has not been checked out.
    async fn record_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> StoreResult<CheckOutOutcome>;
}

#[async_trait]
pub trait SalaryStore: Send + Sync {
    async fn insert_salary_slip(&self, slip: NewSalarySlip) -> StoreResult<SalarySlip>;
    async fn salary_slips_for_employee(&self, employee_id: u64) -> StoreResult<Vec<SalarySlip>>;
    async fn all_salary_slips(&self) -> StoreResult<Vec<SalarySlip>>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert_leave_request(&self, request: NewLeaveRequest) -> StoreResult<LeaveRequest>;
    /// Newest start date first, without the joined name.
    async fn leave_requests_for_employee(&self, employee_id: u64)
    -> StoreResult<Vec<LeaveRequest>>;
    /// Newest start date first, each joined with the requester's name.
    async fn all_leave_requests(&self) -> StoreResult<Vec<LeaveRequest>>;
    /// Moves a Pending request to `status`; decided requests are left untouched.
    async fn decide_leave_request(&self, id: u64, status: LeaveStatus)
    -> StoreResult<DecisionOutcome>;
    async fn leave_balance(&self, employee_id: u64) -> StoreResult<Option<LeaveBalance>>;
    async fn set_leave_balance(&self, employee_id: u64, balance: LeaveBalance) -> StoreResult<()>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit(&self, entry: NewAuditLog) -> StoreResult<AuditLogEntry>;
    /// Newest first; equal timestamps fall back to id so the order is strict.
    async fn recent_audit(&self, limit: usize) -> StoreResult<Vec<AuditLogEntry>>;
}

#[async_trait]
pub trait GamificationStore: Send + Sync {
    async fn progress_for(&self, employee_id: u64) -> StoreResult<Option<GamificationProgress>>;
    async fn set_progress(
        &self,
        employee_id: u64,
        progress: GamificationProgress,
    ) -> StoreResult<()>;
    /// Returns the stored settings, storing `defaults` first if there are none.
    async fn settings_or_insert(
        &self,
        defaults: GamificationSettings,
    ) -> StoreResult<GamificationSettings>;
    async fn upsert_settings(
        &self,
        settings: GamificationSettings,
    ) -> StoreResult<GamificationSettings>;
}

pub trait Store:
    UserStore + AttendanceStore + SalaryStore + LeaveStore + AuditStore + GamificationStore
{
}

impl<T> Store for T where
    T: UserStore + AttendanceStore + SalaryStore + LeaveStore + AuditStore + GamificationStore
{
}
