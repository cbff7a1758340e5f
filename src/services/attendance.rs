use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::audit::AuditRecorder;
use crate::model::{
    attendance::{AttendanceRecord, GeoLocation, NewCheckIn},
    user::User,
};
use crate::store::{
    AttendanceStore, CheckInOutcome, CheckOutOutcome, Store, StoreError, UserStore,
};
use crate::utils::clock::Clock;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("User not found")]
    UserNotFound,

    #[error("You have already checked in today.")]
    AlreadyCheckedIn,

    #[error("You have not checked in today.")]
    NotCheckedIn,

    #[error("You have already checked out today.")]
    AlreadyCheckedOut,

    #[error("Invalid attendance action.")]
    InvalidAction,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The two actions an employee can mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceAction {
    CheckIn,
    CheckOut,
}

impl std::str::FromStr for AttendanceAction {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check-in" => Ok(AttendanceAction::CheckIn),
            "check-out" => Ok(AttendanceAction::CheckOut),
            _ => Err(AttendanceError::InvalidAction),
        }
    }
}

#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    audit: AuditRecorder,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, audit: AuditRecorder) -> Self {
        Self {
            store,
            clock,
            audit,
        }
    }

    async fn user(&self, employee_id: u64) -> Result<User, AttendanceError> {
        self.store
            .user_by_id(employee_id)
            .await?
            .ok_or(AttendanceError::UserNotFound)
    }

    /// Today's stored record, or an unsaved Absent placeholder.
    pub async fn resolve_today(&self, employee_id: u64) -> Result<AttendanceRecord, StoreError> {
        let today = self.clock.today();
        if let Some(record) = self.store.attendance_on(employee_id, today).await? {
            return Ok(record);
        }

        let name = self.store.user_by_id(employee_id).await?.map(|u| u.name);
        Ok(AttendanceRecord::absent(employee_id, name, today))
    }

    pub async fn check_in(
        &self,
        employee_id: u64,
        photo: Option<String>,
        location: Option<GeoLocation>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let user = self.user(employee_id).await?;

        let entry = NewCheckIn {
            employee_id,
            employee_name: user.name.clone(),
            date: self.clock.today(),
            time: self.clock.time_of_day(),
            photo,
            location,
        };

        match self.store.record_check_in(entry).await? {
            CheckInOutcome::Recorded(record) => {
                info!(employee_id, date = %record.date, "Checked in");
                self.audit
                    .record(&user, "Checked In", format!("Checked in on {}", record.date))
                    .await;
                Ok(record)
            }
            CheckInOutcome::AlreadyPresent => {
                debug!(employee_id, "Check-in rejected: already present");
                Err(AttendanceError::AlreadyCheckedIn)
            }
        }
    }

    pub async fn check_out(&self, employee_id: u64) -> Result<AttendanceRecord, AttendanceError> {
        let user = self.user(employee_id).await?;
        let today = self.clock.today();
        let now = self.clock.time_of_day();

        match self.store.record_check_out(employee_id, today, now).await? {
            CheckOutOutcome::Recorded(record) => {
                info!(employee_id, date = %today, "Checked out");
                self.audit
                    .record(&user, "Checked Out", format!("Checked out on {today}"))
                    .await;
                Ok(record)
            }
            CheckOutOutcome::NotCheckedIn => Err(AttendanceError::NotCheckedIn),
            CheckOutOutcome::AlreadyCheckedOut => Err(AttendanceError::AlreadyCheckedOut),
        }
    }

    pub async fn mark(
        &self,
        employee_id: u64,
        action: AttendanceAction,
        photo: Option<String>,
        location: Option<GeoLocation>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        match action {
            AttendanceAction::CheckIn => self.check_in(employee_id, photo, location).await,
            AttendanceAction::CheckOut => self.check_out(employee_id).await,
        }
    }

    pub async fn history(&self, employee_id: u64) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.store.attendance_for_employee(employee_id, None).await
    }

    pub async fn all(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.store.all_attendance().await
    }
}
