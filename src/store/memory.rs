use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use super::{
    AttendanceStore, AuditStore, CheckInOutcome, CheckOutOutcome, DecisionOutcome,
    GamificationStore, LeaveStore, SalaryStore, StoreError, StoreResult, UserStore,
};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, NewAttendance, NewCheckIn},
    audit_log::{AuditLogEntry, NewAuditLog},
    gamification::{GamificationProgress, GamificationSettings},
    leave_request::{LeaveBalance, LeaveRequest, LeaveStatus, NewLeaveRequest},
    role::Role,
    salary_slip::{NewSalarySlip, SalarySlip},
    user::{NewUser, User, UserChanges},
};

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: Vec<User>,
    attendance: Vec<AttendanceRecord>,
    salaries: Vec<SalarySlip>,
    leave_requests: Vec<LeaveRequest>,
    leave_balances: HashMap<u64, LeaveBalance>,
    audit_logs: Vec<AuditLogEntry>,
    gamification: HashMap<u64, GamificationProgress>,
    settings: Option<GamificationSettings>,
    #[cfg(test)]
    fail_audit_writes: bool,
    #[cfg(test)]
    offline_checks: u32,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    #[cfg(test)]
    fn audit_writable(&self) -> StoreResult<()> {
        if self.fail_audit_writes {
            return Err(StoreError::Unavailable("audit writes disabled".into()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn audit_writable(&self) -> StoreResult<()> {
        Ok(())
    }

    #[cfg(test)]
    fn reachable(&mut self) -> StoreResult<()> {
        if self.offline_checks > 0 {
            self.offline_checks -= 1;
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn reachable(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn user_name(&self, id: u64) -> Option<&str> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.as_str())
    }
}

/// In-process store. One lock guards every table, so each trait method is
/// atomic with respect to all others.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn fail_audit_writes(&self) {
        self.write().fail_audit_writes = true;
    }

    /// The next `checks` user counts fail as if the database were down.
    #[cfg(test)]
    pub(crate) fn go_offline(&self, checks: u32) {
        self.write().offline_checks = checks;
    }
}

fn newest_first(records: &mut [AttendanceRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

fn latest_start_first(requests: &mut [LeaveRequest]) {
    requests.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.write();
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }

        let user = User {
            id: tables.next_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            team: user.team,
            join_date: user.join_date,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.read().users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn first_user_with_role(&self, role: Role) -> StoreResult<Option<User>> {
        Ok(self
            .read()
            .users
            .iter()
            .filter(|u| u.role == role)
            .min_by_key(|u| u.id)
            .cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.read().users.clone())
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let mut tables = self.write();
        tables.reachable()?;
        Ok(tables.users.len() as u64)
    }

    async fn count_users_with_role(&self, role: Role) -> StoreResult<u64> {
        Ok(self.read().users.iter().filter(|u| u.role == role).count() as u64)
    }

    async fn update_user(&self, id: u64, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut tables = self.write();
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        changes.apply(user);
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self
            .read()
            .attendance
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn attendance_for_employee(
        &self,
        employee_id: u64,
        limit: Option<usize>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let mut records: Vec<_> = self
            .read()
            .attendance
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        newest_first(&mut records);
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn all_attendance(&self) -> StoreResult<Vec<AttendanceRecord>> {
        let mut records = self.read().attendance.clone();
        newest_first(&mut records);
        Ok(records)
    }

    async fn count_attendance(
        &self,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> StoreResult<u64> {
        Ok(self
            .read()
            .attendance
            .iter()
            .filter(|r| r.date == date && r.status == status)
            .count() as u64)
    }

    async fn insert_attendance(&self, record: NewAttendance) -> StoreResult<AttendanceRecord> {
        let mut tables = self.write();
        if tables
            .attendance
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date)
        {
            return Err(StoreError::Duplicate(format!(
                "attendance for employee {} on {}",
                record.employee_id, record.date
            )));
        }

        let record = AttendanceRecord {
            id: Some(tables.next_id()),
            employee_id: record.employee_id,
            employee_name: Some(record.employee_name),
            date: record.date,
            check_in: record.check_in,
            check_out: record.check_out,
            status: record.status,
            check_in_photo: None,
            check_in_location: None,
        };
        tables.attendance.push(record.clone());
        Ok(record)
    }

    async fn record_check_in(&self, entry: NewCheckIn) -> StoreResult<CheckInOutcome> {
        let mut tables = self.write();
        let existing = tables
            .attendance
            .iter()
            .position(|r| r.employee_id == entry.employee_id && r.date == entry.date);

        match existing {
            Some(idx) if tables.attendance[idx].status == AttendanceStatus::Present => {
                Ok(CheckInOutcome::AlreadyPresent)
            }
            Some(idx) => {
                let id = tables.attendance[idx].id.unwrap_or_default();
                let record = entry.into_record(id);
                tables.attendance[idx] = record.clone();
                Ok(CheckInOutcome::Recorded(record))
            }
            None => {
                let record = entry.into_record(tables.next_id());
                tables.attendance.push(record.clone());
                Ok(CheckInOutcome::Recorded(record))
            }
        }
    }

    async fn record_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> StoreResult<CheckOutOutcome> {
        let mut tables = self.write();
        let Some(record) = tables
            .attendance
            .iter_mut()
            .find(|r| r.employee_id == employee_id && r.date == date)
        else {
            return Ok(CheckOutOutcome::NotCheckedIn);
        };

        if record.check_in.is_none() {
            return Ok(CheckOutOutcome::NotCheckedIn);
        }
        if record.check_out.is_some() {
            return Ok(CheckOutOutcome::AlreadyCheckedOut);
        }
        record.check_out = Some(time);
        Ok(CheckOutOutcome::Recorded(record.clone()))
    }
}

#[async_trait]
impl SalaryStore for MemoryStore {
    async fn insert_salary_slip(&self, slip: NewSalarySlip) -> StoreResult<SalarySlip> {
        let mut tables = self.write();
        let slip = slip.into_slip(tables.next_id());
        tables.salaries.push(slip.clone());
        Ok(slip)
    }

    async fn salary_slips_for_employee(&self, employee_id: u64) -> StoreResult<Vec<SalarySlip>> {
        Ok(self
            .read()
            .salaries
            .iter()
            .filter(|s| s.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn all_salary_slips(&self) -> StoreResult<Vec<SalarySlip>> {
        Ok(self.read().salaries.clone())
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert_leave_request(&self, request: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let mut tables = self.write();
        let request = request.into_request(tables.next_id());
        tables.leave_requests.push(request.clone());
        Ok(request)
    }

    async fn leave_requests_for_employee(
        &self,
        employee_id: u64,
    ) -> StoreResult<Vec<LeaveRequest>> {
        let mut requests: Vec<_> = self
            .read()
            .leave_requests
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        latest_start_first(&mut requests);
        Ok(requests)
    }

    async fn all_leave_requests(&self) -> StoreResult<Vec<LeaveRequest>> {
        let tables = self.read();
        let mut requests: Vec<_> = tables
            .leave_requests
            .iter()
            .map(|r| LeaveRequest {
                employee_name: tables.user_name(r.employee_id).map(str::to_owned),
                ..r.clone()
            })
            .collect();
        latest_start_first(&mut requests);
        Ok(requests)
    }

    async fn decide_leave_request(
        &self,
        id: u64,
        status: LeaveStatus,
    ) -> StoreResult<DecisionOutcome> {
        let mut tables = self.write();
        let Some(request) = tables.leave_requests.iter_mut().find(|r| r.id == id) else {
            return Ok(DecisionOutcome::NotFound);
        };
        if request.status != LeaveStatus::Pending {
            return Ok(DecisionOutcome::AlreadyDecided(request.status));
        }
        request.status = status;
        let mut decided = request.clone();
        decided.employee_name = tables.user_name(decided.employee_id).map(str::to_owned);
        Ok(DecisionOutcome::Decided(decided))
    }

    async fn leave_balance(&self, employee_id: u64) -> StoreResult<Option<LeaveBalance>> {
        Ok(self.read().leave_balances.get(&employee_id).copied())
    }

    async fn set_leave_balance(&self, employee_id: u64, balance: LeaveBalance) -> StoreResult<()> {
        self.write().leave_balances.insert(employee_id, balance);
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_audit(&self, entry: NewAuditLog) -> StoreResult<AuditLogEntry> {
        let mut tables = self.write();
        tables.audit_writable()?;
        let entry = entry.into_entry(tables.next_id());
        tables.audit_logs.push(entry.clone());
        Ok(entry)
    }

    async fn recent_audit(&self, limit: usize) -> StoreResult<Vec<AuditLogEntry>> {
        let mut entries = self.read().audit_logs.clone();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[async_trait]
impl GamificationStore for MemoryStore {
    async fn progress_for(&self, employee_id: u64) -> StoreResult<Option<GamificationProgress>> {
        Ok(self.read().gamification.get(&employee_id).cloned())
    }

    async fn set_progress(
        &self,
        employee_id: u64,
        progress: GamificationProgress,
    ) -> StoreResult<()> {
        self.write().gamification.insert(employee_id, progress);
        Ok(())
    }

    async fn settings_or_insert(
        &self,
        defaults: GamificationSettings,
    ) -> StoreResult<GamificationSettings> {
        Ok(*self.write().settings.get_or_insert(defaults))
    }

    async fn upsert_settings(
        &self,
        settings: GamificationSettings,
    ) -> StoreResult<GamificationSettings> {
        self.write().settings = Some(settings);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Someone".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::Employee,
            team: "Unassigned".into(),
            join_date: date("2024-01-01"),
        }
    }

    fn check_in(employee_id: u64, day: &str) -> NewCheckIn {
        NewCheckIn {
            employee_id,
            employee_name: "Someone".into(),
            date: date(day),
            time: time("09:00"),
            photo: None,
            location: None,
        }
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();

        let err = store.insert_user(new_user("A@Example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn check_in_overwrites_a_non_present_record_in_place() {
        let store = MemoryStore::new();
        let seeded = store
            .insert_attendance(NewAttendance {
                employee_id: 5,
                employee_name: "Someone".into(),
                date: date("2024-06-01"),
                check_in: None,
                check_out: None,
                status: AttendanceStatus::OnLeave,
            })
            .await
            .unwrap();

        let CheckInOutcome::Recorded(record) =
            store.record_check_in(check_in(5, "2024-06-01")).await.unwrap()
        else {
            panic!("expected the check-in to be recorded");
        };

        assert_eq!(record.id, seeded.id);
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(store.all_attendance().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn concurrent_check_ins_leave_one_record_per_employee_and_day() {
        let store = Arc::new(MemoryStore::new());

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                actix_web::rt::spawn(async move {
                    store.record_check_in(check_in(9, "2024-06-03")).await
                })
            })
            .collect();

        let mut recorded = 0;
        for attempt in futures::future::join_all(attempts).await {
            if let CheckInOutcome::Recorded(_) = attempt.unwrap().unwrap() {
                recorded += 1;
            }
        }

        assert_eq!(recorded, 1);
        assert_eq!(
            store.attendance_for_employee(9, None).await.unwrap().len(),
            1
        );
    }

    #[actix_web::test]
    async fn check_out_requires_a_check_in_and_happens_once() {
        let store = MemoryStore::new();
        let day = date("2024-06-03");

        assert!(matches!(
            store.record_check_out(3, day, time("17:00")).await.unwrap(),
            CheckOutOutcome::NotCheckedIn
        ));

        store.record_check_in(check_in(3, "2024-06-03")).await.unwrap();
        assert!(matches!(
            store.record_check_out(3, day, time("17:00")).await.unwrap(),
            CheckOutOutcome::Recorded(_)
        ));
        assert!(matches!(
            store.record_check_out(3, day, time("17:05")).await.unwrap(),
            CheckOutOutcome::AlreadyCheckedOut
        ));
    }

    #[actix_web::test]
    async fn leave_requests_are_listed_by_start_date_with_names_joined() {
        let store = MemoryStore::new();
        let jane = store.insert_user(new_user("jane@example.com")).await.unwrap();

        for (start, employee) in [("2024-05-10", jane.id), ("2024-07-20", jane.id), ("2024-06-01", 999)] {
            store
                .insert_leave_request(NewLeaveRequest {
                    employee_id: employee,
                    start_date: date(start),
                    end_date: date(start),
                    reason: "r".into(),
                    status: LeaveStatus::Pending,
                })
                .await
                .unwrap();
        }

        let all = store.all_leave_requests().await.unwrap();
        let starts: Vec<_> = all.iter().map(|r| r.start_date.to_string()).collect();
        assert_eq!(starts, ["2024-07-20", "2024-06-01", "2024-05-10"]);
        assert_eq!(all[0].employee_name.as_deref(), Some("Someone"));
        assert_eq!(all[1].employee_name, None);
    }

    #[actix_web::test]
    async fn settings_are_inserted_once() {
        let store = MemoryStore::new();
        let first = store
            .settings_or_insert(GamificationSettings::default())
            .await
            .unwrap();
        store
            .upsert_settings(GamificationSettings {
                points_for_punctuality: 3,
                points_for_perfect_week: 4,
            })
            .await
            .unwrap();
        let second = store
            .settings_or_insert(GamificationSettings::default())
            .await
            .unwrap();

        assert_eq!(first, GamificationSettings::default());
        assert_eq!(second.points_for_punctuality, 3);
    }
}
