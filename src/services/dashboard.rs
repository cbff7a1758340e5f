use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::attendance::AttendanceService;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    gamification::GamificationProgress,
    role::Role,
};
use crate::store::{AttendanceStore, GamificationStore, Store, StoreError, UserStore};
use crate::utils::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_employees: u64,
    pub present_today: u64,
    pub on_leave: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSnapshot {
    pub today_attendance: AttendanceRecord,
    pub gamification: GamificationProgress,
}

#[derive(Clone)]
pub struct DashboardAggregator {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    attendance: AttendanceService,
}

impl DashboardAggregator {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, attendance: AttendanceService) -> Self {
        Self {
            store,
            clock,
            attendance,
        }
    }

    /// Fresh counts on every call.
    pub async fn admin_snapshot(&self) -> Result<AdminStats, StoreError> {
        let today = self.clock.today();
        Ok(AdminStats {
            total_employees: self.store.count_users_with_role(Role::Employee).await?,
            present_today: self
                .store
                .count_attendance(today, AttendanceStatus::Present)
                .await?,
            on_leave: self
                .store
                .count_attendance(today, AttendanceStatus::OnLeave)
                .await?,
        })
    }

    pub async fn employee_snapshot(&self, employee_id: u64) -> Result<EmployeeSnapshot, StoreError> {
        let today_attendance = self.attendance.resolve_today(employee_id).await?;
        let gamification = self
            .store
            .progress_for(employee_id)
            .await?
            .unwrap_or_default();

        Ok(EmployeeSnapshot {
            today_attendance,
            gamification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::audit::AuditRecorder;
    use crate::store::{memory::MemoryStore, seed::seed_if_empty};
    use crate::utils::clock::FixedClock;

    async fn seeded() -> (Arc<MemoryStore>, DashboardAggregator) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at("2024-08-01T10:00:00+00:00"));
        seed_if_empty(store.as_ref(), clock.today()).await.unwrap();

        let audit = AuditRecorder::new(store.clone(), clock.clone());
        let attendance = AttendanceService::new(store.clone(), clock.clone(), audit);
        let dashboard = DashboardAggregator::new(store.clone(), clock, attendance);
        (store, dashboard)
    }

    #[actix_web::test]
    async fn admin_counts_reflect_check_ins() {
        let (store, dashboard) = seeded().await;
        let stats = dashboard.admin_snapshot().await.unwrap();
        assert_eq!(
            stats,
            AdminStats {
                total_employees: 2,
                present_today: 0,
                on_leave: 0
            }
        );

        let jane = store.user_by_email("employee@example.com").await.unwrap().unwrap();
        dashboard
            .attendance
            .check_in(jane.id, None, None)
            .await
            .unwrap();
        assert_eq!(dashboard.admin_snapshot().await.unwrap().present_today, 1);
    }

    #[actix_web::test]
    async fn employee_without_progress_gets_defaults() {
        let (store, dashboard) = seeded().await;
        let john = store.user_by_email("john@example.com").await.unwrap().unwrap();

        let snapshot = dashboard.employee_snapshot(john.id).await.unwrap();
        assert_eq!(snapshot.gamification, GamificationProgress::default());
        assert_eq!(snapshot.today_attendance.status, AttendanceStatus::Absent);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value["gamification"]["leaderboardRank"].is_null());
        assert_eq!(value["todayAttendance"]["employeeName"], "John Smith");
    }
}
