//! Demo data loaded into an empty store at start-up.

use std::time::Duration;

use anyhow::Context;
use chrono::{Days, NaiveDate, NaiveTime};
use tracing::{info, warn};

use super::{
    AttendanceStore, GamificationStore, LeaveStore, SalaryStore, Store, StoreError, UserStore,
};
use crate::auth::password::hash_password;
use crate::utils::clock::Clock;
use crate::model::{
    attendance::{AttendanceStatus, NewAttendance},
    gamification::{Badge, GamificationProgress, GamificationSettings},
    leave_request::{LeaveBalance, LeaveStatus, NewLeaveRequest},
    role::Role,
    salary_slip::NewSalarySlip,
    user::{NewUser, User},
};

const DEMO_PASSWORD: &str = "password123";

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid seed date {y}-{m}-{d}"))
}

fn time(h: u32, m: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(h, m, 0)
}

fn days_before(today: NaiveDate, days: u64) -> anyhow::Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(days))
        .context("seed date out of range")
}

/// Seeds the store when it has no users. Returns whether anything was written.
pub async fn seed_if_empty(store: &dyn Store, today: NaiveDate) -> anyhow::Result<bool> {
    if store.count_users().await? > 0 {
        return Ok(false);
    }
    info!("Store is empty, seeding demo data");

    let password_hash =
        hash_password(DEMO_PASSWORD).map_err(|e| anyhow::anyhow!("hash seed password: {e}"))?;

    let seed_users = [
        ("Alex Johnson", "admin@example.com", Role::Admin, "Management", date(2020, 1, 15)?),
        ("Jane Doe", "employee@example.com", Role::Employee, "Engineering", date(2022, 3, 10)?),
        ("John Smith", "john@example.com", Role::Employee, "Marketing", date(2021, 7, 22)?),
    ];

    let mut users: Vec<User> = Vec::with_capacity(seed_users.len());
    for (name, email, role, team, join_date) in seed_users {
        let user = store
            .insert_user(NewUser {
                name: name.into(),
                email: email.into(),
                password_hash: password_hash.clone(),
                role,
                team: team.into(),
                join_date,
            })
            .await?;
        users.push(user);
    }
    let (jane, john) = (&users[1], &users[2]);

    let two_days_ago = days_before(today, 2)?;
    let yesterday = days_before(today, 1)?;
    let attendance = [
        (jane, two_days_ago, time(9, 1), time(17, 30), AttendanceStatus::Present),
        (jane, yesterday, time(8, 55), time(17, 35), AttendanceStatus::Present),
        (john, two_days_ago, time(9, 15), time(18, 0), AttendanceStatus::Present),
        (john, yesterday, None, None, AttendanceStatus::OnLeave),
    ];
    for (user, date, check_in, check_out, status) in attendance {
        store
            .insert_attendance(NewAttendance {
                employee_id: user.id,
                employee_name: user.name.clone(),
                date,
                check_in,
                check_out,
                status,
            })
            .await?;
    }

    let salaries = [
        (jane, "April", 4000.0, 1000.0, 200.0, 4800.0),
        (jane, "May", 4000.0, 1000.0, 200.0, 4800.0),
        (john, "April", 3500.0, 800.0, 150.0, 4150.0),
    ];
    for (user, month, basic, allowances, deductions, net_salary) in salaries {
        store
            .insert_salary_slip(NewSalarySlip {
                employee_id: user.id,
                month: month.into(),
                year: 2024,
                basic,
                allowances,
                deductions,
                net_salary,
            })
            .await?;
    }

    let leave_requests = [
        (jane, date(2024, 5, 10)?, date(2024, 5, 12)?, "Vacation", LeaveStatus::Approved),
        (john, date(2024, 6, 1)?, date(2024, 6, 1)?, "Sick Leave", LeaveStatus::Approved),
        (jane, date(2024, 7, 20)?, date(2024, 7, 25)?, "Family event", LeaveStatus::Pending),
    ];
    for (user, start_date, end_date, reason, status) in leave_requests {
        store
            .insert_leave_request(NewLeaveRequest {
                employee_id: user.id,
                start_date,
                end_date,
                reason: reason.into(),
                status,
            })
            .await?;
    }

    store
        .upsert_settings(GamificationSettings::default())
        .await?;

    store
        .set_progress(
            jane.id,
            GamificationProgress {
                points: 120,
                badges: vec![Badge {
                    id: "b1".into(),
                    name: "Punctuality Pro".into(),
                    description: "Checked in on time 5 days in a row".into(),
                    icon: "clock".into(),
                }],
                leaderboard_rank: Some(1),
            },
        )
        .await?;
    store
        .set_leave_balance(jane.id, LeaveBalance { annual: 12, sick: 9 })
        .await?;

    info!(users = users.len(), "Seeding complete");
    Ok(true)
}

fn store_unreachable(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Unavailable(_)))
}

/// Seeds on the first attempt that reaches the store, retrying while the
/// database is down. Any other failure is returned.
pub async fn seed_when_reachable(
    store: &dyn Store,
    clock: &dyn Clock,
    retry_every: Duration,
) -> anyhow::Result<bool> {
    loop {
        match seed_if_empty(store, clock.today()).await {
            Err(e) if store_unreachable(&e) => {
                warn!(error = %e, retry_in = ?retry_every, "Store unreachable, seeding postponed");
                actix_web::rt::time::sleep(retry_every).await;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::utils::clock::FixedClock;

    #[actix_web::test]
    async fn seeds_once_and_only_into_an_empty_store() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();

        assert!(seed_if_empty(&store, today).await.unwrap());
        assert!(!seed_if_empty(&store, today).await.unwrap());

        assert_eq!(store.count_users().await.unwrap(), 3);
        assert_eq!(store.count_users_with_role(Role::Employee).await.unwrap(), 2);
        assert_eq!(store.all_salary_slips().await.unwrap().len(), 3);
        assert_eq!(store.all_leave_requests().await.unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn seeded_attendance_is_relative_to_today() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        seed_if_empty(&store, today).await.unwrap();

        let yesterday = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
        assert_eq!(
            store
                .count_attendance(yesterday, AttendanceStatus::OnLeave)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .count_attendance(today, AttendanceStatus::Present)
                .await
                .unwrap(),
            0
        );
    }

    #[actix_web::test]
    async fn seeding_waits_for_the_store_to_come_back() {
        let store = MemoryStore::new();
        let clock = FixedClock::at("2024-08-01T09:05:00Z");
        store.go_offline(2);

        let seeded = seed_when_reachable(&store, &clock, Duration::from_millis(1))
            .await
            .unwrap();

        assert!(seeded);
        assert_eq!(store.count_users().await.unwrap(), 3);
    }

    #[test]
    fn only_unavailable_stores_are_retried() {
        let down = anyhow::Error::from(StoreError::Unavailable("refused".into()));
        let broken = anyhow::Error::from(StoreError::Backend("syntax".into()));
        assert!(store_unreachable(&down));
        assert!(!store_unreachable(&broken));
    }
}
