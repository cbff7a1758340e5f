use std::sync::Arc;

use tracing::{error, warn};

use crate::model::{
    audit_log::{AuditLogEntry, NewAuditLog},
    role::Role,
    user::User,
};
use crate::store::{AuditStore, Store, StoreResult, UserStore};
use crate::utils::clock::Clock;

/// Most entries the admin audit view returns.
pub const AUDIT_PAGE: usize = 100;

/// Who performed an audited action.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: u64,
    pub name: String,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// Appends audit entries. Recording never fails the surrounding operation.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn record(&self, actor: impl Into<Actor>, action: &str, details: impl Into<String>) {
        let actor = actor.into();
        let entry = NewAuditLog {
            timestamp: self.clock.now(),
            user_id: actor.id,
            user_name: actor.name,
            action: action.to_string(),
            details: details.into(),
        };

        if let Err(e) = self.store.append_audit(entry).await {
            error!(error = %e, action, "Failed to write audit log");
        }
    }

    /// Admin-side actions carry no session, so they are attributed to the
    /// first admin account.
    pub async fn record_as_admin(&self, action: &str, details: impl Into<String>) {
        match self.store.first_user_with_role(Role::Admin).await {
            Ok(Some(admin)) => self.record(&admin, action, details).await,
            Ok(None) => warn!(action, "No admin user to attribute audit entry to"),
            Err(e) => error!(error = %e, action, "Failed to resolve admin for audit log"),
        }
    }

    pub async fn recent(&self, limit: usize) -> StoreResult<Vec<AuditLogEntry>> {
        self.store.recent_audit(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::NewUser;
    use crate::store::memory::MemoryStore;
    use crate::utils::clock::FixedClock;
    use chrono::{Duration, NaiveDate};

    fn actor(id: u64) -> Actor {
        Actor {
            id,
            name: format!("user {id}"),
        }
    }

    #[actix_web::test]
    async fn each_record_adds_one_entry_listed_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at("2024-05-10T09:00:00+00:00"));
        let audit = AuditRecorder::new(store.clone(), clock.clone());
        let started = clock.now();

        audit.record(actor(1), "First", "a").await;
        // same timestamp: the later entry still sorts first
        audit.record(actor(1), "Second", "b").await;
        clock.advance(Duration::seconds(5));
        audit.record(actor(2), "Third", "c").await;

        let entries = audit.recent(AUDIT_PAGE).await.unwrap();
        let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, ["Third", "Second", "First"]);
        assert!(entries.iter().all(|e| e.timestamp >= started));
        assert_eq!(entries[0].user_name, "user 2");
    }

    #[actix_web::test]
    async fn failed_writes_are_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.fail_audit_writes();
        let audit = AuditRecorder::new(store.clone(), Arc::new(FixedClock::at("2024-05-10T09:00:00+00:00")));

        audit.record(actor(1), "User Login", "").await;
        assert!(audit.recent(10).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn admin_actions_are_attributed_to_the_first_admin() {
        let store = Arc::new(MemoryStore::new());
        for (name, role) in [("Emp", Role::Employee), ("Alex", Role::Admin), ("Sam", Role::Admin)] {
            store
                .insert_user(NewUser {
                    name: name.into(),
                    email: format!("{name}@example.com"),
                    password_hash: String::new(),
                    role,
                    team: "T".into(),
                    join_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                })
                .await
                .unwrap();
        }
        let audit = AuditRecorder::new(store, Arc::new(FixedClock::at("2024-05-10T09:00:00+00:00")));

        audit.record_as_admin("Exported Employee Data (CSV)", "").await;

        let entries = audit.recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_name, "Alex");
    }
}
