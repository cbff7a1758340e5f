use std::sync::{PoisonError, RwLock};

use anyhow::Result;
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;

use crate::store::{Store, UserStore};

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Probabilistic set of registered emails. A miss means the email is
/// definitely free; a hit has to be confirmed elsewhere.
pub struct EmailFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for EmailFilter {
    fn default() -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }
}

impl EmailFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an email might be registered (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email)
    }

    pub fn insert(&self, email: &str) {
        let email = normalize(email);
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&email);
    }

    /// Insert a batch of normalized emails under one lock
    fn insert_batch(&self, emails: &[String]) {
        let mut filter = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        for email in emails {
            filter.add(email);
        }
    }

    /// Load every registered email, `batch_size` at a time.
    pub async fn warmup(&self, store: &dyn Store, batch_size: usize) -> Result<()> {
        let users = store.list_users().await?;
        let total = users.len();

        let mut batches = futures::stream::iter(users)
            .map(|user| normalize(&user.email))
            .chunks(batch_size.max(1));

        while let Some(batch) = batches.next().await {
            self.insert_batch(&batch);
        }

        log::info!("Email filter warmup complete: {} users", total);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::model::{role::Role, user::NewUser};
    use chrono::NaiveDate;

    #[test]
    fn lookups_ignore_case_and_surrounding_whitespace() {
        let filter = EmailFilter::new();
        assert!(!filter.might_exist("jane@example.com"));

        filter.insert(" Jane@Example.com");
        assert!(filter.might_exist("jane@example.com"));
    }

    #[actix_web::test]
    async fn warmup_loads_existing_accounts() {
        let store = MemoryStore::new();
        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            store
                .insert_user(NewUser {
                    name: "X".into(),
                    email: email.into(),
                    password_hash: String::new(),
                    role: Role::Employee,
                    team: "Unassigned".into(),
                    join_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                })
                .await
                .unwrap();
        }

        let filter = EmailFilter::new();
        filter.warmup(&store, 2).await.unwrap();

        assert!(filter.might_exist("B@example.com"));
        assert!(filter.might_exist("c@example.com"));
    }
}
