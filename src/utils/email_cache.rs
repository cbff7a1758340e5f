use std::time::Duration;

use anyhow::Result;
use moka::future::Cache;

use crate::store::{Store, UserStore};

/// Recently seen registered emails.
/// true  => email is TAKEN (only taken emails are stored)
pub struct EmailCache {
    inner: Cache<String, bool>,
}

impl Default for EmailCache {
    fn default() -> Self {
        Self::new(500_000, Duration::from_secs(86400))
    }
}

impl EmailCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Mark a single email as taken
    pub async fn mark_taken(&self, email: &str) {
        self.inner.insert(email.trim().to_lowercase(), true).await;
    }

    pub async fn is_taken(&self, email: &str) -> bool {
        self.inner
            .get(&email.trim().to_lowercase())
            .await
            .unwrap_or(false)
    }

    /// Batch mark emails as taken
    async fn batch_mark(&self, emails: &[String]) {
        let futures: Vec<_> = emails
            .iter()
            .map(|e| self.inner.insert(e.to_lowercase(), true))
            .collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }

    /// Preload the accounts created in the last `days` days, which are the
    /// most likely to be re-submitted by a signup form.
    pub async fn warmup(
        &self,
        store: &dyn Store,
        today: chrono::NaiveDate,
        days: u64,
        batch_size: usize,
    ) -> Result<()> {
        let since = today
            .checked_sub_days(chrono::Days::new(days))
            .unwrap_or(chrono::NaiveDate::MIN);

        let recent: Vec<String> = store
            .list_users()
            .await?
            .into_iter()
            .filter(|u| u.join_date >= since)
            .map(|u| u.email)
            .collect();

        for batch in recent.chunks(batch_size.max(1)) {
            self.batch_mark(batch).await;
        }

        log::info!(
            "Email cache warmup complete: {} recent users (last {} days)",
            recent.len(),
            days
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn only_marked_emails_are_taken() {
        let cache = EmailCache::default();
        cache.mark_taken("Jane@Example.com").await;

        assert!(cache.is_taken("jane@example.com").await);
        assert!(!cache.is_taken("john@example.com").await);
    }
}
