use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::audit::AuditRecorder;
use crate::auth::password::{hash_password, verify_password};
use crate::model::{
    role::Role,
    user::{NewUser, User, UserChanges, UserUpdates},
};
use crate::store::{Store, StoreError, UserStore};
use crate::utils::{clock::Clock, email_cache::EmailCache, email_filter::EmailFilter};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Name, email, password and role are required.")]
    MissingFields,

    #[error("An account with this email already exists.")]
    EmailTaken,

    #[error("User not found.")]
    UserNotFound,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<argon2::password_hash::Error> for AccountError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AccountError::Hash(e.to_string())
    }
}

pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

const DEFAULT_TEAM: &str = "Unassigned";

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    audit: AuditRecorder,
    email_filter: Arc<EmailFilter>,
    email_cache: Arc<EmailCache>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        audit: AuditRecorder,
        email_filter: Arc<EmailFilter>,
        email_cache: Arc<EmailCache>,
    ) -> Self {
        Self {
            store,
            clock,
            audit,
            email_filter,
            email_cache,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let Some(user) = self.store.user_by_email(email.trim()).await? else {
            info!("Invalid credentials: user not found");
            return Err(AccountError::InvalidCredentials);
        };

        debug!(user_id = user.id, "Verifying password");
        if !verify_password(password, &user.password_hash)? {
            info!(user_id = user.id, "Invalid credentials: password mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        self.audit.record(&user, "User Login", "").await;
        Ok(user)
    }

    /// true  => email AVAILABLE
    /// false => email TAKEN
    pub async fn is_email_available(&self, email: &str) -> Result<bool, StoreError> {
        // 1️⃣ Cuckoo filter: fast negative
        if !self.email_filter.might_exist(email) {
            return Ok(true);
        }

        // 2️⃣ Moka cache: fast positive
        if self.email_cache.is_taken(email).await {
            return Ok(false);
        }

        // 3️⃣ Store fallback
        let taken = self.store.user_by_email(email).await?.is_some();
        if taken {
            self.email_cache.mark_taken(email).await;
        }
        Ok(!taken)
    }

    pub async fn signup(&self, signup: Signup) -> Result<User, AccountError> {
        let name = signup.name.trim();
        let email = signup.email.trim();
        if name.is_empty() || email.is_empty() || signup.password.is_empty() {
            return Err(AccountError::MissingFields);
        }

        if !self.is_email_available(email).await? {
            return Err(AccountError::EmailTaken);
        }

        let password_hash = hash_password(&signup.password)?;
        let created = self
            .store
            .insert_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role: signup.role,
                team: DEFAULT_TEAM.to_string(),
                join_date: self.clock.today(),
            })
            .await;

        // the store's unique constraint settles races the fast path missed
        let user = match created {
            Ok(user) => user,
            Err(StoreError::Duplicate(_)) => return Err(AccountError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        self.email_filter.insert(&user.email);
        self.email_cache.mark_taken(&user.email).await;

        info!(user_id = user.id, role = %user.role, "User signed up");
        self.audit.record(&user, "User Signed Up", "").await;
        Ok(user)
    }

    /// Applies name, team and join date; `new_password` is re-hashed when non-empty.
    pub async fn update_profile(
        &self,
        id: u64,
        updates: UserUpdates,
        new_password: Option<String>,
    ) -> Result<User, AccountError> {
        let password_hash = match new_password.filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };

        let changes = UserChanges {
            name: updates.name,
            team: updates.team,
            join_date: updates.join_date,
            password_hash,
        };

        let user = self
            .store
            .update_user(id, changes)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        self.audit.record(&user, "Updated User Profile", "").await;
        Ok(user)
    }

    pub async fn get_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        self.store.user_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.store.list_users().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AuditStore, memory::MemoryStore, seed::seed_if_empty};
    use crate::utils::clock::FixedClock;
    use chrono::NaiveDate;

    async fn seeded() -> (Arc<MemoryStore>, AccountService) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at("2024-08-01T10:00:00+00:00"));
        seed_if_empty(store.as_ref(), clock.today()).await.unwrap();

        let filter = Arc::new(EmailFilter::new());
        filter.warmup(store.as_ref(), 100).await.unwrap();

        let audit = AuditRecorder::new(store.clone(), clock.clone());
        let service = AccountService::new(
            store.clone(),
            clock,
            audit,
            filter,
            Arc::new(EmailCache::default()),
        );
        (store, service)
    }

    fn signup(email: &str) -> Signup {
        Signup {
            name: "Sam Lee".into(),
            email: email.into(),
            password: "hunter22".into(),
            role: Role::Employee,
        }
    }

    #[actix_web::test]
    async fn admin_login_succeeds_and_is_audited() {
        let (store, accounts) = seeded().await;

        let user = accounts
            .login("admin@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);

        let log = store.recent_audit(1).await.unwrap();
        assert_eq!(log[0].action, "User Login");
        assert_eq!(log[0].user_id, user.id);
    }

    #[actix_web::test]
    async fn wrong_password_is_rejected_without_audit() {
        let (store, accounts) = seeded().await;

        let err = accounts
            .login("admin@example.com", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
        let err = accounts
            .login("nobody@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));

        assert!(store.recent_audit(10).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn signup_defaults_team_and_join_date() {
        let (_, accounts) = seeded().await;

        let user = accounts.signup(signup("sam@example.com")).await.unwrap();
        assert_eq!(user.team, "Unassigned");
        assert_eq!(user.join_date, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());

        let again = accounts.login("sam@example.com", "hunter22").await.unwrap();
        assert_eq!(again.id, user.id);
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let (_, accounts) = seeded().await;

        let err = accounts
            .signup(signup("Employee@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken));

        accounts.signup(signup("sam@example.com")).await.unwrap();
        let err = accounts.signup(signup("sam@example.com")).await.unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken));
    }

    #[actix_web::test]
    async fn blank_signup_fields_are_rejected() {
        let (_, accounts) = seeded().await;
        let mut request = signup("sam@example.com");
        request.name = "   ".into();

        let err = accounts.signup(request).await.unwrap_err();
        assert!(matches!(err, AccountError::MissingFields));
    }

    #[actix_web::test]
    async fn profile_update_changes_only_profile_fields() {
        let (store, accounts) = seeded().await;
        let jane = store.user_by_email("employee@example.com").await.unwrap().unwrap();

        let updates = UserUpdates {
            name: Some("Jane Q. Doe".into()),
            team: Some("Platform".into()),
            join_date: None,
        };
        let updated = accounts
            .update_profile(jane.id, updates, Some("s3cret!".into()))
            .await
            .unwrap();

        assert_eq!(updated.name, "Jane Q. Doe");
        assert_eq!(updated.team, "Platform");
        assert_eq!(updated.role, Role::Employee);
        assert_eq!(updated.email, "employee@example.com");
        assert_eq!(updated.join_date, jane.join_date);

        accounts
            .login("employee@example.com", "s3cret!")
            .await
            .unwrap();
        assert!(accounts
            .login("employee@example.com", "password123")
            .await
            .is_err());
    }

    #[actix_web::test]
    async fn updating_unknown_user_is_not_found() {
        let (_, accounts) = seeded().await;
        let err = accounts
            .update_profile(999, UserUpdates::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::UserNotFound));
    }
}
