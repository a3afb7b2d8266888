//! Login, legacy migration, registration, and password recovery.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::accounts::AccountStore;
use super::credentials::{verify_legacy_digest, CredentialError, CredentialHasher};
use super::mailer::{MailError, Mailer};
use super::tokens::{Claims, TokenError, TokenIssuer, TokenPurpose};
use super::types::{Account, LegacyAccount, LoginOutcome, MigrationState, Profile};
use crate::storage::config::AuthSettings;
use crate::storage::{Database, DatabaseError};
use crate::validation::ValidationErrors;

/// Authentication service.
pub struct AuthService {
    db: Arc<Database>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenIssuer>,
    mailer: Arc<dyn Mailer>,
    session_ttl: Duration,
    reset_ttl: Duration,
    reset_url: String,
}

impl AuthService {
    pub fn new(
        db: Arc<Database>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
        mailer: Arc<dyn Mailer>,
        settings: &AuthSettings,
    ) -> Self {
        Self {
            db,
            hasher,
            tokens,
            mailer,
            session_ttl: Duration::seconds(settings.token_ttl_secs),
            reset_ttl: Duration::seconds(settings.reset_token_ttl_secs),
            reset_url: settings.reset_password_url.clone(),
        }
    }

    // ========== Registration ==========

    /// Create a current account with an empty base-level profile.
    pub fn register(&self, fullname: &str, email: &str, password: &str) -> Result<Account, AuthError> {
        let mut errors = ValidationErrors::new();
        errors.require("fullname", fullname);
        errors.require_email("email", email);
        errors.require("password", password);
        errors.into_result()?;

        if self.lookup(email)?.is_some() {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let account = Account::new(email.to_string(), self.hasher.hash(password)?);
        let profile = Profile::new(account.id, fullname.trim().to_string());

        let result = self.db.with_transaction(|tx| {
            let store = AccountStore::new(tx);
            store.insert_account(&account)?;
            store.insert_profile(&profile)?;
            Ok::<_, AuthError>(())
        });

        match result {
            Ok(()) => {
                info!("Registered account {}", account.id);
                Ok(account)
            }
            Err(AuthError::Database(DatabaseError::UniqueViolation(_))) => {
                Err(AuthError::EmailAlreadyRegistered)
            }
            Err(e) => Err(e),
        }
    }

    // ========== Login ==========

    /// Log in a current account, or migrate a legacy member on first login.
    pub fn login_or_migrate(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let mut errors = ValidationErrors::new();
        errors.require_email("email", email);
        errors.require("password", password);
        errors.into_result()?;

        match self.lookup(email)? {
            None => Err(AuthError::UserNotFound),
            Some(MigrationState::Migrated(account)) => self.login_current(account, password),
            Some(MigrationState::LegacyOnly(legacy)) => self.migrate(legacy, password),
        }
    }

    fn login_current(&self, account: Account, password: &str) -> Result<LoginOutcome, AuthError> {
        if !self.hasher.verify(&account.password_hash, password)? {
            return Err(AuthError::WrongPassword);
        }

        let profile = {
            let conn = self.db.connection();
            AccountStore::new(&conn).get_profile(&account.id)?
        };
        let token = self.issue_session(&account)?;

        Ok(LoginOutcome {
            user: account,
            profile,
            token,
            migrated: false,
        })
    }

    fn migrate(&self, legacy: LegacyAccount, password: &str) -> Result<LoginOutcome, AuthError> {
        if !verify_legacy_digest(&legacy.password_digest, password) {
            return Err(AuthError::WrongPassword);
        }

        let account = Account::new(legacy.email.clone(), self.hasher.hash(password)?);
        let profile = Profile::from_legacy(account.id, &legacy);

        let result = self.db.with_transaction(|tx| {
            let store = AccountStore::new(tx);
            store.insert_account(&account)?;
            store.insert_profile(&profile)?;
            Ok::<_, AuthError>(())
        });

        match result {
            Ok(()) => {}
            Err(AuthError::Database(DatabaseError::UniqueViolation(_))) => {
                // Lost a race with a concurrent first login for the same email.
                let current = {
                    let conn = self.db.connection();
                    AccountStore::new(&conn).find_by_email(&legacy.email)?
                };
                return match current {
                    Some(account) => self.login_current(account, password),
                    None => Err(AuthError::UserNotFound),
                };
            }
            Err(e) => return Err(e),
        }

        info!(
            "Migrated legacy member {} to account {} at level {}",
            legacy.id, account.id, profile.level
        );

        let token = self.issue_session(&account)?;
        Ok(LoginOutcome {
            user: account,
            profile: Some(profile),
            token,
            migrated: true,
        })
    }

    /// Session tokens are stateless; logout only records the event.
    pub fn logout(&self, claims: &Claims) {
        info!("Account {} logged out", claims.sub);
    }

    // ========== Sessions ==========

    fn issue_session(&self, account: &Account) -> Result<String, AuthError> {
        let claims = Claims::new(
            account.id,
            account.email.clone(),
            TokenPurpose::Session,
            Utc::now(),
            self.session_ttl,
        );
        Ok(self.tokens.issue(&claims)?)
    }

    /// Resolve a bearer token to its claims.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        self.authenticate_at(token, Utc::now())
    }

    pub fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        self.tokens
            .verify(token, TokenPurpose::Session, now)
            .map_err(|e| {
                warn!("Rejected session token: {}", e);
                AuthError::InvalidToken
            })
    }

    // ========== Password Recovery ==========

    /// Mail a reset link carrying a short-lived token.
    pub fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let (account, profile) = {
            let conn = self.db.connection();
            let store = AccountStore::new(&conn);
            let account = store
                .find_by_email(email)?
                .ok_or(AuthError::EmailNotFound)?;
            let profile = store.get_profile(&account.id)?;
            (account, profile)
        };

        let claims = Claims::new(
            account.id,
            account.email.clone(),
            TokenPurpose::PasswordReset,
            Utc::now(),
            self.reset_ttl,
        );
        let token = self.tokens.issue(&claims)?;
        let url = format!("{}?token={}", self.reset_url, token);
        let name = profile.map(|p| p.name).unwrap_or_else(|| account.email.clone());

        self.mailer.send_password_reset(&account.email, &name, &url)?;
        info!("Password reset link sent to account {}", account.id);
        Ok(())
    }

    /// Set a new password using a reset token.
    pub fn reset_password(&self, token: &str, password: &str) -> Result<(), AuthError> {
        if password.trim().is_empty() {
            return Err(ValidationErrors::single(
                "password",
                "required",
                "The password field must be defined",
            )
            .into());
        }

        let claims = self
            .tokens
            .verify(token, TokenPurpose::PasswordReset, Utc::now())
            .map_err(|_| AuthError::InvalidToken)?;

        let hash = self.hasher.hash(password)?;

        let conn = self.db.connection();
        let store = AccountStore::new(&conn);
        match store.find_by_id(&claims.sub)? {
            Some(account) if account.email == claims.email => {
                store.update_password(&account.id, &hash)?;
                info!("Password reset for account {}", account.id);
                Ok(())
            }
            _ => Err(AuthError::InvalidToken),
        }
    }

    fn lookup(&self, email: &str) -> Result<Option<MigrationState>, AuthError> {
        let conn = self.db.connection();
        Ok(AccountStore::new(&conn).migration_state(email)?)
    }
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("User not found")]
    UserNotFound,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Email not found")]
    EmailNotFound,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::credentials::Argon2Hasher;
    use crate::identity::tokens::HmacTokenIssuer;
    use rusqlite::params;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl Mailer for RecordingMailer {
        fn send_password_reset(&self, to: &str, _name: &str, url: &str) -> Result<(), MailError> {
            self.sent.lock().unwrap().push((to.to_string(), url.to_string()));
            Ok(())
        }
    }

    fn service() -> (AuthService, Arc<Database>, Arc<RecordingMailer>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mailer = Arc::new(RecordingMailer::default());
        let service = AuthService::new(
            db.clone(),
            Arc::new(Argon2Hasher::new()),
            Arc::new(HmacTokenIssuer::new("test-secret")),
            mailer.clone(),
            &AuthSettings::default(),
        );
        (service, db, mailer)
    }

    fn seed_legacy(db: &Database, email: &str, ssc: Option<i64>, lmd: Option<i64>, spectra: Option<i64>) {
        // md5("password")
        db.connection()
            .execute(
                "INSERT INTO legacy_members (name, email, phone, password, ssc, lmd, spectra)
                 VALUES ('Fulan', ?1, '0812', '5f4dcc3b5aa765d61d8327deb882cf99', ?2, ?3, ?4)",
                params![email, ssc, lmd, spectra],
            )
            .unwrap();
    }

    fn account_count(db: &Database, email: &str) -> i64 {
        db.connection()
            .query_row(
                "SELECT COUNT(*) FROM accounts WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_register_then_login() {
        let (service, _db, _) = service();
        let account = service.register("Fulan", "a@b.co", "secret").unwrap();

        let outcome = service.login_or_migrate("a@b.co", "secret").unwrap();
        assert_eq!(outcome.user.id, account.id);
        assert!(!outcome.migrated);
        assert_eq!(outcome.profile.unwrap().level, 0);

        let claims = service.authenticate(&outcome.token).unwrap();
        assert_eq!(claims.sub, account.id);
    }

    #[test]
    fn test_register_duplicate_email() {
        let (service, db, _) = service();
        service.register("Fulan", "a@b.co", "secret").unwrap();
        assert!(matches!(
            service.register("Other", "a@b.co", "secret"),
            Err(AuthError::EmailAlreadyRegistered)
        ));

        seed_legacy(&db, "old@b.co", None, None, None);
        assert!(matches!(
            service.register("Other", "old@b.co", "secret"),
            Err(AuthError::EmailAlreadyRegistered)
        ));
    }

    #[test]
    fn test_register_validation() {
        let (service, _, _) = service();
        match service.register(" ", "not-an-email", "") {
            Err(AuthError::Validation(errors)) => assert_eq!(errors.fields().len(), 3),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_login_unknown_and_wrong_password() {
        let (service, db, _) = service();
        assert!(matches!(
            service.login_or_migrate("nobody@b.co", "x"),
            Err(AuthError::UserNotFound)
        ));

        service.register("Fulan", "a@b.co", "secret").unwrap();
        assert!(matches!(
            service.login_or_migrate("a@b.co", "wrong"),
            Err(AuthError::WrongPassword)
        ));

        seed_legacy(&db, "old@b.co", Some(1), None, None);
        assert!(matches!(
            service.login_or_migrate("old@b.co", "wrong"),
            Err(AuthError::WrongPassword)
        ));
        assert_eq!(account_count(&db, "old@b.co"), 0);
    }

    #[test]
    fn test_legacy_migration_is_idempotent() {
        let (service, db, _) = service();
        seed_legacy(&db, "old@b.co", Some(12), Some(4), None);

        let first = service.login_or_migrate("old@b.co", "password").unwrap();
        assert!(first.migrated);
        let profile = first.profile.unwrap();
        assert_eq!(profile.level, 6);
        assert_eq!(profile.badges, vec!["SSC-12", "LMD-4"]);
        assert_eq!(profile.whatsapp.as_deref(), Some("0812"));

        let second = service.login_or_migrate("old@b.co", "password").unwrap();
        assert!(!second.migrated);
        assert_eq!(second.user.id, first.user.id);
        assert_eq!(account_count(&db, "old@b.co"), 1);
    }

    #[test]
    fn test_migrated_password_is_rehashed() {
        let (service, db, _) = service();
        seed_legacy(&db, "old@b.co", None, None, None);

        let outcome = service.login_or_migrate("old@b.co", "password").unwrap();
        assert!(outcome.user.password_hash.starts_with("$argon2id$"));
        assert_eq!(outcome.profile.unwrap().level, 0);
    }

    #[test]
    fn test_expired_session_rejected() {
        let (service, _db, _) = service();
        service.register("Fulan", "a@b.co", "secret").unwrap();
        let outcome = service.login_or_migrate("a@b.co", "secret").unwrap();

        let later = Utc::now() + Duration::hours(2);
        assert!(matches!(
            service.authenticate_at(&outcome.token, later),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_password_reset_flow() {
        let (service, _db, mailer) = service();
        service.register("Fulan", "a@b.co", "old-pass").unwrap();

        assert!(matches!(
            service.request_password_reset("nobody@b.co"),
            Err(AuthError::EmailNotFound)
        ));

        service.request_password_reset("a@b.co").unwrap();
        let (to, url) = mailer.sent.lock().unwrap()[0].clone();
        assert_eq!(to, "a@b.co");
        let token = url.split("?token=").nth(1).unwrap().to_string();

        // A reset token is not a session token.
        assert!(service.authenticate(&token).is_err());

        service.reset_password(&token, "new-pass").unwrap();
        assert!(service.login_or_migrate("a@b.co", "new-pass").is_ok());
        assert!(matches!(
            service.login_or_migrate("a@b.co", "old-pass"),
            Err(AuthError::WrongPassword)
        ));
    }

    #[test]
    fn test_reset_with_bad_token() {
        let (service, _db, _) = service();
        assert!(matches!(
            service.reset_password("v1.bogus.token", "x"),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            service.reset_password("whatever", " "),
            Err(AuthError::Validation(_))
        ));
    }
}
