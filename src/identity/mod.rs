//! Identity module for accounts, legacy migration, sessions, and profiles.
//!
//! Provides:
//! - Current and legacy account lookup behind a single migration state
//! - Argon2 credential hashing and legacy digest verification
//! - HMAC-signed session and password-reset tokens
//! - Membership level and badge derivation
//! - Profile viewing and editing

pub mod accounts;
pub mod auth;
pub mod credentials;
pub mod levels;
pub mod mailer;
pub mod profile;
pub mod tokens;
pub mod types;

pub use accounts::AccountStore;
pub use auth::{AuthError, AuthService};
pub use credentials::{Argon2Hasher, CredentialHasher};
pub use levels::{MembershipLevel, ProgramMarkers};
pub use mailer::{LogMailer, Mailer};
pub use profile::{ProfileError, ProfileService};
pub use tokens::{Claims, HmacTokenIssuer, TokenIssuer, TokenPurpose};
pub use types::{Account, LegacyAccount, LoginOutcome, MigrationState, Profile, ProfileUpdate};
