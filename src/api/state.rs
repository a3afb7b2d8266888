//! Shared handler state.

use std::sync::Arc;

use crate::achievements::{AchievementManager, LeaderboardService};
use crate::activities::{ActivityCatalog, ActivityRegistrar};
use crate::certificates::CertificateService;
use crate::clubs::ClubManager;
use crate::counseling::CounselingService;
use crate::forms::FormService;
use crate::identity::{AuthService, CredentialHasher, Mailer, ProfileService, TokenIssuer};
use crate::storage::config::AuthSettings;
use crate::storage::{Database, ObjectStore};

/// Every service, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub profiles: Arc<ProfileService>,
    pub catalog: Arc<ActivityCatalog>,
    pub registrar: Arc<ActivityRegistrar>,
    pub clubs: Arc<ClubManager>,
    pub achievements: Arc<AchievementManager>,
    pub leaderboards: Arc<LeaderboardService>,
    pub certificates: Arc<CertificateService>,
    pub forms: Arc<FormService>,
    pub counseling: Arc<CounselingService>,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        objects: Arc<dyn ObjectStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
        mailer: Arc<dyn Mailer>,
        auth: &AuthSettings,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(db.clone(), hasher, tokens, mailer, auth)),
            profiles: Arc::new(ProfileService::new(db.clone(), objects.clone())),
            catalog: Arc::new(ActivityCatalog::new(db.clone())),
            registrar: Arc::new(ActivityRegistrar::new(db.clone())),
            clubs: Arc::new(ClubManager::new(db.clone())),
            achievements: Arc::new(AchievementManager::new(db.clone(), objects)),
            leaderboards: Arc::new(LeaderboardService::new(db.clone())),
            certificates: Arc::new(CertificateService::new(db.clone())),
            forms: Arc::new(FormService::new(db.clone())),
            counseling: Arc::new(CounselingService::new(db)),
        }
    }
}
