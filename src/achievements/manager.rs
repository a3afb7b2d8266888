//! Achievement submission and editing.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::store::AchievementStore;
use super::types::{Achievement, AchievementInput, AchievementPatch, STATUS_PENDING};
use crate::storage::upload::{object_key, MAX_UPLOAD_BYTES};
use crate::storage::{
    Database, DatabaseError, ObjectStore, Page, PageRequest, StorageError, UploadPolicy, UploadedFile,
};
use crate::validation::ValidationErrors;

const PROOF_POLICY: UploadPolicy = UploadPolicy {
    field: "proof",
    extensions: &["jpg", "png", "jpeg", "pdf", "doc", "docx"],
    max_bytes: MAX_UPLOAD_BYTES,
};

const PROOF_PREFIX: &str = "achievements/";

/// Achievement manager.
pub struct AchievementManager {
    db: Arc<Database>,
    objects: Arc<dyn ObjectStore>,
}

impl AchievementManager {
    pub fn new(db: Arc<Database>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { db, objects }
    }

    /// Submit an achievement with its proof. Starts pending with score 0.
    ///
    /// The proof is stored first; if that fails no row is written. If the row
    /// cannot be written the stored proof is removed again.
    pub fn submit(
        &self,
        actor: &Uuid,
        input: AchievementInput,
        proof: UploadedFile,
    ) -> Result<Achievement, AchievementError> {
        let achievement_date = input.validate()?;
        let ext = PROOF_POLICY.check(&proof).map_err(AchievementError::InvalidFile)?;

        let now = Utc::now();
        let key = object_key(PROOF_PREFIX, actor, now, &ext);
        let stored = self.objects.put(&key, &proof.bytes, &proof.content_type)?;

        let achievement = Achievement {
            id: Uuid::new_v4(),
            user_id: *actor,
            name: input.name,
            description: input.description,
            achievement_date,
            achievement_type: input.achievement_type,
            score: 0,
            proof: stored,
            status: STATUS_PENDING,
            approver_id: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };

        let inserted = {
            let conn = self.db.connection();
            AchievementStore::new(&conn).insert(&achievement)
        };
        if let Err(e) = inserted {
            self.discard(&achievement.proof);
            return Err(e.into());
        }

        info!("Account {} submitted achievement {}", actor, achievement.id);
        Ok(achievement)
    }

    /// Edit a pending achievement owned by the actor.
    ///
    /// Missing, foreign, and already-reviewed achievements all report `NotFound`.
    pub fn update(
        &self,
        actor: &Uuid,
        id: &Uuid,
        patch: AchievementPatch,
        proof: Option<UploadedFile>,
    ) -> Result<Achievement, AchievementError> {
        let mut achievement = {
            let conn = self.db.connection();
            AchievementStore::new(&conn)
                .find(id)?
                .filter(|a| a.user_id == *actor && a.is_pending())
                .ok_or(AchievementError::NotFound)?
        };

        patch.apply(&mut achievement)?;

        let mut replaced = None;
        if let Some(proof) = proof {
            let ext = PROOF_POLICY.check(&proof).map_err(AchievementError::InvalidFile)?;
            let key = object_key(PROOF_PREFIX, actor, Utc::now(), &ext);
            let stored = self.objects.put(&key, &proof.bytes, &proof.content_type)?;
            replaced = Some(std::mem::replace(&mut achievement.proof, stored));
        }

        let written = {
            let conn = self.db.connection();
            AchievementStore::new(&conn).update_submission(&achievement)
        };
        // Reviewed or removed while the proof was uploading
        if !matches!(written, Ok(true)) {
            if replaced.is_some() {
                self.discard(&achievement.proof);
            }
            return Err(match written {
                Err(e) => e.into(),
                Ok(_) => AchievementError::NotFound,
            });
        }

        if let Some(old) = replaced {
            self.discard(&old);
        }

        Ok(achievement)
    }

    /// Best-effort removal of a stored proof.
    fn discard(&self, key: &str) {
        if let Err(e) = self.objects.delete(key) {
            warn!("Failed to delete proof {}: {}", key, e);
        }
    }

    /// The actor's achievements, latest first.
    pub fn mine(&self, actor: &Uuid, page: PageRequest) -> Result<Page<Achievement>, AchievementError> {
        let conn = self.db.connection();
        let (items, total) = AchievementStore::new(&conn).list_for_user(actor, page)?;
        Ok(Page::new(items, total, page))
    }
}

/// Achievement errors.
#[derive(Debug, thiserror::Error)]
pub enum AchievementError {
    #[error("Achievement not found")]
    NotFound,

    #[error("Invalid file: {0}")]
    InvalidFile(ValidationErrors),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
