//! Profile viewing, editing, and picture upload.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::accounts::AccountStore;
use super::types::{Profile, ProfileDetails, ProfileUpdate};
use crate::storage::upload::{object_key, MAX_UPLOAD_BYTES};
use crate::storage::{Database, DatabaseError, ObjectStore, StorageError, UploadPolicy, UploadedFile};
use crate::validation::ValidationErrors;

const PICTURE_POLICY: UploadPolicy = UploadPolicy {
    field: "file",
    extensions: &["jpg", "jpeg", "png", "webp"],
    max_bytes: MAX_UPLOAD_BYTES,
};

/// Profile service.
pub struct ProfileService {
    db: Arc<Database>,
    objects: Arc<dyn ObjectStore>,
}

impl ProfileService {
    pub fn new(db: Arc<Database>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { db, objects }
    }

    /// Account and profile with reference names resolved.
    pub fn show(&self, user_id: &Uuid) -> Result<ProfileDetails, ProfileError> {
        let conn = self.db.connection();
        AccountStore::new(&conn)
            .profile_details(user_id)?
            .ok_or(ProfileError::NotFound)
    }

    /// Apply a partial demographic update.
    pub fn update(&self, user_id: &Uuid, update: ProfileUpdate) -> Result<Profile, ProfileError> {
        update.validate()?;

        let conn = self.db.connection();
        let store = AccountStore::new(&conn);
        let mut profile = store.get_profile(user_id)?.ok_or(ProfileError::NotFound)?;
        profile.apply(update);
        store.update_profile(&profile)?;

        Ok(profile)
    }

    /// Replace the profile picture. The previous object is removed best-effort.
    pub fn upload_picture(&self, user_id: &Uuid, file: UploadedFile) -> Result<Profile, ProfileError> {
        let ext = PICTURE_POLICY.check(&file)?;

        let mut profile = {
            let conn = self.db.connection();
            AccountStore::new(&conn)
                .get_profile(user_id)?
                .ok_or(ProfileError::NotFound)?
        };

        let key = object_key("", user_id, Utc::now(), &ext);
        let stored = self.objects.put(&key, &file.bytes, &file.content_type)?;
        let previous = profile.picture.replace(stored);
        profile.updated_at = Utc::now();

        {
            let conn = self.db.connection();
            AccountStore::new(&conn).update_profile(&profile)?;
        }

        if let Some(old) = previous {
            if let Err(e) = self.objects.delete(&old) {
                warn!("Failed to delete previous picture {}: {}", old, e);
            }
        }

        info!("Updated picture for account {}", user_id);
        Ok(profile)
    }
}

/// Profile errors.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
