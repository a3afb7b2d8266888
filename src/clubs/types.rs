//! Club and club registration types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registration::Document;

/// Club registration status literals.
pub mod status {
    pub const PENDING: &str = "PENDING";
    pub const APPROVED: &str = "APPROVED";
    pub const REJECTED: &str = "REJECTED";

    /// Statuses from which the member may still withdraw.
    pub const CANCELLABLE: [&str; 2] = [PENDING, APPROVED];
}

/// A club members can apply to.
#[derive(Debug, Clone, Serialize)]
pub struct Club {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub logo: Option<String>,
    pub media: Media,
    pub start_period: Option<NaiveDate>,
    pub end_period: Option<NaiveDate>,
    pub is_show: bool,
    pub registration_info: RegistrationInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Club {
    /// A visible club with empty media and registration info.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            description: None,
            short_description: None,
            logo: None,
            media: Media::default(),
            start_period: None,
            end_period: None,
            is_show: true,
            registration_info: RegistrationInfo::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Club gallery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub items: Vec<MediaItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub media_url: String,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// Text shown before and after applying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationInfo {
    #[serde(default)]
    pub registration_info: String,
    #[serde(default)]
    pub after_registration_info: String,
}

/// A member's application to a club.
#[derive(Debug, Clone, Serialize)]
pub struct ClubRegistration {
    pub id: Uuid,
    pub club_id: i64,
    pub member_id: Uuid,
    pub status: String,
    pub additional_data: Document,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClubRegistration {
    pub fn new(member_id: Uuid, club_id: i64, additional_data: Document) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            club_id,
            member_id,
            status: status::PENDING.to_string(),
            additional_data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shallow merge: top-level keys in `patch` replace existing ones.
    pub fn merge_additional_data(&mut self, patch: Document) {
        self.additional_data.extend(patch);
        self.updated_at = Utc::now();
    }

    pub fn is_cancellable(&self) -> bool {
        status::CANCELLABLE.contains(&self.status.as_str())
    }
}

/// A registration with its club.
#[derive(Debug, Clone, Serialize)]
pub struct ClubRegistrationDetails {
    #[serde(flatten)]
    pub registration: ClubRegistration,
    pub club: Club,
}

/// Whether the actor has applied to a club.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationCheck {
    pub is_registered: bool,
    pub registration: Option<ClubRegistrationDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shallow_merge() {
        let mut reg = ClubRegistration::new(
            Uuid::new_v4(),
            1,
            json!({"a": 1, "nested": {"x": 1, "y": 2}}).as_object().unwrap().clone(),
        );
        reg.merge_additional_data(json!({"b": 2, "nested": {"x": 9}}).as_object().unwrap().clone());

        assert_eq!(
            serde_json::Value::Object(reg.additional_data),
            json!({"a": 1, "b": 2, "nested": {"x": 9}})
        );
    }

    #[test]
    fn test_cancellable_statuses() {
        let mut reg = ClubRegistration::new(Uuid::new_v4(), 1, Document::new());
        assert!(reg.is_cancellable());

        reg.status = status::APPROVED.to_string();
        assert!(reg.is_cancellable());

        for other in [status::REJECTED, "pending", "GRADUATED"] {
            reg.status = other.to_string();
            assert!(!reg.is_cancellable(), "{other}");
        }
    }

    #[test]
    fn test_registration_info_defaults() {
        let info: RegistrationInfo =
            serde_json::from_str(r#"{"registration_info": "Isi form"}"#).unwrap();
        assert_eq!(info.registration_info, "Isi form");
        assert_eq!(info.after_registration_info, "");
    }
}
