//! Counseling request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::ValidationErrors;

/// Newly submitted requests wait for a counselor.
pub const STATUS_WAITING: i32 = 0;

/// A peer-counseling ("ruang curhat") request.
#[derive(Debug, Clone, Serialize)]
pub struct CounselingRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Whether the problem is the submitter's own or someone else's
    pub problem_ownership: i32,
    pub owner_name: Option<String>,
    pub problem_category: String,
    pub problem_description: String,
    pub handling_technic: String,
    pub counselor_gender: String,
    pub counselor_id: Option<i64>,
    pub status: i32,
    pub additional_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Intake form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CounselingInput {
    pub problem_ownership: i32,
    #[serde(default)]
    pub owner_name: Option<String>,
    pub problem_category: String,
    pub problem_description: String,
    pub handling_technic: String,
    pub counselor_gender: String,
}

impl CounselingInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("problem_category", &self.problem_category);
        errors.require("problem_description", &self.problem_description);
        errors.require("handling_technic", &self.handling_technic);
        errors.require("counselor_gender", &self.counselor_gender);
        errors.into_result()
    }

    pub fn into_request(self, user_id: Uuid) -> CounselingRequest {
        let now = Utc::now();
        CounselingRequest {
            id: Uuid::new_v4(),
            user_id,
            problem_ownership: self.problem_ownership,
            owner_name: self.owner_name.filter(|n| !n.trim().is_empty()),
            problem_category: self.problem_category,
            problem_description: self.problem_description,
            handling_technic: self.handling_technic,
            counselor_gender: self.counselor_gender,
            counselor_id: None,
            status: STATUS_WAITING,
            additional_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Assigned counselor, as shown in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counselor {
    pub id: i64,
    pub full_name: String,
}

/// A past request with its counselor, if one was assigned.
#[derive(Debug, Clone, Serialize)]
pub struct CounselingHistoryEntry {
    #[serde(flatten)]
    pub request: CounselingRequest,
    pub counselor: Option<Counselor>,
}
