//! Achievement and leaderboard types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::ValidationErrors;

/// The only status a submitter may still edit.
pub const STATUS_PENDING: i32 = 0;

/// A submitted achievement awaiting or past admin review.
#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub achievement_date: NaiveDate,
    #[serde(rename = "type")]
    pub achievement_type: i32,
    /// Set by an admin on approval
    pub score: i32,
    /// Object key of the uploaded proof
    pub proof: String,
    pub status: i32,
    pub approver_id: Option<i64>,
    pub approved_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Achievement {
    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }
}

/// Metadata accompanying a new submission. There is no score field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AchievementInput {
    pub name: String,
    pub description: String,
    pub achievement_date: String,
    #[serde(rename = "type")]
    pub achievement_type: i32,
}

impl AchievementInput {
    /// Validate and return the parsed achievement date.
    pub fn validate(&self) -> Result<NaiveDate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        errors.require("description", &self.description);
        let date = parse_achievement_date(&self.achievement_date);
        if date.is_none() {
            errors.push(
                "achievement_date",
                "date",
                "The achievement_date field must be a valid date",
            );
        }
        errors.into_result()?;
        Ok(date.unwrap_or_default())
    }
}

/// Partial metadata update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AchievementPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub achievement_date: Option<String>,
    #[serde(rename = "type")]
    pub achievement_type: Option<i32>,
}

impl AchievementPatch {
    /// Apply to `achievement`, leaving absent fields untouched.
    pub fn apply(self, achievement: &mut Achievement) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            errors.require("name", name);
        }
        if let Some(description) = &self.description {
            errors.require("description", description);
        }
        let date = match &self.achievement_date {
            Some(raw) => match parse_achievement_date(raw) {
                Some(date) => Some(date),
                None => {
                    errors.push(
                        "achievement_date",
                        "date",
                        "The achievement_date field must be a valid date",
                    );
                    None
                }
            },
            None => None,
        };
        errors.into_result()?;

        if let Some(name) = self.name {
            achievement.name = name;
        }
        if let Some(description) = self.description {
            achievement.description = description;
        }
        if let Some(date) = date {
            achievement.achievement_date = date;
        }
        if let Some(kind) = self.achievement_type {
            achievement.achievement_type = kind;
        }
        achievement.updated_at = Utc::now();
        Ok(())
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_achievement_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<NaiveDate>,
    pub score: i64,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_validation() {
        let input = AchievementInput {
            name: "Juara 1".to_string(),
            description: "Lomba".to_string(),
            achievement_date: "2024-08-17".to_string(),
            achievement_type: 1,
        };
        assert_eq!(
            input.validate().unwrap(),
            NaiveDate::from_ymd_opt(2024, 8, 17).unwrap()
        );

        let bad = AchievementInput {
            achievement_date: "17/08/2024".to_string(),
            ..Default::default()
        };
        assert_eq!(bad.validate().unwrap_err().fields().len(), 3);
    }

    #[test]
    fn test_rfc3339_date() {
        assert_eq!(
            parse_achievement_date("2024-08-17T09:00:00+07:00"),
            NaiveDate::from_ymd_opt(2024, 8, 17)
        );
    }

    #[test]
    fn test_score_is_not_accepted() {
        let input: AchievementInput = serde_json::from_str(
            r#"{"name": "a", "description": "b", "achievement_date": "2024-01-01",
                "type": 2, "score": 100}"#,
        )
        .unwrap();
        assert_eq!(input.achievement_type, 2);
    }
}
